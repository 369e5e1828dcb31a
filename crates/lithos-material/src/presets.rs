//! Named material presets for common lithologies.
//!
//! Values are SI. Creep parameters follow widely used laboratory fits
//! (wet quartzite, dry olivine); treat them as starting points.

use std::collections::HashMap;

use crate::density::DensityLaw;
use crate::elasticity::Elasticity;
use crate::material::Material;
use crate::melt::{MeltModel, MeltWeakening, SolidusCurve};
use crate::plasticity::{DruckerPrager, PlasticityLaw};
use crate::viscosity::{ViscosityLaw, ViscousCreep};

/// Collection of material templates looked up by name.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    /// Library with the built-in presets.
    pub fn with_defaults() -> Self {
        let mut lib = Self::empty();
        lib.register(air());
        lib.register(upper_crust());
        lib.register(lower_crust());
        lib.register(mantle_lithosphere());
        lib.register(sediment());
        lib
    }

    pub fn empty() -> Self {
        Self { materials: HashMap::new() }
    }

    /// Registers a template, replacing any with the same name.
    pub fn register(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Clone of the named template.
    pub fn get(&self, name: &str) -> Option<Material> {
        self.materials.get(name).cloned()
    }

    /// Sorted template names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Presets ──────────────────────────────────────────────────────────

fn crustal_plasticity() -> PlasticityLaw {
    PlasticityLaw::DruckerPrager(DruckerPrager::new(20e6, 0.577).with_softening(2e6, 0.1154, 0.01, 0.06))
}

fn air() -> Material {
    Material::new("air")
        .with_density(DensityLaw::constant(1.0))
        .with_viscosity(ViscosityLaw::constant(1e19))
        .with_heating(100.0, 0.0)
        .with_diffusivity(1e-6)
}

fn upper_crust() -> Material {
    Material::new("upper_crust")
        .with_density(DensityLaw::linear(2620.0))
        .with_viscosity(ViscosityLaw::Creep(
            ViscousCreep::new("wet quartzite", 8.574e-28, 4.0).with_activation(222.815e3, 0.0),
        ))
        .with_plasticity(crustal_plasticity())
        .with_heating(1000.0, 0.7e-6)
        .with_healing_rate(1e-15)
}

fn lower_crust() -> Material {
    Material::new("lower_crust")
        .with_density(DensityLaw::linear(2720.0))
        .with_viscosity(ViscosityLaw::Creep(
            ViscousCreep::new("wet quartzite", 8.574e-28, 4.0).with_activation(222.815e3, 0.0),
        ))
        .with_plasticity(crustal_plasticity())
        .with_heating(1000.0, 0.4e-6)
        .with_melt(MeltModel::new(
            SolidusCurve::new(923.0, -1.2e-7, 1.2e-16, -3.5e-26),
            SolidusCurve::new(1423.0, -1.2e-7, 1.6e-16, -5.0e-27),
        ))
        .with_melt_weakening(MeltWeakening::new(1e-3, 0.15, 0.30))
        .with_latent_heat(300e3)
}

fn mantle_lithosphere() -> Material {
    Material::new("mantle_lithosphere")
        .with_density(DensityLaw::linear(3370.0))
        .with_viscosity(ViscosityLaw::Creep(
            ViscousCreep::new("dry olivine", 6.052e-17, 3.5).with_activation(530e3, 18e-6),
        ))
        .with_plasticity(crustal_plasticity())
        .with_heating(1000.0, 0.0)
}

fn sediment() -> Material {
    Material::new("sediment")
        .with_density(DensityLaw::constant(2300.0))
        .with_viscosity(ViscosityLaw::constant(1e21))
        .with_elasticity(Elasticity::new(1e10, 1e4 * lithos_types::units::SECONDS_PER_YEAR))
        .with_heating(1000.0, 0.6e-6)
}
