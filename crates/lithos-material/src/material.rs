//! Material descriptor.

use serde::{Deserialize, Serialize};

use lithos_types::{LithosError, LithosResult, MaterialId, Scalar};

use crate::density::DensityLaw;
use crate::elasticity::Elasticity;
use crate::melt::{MeltModel, MeltWeakening};
use crate::phase::PhaseChange;
use crate::plasticity::PlasticityLaw;
use crate::shape::Shape;
use crate::viscosity::ViscosityLaw;

/// Constitutive capability a material may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Density,
    Viscosity,
    Plasticity,
    Elasticity,
    StressLimiter,
    Compressibility,
    Diffusivity,
    /// Density, heat capacity and radiogenic heat production together.
    RadiogenicHeating,
    LatentHeat,
    Healing,
    Melt,
    MeltWeakening,
    MeltExpansion,
    InitialMelt,
    PhaseChange,
}

/// A named phase with its own set of constitutive laws.
///
/// Every law is optional; `None` means the material does not take part in
/// the corresponding composition step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    /// Assigned by the registry.
    pub index: MaterialId,
    /// Region painted with this material when it is added.
    pub shape: Option<Shape>,
    pub density: Option<DensityLaw>,
    pub viscosity: Option<ViscosityLaw>,
    pub plasticity: Option<PlasticityLaw>,
    pub elasticity: Option<Elasticity>,
    /// Upper bound on the yield stress.
    pub stress_limiter: Option<Scalar>,
    pub min_viscosity: Option<Scalar>,
    pub max_viscosity: Option<Scalar>,
    pub compressibility: Option<Scalar>,
    pub diffusivity: Option<Scalar>,
    pub capacity: Option<Scalar>,
    pub radiogenic_heat_production: Option<Scalar>,
    pub latent_heat_fusion: Option<Scalar>,
    /// Plastic-strain healing rate (strain per unit time).
    pub healing_rate: Option<Scalar>,
    pub melt: Option<MeltModel>,
    pub melt_weakening: Option<MeltWeakening>,
    pub melt_expansion: Option<Scalar>,
    /// Melt fraction assigned to the particles at initialisation.
    pub initial_melt_fraction: Option<Scalar>,
    pub phase_changes: Vec<PhaseChange>,
}

impl Material {
    /// Material with no declared laws.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_density(mut self, law: DensityLaw) -> Self {
        self.density = Some(law);
        self
    }

    pub fn with_viscosity(mut self, law: ViscosityLaw) -> Self {
        self.viscosity = Some(law);
        self
    }

    pub fn with_plasticity(mut self, law: PlasticityLaw) -> Self {
        self.plasticity = Some(law);
        self
    }

    pub fn with_elasticity(mut self, elasticity: Elasticity) -> Self {
        self.elasticity = Some(elasticity);
        self
    }

    pub fn with_stress_limiter(mut self, limit: Scalar) -> Self {
        self.stress_limiter = Some(limit);
        self
    }

    pub fn with_viscosity_bounds(mut self, min: Scalar, max: Scalar) -> Self {
        self.min_viscosity = Some(min);
        self.max_viscosity = Some(max);
        self
    }

    pub fn with_compressibility(mut self, compressibility: Scalar) -> Self {
        self.compressibility = Some(compressibility);
        self
    }

    pub fn with_diffusivity(mut self, diffusivity: Scalar) -> Self {
        self.diffusivity = Some(diffusivity);
        self
    }

    /// Heat capacity and radiogenic heat production.
    pub fn with_heating(mut self, capacity: Scalar, radiogenic_heat_production: Scalar) -> Self {
        self.capacity = Some(capacity);
        self.radiogenic_heat_production = Some(radiogenic_heat_production);
        self
    }

    pub fn with_latent_heat(mut self, latent_heat_fusion: Scalar) -> Self {
        self.latent_heat_fusion = Some(latent_heat_fusion);
        self
    }

    pub fn with_healing_rate(mut self, rate: Scalar) -> Self {
        self.healing_rate = Some(rate);
        self
    }

    pub fn with_melt(mut self, melt: MeltModel) -> Self {
        self.melt = Some(melt);
        self
    }

    pub fn with_melt_weakening(mut self, weakening: MeltWeakening) -> Self {
        self.melt_weakening = Some(weakening);
        self
    }

    pub fn with_melt_expansion(mut self, expansion: Scalar) -> Self {
        self.melt_expansion = Some(expansion);
        self
    }

    pub fn with_initial_melt_fraction(mut self, fraction: Scalar) -> Self {
        self.initial_melt_fraction = Some(fraction);
        self
    }

    pub fn with_phase_change(mut self, change: PhaseChange) -> Self {
        self.phase_changes.push(change);
        self
    }

    /// Whether the material declares `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Density => self.density.is_some(),
            Capability::Viscosity => self.viscosity.is_some(),
            Capability::Plasticity => self.plasticity.is_some(),
            Capability::Elasticity => self.elasticity.is_some(),
            Capability::StressLimiter => self.stress_limiter.is_some(),
            Capability::Compressibility => self.compressibility.is_some(),
            Capability::Diffusivity => self.diffusivity.is_some(),
            Capability::RadiogenicHeating => {
                self.density.is_some() && self.capacity.is_some() && self.radiogenic_heat_production.is_some()
            }
            Capability::LatentHeat => self.latent_heat_fusion.is_some() && self.capacity.is_some(),
            Capability::Healing => self.healing_rate.is_some(),
            Capability::Melt => self.melt.is_some(),
            Capability::MeltWeakening => self.melt_weakening.is_some(),
            Capability::MeltExpansion => self.melt_expansion.is_some(),
            Capability::InitialMelt => self.initial_melt_fraction.is_some(),
            Capability::PhaseChange => !self.phase_changes.is_empty(),
        }
    }

    /// Checks the cross-capability requirements of the material.
    pub fn validate(&self) -> LithosResult<()> {
        if self.has(Capability::Elasticity) && !self.has(Capability::Viscosity) {
            return Err(LithosError::Configuration(format!(
                "viscosity undefined for elastic material '{}' ({})",
                self.name, self.index
            )));
        }
        if self.has(Capability::StressLimiter) && !self.has(Capability::Plasticity) {
            return Err(LithosError::Configuration(format!(
                "stress limiter without plasticity on material '{}' ({})",
                self.name, self.index
            )));
        }
        if let Some(w) = &self.melt_weakening {
            w.validate(self.index)?;
        }
        if let (Some(min), Some(max)) = (self.min_viscosity, self.max_viscosity) {
            if min > max {
                return Err(LithosError::Configuration(format!(
                    "material '{}': min viscosity {min:e} exceeds max viscosity {max:e}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
