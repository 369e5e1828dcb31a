//! Constitutive function composer.
//!
//! Turns the per-material law table into per-particle values. Every
//! quantity follows the same two phases:
//!
//! 1. **Compose**: walk the registry and build a [`PiecewiseMap`] from
//!    material index to the branch that evaluates the quantity, checking
//!    cross-capability requirements on the way.
//! 2. **Evaluate**: dispatch each particle on its material index and run
//!    the branch against the particle's [`PointState`].
//!
//! Nothing is cached. A [`Composer`] borrows the live swarm and solution,
//! so every call reflects the current field values.

use lithos_material::{Capability, Elasticity, MaterialRegistry, MeltWeakening, PlasticityLaw, PointState, ViscosityLaw};
use lithos_mesh::{CartesianMesh, FrictionBoundaries};
use lithos_types::constants::STRAIN_RATE_FLOOR;
use lithos_types::{LithosError, LithosResult, MaterialId, Scalar, SymTensor};

use crate::config::ModelConfig;
use crate::piecewise::PiecewiseMap;
use crate::solution::Solution;
use crate::swarm::Swarm;

/// Read-only view used to compose material-dependent quantities.
#[derive(Clone, Copy)]
pub struct Composer<'a> {
    pub registry: &'a MaterialRegistry,
    pub config: &'a ModelConfig,
    pub mesh: &'a CartesianMesh,
    pub swarm: &'a Swarm,
    pub solution: &'a Solution,
    pub friction: Option<&'a FrictionBoundaries>,
    /// Whether at least one solve has produced strain rates.
    pub solution_exists: bool,
    /// Timestep of the current iteration, if any.
    pub dt: Option<Scalar>,
}

/// Effective viscosity at one particle with the values the yielding
/// diagnostic needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViscosityBreakdown {
    /// Clamped effective viscosity.
    pub effective: Scalar,
    /// Effective viscosity before the clamp.
    pub unclamped: Scalar,
    /// Viscosity without the plastic branch.
    pub background: Scalar,
    /// No viscous branch declared.
    pub plastic_only: bool,
}

impl ViscosityBreakdown {
    /// The clamped viscosity sits below the background, or the material
    /// has no viscous branch.
    pub fn is_yielding(&self) -> bool {
        self.effective < self.background || self.plastic_only
    }
}

/// Viscosity branch of one material.
#[derive(Debug, Clone, Copy)]
struct Rheology<'a> {
    viscous: Option<&'a ViscosityLaw>,
    elasticity: Option<Elasticity>,
    weakening: Option<&'a MeltWeakening>,
    plasticity: Option<&'a PlasticityLaw>,
    stress_limiter: Option<Scalar>,
    min_viscosity: Scalar,
    max_viscosity: Scalar,
}

impl<'a> Composer<'a> {
    pub fn len(&self) -> usize {
        self.swarm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swarm.is_empty()
    }

    /// Evaluation point of particle `i`.
    pub fn point(&self, i: usize) -> PointState {
        let strain_rate = self.solution.strain_rate[i];
        let strain_rate_invariant = if self.solution_exists {
            strain_rate.second_invariant(self.swarm.dim)
        } else {
            self.config.default_strain_rate
        };
        PointState {
            position: self.swarm.positions[i],
            pressure: self.solution.pressure[i],
            temperature: self.solution.temperature_at(i),
            strain_rate,
            strain_rate_invariant,
            plastic_strain: self.swarm.plastic_strain[i],
            melt: self.swarm.melt[i],
            previous_stress: self.swarm.previous_stress[i],
        }
    }

    fn check(&self) -> LithosResult<()> {
        self.swarm.validate()?;
        self.solution.check_len(self.swarm.len())
    }

    // ─── Viscosity ────────────────────────────────────────────

    fn rheology_map(&self) -> LithosResult<PiecewiseMap<Rheology<'a>>> {
        let mut map = PiecewiseMap::new("viscosity");
        for m in self.registry.iter() {
            if m.has(Capability::Elasticity) && !m.has(Capability::Viscosity) {
                return Err(LithosError::Configuration(format!(
                    "viscosity undefined for elastic material '{}' ({})",
                    m.name, m.index
                )));
            }
            if m.has(Capability::StressLimiter) && !m.has(Capability::Plasticity) {
                return Err(LithosError::Configuration(format!(
                    "stress limiter declared without plasticity on material '{}' ({})",
                    m.name, m.index
                )));
            }
            if !m.has(Capability::Viscosity) && !m.has(Capability::Plasticity) {
                continue;
            }
            if let Some(w) = &m.melt_weakening {
                w.validate(m.index)?;
            }
            map.insert(
                m.index,
                Rheology {
                    viscous: m.viscosity.as_ref(),
                    elasticity: m.elasticity,
                    weakening: m.melt_weakening.as_ref(),
                    plasticity: m.plasticity.as_ref(),
                    stress_limiter: m.stress_limiter.or(self.config.stress_limiter),
                    min_viscosity: m.min_viscosity.unwrap_or(self.config.min_viscosity),
                    max_viscosity: m.max_viscosity.unwrap_or(self.config.max_viscosity),
                },
            );
        }
        Ok(map)
    }

    fn evaluate_rheology(&self, id: MaterialId, r: &Rheology<'_>, point: &PointState) -> LithosResult<ViscosityBreakdown> {
        let dim = self.swarm.dim;

        let viscous = match r.viscous {
            Some(law) => {
                let mut eta = law.evaluate(id, point)?;
                if let Some(e) = r.elasticity {
                    eta = e.effective_viscosity(eta);
                }
                if let Some(w) = r.weakening {
                    eta *= w.multiplier(point.melt);
                }
                Some(eta)
            }
            None => None,
        };

        let plastic = r.plasticity.map(|law| {
            let boundary = self.friction.and_then(|f| f.friction_at(self.mesh, &point.position));
            match boundary {
                // Frictional layer: boundary coefficient, no limiter,
                // plain strain-rate invariant.
                Some(friction) => {
                    let tau = law.with_friction(friction).yield_stress(dim, point);
                    0.5 * tau / point.strain_rate_invariant.max(STRAIN_RATE_FLOOR)
                }
                None => {
                    let mut tau = law.yield_stress(dim, point);
                    if let Some(limit) = r.stress_limiter {
                        tau = tau.min(limit);
                    }
                    let eii = match r.elasticity {
                        Some(e) if self.solution_exists => {
                            e.effective_strain_rate(point.strain_rate, point.previous_stress).second_invariant(dim)
                        }
                        _ => point.strain_rate_invariant,
                    };
                    0.5 * tau / eii.max(STRAIN_RATE_FLOOR)
                }
            }
        });

        let (unclamped, background, plastic_only) = match (viscous, plastic) {
            (Some(v), Some(p)) => (v.min(p), v, false),
            (Some(v), None) => (v, v, false),
            (None, Some(p)) => (p, p, true),
            (None, None) => return Err(LithosError::UndefinedProperty { material: id, property: "viscosity" }),
        };
        let effective = unclamped.max(r.min_viscosity).min(r.max_viscosity);
        Ok(ViscosityBreakdown { effective, unclamped, background, plastic_only })
    }

    /// Full viscosity composition at every particle.
    pub fn viscosity_breakdown(&self) -> LithosResult<Vec<ViscosityBreakdown>> {
        self.check()?;
        let map = self.rheology_map()?;
        map.evaluate(&self.swarm.material, |i, r| {
            self.evaluate_rheology(self.swarm.material[i], r, &self.point(i))
        })
    }

    /// Effective viscosity at every particle.
    pub fn viscosity(&self) -> LithosResult<Vec<Scalar>> {
        Ok(self.viscosity_breakdown()?.into_iter().map(|b| b.effective).collect())
    }

    /// Yielding diagnostic: strain-rate invariant where plasticity governs,
    /// zero elsewhere and everywhere before the first solve.
    pub fn yielding(&self) -> LithosResult<Vec<Scalar>> {
        if !self.solution_exists {
            self.check()?;
            return Ok(vec![0.0; self.len()]);
        }
        let breakdown = self.viscosity_breakdown()?;
        Ok(breakdown
            .iter()
            .enumerate()
            .map(|(i, b)| if b.is_yielding() { self.point(i).strain_rate_invariant } else { 0.0 })
            .collect())
    }

    /// `2 eta_eff max(edot_II, default strain rate)`.
    pub fn yield_stress(&self) -> LithosResult<Vec<Scalar>> {
        let eta = self.viscosity()?;
        let floor = self.config.default_strain_rate;
        Ok(eta.iter().enumerate().map(|(i, &v)| 2.0 * v * self.point(i).strain_rate_invariant.max(floor)).collect())
    }

    // ─── Stress ───────────────────────────────────────────────

    fn elastic_from(&self, eta: &[Scalar]) -> LithosResult<Vec<SymTensor>> {
        if !self.registry.any(Capability::Elasticity) {
            return Ok(vec![SymTensor::ZERO; self.len()]);
        }
        let mut map = PiecewiseMap::with_default("elastic stress", None);
        for m in self.registry.iter() {
            map.insert(m.index, m.elasticity);
        }
        map.evaluate(&self.swarm.material, |i, e: &Option<Elasticity>| {
            Ok(match e {
                Some(e) => e.elastic_stress(eta[i], self.swarm.previous_stress[i]),
                None => SymTensor::ZERO,
            })
        })
    }

    /// Elastic stress contribution; zero tensors without elastic materials.
    pub fn elastic_stress(&self) -> LithosResult<Vec<SymTensor>> {
        if !self.registry.any(Capability::Elasticity) {
            self.check()?;
            return Ok(vec![SymTensor::ZERO; self.len()]);
        }
        let eta = self.viscosity()?;
        self.elastic_from(&eta)
    }

    /// Total stress `2 eta_eff D + elastic`.
    pub fn stress(&self) -> LithosResult<Vec<SymTensor>> {
        let eta = self.viscosity()?;
        let elastic = self.elastic_from(&eta)?;
        Ok(eta
            .iter()
            .zip(&elastic)
            .enumerate()
            .map(|(i, (&v, &el))| self.solution.strain_rate[i] * (2.0 * v) + el)
            .collect())
    }

    // ─── Density ──────────────────────────────────────────────

    fn density_at(&self, id: MaterialId, point: &PointState) -> LithosResult<Scalar> {
        let m = self.registry.get(id)?;
        let law = m.density.as_ref().ok_or(LithosError::UndefinedProperty { material: id, property: "density" })?;
        let mut rho = if point.temperature.is_some() { law.evaluate(id, point)? } else { law.reference_density() };
        if let Some(expansion) = m.melt_expansion {
            rho *= 1.0 - expansion * point.melt;
        }
        Ok(rho)
    }

    /// Density at every particle.
    pub fn density(&self) -> LithosResult<Vec<Scalar>> {
        self.check()?;
        let mut map = PiecewiseMap::new("density");
        for m in self.registry.iter().filter(|m| m.has(Capability::Density)) {
            map.insert(m.index, ());
        }
        map.evaluate(&self.swarm.material, |i, _| self.density_at(self.swarm.material[i], &self.point(i)))
    }

    // ─── Thermal coefficients ─────────────────────────────────

    /// Thermal diffusivity; materials without one use the model default.
    pub fn diffusivity(&self) -> LithosResult<Vec<Scalar>> {
        self.check()?;
        let mut map = PiecewiseMap::with_default("diffusivity", self.config.diffusivity);
        for m in self.registry.iter() {
            if let Some(k) = m.diffusivity {
                map.insert(m.index, k);
            }
        }
        map.evaluate(&self.swarm.material, |_, &k| Ok(k))
    }

    /// Heat production: radiogenic `H / (rho Cp)`, latent heating of melt
    /// once a timestep is known, and shear heating when enabled.
    pub fn heat_production(&self) -> LithosResult<Vec<Scalar>> {
        self.check()?;
        let mut out = vec![0.0; self.len()];

        for (i, slot) in out.iter_mut().enumerate() {
            let id = self.swarm.material[i];
            let m = self.registry.get(id)?;
            if !m.has(Capability::RadiogenicHeating) {
                continue;
            }
            if let (Some(h), Some(cp)) = (m.radiogenic_heat_production, m.capacity) {
                let point = self.point(i);
                *slot = h / self.density_at(id, &point)? / cp;
            }
        }

        if let Some(dt) = self.dt.filter(|&dt| dt > 0.0) {
            if self.registry.any(Capability::LatentHeat) {
                let melt_now = self.melt_fraction()?;
                for (i, slot) in out.iter_mut().enumerate() {
                    let id = self.swarm.material[i];
                    let m = self.registry.get(id)?;
                    if let (Some(l), Some(cp)) = (m.latent_heat_fusion, m.capacity) {
                        let t = self
                            .solution
                            .temperature_at(i)
                            .ok_or(LithosError::MissingField { material: id, field: "temperature" })?;
                        let df = (melt_now[i] - self.swarm.melt[i]) / dt;
                        *slot += l / cp * df * t;
                    }
                }
            }
        }

        if self.config.shear_heating {
            let stress = self.stress()?;
            for (i, slot) in out.iter_mut().enumerate() {
                *slot += stress[i].second_invariant(self.swarm.dim) * self.point(i).strain_rate_invariant;
            }
        }
        Ok(out)
    }

    /// Compressibility, or `None` if no material declares one.
    pub fn compressibility(&self) -> LithosResult<Option<Vec<Scalar>>> {
        if !self.registry.any(Capability::Compressibility) {
            return Ok(None);
        }
        self.check()?;
        let mut map = PiecewiseMap::with_default("compressibility", 0.0);
        for m in self.registry.iter() {
            if let Some(c) = m.compressibility {
                map.insert(m.index, c);
            }
        }
        map.evaluate(&self.swarm.material, |_, &c| Ok(c)).map(Some)
    }

    // ─── Melt and healing ─────────────────────────────────────

    /// Equilibrium melt fraction; zero for materials without a melt model.
    pub fn melt_fraction(&self) -> LithosResult<Vec<Scalar>> {
        self.check()?;
        let mut map = PiecewiseMap::with_default("melt fraction", None);
        for m in self.registry.iter() {
            if let Some(model) = &m.melt {
                map.insert(m.index, Some(model));
            }
        }
        map.evaluate(&self.swarm.material, |i, model| match model {
            Some(model) => {
                let id = self.swarm.material[i];
                let t = self
                    .solution
                    .temperature_at(i)
                    .ok_or(LithosError::MissingField { material: id, field: "temperature" })?;
                Ok(model.melt_fraction(self.solution.pressure[i], t))
            }
            None => Ok(0.0),
        })
    }

    /// Healing rate per particle, or `None` if no material heals.
    pub fn healing_rate(&self) -> LithosResult<Option<Vec<Scalar>>> {
        if !self.registry.any(Capability::Healing) {
            return Ok(None);
        }
        self.check()?;
        let mut map = PiecewiseMap::with_default("healing rate", 0.0);
        for m in self.registry.iter() {
            if let Some(rate) = m.healing_rate {
                map.insert(m.index, rate);
            }
        }
        map.evaluate(&self.swarm.material, |_, &r| Ok(r)).map(Some)
    }

    /// Smallest elastic observation time over all materials.
    pub fn min_observation_time(&self) -> Option<Scalar> {
        self.registry
            .iter()
            .filter_map(|m| m.elasticity.map(|e| e.observation_time))
            .fold(None, |acc: Option<Scalar>, t| Some(acc.map_or(t, |a| a.min(t))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_material::{DensityLaw, Material};
    use lithos_types::Dimension;

    fn fixture(materials: &[MaterialId]) -> (MaterialRegistry, ModelConfig, CartesianMesh, Swarm, Solution) {
        let registry = MaterialRegistry::new(Material::new("bg").with_viscosity(ViscosityLaw::constant(1e21)));
        let mesh = CartesianMesh::new_2d([0.0, 0.0], [1.0, 1.0], [2, 2]).unwrap();
        let positions = vec![[0.5, 0.5, 0.0]; materials.len()];
        let mut swarm = Swarm::new(Dimension::Two, positions);
        swarm.material = materials.to_vec();
        let solution = Solution::new(materials.len());
        (registry, ModelConfig::default(), mesh, swarm, solution)
    }

    #[test]
    fn default_strain_rate_before_first_solve() {
        let (registry, config, mesh, swarm, solution) = fixture(&[MaterialId(0)]);
        let c = Composer {
            registry: &registry,
            config: &config,
            mesh: &mesh,
            swarm: &swarm,
            solution: &solution,
            friction: None,
            solution_exists: false,
            dt: None,
        };
        assert_eq!(c.point(0).strain_rate_invariant, config.default_strain_rate);
        assert_eq!(c.yielding().unwrap(), vec![0.0]);
    }

    #[test]
    fn density_falls_back_to_reference_without_temperature() {
        let (mut registry, config, mesh, mut swarm, solution) = fixture(&[MaterialId(1)]);
        let id = registry
            .add(Material::new("hot").with_density(DensityLaw::linear(3300.0)).with_melt_expansion(0.1), None)
            .unwrap();
        swarm.melt[0] = 0.5;
        let c = Composer {
            registry: &registry,
            config: &config,
            mesh: &mesh,
            swarm: &swarm,
            solution: &solution,
            friction: None,
            solution_exists: false,
            dt: None,
        };
        assert_eq!(id, MaterialId(1));
        let rho = c.density().unwrap();
        assert!((rho[0] - 3300.0 * 0.95).abs() < 1e-9);
    }

    #[test]
    fn background_without_density_is_undefined() {
        let (registry, config, mesh, swarm, solution) = fixture(&[MaterialId(0)]);
        let c = Composer {
            registry: &registry,
            config: &config,
            mesh: &mesh,
            swarm: &swarm,
            solution: &solution,
            friction: None,
            solution_exists: false,
            dt: None,
        };
        assert!(matches!(c.density(), Err(LithosError::UndefinedProperty { property: "density", .. })));
    }

    #[test]
    fn viscous_stress_without_elastic_materials() {
        let (registry, config, mesh, swarm, mut solution) = fixture(&[MaterialId(0)]);
        solution.strain_rate[0] = SymTensor::new_2d(1e-15, -1e-15, 0.0);
        let c = Composer {
            registry: &registry,
            config: &config,
            mesh: &mesh,
            swarm: &swarm,
            solution: &solution,
            friction: None,
            solution_exists: true,
            dt: None,
        };
        assert_eq!(c.elastic_stress().unwrap(), vec![SymTensor::ZERO]);
        let tau = c.stress().unwrap();
        let parts = tau[0].components(Dimension::Two);
        assert!((parts[0] - 2e6).abs() < 1e-6);
        assert!((parts[1] + 2e6).abs() < 1e-6);
        assert_eq!(parts[2], 0.0);
    }
}
