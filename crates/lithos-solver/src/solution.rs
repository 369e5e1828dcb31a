//! Latest solver output sampled at the particles.

use lithos_types::{Dimension, LithosError, LithosResult, Scalar, SymTensor};

/// Per-particle samples of the solved fields.
///
/// Written by the Stokes and thermal collaborators, read by the composer.
/// Entries follow the swarm ordering and are remapped with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    pub pressure: Vec<Scalar>,
    pub strain_rate: Vec<SymTensor>,
    /// Present only when the model carries a temperature field.
    pub temperature: Option<Vec<Scalar>>,
}

impl Solution {
    /// Zeroed samples for `n` particles.
    pub fn new(n: usize) -> Self {
        Self { pressure: vec![0.0; n], strain_rate: vec![SymTensor::ZERO; n], temperature: None }
    }

    pub fn len(&self) -> usize {
        self.pressure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
    }

    /// Strain-rate second invariant at particle `i`.
    #[inline]
    pub fn strain_rate_invariant(&self, i: usize, dim: Dimension) -> Scalar {
        self.strain_rate[i].second_invariant(dim)
    }

    #[inline]
    pub fn temperature_at(&self, i: usize) -> Option<Scalar> {
        self.temperature.as_ref().map(|t| t[i])
    }

    /// Reorders the samples: entry `i` becomes old entry `sources[i]`.
    pub fn remap(&mut self, sources: &[usize]) -> LithosResult<()> {
        let n = self.len();
        if let Some(&bad) = sources.iter().find(|&&s| s >= n) {
            return Err(LithosError::InvariantViolation(format!("remap source {bad} out of range ({n} samples)")));
        }
        self.pressure = sources.iter().map(|&s| self.pressure[s]).collect();
        self.strain_rate = sources.iter().map(|&s| self.strain_rate[s]).collect();
        if let Some(t) = &self.temperature {
            self.temperature = Some(sources.iter().map(|&s| t[s]).collect());
        }
        Ok(())
    }

    /// Checks that every sample array matches `n` particles.
    pub fn check_len(&self, n: usize) -> LithosResult<()> {
        let t_len = self.temperature.as_ref().map_or(n, Vec::len);
        if self.pressure.len() != n || self.strain_rate.len() != n || t_len != n {
            return Err(LithosError::InvariantViolation(format!(
                "solution sized for {} particles, swarm has {n}",
                self.pressure.len()
            )));
        }
        Ok(())
    }
}
