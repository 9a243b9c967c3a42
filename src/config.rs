// config.rs - Construction parameters (single source of truth)

use crate::chain::{Boundary, InitialState, SpinChain};
use crate::controller::SimulationController;
use crate::error::{Result, SimError};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Everything needed to build a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub length:          usize,
    pub coupling:        f64,
    pub num_past_states: usize,
    pub coarse:          usize,
    pub initial:         InitialState,
    pub boundary:        Boundary,
    pub seed:            Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            length:          100,
            coupling:        -1.0,
            num_past_states: 100,
            coarse:          10,
            initial:         InitialState::Uniform,
            boundary:        Boundary::Periodic,
            seed:            None,
        }
    }
}

impl SimConfig {
    pub fn with_length(length: usize) -> Self {
        Self { length, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.length < 1 {
            return Err(SimError::config("length must be >= 1"));
        }
        if !self.coupling.is_finite() {
            return Err(SimError::config(format!(
                "coupling must be finite, got {}",
                self.coupling
            )));
        }
        if self.num_past_states < 1 {
            return Err(SimError::config("num_past_states must be >= 1"));
        }
        if self.coarse < 1 {
            return Err(SimError::config("coarse must be >= 1"));
        }
        Ok(())
    }

    /// Build the chain and controller. The same RNG seeds the initial
    /// configuration and then drives the dynamics; without a seed it is
    /// drawn from OS entropy.
    pub fn build(&self) -> Result<SimulationController<SpinChain, ChaCha20Rng>> {
        self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let chain = SpinChain::new(self.length, self.coupling, self.initial, &mut rng)?
            .with_boundary(self.boundary);
        SimulationController::new(chain, rng, self.num_past_states, self.coarse)
    }

    /// Dump the resolved configuration as pretty JSON.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.coupling, -1.0);
        assert_eq!(cfg.num_past_states, 100);
        assert_eq!(cfg.coarse, 10);
        assert_eq!(cfg.boundary, Boundary::Periodic);
    }

    #[test]
    fn test_validate_rejects_zero_fields() {
        for cfg in [
            SimConfig::with_length(0),
            SimConfig { coarse: 0, ..SimConfig::default() },
            SimConfig { num_past_states: 0, ..SimConfig::default() },
            SimConfig { coupling: f64::NAN, ..SimConfig::default() },
        ] {
            assert!(matches!(cfg.validate(), Err(SimError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_json_round_trip_preserves_modes() {
        let cfg = SimConfig {
            initial: InitialState::Random,
            boundary: Boundary::Open,
            seed: Some(7),
            ..SimConfig::with_length(12)
        };
        let text = serde_json::to_string(&cfg).unwrap();
        assert!(text.contains("\"open\""));
        let back: SimConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
