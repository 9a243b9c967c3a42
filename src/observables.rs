// observables.rs - Per-frame snapshot of everything a renderer reads

use crate::chain::SpinSystem;
use crate::controller::SimulationController;
use rand::Rng;

/// Owned copy of the derived quantities at one redraw tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub step: u64,
    pub temperature: Option<f64>,
    pub spins: Vec<i8>,
    pub magnetization: f64,
    pub energy: f64,
    /// `None` while the history is still empty.
    pub correlation: Option<Vec<f64>>,
}

impl Frame {
    /// Read the controller once. `max_distance` is clamped to the chain.
    pub fn capture<S: SpinSystem, R: Rng>(
        sim: &SimulationController<S, R>,
        max_distance: usize,
    ) -> Self {
        let spins = sim.state().to_vec();
        let max_distance = max_distance.min(spins.len().saturating_sub(1));
        Self {
            step: sim.steps_taken(),
            temperature: sim.temperature(),
            magnetization: sim.magnetization(),
            energy: sim.total_energy(),
            correlation: sim.correlation_function(max_distance).ok(),
            spins,
        }
    }

    /// Energy per spin.
    pub fn energy_density(&self) -> f64 {
        self.energy / self.spins.len() as f64
    }

    /// One character per spin: `+` up, `-` down.
    pub fn spin_row(&self) -> String {
        self.spins
            .iter()
            .map(|&s| if s > 0 { '+' } else { '-' })
            .collect()
    }

    pub fn csv_header(max_distance: usize) -> Vec<String> {
        let mut h: Vec<String> = ["step", "temperature", "magnetization", "energy", "spins"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        h.extend((0..=max_distance).map(|d| format!("c{d}")));
        h
    }

    /// Row matching [`csv_header`](Self::csv_header); missing correlation
    /// values are written as empty fields.
    pub fn to_record(&self, max_distance: usize) -> Vec<String> {
        let mut r = vec![
            self.step.to_string(),
            self.temperature.map(|t| t.to_string()).unwrap_or_default(),
            self.magnetization.to_string(),
            self.energy.to_string(),
            self.spin_row(),
        ];
        let corr = self.correlation.as_deref().unwrap_or(&[]);
        r.extend((0..=max_distance).map(|d| corr.get(d).map(|c| c.to_string()).unwrap_or_default()));
        r
    }
}
