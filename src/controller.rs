// controller.rs - Drives a spin system through a schedule and keeps the
// rolling window of past states used for correlation averages.

use crate::chain::{SpinChain, SpinSystem};
use crate::correlation::{connected_correlation, raw_correlation, reference_correlation};
use crate::error::{check_temperature, Result, SimError};
use crate::schedule::{Schedule, TimeUnit};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Owns the chain, its random source and the snapshot history.
///
/// Nothing in here locks: a renderer on another thread should take a
/// [`Frame`](crate::observables::Frame) and hand that over instead.
#[derive(Debug, Clone)]
pub struct SimulationController<S = SpinChain, R = ChaCha20Rng> {
    system: S,
    rng: R,
    history: VecDeque<Vec<i8>>,
    num_past_states: usize,
    coarse: usize,
    since_snapshot: usize,
    steps_taken: u64,
    temperature: Option<f64>,
}

impl<S: SpinSystem, R: Rng> SimulationController<S, R> {
    /// `num_past_states` bounds the history; a snapshot is recorded after
    /// every `coarse` steps. Both must be >= 1.
    pub fn new(system: S, rng: R, num_past_states: usize, coarse: usize) -> Result<Self> {
        if num_past_states == 0 {
            return Err(SimError::config("num_past_states must be >= 1"));
        }
        if coarse == 0 {
            return Err(SimError::config("coarse must be >= 1"));
        }
        Ok(Self {
            system,
            rng,
            history: VecDeque::with_capacity(num_past_states),
            num_past_states,
            coarse,
            since_snapshot: 0,
            steps_taken: 0,
            temperature: None,
        })
    }

    /// Run `count` Metropolis trials at `temperature`. Returns how many
    /// flips were accepted.
    pub fn run_steps(&mut self, temperature: f64, count: usize) -> Result<usize> {
        check_temperature(temperature)?;
        self.temperature = Some(temperature);

        let mut accepted = 0;
        for _ in 0..count {
            let info = self.system.step(temperature, &mut self.rng)?;
            if info.accepted {
                accepted += 1;
            }
            self.steps_taken += 1;
            self.since_snapshot += 1;
            if self.since_snapshot == self.coarse {
                self.since_snapshot = 0;
                self.record_snapshot();
            }
        }
        Ok(accepted)
    }

    /// Run `sweeps` sweeps at `temperature`. A sweep is L trials at random
    /// sites followed by one snapshot; the coarse counter is left alone.
    pub fn run_sweeps(&mut self, temperature: f64, sweeps: usize) -> Result<usize> {
        check_temperature(temperature)?;
        let len = self.system.spins().len();
        if len.checked_mul(sweeps).is_none() {
            return Err(SimError::config(format!(
                "{sweeps} sweeps of {len} trials overflow the step count"
            )));
        }
        self.temperature = Some(temperature);

        let mut accepted = 0;
        for _ in 0..sweeps {
            for _ in 0..len {
                if self.system.step(temperature, &mut self.rng)?.accepted {
                    accepted += 1;
                }
                self.steps_taken += 1;
            }
            self.record_snapshot();
        }
        Ok(accepted)
    }

    /// `run_steps` or `run_sweeps`, depending on `unit`.
    pub fn run(&mut self, unit: TimeUnit, temperature: f64, amount: usize) -> Result<usize> {
        match unit {
            TimeUnit::Steps => self.run_steps(temperature, amount),
            TimeUnit::Sweeps => self.run_sweeps(temperature, amount),
        }
    }

    /// Apply every stage in order, no interleaving. Returns accepted flips.
    pub fn schedule_update(&mut self, schedule: &Schedule) -> Result<usize> {
        let mut accepted = 0;
        for (k, stage) in schedule.stages().iter().enumerate() {
            debug!(
                stage = k,
                temperature = stage.temperature,
                duration = stage.duration,
                "schedule stage"
            );
            accepted += self.run_steps(stage.temperature, stage.duration)?;
        }
        Ok(accepted)
    }

    /// Same as [`schedule_update`](Self::schedule_update) for raw pairs; the
    /// whole list is validated before the first step runs.
    pub fn schedule_update_pairs(&mut self, pairs: &[(f64, i64)]) -> Result<usize> {
        let schedule = Schedule::try_from(pairs)?;
        self.schedule_update(&schedule)
    }

    /// Push a copy of the current state, evicting the oldest when full.
    pub fn record_snapshot(&mut self) {
        if self.history.len() == self.num_past_states {
            self.history.pop_front();
            trace!(capacity = self.num_past_states, "evicted oldest snapshot");
        }
        self.history.push_back(self.system.spins().to_vec());
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.since_snapshot = 0;
    }

    /// Back to the initial configuration with an empty history.
    pub fn reset(&mut self) {
        self.system.reset();
        self.clear_history();
        self.steps_taken = 0;
        self.temperature = None;
    }

    /// Raw correlation `<s_i s_{i+d}>` over the history, `d` in
    /// `0..=max_distance`.
    pub fn correlation_function(&self, max_distance: usize) -> Result<Vec<f64>> {
        raw_correlation(&self.history, max_distance, self.system.boundary())
    }

    /// Connected correlation `<s_i s_{i+d}> - <s_i><s_{i+d}>` over the history.
    pub fn connected_correlation_function(&self, max_distance: usize) -> Result<Vec<f64>> {
        connected_correlation(&self.history, max_distance, self.system.boundary())
    }

    /// `<s_0 s_i>` for every site, measured from the first spin only.
    pub fn reference_correlation_function(&self) -> Result<Vec<f64>> {
        reference_correlation(&self.history)
    }

    /// Correlation at every distance the chain supports.
    pub fn full_correlation(&self) -> Result<Vec<f64>> {
        self.correlation_function(self.system.spins().len() - 1)
    }

    /// Current spins, read-only.
    pub fn state(&self) -> &[i8] {
        self.system.spins()
    }

    pub fn set_spin(&mut self, site: usize, value: i8) -> Result<()> {
        self.system.set_spin(site, value)
    }

    pub fn magnetization(&self) -> f64 {
        self.system.magnetization()
    }

    pub fn total_energy(&self) -> f64 {
        self.system.total_energy()
    }

    /// Recorded snapshots, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &[i8]> + '_ {
        self.history.iter().map(Vec::as_slice)
    }

    /// The most recent `n` snapshots (fewer if not that many exist), oldest
    /// first.
    pub fn recent_states(&self, n: usize) -> impl Iterator<Item = &[i8]> + '_ {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).map(Vec::as_slice)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn num_past_states(&self) -> usize {
        self.num_past_states
    }

    pub fn coarse(&self) -> usize {
        self.coarse
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Temperature of the most recent `run_steps` call.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Direct access for edits between steps (local fields, flips).
    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }
}
