// chain.rs - 1D Ising chain with single-spin-flip Metropolis dynamics

use crate::error::{check_temperature, Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the two ends of the chain see each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Ring topology: site 0 and site L-1 are neighbours.
    #[default]
    Periodic,
    /// Free ends: site 0 and site L-1 have a single neighbour each.
    Open,
}

impl FromStr for Boundary {
    type Err = SimError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "periodic" => Ok(Self::Periodic),
            "open" => Ok(Self::Open),
            _ => Err(SimError::config(format!(
                "unknown boundary '{s}', expected 'periodic' or 'open'"
            ))),
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Periodic => "periodic",
            Self::Open => "open",
        })
    }
}

/// Starting configuration of a freshly built chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialState {
    /// Every spin independently +1 or -1 with probability 1/2.
    Random,
    /// Every spin +1.
    #[default]
    Uniform,
}

impl FromStr for InitialState {
    type Err = SimError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Self::Random),
            "uniform" => Ok(Self::Uniform),
            _ => Err(SimError::config(format!(
                "unknown initial state '{s}', expected 'random' or 'uniform'"
            ))),
        }
    }
}

impl fmt::Display for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::Uniform => "uniform",
        })
    }
}

/// Returned by `step`, lets the driver keep running sums without rescanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    pub site: usize,
    pub accepted: bool,
    pub proposed_delta: f64, // ΔE of the proposed flip, accepted or not
}

impl StepInfo {
    /// Change in total energy actually applied (0 if rejected).
    pub fn delta_energy(&self) -> f64 {
        if self.accepted { self.proposed_delta } else { 0.0 }
    }
}

/// Anything the controller can drive through a temperature schedule.
///
/// `SpinChain` is the real implementation; the trait exists so tests can
/// substitute an instrumented double.
pub trait SpinSystem {
    fn spins(&self) -> &[i8];

    fn boundary(&self) -> Boundary;

    /// One Metropolis trial at `temperature`.
    fn step<R: Rng>(&mut self, temperature: f64, rng: &mut R) -> Result<StepInfo>;

    fn total_energy(&self) -> f64;

    fn set_spin(&mut self, site: usize, value: i8) -> Result<()>;

    /// Restore the configuration the system was built with.
    fn reset(&mut self);

    /// Mean spin, in [-1, 1].
    fn magnetization(&self) -> f64 {
        let spins = self.spins();
        spins.iter().map(|&s| s as f64).sum::<f64>() / spins.len() as f64
    }
}

/// A chain of ±1 spins with nearest-neighbour coupling and local fields.
///
/// Energy convention: `E = J Σ_<ij> s_i s_j + Σ_i h_i s_i`, so `J < 0` is
/// ferromagnetic and `J > 0` antiferromagnetic. A bond never joins a site
/// to itself, which makes a periodic chain of length 1 bond-free.
#[derive(Debug, Clone)]
pub struct SpinChain {
    spins: Vec<i8>,
    coupling: f64,
    local_fields: Vec<f64>,
    boundary: Boundary,
    initial: Vec<i8>,
}

fn check_spin(value: i8) -> Result<()> {
    if value == 1 || value == -1 {
        Ok(())
    } else {
        Err(SimError::config(format!("spins must be 1 or -1, got {value}")))
    }
}

fn check_field(h: f64) -> Result<()> {
    if h.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!("local field must be finite, got {h}")))
    }
}

impl SpinChain {
    /// Build a chain of `length` spins with coupling `coupling`, drawing the
    /// random configuration (if requested) from the caller's RNG.
    pub fn new(
        length: usize,
        coupling: f64,
        initial: InitialState,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if length < 1 {
            return Err(SimError::config("chain length must be >= 1"));
        }
        let spins = match initial {
            InitialState::Uniform => vec![1; length],
            InitialState::Random => (0..length)
                .map(|_| if rng.gen_bool(0.5) { 1 } else { -1 })
                .collect(),
        };
        Self::from_spins(spins, coupling)
    }

    /// Build a chain from an explicit configuration.
    pub fn from_spins(spins: Vec<i8>, coupling: f64) -> Result<Self> {
        if spins.is_empty() {
            return Err(SimError::config("chain length must be >= 1"));
        }
        if !coupling.is_finite() {
            return Err(SimError::config(format!("coupling must be finite, got {coupling}")));
        }
        for &s in &spins {
            check_spin(s)?;
        }
        Ok(Self {
            local_fields: vec![0.0; spins.len()],
            initial: spins.clone(),
            spins,
            coupling,
            boundary: Boundary::Periodic,
        })
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Replace all local fields at once; `fields.len()` must match the chain.
    pub fn with_local_fields(mut self, fields: Vec<f64>) -> Result<Self> {
        if fields.len() != self.len() {
            return Err(SimError::config(format!(
                "expected {} local fields, got {}",
                self.len(),
                fields.len()
            )));
        }
        for &h in &fields {
            check_field(h)?;
        }
        self.local_fields = fields;
        Ok(self)
    }

    /// Number of spins.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.spins.len()
    }

    /// Always false for a constructed chain.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn local_fields(&self) -> &[f64] {
        &self.local_fields
    }

    fn check_site(&self, site: usize) -> Result<()> {
        if site < self.len() {
            Ok(())
        } else {
            Err(SimError::IndexOutOfRange { site, len: self.len() })
        }
    }

    /// Left and right neighbours of `site`; `None` at an open end or where
    /// the neighbour would be the site itself.
    pub fn neighbours(&self, site: usize) -> [Option<usize>; 2] {
        let n = self.len();
        let (left, right) = match self.boundary {
            Boundary::Periodic => (Some((site + n - 1) % n), Some((site + 1) % n)),
            Boundary::Open => (site.checked_sub(1), (site + 1 < n).then_some(site + 1)),
        };
        [left.filter(|&j| j != site), right.filter(|&j| j != site)]
    }

    #[inline]
    fn delta_at(&self, site: usize) -> f64 {
        let s = self.spins[site] as f64;
        let neighbour_sum: f64 = self
            .neighbours(site)
            .iter()
            .flatten()
            .map(|&j| self.spins[j] as f64)
            .sum();
        -2.0 * s * (self.coupling * neighbour_sum + self.local_fields[site])
    }

    /// Change in total energy if the spin at `site` were flipped. Pure.
    pub fn energy_delta(&self, site: usize) -> Result<f64> {
        self.check_site(site)?;
        Ok(self.delta_at(site))
    }

    /// Flip one spin unconditionally.
    pub fn flip(&mut self, site: usize) -> Result<()> {
        self.check_site(site)?;
        self.spins[site] = -self.spins[site];
        Ok(())
    }

    pub fn set_local_field(&mut self, site: usize, field: f64) -> Result<()> {
        self.check_site(site)?;
        check_field(field)?;
        self.local_fields[site] = field;
        Ok(())
    }

    /// Σ J s_i s_{i+1} over every bond, each bond counted once.
    fn bond_energy(&self) -> f64 {
        (0..self.len())
            .filter_map(|i| self.neighbours(i)[1].map(|j| (i, j)))
            .map(|(i, j)| self.coupling * (self.spins[i] * self.spins[j]) as f64)
            .sum()
    }

    fn field_energy(&self) -> f64 {
        self.spins
            .iter()
            .zip(&self.local_fields)
            .map(|(&s, &h)| h * s as f64)
            .sum()
    }
}

impl SpinSystem for SpinChain {
    fn spins(&self) -> &[i8] {
        &self.spins
    }

    fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Pick a site uniformly, accept if ΔE <= 0, otherwise with probability
    /// `exp(-ΔE / T)`. Exactly one trial per call.
    fn step<R: Rng>(&mut self, temperature: f64, rng: &mut R) -> Result<StepInfo> {
        check_temperature(temperature)?;
        let site = rng.gen_range(0..self.len());
        let delta = self.delta_at(site);
        let accepted = if delta <= 0.0 {
            true
        } else {
            rng.gen::<f64>() < (-delta / temperature).exp()
        };
        if accepted {
            self.spins[site] = -self.spins[site];
        }
        Ok(StepInfo { site, accepted, proposed_delta: delta })
    }

    fn total_energy(&self) -> f64 {
        self.bond_energy() + self.field_energy()
    }

    fn set_spin(&mut self, site: usize, value: i8) -> Result<()> {
        self.check_site(site)?;
        check_spin(value)?;
        self.spins[site] = value;
        Ok(())
    }

    fn reset(&mut self) {
        self.spins.clone_from(&self.initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours_periodic_wrap() {
        let chain = SpinChain::from_spins(vec![1; 5], -1.0).unwrap();
        assert_eq!(chain.neighbours(0), [Some(4), Some(1)]);
        assert_eq!(chain.neighbours(4), [Some(3), Some(0)]);
    }

    #[test]
    fn test_neighbours_open_ends() {
        let chain = SpinChain::from_spins(vec![1; 5], -1.0)
            .unwrap()
            .with_boundary(Boundary::Open);
        assert_eq!(chain.neighbours(0), [None, Some(1)]);
        assert_eq!(chain.neighbours(4), [Some(3), None]);
    }

    #[test]
    fn test_single_site_has_no_bonds() {
        let chain = SpinChain::from_spins(vec![1], -1.0).unwrap();
        assert_eq!(chain.neighbours(0), [None, None]);
        assert_eq!(chain.total_energy(), 0.0);
        assert_eq!(chain.energy_delta(0).unwrap(), 0.0);
    }

    #[test]
    fn test_uniform_ferromagnet_energy() {
        // Ring of 6 aligned spins, J = -1: six bonds at -1 each.
        let chain = SpinChain::from_spins(vec![1; 6], -1.0).unwrap();
        assert!((chain.total_energy() + 6.0).abs() < 1e-12);
        // Flipping one spin breaks two bonds: ΔE = +4.
        assert!((chain.energy_delta(2).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("open".parse::<Boundary>().unwrap(), Boundary::Open);
        assert_eq!("random".parse::<InitialState>().unwrap(), InitialState::Random);
        assert!("ring".parse::<Boundary>().is_err());
        assert!("mixed".parse::<InitialState>().is_err());
    }
}
