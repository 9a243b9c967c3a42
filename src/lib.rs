//! Metropolis simulation of the 1D Ising chain with rolling-window
//! correlation statistics.

pub mod chain;
pub mod config;
pub mod controller;
pub mod correlation;
pub mod error;
pub mod observables;
pub mod schedule;

pub use chain::{Boundary, InitialState, SpinChain, SpinSystem, StepInfo};
pub use config::SimConfig;
pub use controller::SimulationController;
pub use error::{Result, SimError};
pub use observables::Frame;
pub use schedule::{Schedule, Stage, TimeUnit};
