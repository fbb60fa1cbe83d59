//! Task runner adapters.

pub mod simulated;

pub use simulated::{SimulatedResponse, SimulatedRunner};
