//! Tracking context: continuous immobility duration.

pub mod immobility;

pub use immobility::{ImmobilitySource, ImmobilityTimer, ImmobilityUpdate};
