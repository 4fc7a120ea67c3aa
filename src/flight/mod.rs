//! Single-flight call coalescing
//!
//! Collapses concurrent calls to an expensive async operation into one
//! in-flight execution whose outcome every caller receives.

pub mod coordinator;
pub mod events;
pub mod options;
pub mod producer;
pub mod state;
pub mod stats;

pub use coordinator::SingleFlight;
pub use events::FlightEvent;
pub use options::FlightOptions;
pub use producer::Producer;
pub use state::{OutcomeKind, Phase};
pub use stats::FlightStats;
