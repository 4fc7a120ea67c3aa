//! singleflight - call coalescing for async producers
//!
//! Wraps an expensive asynchronous operation so that concurrent callers share
//! a single in-flight execution and all observe its outcome.
//!
//! ```no_run
//! use singleflight::SingleFlight;
//!
//! # async fn demo() {
//! let flight: SingleFlight<(), String, String> =
//!     SingleFlight::new(|_: ()| async { Ok::<_, String>("token".to_string()) });
//! let (a, b) = tokio::join!(flight.handle(()), flight.handle(()));
//! assert_eq!(a, b);
//! # }
//! ```

pub mod demo;
pub mod error;
pub mod flight;

pub use error::{FlightError, Result};
pub use flight::{FlightEvent, FlightOptions, FlightStats, OutcomeKind, Phase, Producer, SingleFlight};
