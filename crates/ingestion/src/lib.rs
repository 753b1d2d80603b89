//! # Ingestion
//!
//! Synthetic reading generation.
//!
//! Responsibilities:
//! - Produce one `TelemetrySample` per tick (bounded random draw above fixed baselines)
//! - Allocate message ids from the run's `SessionState`
//!
//! ## Usage Example
//!
//! ```
//! use contracts::SessionState;
//! use ingestion::ReadingGenerator;
//!
//! let mut generator = ReadingGenerator::seeded("dev-1", 20.0, 60.0, 42);
//! let mut session = SessionState::new();
//! let sample = generator.next_sample(&mut session);
//! assert_eq!(sample.message_id, 0);
//! ```

mod generator;

pub use contracts::TelemetrySample;
pub use generator::{ReadingGenerator, HUMIDITY_SPAN, TEMPERATURE_SPAN};
