//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! Leaf crate of the workspace: every other crate may depend on it, it depends on none of them.
//!
//! ## Counter Model
//! - `SessionState` owns the message-id counter for one run
//! - The counter wraps to 0 after `u64::MAX` and resets to 0 after a recovered failure

mod blueprint;
mod client;
mod connection;
mod error;
mod sample;
mod session;
mod sink;
mod upload;

pub use blueprint::*;
pub use client::{BlobStore, IngestionClient, LocalBlobStore, LocalIngestionClient};
pub use connection::ConnectionString;
pub use error::*;
pub use sample::*;
pub use session::SessionState;
pub use sink::*;
pub use upload::*;
