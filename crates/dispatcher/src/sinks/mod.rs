//! Sink implementations
//!
//! Contains RealtimeSink and BatchSink.

mod batch;
mod buffer;
mod realtime;

pub use self::batch::BatchSink;
pub use self::buffer::{BatchBuffer, FileNamer};
pub use self::realtime::RealtimeSink;
