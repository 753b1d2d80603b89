//! # Dispatcher
//!
//! 遥测投递模块。
//!
//! 负责：
//! - Realtime: 每个样本立即发送到 IoT Hub
//! - Batch: 按批缓冲为 JSON Lines 文件，满批后上传 blob 并通知完成
//! - 根据 `DeliveryMode` 一次性选定 sink

pub mod delivery;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{DeliveryMode, TelemetrySink};
pub use delivery::{create_sink, DeliverySink};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{BatchBuffer, BatchSink, FileNamer, RealtimeSink};
