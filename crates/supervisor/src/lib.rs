//! # Supervisor
//!
//! 运行循环与故障恢复。
//!
//! 负责：
//! - 每个周期生成一个样本并交给 `TelemetrySink`
//! - 成功后按固定间隔节流
//! - 失败时记录错误、暂停、重置计数器，然后继续 (由 `RetryPolicy` 决定)
//!
//! ## 使用示例
//!
//! ```ignore
//! use supervisor::{FixedDelay, Simulator, SimulatorConfig};
//!
//! let mut simulator = Simulator::new(generator, sink, FixedDelay::default(), SimulatorConfig::default());
//! simulator.open().await?;
//! simulator.run(None).await?;
//! ```

mod error;
mod policy;
mod simulator;

pub use error::SupervisorError;
pub use policy::{FixedDelay, RetryPolicy};
pub use simulator::{LoopState, Simulator, SimulatorConfig, StepOutcome};
