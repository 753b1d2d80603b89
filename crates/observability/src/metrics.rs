//! 模拟器指标收集模块
//!
//! 记录样本生成、消息发送、批量上传与故障恢复的运行指标，
//! 以及 `telemetry` target 上的追踪记录。

use contracts::TelemetrySample;
use metrics::{counter, gauge, histogram};

/// 追踪记录使用的 tracing target
pub const TELEMETRY_TARGET: &str = "telemetry";

/// 记录一个生成的样本
///
/// 每次生成 TelemetrySample 时调用。
///
/// # Example
///
/// ```ignore
/// let sample = generator.next_sample(&mut session);
/// observability::metrics::record_sample_generated(&sample);
/// ```
pub fn record_sample_generated(sample: &TelemetrySample) {
    counter!("iot_sim_samples_generated_total").increment(1);

    // 当前消息 ID (用于观察回绕/重置)
    gauge!("iot_sim_message_id").set(sample.message_id as f64);

    histogram!("iot_sim_temperature_celsius").record(sample.temperature);
    histogram!("iot_sim_humidity_percent").record(sample.humidity);
}

/// 记录一次消息投递
pub fn record_message_sent(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "iot_sim_messages_sent_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录一次批量上传
pub fn record_batch_flushed(samples: u64, bytes: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("iot_sim_batch_flushes_total", "status" => status.to_string()).increment(1);

    if success {
        counter!("iot_sim_blob_bytes_total").increment(bytes as u64);
        histogram!("iot_sim_batch_samples").record(samples as f64);
    }
}

/// 记录一次故障恢复
pub fn record_recovery() {
    counter!("iot_sim_recoveries_total").increment(1);
}

/// 发送追踪消息 (镜像本地日志)
pub fn trace_message(message: &str) {
    counter!("iot_sim_trace_messages_total").increment(1);
    tracing::info!(target: TELEMETRY_TARGET, "{message}");
}

/// 发送异常记录
pub fn trace_exception(error: &(dyn std::error::Error + 'static)) {
    counter!("iot_sim_exceptions_total").increment(1);
    tracing::error!(
        target: TELEMETRY_TARGET,
        error = %error,
        chain = %error_chain(error),
        "Exception recorded"
    );
}

/// 错误及其 source 链 (`a: b: c`)
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

/// 会话指标聚合器
///
/// 在内存中聚合指标，运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 生成样本数
    pub total_samples: u64,

    /// 成功投递数
    pub delivered: u64,

    /// 故障恢复次数
    pub recoveries: u64,

    /// 超过告警阈值的样本数
    pub temperature_alerts: u64,

    /// 最大消息 ID
    pub max_message_id: u64,

    /// 温度统计
    pub temperature_stats: RunningStats,

    /// 湿度统计
    pub humidity_stats: RunningStats,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新样本统计
    pub fn record_sample(&mut self, sample: &TelemetrySample, alert_threshold: f64) {
        self.total_samples += 1;
        self.max_message_id = self.max_message_id.max(sample.message_id);

        if sample.is_temperature_alert(alert_threshold) {
            self.temperature_alerts += 1;
        }

        self.temperature_stats.push(sample.temperature);
        self.humidity_stats.push(sample.humidity);
    }

    /// 记录成功投递
    pub fn record_delivered(&mut self) {
        self.delivered += 1;
    }

    /// 记录故障恢复
    pub fn record_recovery(&mut self) {
        self.recoveries += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_samples: self.total_samples,
            delivered: self.delivered,
            recoveries: self.recoveries,
            temperature_alerts: self.temperature_alerts,
            alert_rate: if self.total_samples > 0 {
                self.temperature_alerts as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            },
            max_message_id: self.max_message_id,
            temperature: StatsSummary::from(&self.temperature_stats),
            humidity: StatsSummary::from(&self.humidity_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 会话摘要
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_samples: u64,
    pub delivered: u64,
    pub recoveries: u64,
    pub temperature_alerts: u64,
    pub alert_rate: f64,
    pub max_message_id: u64,
    pub temperature: StatsSummary,
    pub humidity: StatsSummary,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Metrics Summary ===")?;
        writeln!(f, "Samples generated: {}", self.total_samples)?;
        writeln!(f, "Samples delivered: {}", self.delivered)?;
        writeln!(f, "Recoveries: {}", self.recoveries)?;
        writeln!(
            f,
            "Temperature alerts: {} ({:.2}%)",
            self.temperature_alerts, self.alert_rate
        )?;
        writeln!(f, "Highest message id: {}", self.max_message_id)?;
        writeln!(f, "Temperature (C): {}", self.temperature)?;
        writeln!(f, "Humidity (%): {}", self.humidity)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
