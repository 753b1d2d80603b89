//! Batch buffer and file naming

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};

/// Extension of every batch file
pub const BATCH_FILE_EXTENSION: &str = ".jsonl";

/// Timestamp layout: `yyyyMMddHHmmssfff`
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Generates batch file names `{prefix}{yyyyMMddHHmmssfff}.jsonl` (UTC)
///
/// Names requested within the same millisecond get a `-N` suffix, so
/// consecutive names always differ.
#[derive(Debug, Clone)]
pub struct FileNamer {
    prefix: String,
    last_stamp: Option<String>,
    collisions: u32,
}

impl FileNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_stamp: None,
            collisions: 0,
        }
    }

    /// Name for a file started now
    pub fn next_name(&mut self) -> String {
        self.name_at(Utc::now())
    }

    /// Name for a file started at `now`
    pub fn name_at(&mut self, now: DateTime<Utc>) -> String {
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();

        if self.last_stamp.as_deref() == Some(stamp.as_str()) {
            self.collisions += 1;
            return format!(
                "{}{}-{}{}",
                self.prefix, stamp, self.collisions, BATCH_FILE_EXTENSION
            );
        }

        self.collisions = 0;
        let name = format!("{}{}{}", self.prefix, stamp, BATCH_FILE_EXTENSION);
        self.last_stamp = Some(stamp);
        name
    }
}

/// Append-only newline-delimited buffer bound to one file name
#[derive(Debug, Clone)]
pub struct BatchBuffer {
    file_name: String,
    data: BytesMut,
    samples: u64,
}

impl BatchBuffer {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            data: BytesMut::new(),
            samples: 0,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Append one serialized sample followed by `\n`
    pub fn append(&mut self, line: &str) {
        self.data.extend_from_slice(line.as_bytes());
        self.data.extend_from_slice(b"\n");
        self.samples += 1;
    }

    /// Number of samples appended
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Buffered size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffered content (cheap to clone)
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    /// Buffered lines (without trailing newlines)
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::str::from_utf8(&self.data)
            .unwrap_or_default()
            .lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_name_format() {
        let mut namer = FileNamer::new("telemetry-");
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(namer.name_at(now), "telemetry-20240305070809042.jsonl");
    }

    #[test]
    fn test_same_millisecond_gets_suffix() {
        let mut namer = FileNamer::new("t-");
        let first = namer.name_at(at(1_700_000_000_123));
        let second = namer.name_at(at(1_700_000_000_123));
        let third = namer.name_at(at(1_700_000_000_123));
        let later = namer.name_at(at(1_700_000_000_124));

        assert_eq!(first, "t-20231114221320123.jsonl");
        assert_eq!(second, "t-20231114221320123-1.jsonl");
        assert_eq!(third, "t-20231114221320123-2.jsonl");
        assert_eq!(later, "t-20231114221320124.jsonl");
    }

    #[test]
    fn test_buffer_appends_lines_in_order() {
        let mut buffer = BatchBuffer::new("f.jsonl");
        assert!(buffer.is_empty());

        buffer.append(r#"{"messageId":0}"#);
        buffer.append(r#"{"messageId":1}"#);

        assert_eq!(buffer.samples(), 2);
        assert_eq!(
            buffer.lines().collect::<Vec<_>>(),
            vec![r#"{"messageId":0}"#, r#"{"messageId":1}"#]
        );
        assert_eq!(
            buffer.into_bytes(),
            Bytes::from_static(b"{\"messageId\":0}\n{\"messageId\":1}\n")
        );
    }
}
