//! CSV snapshot feed.
//!
//! Expects a header row naming `time`, `reserve0`, `reserve1`, `volume0` and
//! `volume1`. Times are RFC 3339; quantities are raw integers encoded as
//! big-endian hex, with or without a `0x` prefix.

use amm_hedge_domain::market::MarketSnapshot;
use amm_hedge_domain::ports::FeedError;
use chrono::{DateTime, Utc};
use csv::{Reader, ReaderBuilder, StringRecord};
use primitive_types::U256;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const COLUMNS: [&str; 5] = ["time", "reserve0", "reserve1", "volume0", "volume1"];

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    time: String,
    reserve0: String,
    reserve1: String,
    volume0: String,
    volume1: String,
}

fn schema(line: u64, field: &str, reason: impl Into<String>) -> FeedError {
    FeedError::Schema {
        line,
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Decodes a big-endian hex string into a `U256`.
pub fn parse_hex_u256(value: &str) -> Result<U256, String> {
    let digits = value.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.is_empty() {
        return Err("is empty".to_string());
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| format!("is not hex: {e}"))?;
    if bytes.len() > 32 {
        return Err(format!("has {} bytes, more than 256 bits", bytes.len()));
    }
    Ok(U256::from_big_endian(&bytes))
}

fn parse_record(line: u64, record: &SnapshotRecord) -> Result<MarketSnapshot, FeedError> {
    let timestamp = DateTime::parse_from_rfc3339(record.time.trim())
        .map_err(|e| schema(line, "time", format!("is not RFC 3339: {e}")))?
        .with_timezone(&Utc);
    let quantity =
        |field: &str, value: &str| parse_hex_u256(value).map_err(|reason| schema(line, field, reason));

    Ok(MarketSnapshot::new(
        timestamp,
        quantity("reserve0", &record.reserve0)?,
        quantity("reserve1", &record.reserve1)?,
        quantity("volume0", &record.volume0)?,
        quantity("volume1", &record.volume1)?,
    ))
}

/// Streaming reader of market snapshots, optionally restricted to a time
/// window.
pub struct SnapshotReader<R: Read> {
    reader: Reader<R>,
    headers: StringRecord,
    record: StringRecord,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    finished: bool,
}

impl SnapshotReader<File> {
    /// Opens a snapshot CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FeedError::Read(format!("could not open {}: {e}", path.display())))?;
        Self::new(file)
    }
}

impl<R: Read> SnapshotReader<R> {
    /// Reads and checks the header row.
    pub fn new(source: R) -> Result<Self, FeedError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);
        let headers = reader
            .headers()
            .map_err(|e| FeedError::Read(e.to_string()))?
            .clone();
        if let Some(missing) = COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|h| h == **column))
        {
            return Err(schema(1, missing, "column is missing"));
        }
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            start: None,
            end: None,
            finished: false,
        })
    }

    /// Skips snapshots before `start` and stops after `end`, both inclusive.
    #[must_use]
    pub fn with_bounds(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

impl<R: Read> Iterator for SnapshotReader<R> {
    type Item = Result<MarketSnapshot, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {
                    let line = self.record.position().map_or(0, |p| p.line());
                    let parsed = self
                        .record
                        .deserialize::<SnapshotRecord>(Some(&self.headers))
                        .map_err(|e| schema(line, "record", e.to_string()))
                        .and_then(|record| parse_record(line, &record));
                    let snapshot = match parsed {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            self.finished = true;
                            return Some(Err(e));
                        }
                    };
                    if self.start.is_some_and(|start| snapshot.timestamp < start) {
                        debug!(line, timestamp = %snapshot.timestamp, "skipping snapshot before start");
                        continue;
                    }
                    if self.end.is_some_and(|end| snapshot.timestamp > end) {
                        self.finished = true;
                        return None;
                    }
                    return Some(Ok(snapshot));
                }
                Ok(false) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(FeedError::Read(e.to_string())));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::{Cursor, Write};

    const HEADER: &str = "time,reserve0,reserve1,volume0,volume1\n";

    fn reader(body: &str) -> SnapshotReader<Cursor<Vec<u8>>> {
        SnapshotReader::new(Cursor::new(format!("{HEADER}{body}").into_bytes())).unwrap()
    }

    #[test]
    fn test_parse_hex_u256() {
        assert_eq!(parse_hex_u256("0x01e8480").unwrap(), U256::from(2_000_000u64));
        assert_eq!(parse_hex_u256("f4240").unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_hex_u256("00").unwrap(), U256::zero());
        assert!(parse_hex_u256("").is_err());
        assert!(parse_hex_u256("zz").is_err());
        assert!(parse_hex_u256(&"ff".repeat(33)).is_err());
    }

    #[test]
    fn test_reads_snapshots() {
        let body = "2021-10-07T00:00:00Z,1d1a94a2000,3635c9adc5dea00000,0,0\n\
                    2021-10-07T01:00:00Z,0x1d1a94a2000,0x3635c9adc5dea00000,0x3b9aca00,0xde0b6b3a7640000\n";
        let snapshots: Vec<_> = reader(body).collect::<Result<_, _>>().unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].reserve0, U256::from(2_000_000_000_000u64));
        assert_eq!(snapshots[0].reserve1, U256::exp10(21));
        assert_eq!(snapshots[1].volume0, U256::from(1_000_000_000u64));
        assert_eq!(snapshots[1].volume1, U256::exp10(18));
        assert_eq!(
            snapshots[1].timestamp,
            Utc.with_ymd_and_hms(2021, 10, 7, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bounds() {
        let body = "2021-10-07T00:00:00Z,1,1,0,0\n\
                    2021-10-07T01:00:00Z,2,2,0,0\n\
                    2021-10-07T02:00:00Z,3,3,0,0\n\
                    2021-10-07T03:00:00Z,4,4,0,0\n";
        let snapshots: Vec<_> = reader(body)
            .with_bounds(
                Some(Utc.with_ymd_and_hms(2021, 10, 7, 1, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2021, 10, 7, 2, 0, 0).unwrap()),
            )
            .collect::<Result<_, _>>()
            .unwrap();

        let reserves: Vec<_> = snapshots.iter().map(|s| s.reserve0.as_u64()).collect();
        assert_eq!(reserves, vec![2, 3]);
    }

    #[test]
    fn test_bad_value_is_schema_error() {
        let body = "2021-10-07T00:00:00Z,1,1,0,0\n2021-10-07T01:00:00Z,1,xyz,0,0\n";
        let mut feed = reader(body);
        assert!(feed.next().unwrap().is_ok());
        match feed.next().unwrap() {
            Err(FeedError::Schema { line, field, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(field, "reserve1");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(feed.next().is_none());
    }

    #[test]
    fn test_bad_time_is_schema_error() {
        let mut feed = reader("yesterday,1,1,0,0\n");
        assert!(matches!(
            feed.next(),
            Some(Err(FeedError::Schema { ref field, .. })) if field == "time"
        ));
    }

    #[test]
    fn test_missing_column() {
        let source = Cursor::new(b"time,reserve0,reserve1,volume0\n".to_vec());
        match SnapshotReader::new(source) {
            Err(FeedError::Schema { field, .. }) => assert_eq!(field, "volume1"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("missing column accepted"),
        }
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        assert!(reader("").next().is_none());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}2022-01-01T00:00:00+00:00,a,b,c,d").unwrap();

        let snapshots: Vec<_> = SnapshotReader::from_path(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].volume1, U256::from(13u64));
    }
}
