use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A numeric field of a metric point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Decimal(Decimal),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Decimal(value) => write!(f, "{value}"),
            FieldValue::Integer(value) => write!(f, "{value}i"),
        }
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

/// One measurement written to the metrics sink.
///
/// Tags and fields are kept sorted so that serialized output is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub measurement: String,
    pub timestamp: DateTime<Utc>,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl MetricPoint {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            timestamp,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_keeps_keys_sorted() {
        let point = MetricPoint::new("uniswapv2", Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap())
            .with_tag("strategy", "hold")
            .with_tag("size", "1M")
            .with_field("value", dec!(1.5))
            .with_field("cost", dec!(0.25))
            .with_field("rehedges", 3u32);

        let tags: Vec<_> = point.tags.keys().cloned().collect();
        assert_eq!(tags, vec!["size", "strategy"]);
        let fields: Vec<_> = point.fields.keys().cloned().collect();
        assert_eq!(fields, vec!["cost", "rehedges", "value"]);
        assert_eq!(point.tag("strategy"), Some("hold"));
        assert_eq!(point.field("rehedges"), Some(FieldValue::Integer(3)));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(FieldValue::Decimal(dec!(-12.5)).to_string(), "-12.5");
        assert_eq!(FieldValue::Integer(7).to_string(), "7i");
    }
}
