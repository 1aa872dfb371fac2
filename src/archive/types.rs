// src/archive/types.rs
//! Decoded in-memory form of the staking event archive

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One event as it sits in the archive: a positional tuple of mixed JSON values
pub type RawEvent = Vec<Value>;

/// The whole archive after decompression and JSON decoding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventArchive {
    /// Wallet -> address record. Kept undecoded so one bad record can't poison the archive.
    #[serde(default)]
    pub addresses: HashMap<String, Value>,
    /// Chronologically sorted events for every wallet, interleaved
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub meta: ArchiveMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArchiveMeta {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub total_wallets: Option<u64>,
    #[serde(default)]
    pub total_events: Option<u64>,
}

/// Cumulative totals published for a wallet, in archive order
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentTotals {
    pub staked: f64,
    pub unstaked: f64,
    pub withdrawn: f64,
    pub compounded: f64,
    pub total_rewards: f64,
}

/// Per-wallet entry of `addresses`
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub first_event: Option<usize>,
    pub last_event: Option<usize>,
    pub current: Option<CurrentTotals>,
}

impl AddressRecord {
    /// Decode a record, `None` when it isn't an object or its fields have the wrong shape
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let index = |key: &str| -> Option<Option<usize>> {
            match obj.get(key) {
                None | Some(Value::Null) => Some(None),
                Some(v) => v.as_u64().map(|n| Some(n as usize)),
            }
        };
        let first_event = index("first_event")?;
        let last_event = index("last_event")?;

        let current = match obj.get("current") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => {
                let nums: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
                let nums = nums?;
                if nums.len() < 5 {
                    return None;
                }
                Some(CurrentTotals {
                    staked: nums[0],
                    unstaked: nums[1],
                    withdrawn: nums[2],
                    compounded: nums[3],
                    total_rewards: nums[4],
                })
            }
            Some(_) => return None,
        };

        Some(Self {
            first_event,
            last_event,
            current,
        })
    }

    /// The slice of `events` this record points at, clamped to `len`.
    /// `None` when the record carries no usable range.
    pub fn event_window(&self, len: usize) -> Option<std::ops::Range<usize>> {
        let first = self.first_event?;
        let last = self.last_event.unwrap_or(len.saturating_sub(1));
        if first > last || first >= len {
            return None;
        }
        Some(first..last.min(len - 1) + 1)
    }
}

impl EventArchive {
    pub fn record(&self, address: &str) -> Option<&Value> {
        self.addresses.get(address)
    }

    /// Start of coverage, if `meta.start` parses
    pub fn coverage_start(&self) -> Option<DateTime<Utc>> {
        parse_coverage_instant(&self.meta.start, NaiveTime::MIN)
    }

    /// End of coverage, if `meta.end` parses. Bare dates cover the whole day.
    pub fn coverage_end(&self) -> Option<DateTime<Utc>> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        parse_coverage_instant(&self.meta.end, end_of_day)
    }

    /// Compare meta counts with what was actually decoded, and check the coverage range
    pub fn check_meta(&self) -> bool {
        let mut consistent = true;
        if let (Some(start), Some(end)) = (self.coverage_start(), self.coverage_end()) {
            if start > end {
                log::warn!(
                    "Archive coverage starts ({}) after it ends ({})",
                    self.meta.start,
                    self.meta.end
                );
                consistent = false;
            }
        }
        if let Some(total) = self.meta.total_events {
            if total as usize != self.events.len() {
                log::warn!(
                    "Archive meta reports {} events but {} were decoded",
                    total,
                    self.events.len()
                );
                consistent = false;
            }
        }
        if let Some(total) = self.meta.total_wallets {
            if total as usize != self.addresses.len() {
                log::warn!(
                    "Archive meta reports {} wallets but {} were decoded",
                    total,
                    self.addresses.len()
                );
                consistent = false;
            }
        }
        consistent
    }
}

/// Parse an RFC 3339 instant, falling back to `YYYY-MM-DD` at `time_of_day` UTC
pub fn parse_coverage_instant(raw: &str, time_of_day: NaiveTime) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(time_of_day).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_decodes_full_shape() {
        let record = AddressRecord::from_value(&json!({
            "first_event": 3,
            "last_event": 9,
            "current": [10.5, 1.0, 2.0, 0.25, 0.75]
        }))
        .unwrap();
        assert_eq!(record.first_event, Some(3));
        assert_eq!(record.last_event, Some(9));
        let current = record.current.unwrap();
        assert_eq!(current.staked, 10.5);
        assert_eq!(current.total_rewards, 0.75);
    }

    #[test]
    fn test_record_rejects_bad_shapes() {
        assert!(AddressRecord::from_value(&json!("nope")).is_none());
        assert!(AddressRecord::from_value(&json!({"first_event": "a"})).is_none());
        assert!(AddressRecord::from_value(&json!({"current": [1, 2]})).is_none());
        assert!(AddressRecord::from_value(&json!({"current": {"staked": 1}})).is_none());
    }

    #[test]
    fn test_event_window_clamps() {
        let record = AddressRecord {
            first_event: Some(2),
            last_event: Some(50),
            current: None,
        };
        assert_eq!(record.event_window(10), Some(2..10));

        let empty = AddressRecord {
            first_event: None,
            last_event: Some(4),
            current: None,
        };
        assert_eq!(empty.event_window(10), None);

        let past_end = AddressRecord {
            first_event: Some(12),
            last_event: Some(14),
            current: None,
        };
        assert_eq!(past_end.event_window(10), None);
    }

    #[test]
    fn test_coverage_dates() {
        let archive = EventArchive {
            meta: ArchiveMeta {
                start: "2024-01-01".to_string(),
                end: "2024-03-31".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            archive.coverage_start().unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(
            archive.coverage_end().unwrap().to_rfc3339(),
            "2024-03-31T23:59:59+00:00"
        );

        let instant = parse_coverage_instant("2024-02-01T12:00:00Z", NaiveTime::MIN).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-02-01T12:00:00+00:00");
        assert!(parse_coverage_instant("yesterday", NaiveTime::MIN).is_none());
    }

    #[test]
    fn test_check_meta_flags_mismatch() {
        let mut archive = EventArchive::default();
        archive.meta.total_events = Some(2);
        assert!(!archive.check_meta());
        archive.meta.total_events = Some(0);
        archive.meta.total_wallets = Some(0);
        assert!(archive.check_meta());
    }

    #[test]
    fn test_check_meta_flags_inverted_coverage() {
        let mut archive = EventArchive::default();
        archive.meta.start = "2024-03-01".to_string();
        archive.meta.end = "2024-02-01".to_string();
        assert!(!archive.check_meta());

        // Same bare date: start of day is before end of day
        archive.meta.end = "2024-03-01".to_string();
        assert!(archive.check_meta());
    }
}
