//! Batch identifiers scoping one end-to-end pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

/// Identifier shared by every row written during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(i64);

impl BatchId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(BatchId)
            .map_err(|e| format!("Invalid batch ID '{}': {}", s, e))
    }
}

impl From<i64> for BatchId {
    fn from(v: i64) -> Self {
        BatchId(v)
    }
}

/// Hands out time-derived batch ids (Unix seconds) that never repeat within a process.
///
/// Two runs started in the same second get consecutive ids instead of sharing one.
#[derive(Debug, Default)]
pub struct BatchIdGenerator {
    last: AtomicI64,
}

impl BatchIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> BatchId {
        self.next_at(chrono::Utc::now().timestamp())
    }

    fn next_at(&self, now_secs: i64) -> BatchId {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_secs.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return BatchId(candidate),
                Err(observed) => current = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_clock() {
        let gen = BatchIdGenerator::new();
        assert_eq!(gen.next_at(1_700_000_000).as_i64(), 1_700_000_000);
        assert_eq!(gen.next_at(1_700_000_005).as_i64(), 1_700_000_005);
    }

    #[test]
    fn test_same_second_ids_are_distinct() {
        let gen = BatchIdGenerator::new();
        let a = gen.next_at(1_700_000_000);
        let b = gen.next_at(1_700_000_000);
        let c = gen.next_at(1_699_999_999);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_parse_and_serde() {
        let id: BatchId = "42".parse().unwrap();
        assert_eq!(id, BatchId::new(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert!("abc".parse::<BatchId>().is_err());
    }
}
