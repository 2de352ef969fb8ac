//! Resource limit identifiers and values

use serde::Serialize;
use std::fmt;

/// Kernel rlimit resource identifier.
///
/// The numeric value differs between operating systems, so a `LimitKind`
/// should only ever come from the constant table of the running OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LimitKind(i32);

impl LimitKind {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Soft and hard value of a single rlimit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RLimit {
    pub soft: u64,
    pub hard: u64,
}

impl RLimit {
    pub const fn new(soft: u64, hard: u64) -> Self {
        Self { soft, hard }
    }

    /// Same value for soft and hard
    pub const fn fixed(value: u64) -> Self {
        Self {
            soft: value,
            hard: value,
        }
    }
}

/// Outcome of a soft-limit lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceLimit {
    /// The lookup itself failed
    Unknown,
    /// No limit configured
    Unlimited,
    Limited(u64),
}

impl ResourceLimit {
    /// Classify a raw soft limit against the OS's infinity value
    pub fn from_raw(value: u64, infinity: u64) -> Self {
        if value == infinity {
            ResourceLimit::Unlimited
        } else {
            ResourceLimit::Limited(value)
        }
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            ResourceLimit::Limited(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, ResourceLimit::Unlimited)
    }
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLimit::Unknown => f.write_str("unknown"),
            ResourceLimit::Unlimited => f.write_str("unlimited"),
            ResourceLimit::Limited(v) => write!(f, "{}", v),
        }
    }
}

/// Limits the server cares about at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessLimits {
    pub max_threads: ResourceLimit,
    pub max_virtual_memory: ResourceLimit,
    pub max_file_size: ResourceLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_maps_to_unlimited() {
        assert_eq!(
            ResourceLimit::from_raw(u64::MAX, u64::MAX),
            ResourceLimit::Unlimited
        );
        assert_eq!(
            ResourceLimit::from_raw(4096, u64::MAX),
            ResourceLimit::Limited(4096)
        );
    }

    #[test]
    fn freebsd_infinity_is_not_all_ones() {
        let infinity = i64::MAX as u64;
        assert_eq!(
            ResourceLimit::from_raw(u64::MAX, infinity),
            ResourceLimit::Limited(u64::MAX)
        );
        assert!(ResourceLimit::from_raw(infinity, infinity).is_unlimited());
    }

    #[test]
    fn display() {
        assert_eq!(ResourceLimit::Unknown.to_string(), "unknown");
        assert_eq!(ResourceLimit::Unlimited.to_string(), "unlimited");
        assert_eq!(ResourceLimit::Limited(12).to_string(), "12");
    }

    #[test]
    fn fixed_sets_both_values() {
        assert_eq!(RLimit::fixed(0), RLimit::new(0, 0));
    }
}
