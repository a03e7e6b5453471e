//! Version and time providers for setup blocks

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Supplies the software version and current time recorded by `setup`.
pub trait Stamper: fmt::Debug + Send + Sync {
    fn version(&self) -> &str;
    fn now(&self) -> DateTime<Utc>;
}

/// The running crate version and the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStamper;

impl Stamper for SystemStamper {
    fn version(&self) -> &str {
        crate::VERSION
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fixed version and instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStamper {
    pub version: String,
    pub at: DateTime<Utc>,
}

impl StaticStamper {
    pub fn new(version: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            at,
        }
    }
}

impl Stamper for StaticStamper {
    fn version(&self) -> &str {
        &self.version
    }

    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

/// ISO-8601 UTC timestamp with microseconds, e.g. `2026-10-19T08:30:00.000000Z`.
pub fn isot(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Compact timestamp usable in file names.
pub(crate) fn file_suffix(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%6f").to_string()
}
