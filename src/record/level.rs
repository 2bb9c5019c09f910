//! Record severity and the level filter.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;
use strum_macros::EnumIter as EnumIterMacro;

/// Severity of a log record.
///
/// Totally ordered: `Debug < Info < Warn < Error < Fatal`. A sink configured
/// with threshold `T` accepts a record at level `L` iff `L >= T`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum, EnumIterMacro,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose diagnostics
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected that did not fail the operation
    Warn,
    /// A failed operation
    Error,
    /// A failure the application cannot recover from. Recorded like any
    /// other level; the process is not terminated.
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Level filter: treats `self` as the threshold.
    #[inline]
    pub fn accepts(self, level: Level) -> bool {
        level >= self
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(format!("unknown level `{other}`")),
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(l: Level) -> Self {
        match l {
            Level::Debug => log::LevelFilter::Debug,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error | Level::Fatal => log::LevelFilter::Error,
        }
    }
}
