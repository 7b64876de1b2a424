use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a single course section (the registrar's class number).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassNumber(pub String);

impl ClassNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ClassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Course name shared by every section of a course; fetches are batched by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(pub String);

impl ClassName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Availability reported by the class search. Only `Open` and `Full` drive alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Open,
    Full,
    Waitlist,
    Closed,
    #[serde(other)]
    Unknown,
}

impl SeatStatus {
    /// Status a freshly tracked section is assumed to be in before any observation.
    pub const INACTIVE: SeatStatus = SeatStatus::Full;

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Full => "FULL",
            Self::Waitlist => "WAITLIST",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last known state of one tracked section, as returned by the class search.
///
/// Everything besides the class number, class name, and status is opaque to the
/// monitor and only flows through to alert rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSnapshot {
    /// Missing in a payload means blank; the registry rejects it.
    #[serde(default)]
    pub class_number: ClassNumber,
    pub class_name: ClassName,
    pub status: SeatStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub seats: String,
}

impl SectionSnapshot {
    pub fn display_name(&self) -> &str {
        self.class_name.as_str()
    }
}
