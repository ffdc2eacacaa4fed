use serde::{Deserialize, Serialize};

/// Leak class, the target variable of the classifier.
///
/// Four-way output: the medium-leak scenario maps onto `Slow` at training
/// time, and both the normal and early-deviation scenarios map onto `None`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeakClass {
    None,
    Micro,
    Slow,
    Catastrophic,
}

impl LeakClass {
    /// All classes, in class-index order
    pub const ALL: [LeakClass; 4] = [
        LeakClass::None,
        LeakClass::Micro,
        LeakClass::Slow,
        LeakClass::Catastrophic,
    ];

    /// Class index used by the classifier
    pub fn index(self) -> usize {
        match self {
            LeakClass::None => 0,
            LeakClass::Micro => 1,
            LeakClass::Slow => 2,
            LeakClass::Catastrophic => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Business-facing severity tier derived from the leak class.
///
/// `Unknown` covers labels that do not parse to a [`LeakClass`]; the
/// class-to-severity policy itself lives in the inference decision layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
    Unknown,
}
