//! Shape normalization for user input and store documents
//!
//! Stored documents have drifted over time: scalars where lists are expected,
//! renamed fields, optional nested geodata. Each entity gets one module that
//! decodes the raw shape with serde variant enums and converts it into the
//! stable domain types in [`crate::results`].

pub mod address;
pub mod codes;
pub mod plan;
pub mod provider;

use serde::de::IgnoredAny;
use serde::Deserialize;

/// A field that is sometimes a single value and sometimes a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// A loosely typed scalar, as found in identifier, flag and free-text fields
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Scalar {
    /// Text form of the scalar; `None` for blank text and non-scalar values
    pub(crate) fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Other(_) => None,
        }
    }

    pub(crate) fn into_text(self) -> Option<String> {
        self.to_text()
    }

    /// Numeric value; numeric text is parsed
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::Other(_) => None,
        }
    }

    /// Interpret as a yes/no flag (`true`, `"Y"`, `"yes"`, `1`)
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(_) | Self::Other(_) => false,
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "y" | "yes" | "true" | "1"
            ),
        }
    }
}
