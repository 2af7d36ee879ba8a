//! Structural errors raised while building a collation.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::xml::XmlError;

#[derive(Debug, thiserror::Error)]
pub enum CollationError {
    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The document has no `listWit`; the sigla it does use are listed so
    /// they can be declared.
    #[error(
        "an explicit listWit element must be included in the collation; \
         sigla found in readings: {}",
        .sigla.join(", ")
    )]
    MissingWitnessList { sigla: Vec<String> },

    #[error("invalid value {value:?} for attribute `{attribute}` on <{element}>")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
    },

    #[error(transparent)]
    IntrinsicRelations(#[from] IntrinsicRelationsError),

    /// Witnesses whose latest possible date precedes the earliest possible
    /// date of the work they attest.
    #[error(
        "witnesses dated before the earliest origin date {origin_lower}: {}",
        format_dated(.witnesses)
    )]
    WitnessDate {
        origin_lower: i32,
        witnesses: Vec<(String, i32)>,
    },
}

fn format_dated(witnesses: &[(String, i32)]) -> String {
    witnesses
        .iter()
        .map(|(id, upper)| format!("{id} ({upper})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Violations of the single-rooted-tree shape required of a unit's
/// intrinsic relations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntrinsicRelationsError {
    #[error(
        "in variation unit {unit_id}, more than one intrinsic relation points to: {}",
        .readings.join(", ")
    )]
    AmbiguousPrior {
        unit_id: String,
        readings: Vec<String>,
    },

    #[error(
        "in variation unit {unit_id}, the intrinsic relations contain a cycle through: {}",
        .readings.join(", ")
    )]
    Cycle {
        unit_id: String,
        readings: Vec<String>,
    },

    #[error(
        "in variation unit {unit_id}, the intrinsic relations have more than one root: {}",
        .roots.join(", ")
    )]
    MultipleRoots { unit_id: String, roots: Vec<String> },
}

impl IntrinsicRelationsError {
    pub fn unit_id(&self) -> &str {
        match self {
            Self::AmbiguousPrior { unit_id, .. }
            | Self::Cycle { unit_id, .. }
            | Self::MultipleRoots { unit_id, .. } => unit_id,
        }
    }
}
