//! Output formats and their state alphabets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use collatio_core::Collation;

use crate::error::ExportError;

/// 0-9, a-z, A-Z. PAUP* and the extended MrBayes accept all 62.
const NEXUS_SYMBOLS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Hennig86 allows 32 states, upper-case.
const HENNIG86_SYMBOLS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUV";
/// RAxML-style 32-state alphabet.
const MULTISTATE_SYMBOLS: &str = "0123456789abcdefghijklmnopqrstuv";

pub const MISSING_SYMBOL: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Nexus,
    Hennig86,
    Phylip,
    Fasta,
    Csv,
    Tsv,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::Nexus,
        Format::Hennig86,
        Format::Phylip,
        Format::Fasta,
        Format::Csv,
        Format::Tsv,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Format::Nexus => "nexus",
            Format::Hennig86 => "hennig86",
            Format::Phylip => "phylip",
            Format::Fasta => "fasta",
            Format::Csv => "csv",
            Format::Tsv => "tsv",
        }
    }

    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            Format::Nexus => &[".nex", ".nexus", ".nxs"],
            Format::Hennig86 => &[".tnt"],
            Format::Phylip => &[".phy"],
            Format::Fasta => &[".fa", ".fasta"],
            Format::Csv => &[".csv"],
            Format::Tsv => &[".tsv"],
        }
    }

    /// Pick a format from the file suffix (case-insensitive).
    pub fn infer(path: &Path) -> Result<Self, ExportError> {
        let suffix = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()));
        if let Some(suffix) = &suffix {
            for format in Self::ALL {
                if format.suffixes().contains(&suffix.as_str()) {
                    return Ok(format);
                }
            }
        }
        Err(ExportError::FormatUnknown {
            path: path.display().to_string(),
            allowed: Self::ALL
                .iter()
                .flat_map(|format| format.suffixes().iter().copied())
                .collect(),
        })
    }

    /// Single-character state alphabet, in coordinate order.
    pub fn alphabet(self) -> &'static str {
        match self {
            Format::Nexus | Format::Csv | Format::Tsv => NEXUS_SYMBOLS,
            Format::Hennig86 => HENNIG86_SYMBOLS,
            Format::Phylip | Format::Fasta => MULTISTATE_SYMBOLS,
        }
    }

    /// The first `n` symbols of this format's alphabet, where `n` is the
    /// largest substantive-reading count of any informative unit.
    pub fn symbols(self, collation: &Collation) -> Result<Vec<char>, ExportError> {
        let needed = max_state_count(collation);
        let alphabet = self.alphabet();
        if needed > alphabet.len() {
            return Err(ExportError::TooManyStates {
                format: self,
                needed,
                available: alphabet.len(),
            });
        }
        Ok(alphabet.chars().take(needed).collect())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn max_state_count(collation: &Collation) -> usize {
    collation
        .variation_unit_ids()
        .iter()
        .filter_map(|id| collation.substantive_readings(id))
        .map(<[String]>::len)
        .max()
        .unwrap_or(0)
}
