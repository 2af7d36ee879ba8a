//! Collation policy: how sigla are resolved and how reading types are treated.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::dates::{parse_year_value, DateRange};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid collation config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fragmentary threshold must lie in [0, 1], got {0}")]
    FragmentaryThreshold(f64),
    #[error("reading type `{0}` is configured as both trivial and missing")]
    ConflictingReadingType(String),
    #[error("witness {witness}: minimum date {lower} is greater than maximum date {upper}")]
    WitnessDateRange { witness: String, lower: i32, upper: i32 },
    #[error("witness dates line {line}: expected `id,min,max`, got {row:?}")]
    WitnessDatesRow { line: usize, row: String },
}

/// Policy applied when deriving reading-support vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollationConfig {
    /// Suffixes stripped (in order, repeatedly) to reduce a siglum to a base
    /// witness id, e.g. `*` for first hands or `T` for main texts.
    pub manuscript_suffixes: Vec<String>,
    /// Reading types collapsed into the preceding substantive reading.
    pub trivial_reading_types: BTreeSet<String>,
    /// Reading types treated as absence of data.
    pub missing_reading_types: BTreeSet<String>,
    /// Fill all-zero support vectors of `corrector` witnesses from their
    /// base witness.
    pub fill_corrector_lacunae: bool,
    /// Explicit corrector → base witness links. Correctors without an entry
    /// fall back to the witness listed immediately before them.
    pub corrector_bases: BTreeMap<String, String>,
    /// Drop witnesses extant at fewer than this proportion of informative
    /// units.
    pub fragmentary_threshold: Option<f64>,
    /// Witness id → date range replacing the witness's `origDate`. An unset
    /// upper bound means the current year.
    pub witness_dates: BTreeMap<String, DateRange>,
}

impl CollationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.fragmentary_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::FragmentaryThreshold(threshold));
            }
        }
        if let Some(both) = self
            .trivial_reading_types
            .intersection(&self.missing_reading_types)
            .next()
        {
            return Err(ConfigError::ConflictingReadingType(both.clone()));
        }
        for (witness, range) in &self.witness_dates {
            if let (Some(lower), Some(upper)) = (range.lower, range.upper) {
                if lower > upper {
                    return Err(ConfigError::WitnessDateRange {
                        witness: witness.clone(),
                        lower,
                        upper,
                    });
                }
            }
        }
        Ok(())
    }

    /// Read witness date overrides from a headerless `id,min,max` file.
    /// Either year may be left empty.
    pub fn load_witness_dates(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.witness_dates.extend(parse_witness_dates(&text)?);
        self.validate()?;
        Ok(self)
    }

    pub fn with_manuscript_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manuscript_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trivial_reading_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trivial_reading_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_reading_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_reading_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fill_corrector_lacunae(mut self, fill: bool) -> Self {
        self.fill_corrector_lacunae = fill;
        self
    }

    pub fn with_corrector_base(mut self, corrector: impl Into<String>, base: impl Into<String>) -> Self {
        self.corrector_bases.insert(corrector.into(), base.into());
        self
    }

    pub fn with_fragmentary_threshold(mut self, threshold: f64) -> Self {
        self.fragmentary_threshold = Some(threshold);
        self
    }

    pub fn with_witness_dates(mut self, witness: impl Into<String>, lower: Option<i32>, upper: Option<i32>) -> Self {
        self.witness_dates.insert(witness.into(), DateRange::new(lower, upper));
        self
    }
}

/// Parse `id,min,max` rows; blank lines are skipped.
pub fn parse_witness_dates(text: &str) -> Result<BTreeMap<String, DateRange>, ConfigError> {
    let mut dates = BTreeMap::new();
    for (index, row) in text.lines().enumerate() {
        if row.trim().is_empty() {
            continue;
        }
        let bad_row = || ConfigError::WitnessDatesRow {
            line: index + 1,
            row: row.to_string(),
        };
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        let [id, lower, upper] = fields.as_slice() else {
            return Err(bad_row());
        };
        if id.is_empty() {
            return Err(bad_row());
        }
        let year = |field: &str| match field {
            "" => Ok(None),
            value => parse_year_value(value).map(Some).ok_or_else(bad_row),
        };
        dates.insert((*id).to_string(), DateRange::new(year(*lower)?, year(*upper)?));
    }
    Ok(dates)
}
