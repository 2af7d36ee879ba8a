//! Per-unit reading-support vectors.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CollationConfig;
use crate::reading::ReadingClass;
use crate::variation_unit::VariationUnit;

/// A witness's distribution over a unit's substantive readings. Sums to 1,
/// or is all-zero where the witness has no data.
pub type SupportVector = Vec<f64>;

/// Reduce a siglum to a known witness id by stripping configured suffixes.
///
/// A verbatim match always wins. Otherwise the first suffix in list order
/// that ends the current string is removed, and the check repeats until a
/// match is found or no suffix applies; the residue is returned either way.
pub fn resolve_base_witness<F>(siglum: &str, is_known: F, suffixes: &[String]) -> String
where
    F: Fn(&str) -> bool,
{
    let mut base = siglum;
    loop {
        if is_known(base) {
            return base.to_string();
        }
        let stripped = suffixes
            .iter()
            .filter(|suffix| !suffix.is_empty())
            .find_map(|suffix| base.strip_suffix(suffix.as_str()));
        match stripped {
            Some(shorter) => base = shorter,
            None => return base.to_string(),
        }
    }
}

/// Support vectors of one informative unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitSupport {
    /// Substantive reading ids; the index is the coordinate.
    pub substantive_reading_ids: Vec<String>,
    /// Witness id → support vector, one entry per known witness.
    pub vectors: BTreeMap<String, SupportVector>,
}

/// Compute support vectors for `unit` over `witness_ids`.
///
/// Returns `None` when fewer than two substantive readings remain after
/// trivial readings are collapsed.
pub fn compute_unit_support(
    unit: &VariationUnit,
    witness_ids: &[String],
    config: &CollationConfig,
) -> Option<UnitSupport> {
    let classify = |reading_type: &str| {
        ReadingClass::classify(
            reading_type,
            &config.trivial_reading_types,
            &config.missing_reading_types,
        )
    };

    // Coordinates of substantive readings, and of trivial readings
    // collapsed into them.
    let mut substantive_reading_ids: Vec<String> = Vec::new();
    let mut coordinate_by_id: BTreeMap<&str, usize> = BTreeMap::new();
    let mut trivial_coordinates: BTreeMap<usize, usize> = BTreeMap::new();
    for (index, reading) in unit.readings.iter().enumerate() {
        if reading.is_targeted() {
            continue;
        }
        match classify(&reading.reading_type) {
            ReadingClass::Missing => {}
            ReadingClass::Trivial => match substantive_reading_ids.len().checked_sub(1) {
                Some(last) => {
                    trivial_coordinates.insert(index, last);
                    coordinate_by_id.entry(reading.id.as_str()).or_insert(last);
                }
                None => tracing::warn!(
                    unit = %unit.id,
                    reading = %reading.id,
                    "trivial reading has no preceding substantive reading; ignoring it"
                ),
            },
            ReadingClass::Substantive => {
                let coordinate = substantive_reading_ids.len();
                substantive_reading_ids.push(reading.id.clone());
                coordinate_by_id.insert(reading.id.as_str(), coordinate);
            }
        }
    }

    if substantive_reading_ids.len() < 2 {
        tracing::debug!(
            unit = %unit.id,
            substantive = substantive_reading_ids.len(),
            "variation unit is uninformative"
        );
        return None;
    }

    let width = substantive_reading_ids.len();
    let known: BTreeSet<&str> = witness_ids.iter().map(String::as_str).collect();
    let mut vectors: BTreeMap<String, SupportVector> = witness_ids
        .iter()
        .map(|id| (id.clone(), vec![0.0; width]))
        .collect();

    for (index, reading) in unit.readings.iter().enumerate() {
        let mut contribution = vec![0.0; width];
        match classify(&reading.reading_type) {
            ReadingClass::Missing => continue,
            ReadingClass::Trivial if !reading.is_targeted() => match trivial_coordinates.get(&index) {
                Some(&coordinate) => contribution[coordinate] = 1.0,
                None => continue,
            },
            _ if reading.is_targeted() => {
                for (target, weight) in &reading.certainties {
                    if let Some(&coordinate) = coordinate_by_id.get(target.as_str()) {
                        contribution[coordinate] += weight;
                    }
                }
            }
            _ => match coordinate_by_id.get(reading.id.as_str()) {
                Some(&coordinate) => contribution[coordinate] = 1.0,
                None => continue,
            },
        }

        // Unresolved sigla are skipped here and reported once by the
        // collation.
        for siglum in &reading.wits {
            let base = resolve_base_witness(siglum, |s| known.contains(s), &config.manuscript_suffixes);
            if let Some(accumulator) = vectors.get_mut(&base) {
                for (total, add) in accumulator.iter_mut().zip(&contribution) {
                    *total += add;
                }
            }
        }
    }

    for vector in vectors.values_mut() {
        let total: f64 = vector.iter().sum();
        if total > 0.0 {
            for value in vector.iter_mut() {
                *value /= total;
            }
        }
    }

    Some(UnitSupport {
        substantive_reading_ids,
        vectors,
    })
}

/// True when the vector carries no data.
pub fn is_lacunose(vector: &[f64]) -> bool {
    vector.iter().all(|value| *value == 0.0)
}
