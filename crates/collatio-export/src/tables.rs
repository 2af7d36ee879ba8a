//! Tabular views of a collation: the reading-support matrix, pairwise
//! witness comparisons, and discrete state tables.

use serde::Serialize;

use collatio_core::support::is_lacunose;
use collatio_core::Collation;

use crate::format::MISSING_SYMBOL;
use crate::labels::OMISSION_LABEL;

/// Coordinates with any support.
pub fn supported_states(vector: &[f64]) -> Vec<usize> {
    vector
        .iter()
        .enumerate()
        .filter(|(_, weight)| **weight > 0.0)
        .map(|(index, _)| index)
        .collect()
}

/// The single supported coordinate, if there is exactly one.
pub fn singleton_state(vector: &[f64]) -> Option<usize> {
    match supported_states(vector).as_slice() {
        [state] => Some(*state),
        _ => None,
    }
}

/// Substantive reading texts of an informative unit, in coordinate order.
pub fn substantive_reading_texts(collation: &Collation, unit_id: &str) -> Vec<String> {
    let Some(reading_ids) = collation.substantive_readings(unit_id) else {
        return Vec::new();
    };
    let unit = collation.variation_unit(unit_id);
    reading_ids
        .iter()
        .map(|reading_id| {
            unit.and_then(|unit| unit.reading(reading_id))
                .map(|reading| reading.text.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Rows are substantive readings (`"<unit>, <text>"`), columns witnesses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportMatrix {
    pub reading_labels: Vec<String>,
    pub witness_labels: Vec<String>,
    /// `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

/// With `split_missing`, a lacunose witness spreads weight 1 evenly over the
/// unit's readings; otherwise its column stays zero there.
pub fn support_matrix(collation: &Collation, split_missing: bool) -> SupportMatrix {
    let mut reading_labels = Vec::new();
    for unit_id in collation.variation_unit_ids() {
        for text in substantive_reading_texts(collation, unit_id) {
            reading_labels.push(format!("{unit_id}, {text}"));
        }
    }
    let witness_labels: Vec<String> = collation.witnesses().iter().map(|w| w.id.clone()).collect();

    let mut values = vec![vec![0.0; witness_labels.len()]; reading_labels.len()];
    for (column, witness_id) in witness_labels.iter().enumerate() {
        let Some(vectors) = collation.readings_by_witness().get(witness_id) else {
            continue;
        };
        let mut row = 0;
        for vector in vectors {
            let lacunose = is_lacunose(vector);
            for weight in vector {
                values[row][column] = match (lacunose, split_missing) {
                    (true, true) => 1.0 / vector.len() as f64,
                    _ => *weight,
                };
                row += 1;
            }
        }
    }

    SupportMatrix {
        reading_labels,
        witness_labels,
        values,
    }
}

/// One pairwise comparison: `count` agreements or disagreements over the
/// `extant` units where both witnesses have exactly one supported reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairwiseCell {
    pub count: usize,
    pub extant: usize,
}

impl PairwiseCell {
    /// `count / extant`, or 0 without overlap.
    pub fn proportion(&self) -> f64 {
        self.count as f64 / self.extant.max(1) as f64
    }

    pub fn render(&self, proportion: bool, show_extant: bool) -> String {
        let value = if proportion {
            self.proportion().to_string()
        } else {
            self.count.to_string()
        };
        if show_extant {
            format!("{value}/{}", self.extant)
        } else {
            value
        }
    }
}

/// Symmetric witness × witness matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseMatrix {
    pub labels: Vec<String>,
    pub cells: Vec<Vec<PairwiseCell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Disagreement,
    Agreement,
}

pub fn distance_matrix(collation: &Collation) -> PairwiseMatrix {
    pairwise_matrix(collation, Comparison::Disagreement)
}

pub fn similarity_matrix(collation: &Collation) -> PairwiseMatrix {
    pairwise_matrix(collation, Comparison::Agreement)
}

fn pairwise_matrix(collation: &Collation, comparison: Comparison) -> PairwiseMatrix {
    let labels: Vec<String> = collation.witnesses().iter().map(|w| w.id.clone()).collect();
    let singletons: Vec<Vec<Option<usize>>> = labels
        .iter()
        .map(|id| {
            collation
                .readings_by_witness()
                .get(id)
                .map(|vectors| vectors.iter().map(|v| singleton_state(v)).collect())
                .unwrap_or_default()
        })
        .collect();

    let n = labels.len();
    let mut cells = vec![vec![PairwiseCell { count: 0, extant: 0 }; n]; n];
    for i in 0..n {
        for j in i..n {
            let mut cell = PairwiseCell { count: 0, extant: 0 };
            for (a, b) in singletons[i].iter().zip(&singletons[j]) {
                let (Some(a), Some(b)) = (a, b) else {
                    continue;
                };
                cell.extant += 1;
                let agree = a == b;
                if agree == (comparison == Comparison::Agreement) {
                    cell.count += 1;
                }
            }
            cells[i][j] = cell;
            cells[j][i] = cell;
        }
    }
    PairwiseMatrix { labels, cells }
}

/// Witness × unit table of reading ids; `?` for lacunae, `{a b}` (or `?`)
/// for ambiguity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTable {
    pub witness_labels: Vec<String>,
    pub unit_ids: Vec<String>,
    pub cells: Vec<Vec<String>>,
}

pub fn nexus_table(collation: &Collation, ambiguous_as_missing: bool) -> StateTable {
    let unit_ids = collation.variation_unit_ids().to_vec();
    let witness_labels: Vec<String> = collation.witnesses().iter().map(|w| w.id.clone()).collect();
    let missing = MISSING_SYMBOL.to_string();

    let cells = witness_labels
        .iter()
        .map(|witness_id| {
            let vectors = collation.readings_by_witness().get(witness_id);
            unit_ids
                .iter()
                .enumerate()
                .map(|(position, unit_id)| {
                    let (Some(vector), Some(reading_ids)) = (
                        vectors.and_then(|v| v.get(position)),
                        collation.substantive_readings(unit_id),
                    ) else {
                        return missing.clone();
                    };
                    match supported_states(vector).as_slice() {
                        [] => missing.clone(),
                        [state] => reading_ids[*state].clone(),
                        _ if ambiguous_as_missing => missing.clone(),
                        states => {
                            let ids: Vec<&str> = states.iter().map(|s| reading_ids[*s].as_str()).collect();
                            format!("{{{}}}", ids.join(" "))
                        }
                    }
                })
                .collect()
        })
        .collect();

    StateTable {
        witness_labels,
        unit_ids,
        cells,
    }
}

/// One row of the long table; `state` and `value` are `?` unless the witness
/// has exactly one supported reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongRow {
    pub taxon: String,
    pub character: String,
    pub state: String,
    pub value: String,
}

pub const LONG_TABLE_COLUMNS: [&str; 4] = ["taxon", "character", "state", "value"];

pub fn long_table(collation: &Collation) -> Vec<LongRow> {
    let texts: Vec<Vec<String>> = collation
        .variation_unit_ids()
        .iter()
        .map(|unit_id| substantive_reading_texts(collation, unit_id))
        .collect();

    let mut rows = Vec::new();
    for witness in collation.witnesses() {
        let vectors = collation.readings_by_witness().get(&witness.id);
        for (position, unit_id) in collation.variation_unit_ids().iter().enumerate() {
            let state = vectors
                .and_then(|v| v.get(position))
                .and_then(|vector| singleton_state(vector));
            let (state, value) = match state {
                Some(state) => {
                    let text = texts[position].get(state).cloned().unwrap_or_default();
                    let text = if text.is_empty() {
                        OMISSION_LABEL.to_string()
                    } else {
                        text
                    };
                    (state.to_string(), text)
                }
                None => (MISSING_SYMBOL.to_string(), MISSING_SYMBOL.to_string()),
            };
            rows.push(LongRow {
                taxon: witness.id.clone(),
                character: unit_id.clone(),
                state,
                value,
            });
        }
    }
    rows
}
