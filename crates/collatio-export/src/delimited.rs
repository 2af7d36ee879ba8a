//! CSV / TSV output of the tabular views.

use serde::{Deserialize, Serialize};

use collatio_core::Collation;

use crate::tables::{
    distance_matrix, long_table, nexus_table, similarity_matrix, support_matrix, PairwiseMatrix,
    LONG_TABLE_COLUMNS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Reading-support matrix.
    #[default]
    Matrix,
    Distance,
    Similarity,
    /// Witness × unit reading ids.
    Nexus,
    /// (taxon, character, state, value) rows.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub kind: TableKind,
    /// Spread a lacunose witness's weight evenly over the unit's readings.
    pub split_missing: bool,
    /// Pairwise cells as proportions of shared extant units.
    pub proportion: bool,
    /// Append `/<shared extant units>` to pairwise cells.
    pub show_extant: bool,
    pub ambiguous_as_missing: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            kind: TableKind::Matrix,
            split_missing: true,
            proportion: false,
            show_extant: false,
            ambiguous_as_missing: false,
        }
    }
}

/// Render the chosen table with `delimiter` between fields. Every table but
/// the long table has an empty leading header cell above its row labels.
pub fn render_delimited(collation: &Collation, delimiter: char, options: &TableOptions) -> String {
    let rows: Vec<Vec<String>> = match options.kind {
        TableKind::Matrix => {
            let matrix = support_matrix(collation, options.split_missing);
            let mut rows = vec![header(&matrix.witness_labels)];
            for (label, values) in matrix.reading_labels.iter().zip(&matrix.values) {
                let mut row = vec![label.clone()];
                row.extend(values.iter().map(f64::to_string));
                rows.push(row);
            }
            rows
        }
        TableKind::Distance => pairwise_rows(&distance_matrix(collation), options),
        TableKind::Similarity => pairwise_rows(&similarity_matrix(collation), options),
        TableKind::Nexus => {
            let table = nexus_table(collation, options.ambiguous_as_missing);
            let mut rows = vec![header(&table.unit_ids)];
            for (label, cells) in table.witness_labels.iter().zip(&table.cells) {
                let mut row = vec![label.clone()];
                row.extend(cells.iter().cloned());
                rows.push(row);
            }
            rows
        }
        TableKind::Long => {
            let mut rows = vec![LONG_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect()];
            for entry in long_table(collation) {
                rows.push(vec![entry.taxon, entry.character, entry.state, entry.value]);
            }
            rows
        }
    };

    let mut out = String::new();
    for row in rows {
        let fields: Vec<String> = row.iter().map(|field| quote_field(field, delimiter)).collect();
        out.push_str(&fields.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

fn header(labels: &[String]) -> Vec<String> {
    std::iter::once(String::new()).chain(labels.iter().cloned()).collect()
}

fn pairwise_rows(matrix: &PairwiseMatrix, options: &TableOptions) -> Vec<Vec<String>> {
    let mut rows = vec![header(&matrix.labels)];
    for (label, cells) in matrix.labels.iter().zip(&matrix.cells) {
        let mut row = vec![label.clone()];
        row.extend(
            cells
                .iter()
                .map(|cell| cell.render(options.proportion, options.show_extant)),
        );
        rows.push(row);
    }
    rows
}

/// Quote a field containing the delimiter, a quote, or a line break;
/// embedded quotes are doubled.
fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
