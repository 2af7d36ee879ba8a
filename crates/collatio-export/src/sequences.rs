//! Single-symbol alignments: Hennig86, PHYLIP, and FASTA.
//!
//! None of these formats can express ambiguity, so anything other than a
//! single supported reading is written as `?`.

use collatio_core::Collation;

use crate::error::ExportError;
use crate::format::{Format, MISSING_SYMBOL};
use crate::labels::taxon_labels;
use crate::tables::singleton_state;

/// One row of symbols per witness, in witness order.
fn sequences(collation: &Collation, format: Format) -> Result<Vec<String>, ExportError> {
    let symbols = format.symbols(collation)?;
    let width = collation.variation_unit_ids().len();
    Ok(collation
        .witnesses()
        .iter()
        .map(|witness| {
            let vectors = collation.readings_by_witness().get(&witness.id);
            (0..width)
                .map(|position| {
                    vectors
                        .and_then(|v| v.get(position))
                        .and_then(|vector| singleton_state(vector))
                        .map_or(MISSING_SYMBOL, |state| symbols[state])
                })
                .collect()
        })
        .collect())
}

pub fn render_hennig86(collation: &Collation) -> Result<String, ExportError> {
    let rows = sequences(collation, Format::Hennig86)?;
    let taxa = taxon_labels(collation, Format::Hennig86);
    let width = taxa.iter().map(String::len).max().unwrap_or(0);
    let nstates = Format::Hennig86.symbols(collation)?.len();

    let mut out = format!("nstates {nstates};\nxread\n");
    out.push_str(&format!("{} {}\n", collation.variation_unit_ids().len(), taxa.len()));
    for (taxon, row) in taxa.iter().zip(&rows) {
        out.push_str(&format!("{taxon:<width$} {row}\n"));
    }
    out.push(';');
    Ok(out)
}

pub fn render_phylip(collation: &Collation) -> Result<String, ExportError> {
    let rows = sequences(collation, Format::Phylip)?;
    let taxa = taxon_labels(collation, Format::Phylip);
    let width = taxa.iter().map(String::len).max().unwrap_or(0);

    let mut out = format!("{} {}\n", taxa.len(), collation.variation_unit_ids().len());
    for (taxon, row) in taxa.iter().zip(&rows) {
        out.push_str(&format!("{taxon:<width$}\t{row}\n"));
    }
    Ok(out)
}

pub fn render_fasta(collation: &Collation) -> Result<String, ExportError> {
    let rows = sequences(collation, Format::Fasta)?;
    let taxa = taxon_labels(collation, Format::Fasta);

    let mut out = String::new();
    for (taxon, row) in taxa.iter().zip(&rows) {
        out.push_str(&format!(">{taxon}\n{row}\n"));
    }
    Ok(out)
}
