//! NEXUS DATA block (plus an optional ASSUMPTIONS block of tip-date
//! calibrations).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

use collatio_core::dates::current_year;
use collatio_core::support::is_lacunose;
use collatio_core::Collation;

use crate::error::ExportError;
use crate::format::{Format, MISSING_SYMBOL};
use crate::labels::{reading_label, sanitize_label, taxon_labels};
use crate::tables::{substantive_reading_texts, supported_states};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusOptions {
    /// Emit a CharStateLabels block naming each unit and its readings.
    pub char_state_labels: bool,
    /// `StatesFormat=Frequency`: every cell is a weighted state vector.
    pub frequency: bool,
    /// Write ambiguous cells as `?` instead of `{..}`. Ignored with
    /// `frequency`.
    pub ambiguous_as_missing: bool,
    /// Append CALIBRATE statements from witness date ranges.
    pub calibrate_dates: bool,
}

impl Default for NexusOptions {
    fn default() -> Self {
        Self {
            char_state_labels: true,
            frequency: false,
            ambiguous_as_missing: false,
            calibrate_dates: false,
        }
    }
}

pub fn render_nexus(collation: &Collation, options: &NexusOptions) -> Result<String, ExportError> {
    let symbols = Format::Nexus.symbols(collation)?;
    let taxa = taxon_labels(collation, Format::Nexus);
    let mut out = write_data_block(collation, options, &symbols, &taxa)?;
    if options.calibrate_dates {
        out.push_str("\n\n");
        out.push_str(&assumptions_block(collation, &taxa));
    }
    Ok(out)
}

fn write_data_block(
    collation: &Collation,
    options: &NexusOptions,
    symbols: &[char],
    taxa: &[String],
) -> Result<String, fmt::Error> {
    let unit_ids = collation.variation_unit_ids();
    let label_width = taxa.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str("#NEXUS\n\n");
    out.push_str("Begin DATA;\n");
    writeln!(out, "\tDimensions ntax={} nchar={};", taxa.len(), unit_ids.len())?;
    out.push_str("\tFormat\n");
    out.push_str("\t\tDataType=Standard\n");
    writeln!(out, "\t\tMissing={MISSING_SYMBOL}")?;
    if options.frequency {
        out.push_str("\t\tStatesFormat=Frequency\n");
    }
    let symbol_list: Vec<String> = symbols.iter().map(char::to_string).collect();
    writeln!(out, "\t\tSymbols=\"{}\";", symbol_list.join(" "))?;

    if options.char_state_labels {
        out.push_str("\tCharStateLabels");
        for (index, unit_id) in unit_ids.iter().enumerate() {
            let separator = if index == 0 { "" } else { "," };
            write!(out, "{separator}\n\t\t{} {} /", index + 1, sanitize_label(unit_id))?;
            for text in substantive_reading_texts(collation, unit_id) {
                write!(out, " {}", reading_label(&text))?;
            }
        }
        out.push_str(";\n");
    }

    out.push_str("\tMatrix");
    for (witness, taxon) in collation.witnesses().iter().zip(taxa) {
        let vectors = collation.readings_by_witness().get(&witness.id);
        if options.frequency {
            write!(out, "\n\t\t{taxon}")?;
        } else {
            write!(out, "\n\t\t{taxon:<width$} ", width = label_width)?;
        }
        for position in 0..unit_ids.len() {
            let vector = vectors.and_then(|v| v.get(position)).map(Vec::as_slice).unwrap_or(&[]);
            if options.frequency {
                out.push_str("\n\t\t\t");
                out.push_str(&frequency_cell(vector, symbols));
            } else {
                out.push_str(&state_cell(vector, symbols, options.ambiguous_as_missing));
            }
        }
    }
    out.push_str(";\n");
    out.push_str("End;");
    Ok(out)
}

fn state_cell(vector: &[f64], symbols: &[char], ambiguous_as_missing: bool) -> String {
    match supported_states(vector).as_slice() {
        [] => MISSING_SYMBOL.to_string(),
        [state] => symbols[*state].to_string(),
        _ if ambiguous_as_missing => MISSING_SYMBOL.to_string(),
        states => {
            let inner: String = states.iter().map(|s| symbols[*s]).collect();
            format!("{{{inner}}}")
        }
    }
}

fn frequency_cell(vector: &[f64], symbols: &[char]) -> String {
    if is_lacunose(vector) {
        return MISSING_SYMBOL.to_string();
    }
    let entries: Vec<String> = vector
        .iter()
        .zip(symbols)
        .map(|(weight, symbol)| format!("{symbol}:{weight:.4}"))
        .collect();
    format!("({})", entries.join(" "))
}

/// Ages are years before the present: a fixed age when the range is a single
/// year, uniform over the range otherwise, and an offset log-normal above the
/// minimum age when the lower bound is unknown.
fn assumptions_block(collation: &Collation, taxa: &[String]) -> String {
    let now = current_year();
    let calibrations: Vec<String> = collation
        .witnesses()
        .iter()
        .zip(taxa)
        .map(|(witness, taxon)| {
            let min_age = witness.date_range.upper.map_or(0, |upper| now - upper);
            match witness.date_range.lower {
                Some(lower) if now - lower == min_age => format!("\tCALIBRATE {taxon} = fixed({min_age})"),
                Some(lower) => format!("\tCALIBRATE {taxon} = uniform({min_age},{})", now - lower),
                None => format!("\tCALIBRATE {taxon} = offsetlognormal({min_age},0.0,1.0)"),
            }
        })
        .collect();

    let mut out = String::from("Begin ASSUMPTIONS;\n");
    out.push_str("\tOPTIONS SCALE = years;\n\n");
    out.push_str(&calibrations.join(",\n"));
    out.push_str(";\n\nEnd;");
    out
}
