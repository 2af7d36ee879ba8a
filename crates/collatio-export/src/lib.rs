//! Collatio export layer
//!
//! Thin writers over a finished [`Collation`]. Every writer renders to a
//! `String`; [`write_to_path`] picks the format (explicitly or from the file
//! suffix) and handles the filesystem.
//!
//! | format   | suffixes                 | ambiguity           |
//! |----------|--------------------------|---------------------|
//! | NEXUS    | `.nex` `.nexus` `.nxs`   | `{..}`, `?`, or frequencies |
//! | Hennig86 | `.tnt`                   | `?`                 |
//! | PHYLIP   | `.phy`                   | `?`                 |
//! | FASTA    | `.fa` `.fasta`           | `?`                 |
//! | CSV/TSV  | `.csv` `.tsv`            | per table kind      |

pub mod delimited;
pub mod error;
pub mod format;
pub mod labels;
pub mod nexus;
pub mod sequences;
pub mod tables;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use collatio_core::Collation;

pub use delimited::{render_delimited, TableKind, TableOptions};
pub use error::ExportError;
pub use format::Format;
pub use nexus::{render_nexus, NexusOptions};
pub use sequences::{render_fasta, render_hennig86, render_phylip};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub nexus: NexusOptions,
    pub table: TableOptions,
}

pub fn render(collation: &Collation, format: Format, options: &ExportOptions) -> Result<String, ExportError> {
    match format {
        Format::Nexus => render_nexus(collation, &options.nexus),
        Format::Hennig86 => render_hennig86(collation),
        Format::Phylip => render_phylip(collation),
        Format::Fasta => render_fasta(collation),
        Format::Csv => Ok(render_delimited(collation, ',', &options.table)),
        Format::Tsv => Ok(render_delimited(collation, '\t', &options.table)),
    }
}

/// Write `collation` to `path`, creating missing parent directories. The
/// format is inferred from the suffix unless given.
pub fn write_to_path(
    collation: &Collation,
    path: impl AsRef<Path>,
    format: Option<Format>,
    options: &ExportOptions,
) -> anyhow::Result<Format> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::infer(path)?,
    };
    let rendered = render(collation, format, options)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
    }
    std::fs::write(path, rendered.as_bytes())
        .with_context(|| format!("failed to write {format} output: {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        %format,
        taxa = collation.witnesses().len(),
        characters = collation.variation_unit_ids().len(),
        "wrote collation"
    );
    Ok(format)
}
