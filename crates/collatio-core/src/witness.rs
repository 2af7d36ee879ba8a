use serde::Serialize;

use crate::dates::DateRange;
use crate::error::CollationError;
use crate::xml::XmlElement;

pub const DEFAULT_WITNESS_TYPE: &str = "manuscript";
pub const CORRECTOR_WITNESS_TYPE: &str = "corrector";

/// One textual source declared in the witness list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Witness {
    /// `xml:id`, else `n`, else the element's own text.
    pub id: String,
    /// `"manuscript"` unless declared otherwise (`"corrector"`, `"version"`,
    /// `"father"`, ...).
    pub witness_type: String,
    pub date_range: DateRange,
}

impl Witness {
    pub fn new(id: impl Into<String>, witness_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            witness_type: witness_type.into(),
            date_range: DateRange::undated_witness(),
        }
    }

    pub fn from_xml(el: &XmlElement) -> Result<Self, CollationError> {
        let id = el
            .xml_id()
            .or_else(|| el.attr("n"))
            .map(str::to_string)
            .unwrap_or_else(|| el.leading_text().unwrap_or_default().trim().to_string());
        let witness_type = el.attr("type").unwrap_or(DEFAULT_WITNESS_TYPE).to_string();

        let mut date_range = DateRange::undated_witness();
        if let Some(orig_date) = el.find("origDate") {
            date_range.apply_attributes(orig_date)?;
        }

        let witness = Self {
            id,
            witness_type,
            date_range,
        };
        tracing::debug!(
            id = %witness.id,
            witness_type = %witness.witness_type,
            lower = ?witness.date_range.lower,
            upper = ?witness.date_range.upper,
            "new witness"
        );
        Ok(witness)
    }

    pub fn is_corrector(&self) -> bool {
        self.witness_type == CORRECTOR_WITNESS_TYPE
    }
}
