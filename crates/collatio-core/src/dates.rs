//! Year ranges for witnesses and for the collated work's origin.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CollationError;
use crate::xml::XmlElement;

/// An inclusive range of years; either bound may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub lower: Option<i32>,
    pub upper: Option<i32>,
}

impl DateRange {
    pub fn new(lower: Option<i32>, upper: Option<i32>) -> Self {
        Self { lower, upper }
    }

    /// Default for a witness with no dating evidence: no lower bound, and
    /// the current year as the upper bound.
    pub fn undated_witness() -> Self {
        Self {
            lower: None,
            upper: Some(current_year()),
        }
    }

    /// Apply the dating attributes of a TEI date-like element
    /// (`origDate`, `date`).
    ///
    /// `when` fixes both bounds; failing that, `to` (the completion of a
    /// production period) fixes both; failing that, `notBefore` and
    /// `notAfter` set whichever bound they name.
    pub fn apply_attributes(&mut self, el: &XmlElement) -> Result<(), CollationError> {
        if let Some(when) = el.attr("when") {
            let year = parse_year(el, "when", when)?;
            self.lower = Some(year);
            self.upper = Some(year);
        } else if let Some(to) = el.attr("to") {
            let year = parse_year(el, "to", to)?;
            self.lower = Some(year);
            self.upper = Some(year);
        } else {
            if let Some(not_before) = el.attr("notBefore") {
                self.lower = Some(parse_year(el, "notBefore", not_before)?);
            }
            if let Some(not_after) = el.attr("notAfter") {
                self.upper = Some(parse_year(el, "notAfter", not_after)?);
            }
        }
        Ok(())
    }

    /// Earliest of both bounds, if either is known.
    pub fn earliest_bound(&self) -> Option<i32> {
        match (self.lower, self.upper) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Parse the year component of an ISO-like date (`"1364"`, `"0384-05"`,
/// `"-0050"`).
pub fn parse_year_value(value: &str) -> Option<i32> {
    let value = value.trim();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let digits = rest.split('-').next()?;
    let year: i32 = digits.parse().ok()?;
    Some(if negative { -year } else { year })
}

fn parse_year(el: &XmlElement, attribute: &str, value: &str) -> Result<i32, CollationError> {
    parse_year_value(value).ok_or_else(|| CollationError::InvalidValue {
        element: el.name.clone(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}
