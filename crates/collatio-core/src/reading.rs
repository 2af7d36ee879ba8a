//! Readings: one attested (or inferred) variant at a point of variation.
//!
//! A reading comes from a `lem`, `rdg`, or `witDetail` element. Its markup is
//! rendered once, at construction, into a display string:
//!
//! | element              | rendering                                        |
//! |----------------------|--------------------------------------------------|
//! | `w`                  | contents followed by a space                     |
//! | `abbr`               | contents                                         |
//! | `hi rend="overline"` | U+0305 after every character                     |
//! | `unclear`            | U+0323 after every non-space character           |
//! | `ex`                 | `(contents)`                                     |
//! | `supplied`           | `[contents]`                                     |
//! | `gap`                | `[extent unit gap (reason)]`, `[...]` if unsized |
//! | `space`              | `[extent unit space (reason)]`                   |
//! | `choice`             | `[alt1/alt2/...]`                                |
//! | `ref`                | `<target>`                                       |
//!
//! Anything else renders as nothing.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CollationError;
use crate::xml::{split_pointers, XmlElement, XmlNode};

pub const DEFAULT_READING_TYPE: &str = "substantive";

const COMBINING_OVERLINE: char = '\u{0305}';
const COMBINING_DOT_BELOW: char = '\u{0323}';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// `xml:id`, else `n`, else the rendered text.
    pub id: String,
    pub reading_type: String,
    pub text: String,
    /// Sigla attesting this reading, `#` prefixes stripped.
    pub wits: Vec<String>,
    /// Readings this one is ambiguous between (or depends on, for overlaps).
    pub targets: Vec<String>,
    /// Normalized weight per target; sums to 1 whenever `targets` is
    /// non-empty.
    pub certainties: BTreeMap<String, f64>,
}

impl Reading {
    /// A plain substantive-style reading, mostly for programmatic use.
    pub fn new(id: impl Into<String>, reading_type: impl Into<String>, wits: Vec<String>) -> Self {
        Self {
            id: id.into(),
            reading_type: reading_type.into(),
            text: String::new(),
            wits,
            targets: Vec::new(),
            certainties: BTreeMap::new(),
        }
    }

    /// A reading distributed over `targets` with the given raw weights
    /// (normalized here; equal weights when all are zero).
    pub fn ambiguous(
        id: impl Into<String>,
        reading_type: impl Into<String>,
        wits: Vec<String>,
        weighted_targets: Vec<(String, f64)>,
    ) -> Self {
        let targets = weighted_targets.iter().map(|(t, _)| t.clone()).collect();
        let mut certainties = BTreeMap::new();
        for (target, weight) in weighted_targets {
            certainties.insert(target, weight);
        }
        let mut reading = Self {
            certainties,
            targets,
            ..Self::new(id, reading_type, wits)
        };
        reading.normalize_certainties();
        reading
    }

    pub fn from_xml(el: &XmlElement) -> Result<Self, CollationError> {
        let reading_type = el.attr("type").unwrap_or(DEFAULT_READING_TYPE).to_string();
        let wits = el.attr("wit").map(split_pointers).unwrap_or_default();

        let mut targets = Vec::new();
        let mut certainties = BTreeMap::new();
        if el.name == "witDetail" {
            targets = el.attr("target").map(split_pointers).unwrap_or_default();
            for target in &targets {
                certainties.insert(target.clone(), 0.0);
            }
            for certainty in el.elements().filter(|c| c.name == "certainty") {
                let degree = match certainty.attr("degree") {
                    Some(raw) => parse_degree(certainty, raw)?,
                    None => 1.0,
                };
                for target in certainty.attr("target").map(split_pointers).unwrap_or_default() {
                    certainties.insert(target, degree);
                }
            }
        }

        let text = render_text(el);
        let id = el
            .xml_id()
            .or_else(|| el.attr("n"))
            .map(str::to_string)
            .unwrap_or_else(|| text.clone());

        let mut reading = Self {
            id,
            reading_type,
            text,
            wits,
            targets,
            certainties,
        };
        reading.normalize_certainties();

        tracing::debug!(
            id = %reading.id,
            reading_type = %reading.reading_type,
            wits = reading.wits.len(),
            targets = ?reading.targets,
            text = %reading.text,
            "new reading"
        );
        Ok(reading)
    }

    /// True for readings whose support is distributed over other readings.
    pub fn is_targeted(&self) -> bool {
        !self.certainties.is_empty()
    }

    /// Reading-group types override the reading's own type.
    pub(crate) fn with_type(mut self, reading_type: &str) -> Self {
        self.reading_type = reading_type.to_string();
        self
    }

    /// Point an untargeted witness detail at an earlier reading, with full
    /// certainty.
    pub(crate) fn with_implicit_target(mut self, target: &str) -> Self {
        self.targets.push(target.to_string());
        self.certainties.insert(target.to_string(), 1.0);
        self.normalize_certainties();
        self
    }

    fn normalize_certainties(&mut self) {
        let mut norm: f64 = self.certainties.values().sum();
        if norm == 0.0 && !self.targets.is_empty() {
            for target in &self.targets {
                self.certainties.insert(target.clone(), 1.0);
            }
            norm = self.certainties.values().sum();
        }
        if norm > 0.0 {
            for weight in self.certainties.values_mut() {
                *weight /= norm;
            }
        }
    }
}

fn parse_degree(el: &XmlElement, raw: &str) -> Result<f64, CollationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CollationError::InvalidValue {
            element: el.name.clone(),
            attribute: "degree".to_string(),
            value: raw.to_string(),
        }),
    }
}

// ============================================================================
// Reading classification
// ============================================================================

/// How a reading type is treated under the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingClass {
    /// A distinct state with its own coordinate.
    Substantive,
    /// Collapsed into the most recent substantive reading.
    Trivial,
    /// Absence of data.
    Missing,
}

impl ReadingClass {
    pub fn classify(
        reading_type: &str,
        trivial_types: &BTreeSet<String>,
        missing_types: &BTreeSet<String>,
    ) -> Self {
        if missing_types.contains(reading_type) {
            Self::Missing
        } else if trivial_types.contains(reading_type) {
            Self::Trivial
        } else {
            Self::Substantive
        }
    }
}

// ============================================================================
// Text serialization
// ============================================================================

/// Render the contents of a reading element and trim the word-boundary
/// padding.
pub fn render_text(el: &XmlElement) -> String {
    let mut out = String::new();
    render_children(el, &mut out);
    out.trim().to_string()
}

fn render_children(el: &XmlElement, out: &mut String) {
    for node in &el.children {
        match node {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(child) => render_element(child, out),
        }
    }
}

fn render_element(el: &XmlElement, out: &mut String) {
    match el.name.as_str() {
        "w" => {
            render_children(el, out);
            out.push(' ');
        }
        "abbr" => render_children(el, out),
        "hi" => {
            let mut inner = String::new();
            render_children(el, &mut inner);
            if el.attr("rend") == Some("overline") {
                for c in inner.chars() {
                    out.push(c);
                    out.push(COMBINING_OVERLINE);
                }
            } else {
                out.push_str(&inner);
            }
        }
        "unclear" => {
            let mut inner = String::new();
            render_children(el, &mut inner);
            for c in inner.trim().chars() {
                out.push(c);
                if !c.is_whitespace() {
                    out.push(COMBINING_DOT_BELOW);
                }
            }
        }
        "ex" => {
            out.push('(');
            render_children(el, out);
            out.push(')');
        }
        "supplied" => {
            out.push('[');
            render_children(el, out);
            out.push(']');
        }
        "gap" => out.push_str(&render_omission(el, "gap", "...")),
        "space" => out.push_str(&render_omission(el, "space", "space")),
        "choice" => {
            let alternatives: Vec<String> = el
                .elements()
                .map(|alt| {
                    let mut rendered = String::new();
                    render_element(alt, &mut rendered);
                    rendered.trim().to_string()
                })
                .collect();
            out.push('[');
            out.push_str(&alternatives.join("/"));
            out.push(']');
        }
        "ref" => {
            out.push('<');
            out.push_str(el.attr("target").unwrap_or_default().trim_matches('#'));
            out.push('>');
        }
        _ => {}
    }
}

/// `[<extent> <unit> <kind> (<reason>)]`, with `placeholder` standing in for the
/// extent/unit/kind part when neither extent nor unit is given.
fn render_omission(el: &XmlElement, kind: &str, placeholder: &str) -> String {
    let size: Vec<&str> = [el.attr("extent"), el.attr("unit")]
        .into_iter()
        .flatten()
        .collect();
    let mut text = String::from("[");
    if size.is_empty() {
        text.push_str(placeholder);
    } else {
        text.push_str(&size.join(" "));
        text.push(' ');
        text.push_str(kind);
    }
    if let Some(reason) = el.attr("reason") {
        text.push_str(" (");
        text.push_str(reason);
        text.push(')');
    }
    text.push(']');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use approx::assert_relative_eq;

    fn reading(xml: &str) -> Reading {
        Reading::from_xml(&parse_document(xml).unwrap()).unwrap()
    }

    #[test]
    fn id_fallbacks() {
        assert_eq!(reading(r#"<rdg xml:id="B10K1V1U2R1" n="1"><w>παυλος</w></rdg>"#).id, "B10K1V1U2R1");
        assert_eq!(reading(r#"<rdg n="1"><w>παυλος</w></rdg>"#).id, "1");
        assert_eq!(reading("<lem><w>παυλος</w></lem>").id, "παυλος");
        assert_eq!(reading(r#"<witDetail type="lac"/>"#).id, "");
    }

    #[test]
    fn type_and_wits() {
        let r = reading(r##"<rdg n="1-v1" type="reconstructed" wit="#L2010 01*"><w>εν</w></rdg>"##);
        assert_eq!(r.reading_type, "reconstructed");
        assert_eq!(r.wits, vec!["L2010", "01*"]);
        assert_eq!(reading(r#"<rdg n="1"/>"#).reading_type, "substantive");
    }

    #[test]
    fn certainties_default_to_equal_weights() {
        let r = reading(r#"<witDetail n="W" target="1 2"/>"#);
        assert_eq!(r.targets, vec!["1", "2"]);
        assert_relative_eq!(r.certainties["1"], 0.5);
        assert_relative_eq!(r.certainties["2"], 0.5);
        assert!(r.is_targeted());
    }

    #[test]
    fn explicit_certainties_are_normalized() {
        let r = reading(
            r#"<witDetail n="W" target="1 2"><certainty target="1" degree="3"/><certainty target="2" degree="1"/></witDetail>"#,
        );
        assert_relative_eq!(r.certainties["1"], 0.75);
        assert_relative_eq!(r.certainties["2"], 0.25);
    }

    #[test]
    fn negative_degree_is_rejected() {
        let el = parse_document(r#"<witDetail target="1"><certainty target="1" degree="-2"/></witDetail>"#).unwrap();
        assert!(matches!(
            Reading::from_xml(&el),
            Err(CollationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn words_are_space_separated() {
        assert_eq!(reading("<rdg><w>εν</w><w>εφεσω</w></rdg>").text, "εν εφεσω");
        assert_eq!(reading("<rdg/>").text, "");
    }

    #[test]
    fn unclear_and_supplied() {
        assert_eq!(
            reading(r#"<rdg><w><unclear>π</unclear><supplied reason="lacuna">ρω</supplied>τον</w></rdg>"#).text,
            "π\u{0323}[ρω]τον"
        );
    }

    #[test]
    fn overline_abbreviation() {
        assert_eq!(
            reading(r#"<rdg><w><abbr><hi rend="overline">θυ</hi></abbr></w></rdg>"#).text,
            "θ\u{0305}υ\u{0305}"
        );
    }

    #[test]
    fn expansion_inside_unclear_is_dotted_with_parentheses() {
        assert_eq!(reading("<rdg><w>πα<ex>ρα</ex></w></rdg>").text, "πα(ρα)");
        assert_eq!(
            reading("<rdg><w>πα<unclear><ex>ρα</ex></unclear></w></rdg>").text,
            "πα(\u{0323}ρ\u{0323}α\u{0323})\u{0323}"
        );
    }

    #[test]
    fn gaps_and_spaces() {
        assert_eq!(
            reading(r#"<rdg><space unit="char" extent="2-4" reason="erased"/></rdg>"#).text,
            "[2-4 char space (erased)]"
        );
        assert_eq!(reading(r#"<rdg><space unit="line" extent="part"/></rdg>"#).text, "[part line space]");
        assert_eq!(reading(r#"<rdg><space reason="erased"/></rdg>"#).text, "[space (erased)]");
        assert_eq!(reading("<rdg><space/></rdg>").text, "[space]");
        assert_eq!(
            reading(r#"<rdg><gap unit="verse" extent="part" reason="lacuna"/></rdg>"#).text,
            "[part verse gap (lacuna)]"
        );
        assert_eq!(reading(r#"<rdg><gap extent="10"/></rdg>"#).text, "[10 gap]");
        assert_eq!(reading(r#"<rdg><gap reason="illegible"/></rdg>"#).text, "[... (illegible)]");
        assert_eq!(reading("<rdg><gap/></rdg>").text, "[...]");
    }

    #[test]
    fn choice_and_ref() {
        assert_eq!(
            reading("<rdg><w><choice><unclear>οτι</unclear><unclear>ετι</unclear></choice></w></rdg>").text,
            "[ο\u{0323}τ\u{0323}ι\u{0323}/ε\u{0323}τ\u{0323}ι\u{0323}]"
        );
        assert_eq!(
            reading(r##"<rdg><ref target="#B1K1V1U2"/><ref target="#B1K1V1U4"/></rdg>"##).text,
            "<B1K1V1U2><B1K1V1U4>"
        );
    }

    #[test]
    fn unknown_elements_render_nothing() {
        assert_eq!(reading("<rdg><w>a<note>skip me</note>b</w></rdg>").text, "ab");
    }

    #[test]
    fn classification_is_total() {
        let trivial: BTreeSet<String> = ["defective".to_string()].into_iter().collect();
        let missing: BTreeSet<String> = ["lac".to_string()].into_iter().collect();
        assert_eq!(ReadingClass::classify("lac", &trivial, &missing), ReadingClass::Missing);
        assert_eq!(ReadingClass::classify("defective", &trivial, &missing), ReadingClass::Trivial);
        assert_eq!(ReadingClass::classify("substantive", &trivial, &missing), ReadingClass::Substantive);
        assert_eq!(ReadingClass::classify("", &trivial, &missing), ReadingClass::Substantive);
    }
}
