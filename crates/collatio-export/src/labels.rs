//! ASCII-safe labels for taxa, characters, and states.

use collatio_core::Collation;

use crate::format::Format;

/// Label for a reading with no text.
pub const OMISSION_LABEL: &str = "om.";

/// Keep ASCII alphanumerics, `_`, and `-`; everything else becomes `_`.
pub fn sanitize_label(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

/// A state label for reading text: Greek is transliterated, combining marks
/// and editorial punctuation are dropped, runs of separators collapse to a
/// single `_`. Text with nothing left is labelled [`OMISSION_LABEL`].
pub fn reading_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;
    for c in text.chars() {
        if is_combining_mark(c) {
            continue;
        }
        if let Some(latin) = transliterate_greek(c) {
            push_with_separator(&mut out, &mut pending_separator, latin);
        } else if c.is_ascii_alphanumeric() || c == '-' {
            push_with_separator(&mut out, &mut pending_separator, c.encode_utf8(&mut [0; 4]));
        } else {
            pending_separator = true;
        }
    }
    if out.is_empty() {
        OMISSION_LABEL.to_string()
    } else {
        out
    }
}

fn push_with_separator(out: &mut String, pending_separator: &mut bool, piece: &str) {
    if *pending_separator && !out.is_empty() {
        out.push('_');
    }
    *pending_separator = false;
    out.push_str(piece);
}

/// Taxon labels in witness order. Hennig86 names must start with a letter,
/// so other ids get a `WIT_` prefix there.
pub fn taxon_labels(collation: &Collation, format: Format) -> Vec<String> {
    collation
        .witnesses()
        .iter()
        .map(|witness| {
            let label = sanitize_label(&witness.id);
            let starts_with_letter = label.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
            if format == Format::Hennig86 && !starts_with_letter {
                format!("WIT_{label}")
            } else {
                label
            }
        })
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn transliterate_greek(c: char) -> Option<&'static str> {
    let latin = match c {
        'α' | 'ά' => "a",
        'β' => "b",
        'γ' => "g",
        'δ' => "d",
        'ε' | 'έ' => "e",
        'ζ' => "z",
        'η' | 'ή' => "h",
        'θ' => "th",
        'ι' | 'ί' | 'ϊ' => "i",
        'κ' => "k",
        'λ' => "l",
        'μ' => "m",
        'ν' => "n",
        'ξ' => "x",
        'ο' | 'ό' => "o",
        'π' => "p",
        'ρ' => "r",
        'σ' | 'ς' => "s",
        'τ' => "t",
        'υ' | 'ύ' | 'ϋ' => "u",
        'φ' => "ph",
        'χ' => "ch",
        'ψ' => "ps",
        'ω' | 'ώ' => "w",
        'Α' => "A",
        'Β' => "B",
        'Γ' => "G",
        'Δ' => "D",
        'Ε' => "E",
        'Ζ' => "Z",
        'Η' => "H",
        'Θ' => "TH",
        'Ι' => "I",
        'Κ' => "K",
        'Λ' => "L",
        'Μ' => "M",
        'Ν' => "N",
        'Ξ' => "X",
        'Ο' => "O",
        'Π' => "P",
        'Ρ' => "R",
        'Σ' => "S",
        'Τ' => "T",
        'Υ' => "U",
        'Φ' => "PH",
        'Χ' => "CH",
        'Ψ' => "PS",
        'Ω' => "W",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize_label("B10K1V1U24-26"), "B10K1V1U24-26");
        assert_eq!(sanitize_label("01*"), "01_");
        assert_eq!(sanitize_label("L 60"), "L_60");
        assert_eq!(sanitize_label(""), "_");
    }

    #[test]
    fn greek_readings_are_transliterated() {
        assert_eq!(reading_label("εν εφεσω"), "en_ephesw");
        assert_eq!(reading_label("θ\u{0305}υ\u{0305}"), "thu");
        assert_eq!(reading_label("π\u{0323}[ρω]τον"), "p_rw_ton");
    }

    #[test]
    fn empty_or_editorial_only_text_is_an_omission() {
        assert_eq!(reading_label(""), "om.");
        assert_eq!(reading_label("[...]"), "om.");
    }

    #[test]
    fn latin_text_keeps_words() {
        assert_eq!(reading_label("in Epheso"), "in_Epheso");
        assert_eq!(reading_label("<B1K1V1U2>"), "B1K1V1U2");
    }
}
