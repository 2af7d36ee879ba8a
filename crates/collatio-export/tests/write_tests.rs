//! Writing collations to disk.

use collatio_core::{Collation, CollationConfig, Reading, VariationUnit, Witness};
use collatio_export::{write_to_path, ExportError, ExportOptions, Format};
use tempfile::tempdir;

fn wits(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn collation() -> Collation {
    let unit = VariationUnit::new(
        "U1",
        vec![
            Reading::new("1", "substantive", wits(&["A", "B"])),
            Reading::new("2", "substantive", wits(&["C"])),
        ],
    );
    Collation::from_parts(
        vec![
            Witness::new("A", "manuscript"),
            Witness::new("B", "manuscript"),
            Witness::new("C", "manuscript"),
        ],
        vec![unit],
        CollationConfig::new(),
    )
    .expect("assemble collation")
}

#[test]
fn suffix_is_matched_case_insensitively() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ALIGNMENT.FA");
    let format = write_to_path(&collation(), &path, None, &ExportOptions::default()).unwrap();
    assert_eq!(format, Format::Fasta);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ">A\n0\n>B\n0\n>C\n1\n");
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("out.phy");
    write_to_path(&collation(), &path, None, &ExportOptions::default()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "3 1\nA\t0\nB\t0\nC\t1\n");
}

#[test]
fn unknown_suffix_lists_allowed_suffixes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let err = write_to_path(&collation(), &path, None, &ExportOptions::default()).unwrap_err();
    match err.downcast_ref::<ExportError>() {
        Some(ExportError::FormatUnknown { allowed, .. }) => {
            assert_eq!(allowed.len(), 9);
            assert!(allowed.contains(&".tnt"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn too_many_states_for_hennig86() {
    let readings = (0..33)
        .map(|i| Reading::new(i.to_string(), "substantive", wits(&[if i % 2 == 0 { "A" } else { "B" }])))
        .collect();
    let collation = Collation::from_parts(
        vec![Witness::new("A", "manuscript"), Witness::new("B", "manuscript")],
        vec![VariationUnit::new("U1", readings)],
        CollationConfig::new(),
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let err = write_to_path(&collation, dir.path().join("out.tnt"), None, &ExportOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExportError>(),
        Some(ExportError::TooManyStates { needed: 33, available: 32, .. })
    ));
    // NEXUS has room for all of them.
    write_to_path(&collation, dir.path().join("out.nex"), None, &ExportOptions::default()).unwrap();
}
