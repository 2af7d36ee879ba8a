//! The collation: witnesses, variation units, and everything derived from
//! them under a [`CollationConfig`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Instant;

use crate::config::CollationConfig;
use crate::dates::{current_year, DateRange};
use crate::error::CollationError;
use crate::relations::{uniform_frequencies, IntrinsicTree};
use crate::support::{compute_unit_support, is_lacunose, resolve_base_witness, SupportVector};
use crate::variation_unit::VariationUnit;
use crate::witness::Witness;
use crate::xml::{parse_document, split_pointers, XmlElement};

/// Elements under `sourceDesc` whose `date` children date the work itself.
const BIBLIOGRAPHIC_ELEMENTS: [&str; 3] = ["bibl", "biblStruct", "biblFull"];

/// Built once, then read-only.
#[derive(Debug, Clone)]
pub struct Collation {
    config: CollationConfig,
    witnesses: Vec<Witness>,
    witness_index_by_id: BTreeMap<String, usize>,
    variation_units: Vec<VariationUnit>,
    variation_unit_ids: Vec<String>,
    substantive_readings_by_variation_unit_id: BTreeMap<String, Vec<String>>,
    substantive_variation_unit_reading_tuples: BTreeSet<(String, String)>,
    readings_by_witness: BTreeMap<String, Vec<SupportVector>>,
    intrinsic_trees: BTreeMap<String, IntrinsicTree>,
    intrinsic_categories: Vec<String>,
    intrinsic_odds_by_id: BTreeMap<String, Option<f64>>,
    transcriptional_categories: Vec<String>,
    transcriptional_rates_by_id: BTreeMap<String, Option<f64>>,
    origin_date_range: DateRange,
    unresolved_sigla: Vec<String>,
}

impl Collation {
    pub fn load(path: impl AsRef<Path>, config: CollationConfig) -> Result<Self, CollationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CollationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&text, config)
    }

    pub fn from_xml_str(text: &str, config: CollationConfig) -> Result<Self, CollationError> {
        let root = parse_document(text)?;
        Self::from_element(&root, config)
    }

    /// Build from a parsed TEI document.
    pub fn from_element(root: &XmlElement, config: CollationConfig) -> Result<Self, CollationError> {
        config.validate()?;
        let started = Instant::now();

        let list_wit = root
            .find("listWit")
            .ok_or_else(|| CollationError::MissingWitnessList {
                sigla: attested_sigla(root),
            })?;
        let mut witnesses = list_wit
            .elements()
            .filter(|el| el.name == "witness")
            .map(Witness::from_xml)
            .collect::<Result<Vec<_>, _>>()?;
        apply_witness_dates(&mut witnesses, &config.witness_dates);

        let mut origin_date_range = parse_origin_date_range(root)?;
        reconcile_dates(&mut origin_date_range, &mut witnesses)?;

        let (intrinsic_categories, intrinsic_odds_by_id) = parse_categories(root, "intrinsic")?;
        let (transcriptional_categories, transcriptional_rates_by_id) =
            parse_categories(root, "transcriptional")?;

        let variation_units = root
            .descendants_named("app")
            .into_iter()
            .map(VariationUnit::from_xml)
            .collect::<Result<Vec<_>, _>>()?;

        let mut collation = Self::unassembled(config, witnesses, variation_units);
        collation.origin_date_range = origin_date_range;
        collation.intrinsic_categories = intrinsic_categories;
        collation.intrinsic_odds_by_id = intrinsic_odds_by_id;
        collation.transcriptional_categories = transcriptional_categories;
        collation.transcriptional_rates_by_id = transcriptional_rates_by_id;
        collation.assemble()?;

        tracing::info!(
            witnesses = collation.witnesses.len(),
            variation_units = collation.variation_units.len(),
            informative_units = collation.variation_unit_ids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collation initialized"
        );
        Ok(collation)
    }

    /// Build from records constructed in code. No origin dating or relation
    /// categories are attached; see [`Collation::with_intrinsic_odds`].
    pub fn from_parts(
        mut witnesses: Vec<Witness>,
        variation_units: Vec<VariationUnit>,
        config: CollationConfig,
    ) -> Result<Self, CollationError> {
        config.validate()?;
        apply_witness_dates(&mut witnesses, &config.witness_dates);
        let mut collation = Self::unassembled(config, witnesses, variation_units);
        collation.assemble()?;
        Ok(collation)
    }

    /// Attach a fixed odds value (or a free parameter, `None`) to an
    /// intrinsic category.
    pub fn with_intrinsic_odds(mut self, category: impl Into<String>, odds: Option<f64>) -> Self {
        let category = category.into();
        if !self.intrinsic_odds_by_id.contains_key(&category) {
            self.intrinsic_categories.push(category.clone());
        }
        self.intrinsic_odds_by_id.insert(category, odds);
        self
    }

    fn unassembled(config: CollationConfig, witnesses: Vec<Witness>, variation_units: Vec<VariationUnit>) -> Self {
        Self {
            config,
            witnesses,
            witness_index_by_id: BTreeMap::new(),
            variation_units,
            variation_unit_ids: Vec::new(),
            substantive_readings_by_variation_unit_id: BTreeMap::new(),
            substantive_variation_unit_reading_tuples: BTreeSet::new(),
            readings_by_witness: BTreeMap::new(),
            intrinsic_trees: BTreeMap::new(),
            intrinsic_categories: Vec::new(),
            intrinsic_odds_by_id: BTreeMap::new(),
            transcriptional_categories: Vec::new(),
            transcriptional_rates_by_id: BTreeMap::new(),
            origin_date_range: DateRange::default(),
            unresolved_sigla: Vec::new(),
        }
    }

    /// Index witnesses, validate relation trees, then derive support
    /// vectors, fill corrector lacunae, and drop fragmentary witnesses.
    fn assemble(&mut self) -> Result<(), CollationError> {
        self.index_witnesses();

        for unit in &self.variation_units {
            if let Some(tree) = IntrinsicTree::from_relations(&unit.id, &unit.intrinsic_relations)? {
                self.intrinsic_trees.insert(unit.id.clone(), tree);
            }
        }

        self.collect_unresolved_sigla();
        self.derive_readings_by_witness();
        if self.config.fill_corrector_lacunae {
            self.fill_corrector_lacunae();
        }
        if let Some(threshold) = self.config.fragmentary_threshold {
            self.filter_fragmentary_witnesses(threshold);
        }
        Ok(())
    }

    fn index_witnesses(&mut self) {
        self.witness_index_by_id.clear();
        for (index, witness) in self.witnesses.iter().enumerate() {
            if self.witness_index_by_id.insert(witness.id.clone(), index).is_some() {
                tracing::warn!(witness = %witness.id, "duplicate witness id; later entry wins");
            }
        }
    }

    fn collect_unresolved_sigla(&mut self) {
        let mut unresolved = BTreeSet::new();
        for reading in self.variation_units.iter().flat_map(|u| &u.readings) {
            for siglum in &reading.wits {
                let base = resolve_base_witness(
                    siglum,
                    |s| self.witness_index_by_id.contains_key(s),
                    &self.config.manuscript_suffixes,
                );
                if !self.witness_index_by_id.contains_key(&base) {
                    unresolved.insert(base);
                }
            }
        }
        self.unresolved_sigla = unresolved.into_iter().collect();
        if !self.unresolved_sigla.is_empty() {
            tracing::warn!(
                sigla = %self.unresolved_sigla.join(", "),
                "sigla in readings have no corresponding witness in the witness list"
            );
        }
    }

    fn derive_readings_by_witness(&mut self) {
        let witness_ids: Vec<String> = self.witnesses.iter().map(|w| w.id.clone()).collect();
        self.readings_by_witness = witness_ids.iter().map(|id| (id.clone(), Vec::new())).collect();
        self.variation_unit_ids.clear();
        self.substantive_readings_by_variation_unit_id.clear();
        self.substantive_variation_unit_reading_tuples.clear();

        for unit in &self.variation_units {
            let Some(support) = compute_unit_support(unit, &witness_ids, &self.config) else {
                continue;
            };
            self.variation_unit_ids.push(unit.id.clone());
            for reading_id in &support.substantive_reading_ids {
                self.substantive_variation_unit_reading_tuples
                    .insert((unit.id.clone(), reading_id.clone()));
            }
            self.substantive_readings_by_variation_unit_id
                .insert(unit.id.clone(), support.substantive_reading_ids);
            for (witness_id, vector) in support.vectors {
                if let Some(vectors) = self.readings_by_witness.get_mut(&witness_id) {
                    vectors.push(vector);
                }
            }
        }
    }

    /// Copy the base witness's vector into every all-zero slot of a
    /// corrector. The base is the configured one if it names a known
    /// witness, else the witness listed immediately before the corrector.
    fn fill_corrector_lacunae(&mut self) {
        for (index, witness) in self.witnesses.iter().enumerate() {
            if !witness.is_corrector() {
                continue;
            }
            let configured = match self.config.corrector_bases.get(&witness.id) {
                Some(base) if self.witness_index_by_id.contains_key(base.as_str()) => Some(base),
                Some(unknown) => {
                    tracing::warn!(
                        corrector = %witness.id,
                        base = %unknown,
                        "configured corrector base is not a listed witness; using the preceding witness"
                    );
                    None
                }
                None => None,
            };
            let base = match (configured, index.checked_sub(1)) {
                (Some(base), _) => base.clone(),
                (None, Some(previous)) => self.witnesses[previous].id.clone(),
                (None, None) => continue,
            };
            let Some(base_vectors) = self.readings_by_witness.get(&base).cloned() else {
                continue;
            };
            let Some(vectors) = self.readings_by_witness.get_mut(&witness.id) else {
                continue;
            };
            let mut filled = 0usize;
            for (vector, base_vector) in vectors.iter_mut().zip(base_vectors) {
                if is_lacunose(vector) {
                    *vector = base_vector;
                    filled += 1;
                }
            }
            tracing::debug!(corrector = %witness.id, base = %base, filled, "filled corrector lacunae");
        }
    }

    fn filter_fragmentary_witnesses(&mut self, threshold: f64) {
        let total = self.variation_unit_ids.len();
        if total == 0 {
            return;
        }
        let fragmentary: BTreeSet<String> = self
            .witnesses
            .iter()
            .filter(|witness| {
                let extant = self
                    .readings_by_witness
                    .get(&witness.id)
                    .map(|vectors| vectors.iter().filter(|v| !is_lacunose(v)).count())
                    .unwrap_or(0);
                (extant as f64) / (total as f64) < threshold
            })
            .map(|witness| witness.id.clone())
            .collect();
        if fragmentary.is_empty() {
            return;
        }

        self.witnesses.retain(|witness| !fragmentary.contains(&witness.id));
        self.readings_by_witness.retain(|id, _| !fragmentary.contains(id));
        self.index_witnesses();
        tracing::info!(
            threshold,
            removed = fragmentary.len(),
            witnesses = %fragmentary.iter().cloned().collect::<Vec<_>>().join(", "),
            "filtered fragmentary witnesses"
        );
    }

    pub fn config(&self) -> &CollationConfig {
        &self.config
    }

    pub fn witnesses(&self) -> &[Witness] {
        &self.witnesses
    }

    pub fn witness(&self, id: &str) -> Option<&Witness> {
        self.witness_index_by_id.get(id).map(|&index| &self.witnesses[index])
    }

    pub fn witness_index_by_id(&self) -> &BTreeMap<String, usize> {
        &self.witness_index_by_id
    }

    /// Every unit in document order, informative or not.
    pub fn variation_units(&self) -> &[VariationUnit] {
        &self.variation_units
    }

    pub fn variation_unit(&self, id: &str) -> Option<&VariationUnit> {
        self.variation_units.iter().find(|unit| unit.id == id)
    }

    /// Ids of informative units (two or more substantive readings), in
    /// document order.
    pub fn variation_unit_ids(&self) -> &[String] {
        &self.variation_unit_ids
    }

    pub fn substantive_readings_by_variation_unit_id(&self) -> &BTreeMap<String, Vec<String>> {
        &self.substantive_readings_by_variation_unit_id
    }

    pub fn substantive_readings(&self, unit_id: &str) -> Option<&[String]> {
        self.substantive_readings_by_variation_unit_id
            .get(unit_id)
            .map(Vec::as_slice)
    }

    pub fn substantive_variation_unit_reading_tuples(&self) -> &BTreeSet<(String, String)> {
        &self.substantive_variation_unit_reading_tuples
    }

    pub fn is_substantive(&self, unit_id: &str, reading_id: &str) -> bool {
        self.substantive_variation_unit_reading_tuples
            .contains(&(unit_id.to_string(), reading_id.to_string()))
    }

    /// Witness id → support vectors aligned with [`Self::variation_unit_ids`].
    pub fn readings_by_witness(&self) -> &BTreeMap<String, Vec<SupportVector>> {
        &self.readings_by_witness
    }

    pub fn support(&self, witness_id: &str, unit_id: &str) -> Option<&[f64]> {
        let position = self.variation_unit_ids.iter().position(|id| id == unit_id)?;
        self.readings_by_witness
            .get(witness_id)?
            .get(position)
            .map(Vec::as_slice)
    }

    pub fn intrinsic_categories(&self) -> &[String] {
        &self.intrinsic_categories
    }

    /// Category → fixed odds, or `None` for a free parameter.
    pub fn intrinsic_odds_by_id(&self) -> &BTreeMap<String, Option<f64>> {
        &self.intrinsic_odds_by_id
    }

    pub fn transcriptional_categories(&self) -> &[String] {
        &self.transcriptional_categories
    }

    /// Category → fixed rate, or `None` for a free parameter.
    pub fn transcriptional_rates_by_id(&self) -> &BTreeMap<String, Option<f64>> {
        &self.transcriptional_rates_by_id
    }

    pub fn origin_date_range(&self) -> DateRange {
        self.origin_date_range
    }

    /// Sorted base sigla that match no listed witness.
    pub fn unresolved_sigla(&self) -> &[String] {
        &self.unresolved_sigla
    }

    pub fn intrinsic_tree(&self, unit_id: &str) -> Option<&IntrinsicTree> {
        self.intrinsic_trees.get(unit_id)
    }

    /// Prior frequencies of an informative unit's substantive readings from
    /// its intrinsic-relation tree. Free-parameter categories count as odds
    /// 1. Uniform when the unit has no relations or the tree reaches no
    /// substantive reading.
    pub fn root_frequencies(&self, unit_id: &str) -> Option<Vec<f64>> {
        let substantive = self.substantive_readings(unit_id)?;
        let Some(tree) = self.intrinsic_trees.get(unit_id) else {
            return Some(uniform_frequencies(substantive.len()));
        };
        let odds = |category: &str| match self.intrinsic_odds_by_id.get(category) {
            Some(Some(odds)) => *odds,
            Some(None) => 1.0,
            None => {
                tracing::warn!(unit = %unit_id, category, "unknown intrinsic category; using odds 1");
                1.0
            }
        };
        Some(
            tree.root_frequencies(substantive, odds)
                .unwrap_or_else(|| uniform_frequencies(substantive.len())),
        )
    }

    /// Uniform frequencies over an informative unit's substantive readings.
    pub fn equilibrium_frequencies(&self, unit_id: &str) -> Option<Vec<f64>> {
        self.substantive_readings(unit_id)
            .map(|readings| uniform_frequencies(readings.len()))
    }
}

/// Distinct sigla named by `rdg`, `rdgGrp`, and `witDetail` elements, sorted.
fn attested_sigla(root: &XmlElement) -> Vec<String> {
    let mut sigla = BTreeSet::new();
    for name in ["rdg", "rdgGrp", "witDetail"] {
        for el in root.descendants_named(name) {
            sigla.extend(el.attr("wit").map(split_pointers).unwrap_or_default());
        }
    }
    sigla.into_iter().collect()
}

fn parse_origin_date_range(root: &XmlElement) -> Result<DateRange, CollationError> {
    let mut dates = Vec::new();
    for source_desc in root.descendants_named("sourceDesc") {
        collect_bibliographic_dates(source_desc, false, &mut dates);
    }
    let mut range = DateRange::default();
    for date in dates {
        range.apply_attributes(date)?;
    }
    Ok(range)
}

fn collect_bibliographic_dates<'a>(el: &'a XmlElement, in_bibl: bool, out: &mut Vec<&'a XmlElement>) {
    for child in el.elements() {
        if in_bibl && child.name == "date" {
            out.push(child);
        }
        let in_bibl = in_bibl || BIBLIOGRAPHIC_ELEMENTS.contains(&child.name.as_str());
        collect_bibliographic_dates(child, in_bibl, out);
    }
}

/// Replace witness date ranges with configured ones. An unset upper bound
/// means the current year.
fn apply_witness_dates(witnesses: &mut [Witness], overrides: &BTreeMap<String, DateRange>) {
    for witness in witnesses.iter_mut() {
        if let Some(range) = overrides.get(&witness.id) {
            witness.date_range = DateRange::new(range.lower, range.upper.or_else(|| Some(current_year())));
        }
    }
    for id in overrides.keys() {
        if !witnesses.iter().any(|w| &w.id == id) {
            tracing::warn!(witness = %id, "dated witness is not in the witness list");
        }
    }
}

/// Check witnesses against the earliest origin date, then tighten whichever
/// side is underdetermined.
fn reconcile_dates(origin: &mut DateRange, witnesses: &mut [Witness]) -> Result<(), CollationError> {
    if let Some(origin_lower) = origin.lower {
        let too_early: Vec<(String, i32)> = witnesses
            .iter()
            .filter_map(|w| {
                w.date_range
                    .upper
                    .filter(|upper| *upper < origin_lower)
                    .map(|upper| (w.id.clone(), upper))
            })
            .collect();
        if !too_early.is_empty() {
            return Err(CollationError::WitnessDate {
                origin_lower,
                witnesses: too_early,
            });
        }
    }

    match origin.upper {
        None => {
            origin.upper = witnesses
                .iter()
                .filter_map(|w| w.date_range.earliest_bound())
                .min();
        }
        Some(origin_upper) => {
            for witness in witnesses.iter_mut() {
                let range = &mut witness.date_range;
                let lower = range.lower.map_or(origin_upper, |lower| lower.max(origin_upper));
                range.lower = Some(lower);
                range.upper = Some(range.upper.map_or(lower, |upper| upper.max(lower)));
            }
        }
    }
    Ok(())
}

/// `interp` ids under `interpGrp[@type=kind]` in document order, with the
/// first `certainty/@degree` of each.
fn parse_categories(
    root: &XmlElement,
    kind: &str,
) -> Result<(Vec<String>, BTreeMap<String, Option<f64>>), CollationError> {
    let mut categories = Vec::new();
    let mut values = BTreeMap::new();
    for group in root
        .descendants_named("interpGrp")
        .into_iter()
        .filter(|group| group.attr("type") == Some(kind))
    {
        for interp in group.elements().filter(|el| el.name == "interp") {
            let Some(id) = interp.xml_id() else {
                continue;
            };
            let degree = interp
                .elements()
                .filter(|el| el.name == "certainty")
                .find_map(|certainty| certainty.attr("degree").map(|raw| (certainty, raw)));
            let value = match degree {
                Some((certainty, raw)) => Some(parse_positive(certainty, raw)?),
                None => None,
            };
            if !values.contains_key(id) {
                categories.push(id.to_string());
            }
            values.insert(id.to_string(), value);
        }
    }
    tracing::debug!(kind, categories = categories.len(), "parsed relation categories");
    Ok((categories, values))
}

fn parse_positive(el: &XmlElement, raw: &str) -> Result<f64, CollationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(CollationError::InvalidValue {
            element: el.name.clone(),
            attribute: "degree".to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::IntrinsicRelationsError;
    use crate::reading::Reading;
    use approx::assert_relative_eq;

    fn wits(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn two_reading_unit(id: &str, first: &[&str], second: &[&str]) -> VariationUnit {
        VariationUnit::new(
            id,
            vec![
                Reading::new("1", "substantive", wits(first)),
                Reading::new("2", "substantive", wits(second)),
            ],
        )
    }

    #[test]
    fn missing_list_wit_names_attested_sigla() {
        let err = Collation::from_xml_str(
            r##"<TEI><text><body><app n="1">
                <rdg n="1" wit="#B #A*"/><rdgGrp wit="#C"><rdg n="2" wit="#A"/></rdgGrp>
            </app></body></text></TEI>"##,
            CollationConfig::new(),
        )
        .unwrap_err();
        match err {
            CollationError::MissingWitnessList { sigla } => assert_eq!(sigla, wits(&["A", "A*", "B", "C"])),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrector_takes_previous_witness_where_lacunose() {
        let witnesses = vec![
            Witness::new("A", "manuscript"),
            Witness::new("AC", "corrector"),
            Witness::new("B", "manuscript"),
        ];
        let units = vec![
            two_reading_unit("U1", &["A"], &["B"]),
            two_reading_unit("U2", &["A", "B"], &["AC"]),
        ];
        let config = CollationConfig::new().with_fill_corrector_lacunae(true);
        let collation = Collation::from_parts(witnesses, units, config).unwrap();
        assert_eq!(collation.support("AC", "U1").unwrap(), &[1.0, 0.0]);
        assert_eq!(collation.support("AC", "U2").unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn configured_corrector_base_overrides_position() {
        let witnesses = vec![
            Witness::new("A", "manuscript"),
            Witness::new("B", "manuscript"),
            Witness::new("AC", "corrector"),
        ];
        let units = vec![two_reading_unit("U1", &["A"], &["B"])];
        let config = CollationConfig::new()
            .with_fill_corrector_lacunae(true)
            .with_corrector_base("AC", "A");
        let collation = Collation::from_parts(witnesses, units, config).unwrap();
        assert_eq!(collation.support("AC", "U1").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn corrector_listed_first_stays_lacunose() {
        let witnesses = vec![
            Witness::new("AC", "corrector"),
            Witness::new("A", "manuscript"),
            Witness::new("B", "manuscript"),
        ];
        let units = vec![two_reading_unit("U1", &["A"], &["B"])];
        let config = CollationConfig::new().with_fill_corrector_lacunae(true);
        let collation = Collation::from_parts(witnesses, units, config).unwrap();
        assert_eq!(collation.support("AC", "U1").unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn unknown_corrector_base_falls_back_to_position() {
        let witnesses = vec![
            Witness::new("A", "manuscript"),
            Witness::new("B", "manuscript"),
            Witness::new("AC", "corrector"),
        ];
        let units = vec![two_reading_unit("U1", &["A"], &["B"])];
        let config = CollationConfig::new()
            .with_fill_corrector_lacunae(true)
            .with_corrector_base("AC", "Typo");
        let collation = Collation::from_parts(witnesses, units, config).unwrap();
        assert_eq!(collation.support("AC", "U1").unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn correctors_untouched_without_flag() {
        let witnesses = vec![Witness::new("A", "manuscript"), Witness::new("AC", "corrector")];
        let units = vec![two_reading_unit("U1", &["A"], &[])];
        let collation = Collation::from_parts(witnesses, units, CollationConfig::new()).unwrap();
        assert_eq!(collation.support("AC", "U1").unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn invalid_intrinsic_tree_aborts_construction() {
        let unit = two_reading_unit("U1", &["A"], &["B"])
            .with_intrinsic_relation("1", "2", "A")
            .with_intrinsic_relation("2", "1", "A");
        let err = Collation::from_parts(
            vec![Witness::new("A", "manuscript"), Witness::new("B", "manuscript")],
            vec![unit],
            CollationConfig::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CollationError::IntrinsicRelations(IntrinsicRelationsError::Cycle { ref unit_id, .. }) if unit_id == "U1"
        ));
    }

    #[test]
    fn root_frequencies_use_category_odds() {
        let unit = two_reading_unit("U1", &["A"], &["B"]).with_intrinsic_relation("1", "2", "RatingB");
        let collation = Collation::from_parts(
            vec![Witness::new("A", "manuscript"), Witness::new("B", "manuscript")],
            vec![unit, two_reading_unit("U2", &["A"], &["B"])],
            CollationConfig::new(),
        )
        .unwrap()
        .with_intrinsic_odds("RatingB", Some(2.0));
        let frequencies = collation.root_frequencies("U1").unwrap();
        assert_relative_eq!(frequencies[0], 2.0 / 3.0);
        assert_relative_eq!(frequencies[1], 1.0 / 3.0);
        assert_eq!(collation.root_frequencies("U2").unwrap(), vec![0.5, 0.5]);
        assert_eq!(collation.equilibrium_frequencies("U1").unwrap(), vec![0.5, 0.5]);
        assert_eq!(collation.root_frequencies("nope"), None);
    }

    #[test]
    fn free_parameter_odds_are_neutral() {
        let unit = two_reading_unit("U1", &["A"], &["B"]).with_intrinsic_relation("1", "2", "RatingC");
        let collation = Collation::from_parts(
            vec![Witness::new("A", "manuscript"), Witness::new("B", "manuscript")],
            vec![unit],
            CollationConfig::new(),
        )
        .unwrap()
        .with_intrinsic_odds("RatingC", None);
        assert_eq!(collation.root_frequencies("U1").unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn fragmentary_witnesses_are_dropped() {
        let witnesses = vec![
            Witness::new("A", "manuscript"),
            Witness::new("B", "manuscript"),
            Witness::new("F", "manuscript"),
        ];
        let units = vec![
            two_reading_unit("U1", &["A", "F"], &["B"]),
            two_reading_unit("U2", &["A"], &["B"]),
            two_reading_unit("U3", &["A"], &["B"]),
        ];
        let config = CollationConfig::new().with_fragmentary_threshold(0.5);
        let collation = Collation::from_parts(witnesses, units, config).unwrap();
        let ids: Vec<_> = collation.witnesses().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(!collation.readings_by_witness().contains_key("F"));
        assert!(collation.witness("F").is_none());
        assert_eq!(collation.witness("B").map(|w| w.id.as_str()), Some("B"));
    }

    #[test]
    fn witness_dated_before_origin_is_rejected() {
        let err = Collation::from_xml_str(
            r##"<TEI><teiHeader><fileDesc><sourceDesc>
                <bibl><date notBefore="50" notAfter="60"/></bibl>
                <listWit>
                    <witness n="early"><origDate notAfter="40"/></witness>
                    <witness n="late"><origDate notBefore="300" notAfter="400"/></witness>
                </listWit>
            </sourceDesc></fileDesc></teiHeader></TEI>"##,
            CollationConfig::new(),
        )
        .unwrap_err();
        match err {
            CollationError::WitnessDate { origin_lower, witnesses } => {
                assert_eq!(origin_lower, 50);
                assert_eq!(witnesses, vec![("early".to_string(), 40)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn origin_upper_bound_raises_witness_lower_bounds() {
        let collation = Collation::from_xml_str(
            r##"<TEI><teiHeader><fileDesc><sourceDesc>
                <biblStruct><monogr><imprint><date notBefore="50" notAfter="60"/></imprint></monogr></biblStruct>
                <listWit>
                    <witness n="A"><origDate notAfter="400"/></witness>
                    <witness n="B"><origDate notBefore="10" notAfter="55"/></witness>
                </listWit>
            </sourceDesc></fileDesc></teiHeader></TEI>"##,
            CollationConfig::new(),
        )
        .unwrap();
        assert_eq!(collation.origin_date_range(), DateRange::new(Some(50), Some(60)));
        assert_eq!(collation.witness("A").unwrap().date_range, DateRange::new(Some(60), Some(400)));
        assert_eq!(collation.witness("B").unwrap().date_range, DateRange::new(Some(60), Some(60)));
    }

    #[test]
    fn configured_witness_dates_replace_orig_date() {
        let tei = r##"<TEI><teiHeader><fileDesc><sourceDesc>
                <bibl><date notBefore="50" notAfter="60"/></bibl>
                <listWit>
                    <witness n="A"><origDate notBefore="300" notAfter="400"/></witness>
                    <witness n="B"><origDate notAfter="40"/></witness>
                </listWit>
            </sourceDesc></fileDesc></teiHeader></TEI>"##;
        let config = CollationConfig::new()
            .with_witness_dates("A", Some(20), Some(90))
            .with_witness_dates("B", Some(500), None);
        let collation = Collation::from_xml_str(tei, config).unwrap();
        assert_eq!(collation.witness("A").unwrap().date_range, DateRange::new(Some(60), Some(90)));
        assert_eq!(
            collation.witness("B").unwrap().date_range,
            DateRange::new(Some(500), Some(current_year()))
        );

        // Without the overrides B predates the work.
        assert!(matches!(
            Collation::from_xml_str(tei, CollationConfig::new()),
            Err(CollationError::WitnessDate { .. })
        ));
    }

    #[test]
    fn inverted_witness_dates_abort_construction() {
        let err = Collation::from_parts(
            vec![Witness::new("A", "manuscript")],
            vec![],
            CollationConfig::new().with_witness_dates("A", Some(400), Some(300)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CollationError::Config(ConfigError::WitnessDateRange { lower: 400, upper: 300, .. })
        ));
    }

    #[test]
    fn origin_upper_bound_falls_back_to_earliest_witness() {
        let collation = Collation::from_xml_str(
            r##"<TEI><listWit>
                <witness n="A"><origDate notBefore="300" notAfter="400"/></witness>
                <witness n="B"><origDate when="250"/></witness>
            </listWit></TEI>"##,
            CollationConfig::new(),
        )
        .unwrap();
        assert_eq!(collation.origin_date_range(), DateRange::new(None, Some(250)));
    }

    #[test]
    fn relation_categories_with_degrees() {
        let collation = Collation::from_xml_str(
            r##"<TEI><listWit><witness n="A"/></listWit>
                <interpGrp type="intrinsic">
                    <interp xml:id="RatingA"><certainty locus="value" degree="19"/></interp>
                    <interp xml:id="RatingB"/>
                    <interp n="ignored"/>
                </interpGrp>
                <interpGrp type="transcriptional">
                    <interp xml:id="Byz"><certainty degree="1.5"/></interp>
                </interpGrp>
            </TEI>"##,
            CollationConfig::new(),
        )
        .unwrap();
        assert_eq!(collation.intrinsic_categories(), &wits(&["RatingA", "RatingB"]));
        assert_eq!(collation.intrinsic_odds_by_id()["RatingA"], Some(19.0));
        assert_eq!(collation.intrinsic_odds_by_id()["RatingB"], None);
        assert_eq!(collation.transcriptional_rates_by_id()["Byz"], Some(1.5));
    }

    #[test]
    fn zero_degree_category_is_invalid() {
        let err = Collation::from_xml_str(
            r##"<TEI><listWit><witness n="A"/></listWit>
                <interpGrp type="intrinsic"><interp xml:id="R"><certainty degree="0"/></interp></interpGrp>
            </TEI>"##,
            CollationConfig::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CollationError::InvalidValue { .. }));
    }
}
