//! Variation units: the readings at one point of variation, plus the
//! relations declared between them.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dates::parse_year_value;
use crate::error::CollationError;
use crate::reading::Reading;
use crate::xml::{split_pointers, XmlElement};

/// Ordered (source reading, target reading) pair.
pub type ReadingPair = (String, String);

/// Literal `(notBefore, notAfter)` bounds of a transcriptional relation.
pub type DateKey = (Option<i32>, Option<i32>);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariationUnit {
    pub id: String,
    pub analysis_categories: Vec<String>,
    /// Document order, reading groups flattened.
    pub readings: Vec<Reading>,
    /// (prior reading, posterior reading) → intrinsic category.
    pub intrinsic_relations: BTreeMap<ReadingPair, String>,
    /// Date key → (source, target) → distinct transcriptional categories in
    /// first-seen order.
    pub transcriptional_relations_by_date_range: BTreeMap<DateKey, BTreeMap<ReadingPair, Vec<String>>>,
}

impl VariationUnit {
    pub fn new(id: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            id: id.into(),
            readings,
            ..Self::default()
        }
    }

    pub fn with_intrinsic_relation(
        mut self,
        prior: impl Into<String>,
        posterior: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.intrinsic_relations
            .insert((prior.into(), posterior.into()), category.into());
        self
    }

    /// Build a unit from an `app` element.
    pub fn from_xml(el: &XmlElement) -> Result<Self, CollationError> {
        let id = match (el.xml_id(), el.attr("n")) {
            (Some(id), _) => id.to_string(),
            (None, Some(n)) => match (el.attr("from"), el.attr("to")) {
                (Some(from), Some(to)) => format!("{n}_{from}_{to}"),
                _ => n.to_string(),
            },
            (None, None) => String::new(),
        };
        let analysis_categories = el.attr("ana").map(split_pointers).unwrap_or_default();

        let mut unit = Self {
            id,
            analysis_categories,
            ..Self::default()
        };
        for child in el.elements() {
            unit.visit(child)?;
        }

        tracing::debug!(
            id = %unit.id,
            readings = unit.readings.len(),
            intrinsic_relations = unit.intrinsic_relations.len(),
            "new variation unit"
        );
        Ok(unit)
    }

    /// All reading ids in document order.
    pub fn reading_ids(&self) -> impl Iterator<Item = &str> {
        self.readings.iter().map(|r| r.id.as_str())
    }

    pub fn reading(&self, id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.id == id)
    }

    fn visit(&mut self, el: &XmlElement) -> Result<(), CollationError> {
        match el.name.as_str() {
            "rdgGrp" => self.visit_group(el)?,
            // A lemma without its own witness list duplicates a rdg.
            "lem" if el.attr("wit").is_none() => {}
            "lem" | "rdg" => self.readings.push(Reading::from_xml(el)?),
            "witDetail" => {
                let mut detail = Reading::from_xml(el)?;
                if detail.targets.is_empty() {
                    let previous = self
                        .readings
                        .iter()
                        .rev()
                        .find(|r| r.targets.is_empty())
                        .map(|r| r.id.clone());
                    if let Some(previous) = previous {
                        detail = detail.with_implicit_target(&previous);
                    }
                }
                self.readings.push(detail);
            }
            "note" => {
                for child in el.elements() {
                    self.visit(child)?;
                }
            }
            "listRelation" => match el.attr("type") {
                Some("intrinsic") => self.parse_intrinsic_relations(el),
                Some("transcriptional") => self.parse_transcriptional_relations(el)?,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn visit_group(&mut self, group: &XmlElement) -> Result<(), CollationError> {
        let group_type = group.attr("type");
        for child in group.elements() {
            match child.name.as_str() {
                "lem" | "rdg" => {
                    let reading = Reading::from_xml(child)?;
                    self.readings.push(match group_type {
                        Some(t) => reading.with_type(t),
                        None => reading,
                    });
                }
                _ => self.visit(child)?,
            }
        }
        Ok(())
    }

    fn parse_intrinsic_relations(&mut self, list: &XmlElement) {
        self.intrinsic_relations.clear();
        for relation in list.elements().filter(|r| r.name == "relation") {
            let Some((actives, passives, categories)) = relation_endpoints(relation) else {
                continue;
            };
            let Some(category) = categories.into_iter().next() else {
                continue;
            };
            for active in &actives {
                for passive in &passives {
                    self.intrinsic_relations
                        .insert((active.clone(), passive.clone()), category.clone());
                }
            }
        }
    }

    fn parse_transcriptional_relations(&mut self, list: &XmlElement) -> Result<(), CollationError> {
        self.transcriptional_relations_by_date_range.clear();
        for relation in list.elements().filter(|r| r.name == "relation") {
            let Some((actives, passives, categories)) = relation_endpoints(relation) else {
                continue;
            };
            let key = (
                relation_year(relation, "notBefore")?,
                relation_year(relation, "notAfter")?,
            );
            let by_pair = self
                .transcriptional_relations_by_date_range
                .entry(key)
                .or_default();
            for active in &actives {
                for passive in &passives {
                    let existing = by_pair
                        .entry((active.clone(), passive.clone()))
                        .or_default();
                    for category in &categories {
                        if !existing.contains(category) {
                            existing.push(category.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// `active`, `passive`, and `ana` pointer lists; `None` unless all three are
/// present.
fn relation_endpoints(relation: &XmlElement) -> Option<(Vec<String>, Vec<String>, Vec<String>)> {
    Some((
        split_pointers(relation.attr("active")?),
        split_pointers(relation.attr("passive")?),
        split_pointers(relation.attr("ana")?),
    ))
}

fn relation_year(relation: &XmlElement, attribute: &str) -> Result<Option<i32>, CollationError> {
    relation
        .attr(attribute)
        .map(|raw| {
            parse_year_value(raw).ok_or_else(|| CollationError::InvalidValue {
                element: relation.name.clone(),
                attribute: attribute.to_string(),
                value: raw.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use approx::assert_relative_eq;

    fn unit(xml: &str) -> VariationUnit {
        VariationUnit::from_xml(&parse_document(xml).unwrap()).unwrap()
    }

    #[test]
    fn id_from_xml_id_or_n_with_location() {
        assert_eq!(unit(r#"<app xml:id="B10K1V1U24-26" n="B10K1V1"/>"#).id, "B10K1V1U24-26");
        assert_eq!(unit(r#"<app n="B10K1V1" from="24" to="26"/>"#).id, "B10K1V1_24_26");
        assert_eq!(unit(r#"<app n="B10K1V1"/>"#).id, "B10K1V1");
        assert_eq!(unit("<app/>").id, "");
    }

    #[test]
    fn analysis_categories_strip_pointers() {
        let u = unit(r##"<app n="1" ana="#lexical #major"/>"##);
        assert_eq!(u.analysis_categories, vec!["lexical", "major"]);
    }

    #[test]
    fn lemma_without_witnesses_is_skipped() {
        let u = unit(
            r##"<app n="1"><lem><w>a</w></lem><rdg n="1" wit="#A"><w>a</w></rdg><rdg n="2" wit="#B"><w>b</w></rdg></app>"##,
        );
        assert_eq!(u.reading_ids().collect::<Vec<_>>(), vec!["1", "2"]);

        let with_wits = unit(r##"<app n="1"><lem n="0" wit=""><w>a</w></lem><rdg n="1" wit="#A"/></app>"##);
        assert_eq!(with_wits.readings.len(), 2);
    }

    #[test]
    fn reading_groups_push_down_their_type() {
        let u = unit(
            r##"<app n="1">
                <rdgGrp type="substantive">
                    <rdg n="1" type="defective" wit="#A"/>
                    <rdgGrp type="orthographic"><rdg n="1o" wit="#B"/></rdgGrp>
                </rdgGrp>
                <rdgGrp><rdg n="2" type="reconstructed" wit="#C"/></rdgGrp>
            </app>"##,
        );
        let types: Vec<_> = u.readings.iter().map(|r| r.reading_type.as_str()).collect();
        assert_eq!(types, vec!["substantive", "orthographic", "reconstructed"]);
    }

    #[test]
    fn untargeted_witness_detail_points_at_previous_plain_reading() {
        let u = unit(
            r##"<app n="1">
                <rdg n="1" wit="#A"/>
                <witDetail n="W1" wit="#B" target="#1"/>
                <witDetail n="W2" wit="#C"/>
            </app>"##,
        );
        let w2 = u.reading("W2").unwrap();
        assert_eq!(w2.targets, vec!["1"]);
        assert_relative_eq!(w2.certainties["1"], 1.0);
    }

    #[test]
    fn intrinsic_relations_cross_product() {
        let u = unit(
            r##"<app n="1">
                <rdg n="1"/><rdg n="2"/><rdg n="3"/>
                <note>
                    <listRelation type="intrinsic">
                        <relation active="#1" passive="#2 #3" ana="#RatingA"/>
                        <relation active="#2" ana="#RatingB"/>
                    </listRelation>
                </note>
            </app>"##,
        );
        assert_eq!(u.intrinsic_relations.len(), 2);
        assert_eq!(u.intrinsic_relations[&("1".into(), "3".into())], "RatingA");
    }

    #[test]
    fn transcriptional_relations_keyed_by_literal_dates() {
        let u = unit(
            r##"<app n="1">
                <rdg n="1"/><rdg n="2"/>
                <note>
                    <listRelation type="transcriptional">
                        <relation active="#1" passive="#2" ana="#Byz #Harm"/>
                        <relation active="#1" passive="#2" ana="#Harm" notBefore="300"/>
                        <relation active="#2" passive="#1" ana="#Clar #Clar" notBefore="300"/>
                    </listRelation>
                </note>
            </app>"##,
        );
        let by_date = &u.transcriptional_relations_by_date_range;
        assert_eq!(by_date.len(), 2);
        assert_eq!(by_date[&(None, None)][&("1".into(), "2".into())], vec!["Byz", "Harm"]);
        let later = &by_date[&(Some(300), None)];
        assert_eq!(later[&("1".into(), "2".into())], vec!["Harm"]);
        assert_eq!(later[&("2".into(), "1".into())], vec!["Clar"]);
    }

    #[test]
    fn malformed_relation_date_is_an_error() {
        let el = parse_document(
            r##"<app n="1"><listRelation type="transcriptional"><relation active="#1" passive="#2" ana="#X" notAfter="soon"/></listRelation></app>"##,
        )
        .unwrap();
        assert!(VariationUnit::from_xml(&el).is_err());
    }
}
