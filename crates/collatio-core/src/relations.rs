//! Intrinsic-relation trees and root-frequency propagation.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::IntrinsicRelationsError;
use crate::variation_unit::ReadingPair;

/// A validated single-rooted tree over the readings touched by a unit's
/// intrinsic relations.
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicTree {
    root: String,
    /// parent → [(child, category)], children in edge-key order.
    children: BTreeMap<String, Vec<(String, String)>>,
}

impl IntrinsicTree {
    /// Validate `relations` as an in-tree. Returns `Ok(None)` for an empty
    /// edge set.
    pub fn from_relations(
        unit_id: &str,
        relations: &BTreeMap<ReadingPair, String>,
    ) -> Result<Option<Self>, IntrinsicRelationsError> {
        if relations.is_empty() {
            return Ok(None);
        }

        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut children: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for ((parent, child), category) in relations {
            in_degree.entry(parent.as_str()).or_insert(0);
            *in_degree.entry(child.as_str()).or_insert(0) += 1;
            children
                .entry(parent.clone())
                .or_default()
                .push((child.clone(), category.clone()));
        }

        let ambiguous: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        if !ambiguous.is_empty() {
            return Err(IntrinsicRelationsError::AmbiguousPrior {
                unit_id: unit_id.to_string(),
                readings: ambiguous,
            });
        }

        let roots: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.to_string())
            .collect();
        let root = match roots.as_slice() {
            [] => {
                return Err(IntrinsicRelationsError::Cycle {
                    unit_id: unit_id.to_string(),
                    readings: in_degree.keys().map(|id| id.to_string()).collect(),
                })
            }
            [root] => root.clone(),
            _ => {
                return Err(IntrinsicRelationsError::MultipleRoots {
                    unit_id: unit_id.to_string(),
                    roots,
                })
            }
        };

        // One root and in-degree ≤ 1 still admits a detached cycle.
        let tree = Self { root, children };
        let reached: BTreeSet<String> = tree.propagate(|_| 1.0).into_keys().collect();
        let detached: Vec<String> = in_degree
            .keys()
            .filter(|id| !reached.contains(**id))
            .map(|id| id.to_string())
            .collect();
        if !detached.is_empty() {
            return Err(IntrinsicRelationsError::Cycle {
                unit_id: unit_id.to_string(),
                readings: detached,
            });
        }
        Ok(Some(tree))
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Unnormalized frequencies: 1 at the root, and each child its parent's
    /// value divided by the odds of the connecting edge's category.
    pub fn propagate<F>(&self, odds: F) -> BTreeMap<String, f64>
    where
        F: Fn(&str) -> f64,
    {
        let mut frequencies = BTreeMap::new();
        let mut stack = vec![(self.root.clone(), 1.0)];
        while let Some((node, frequency)) = stack.pop() {
            if frequencies.contains_key(&node) {
                continue;
            }
            frequencies.insert(node.clone(), frequency);
            for (child, category) in self.children.get(&node).into_iter().flatten() {
                if !frequencies.contains_key(child) {
                    stack.push((child.clone(), frequency / odds(category)));
                }
            }
        }
        frequencies
    }

    /// Frequencies over `substantive_reading_ids`, normalized to sum to 1.
    /// Readings outside the tree get 0; `None` if nothing substantive is
    /// reached.
    pub fn root_frequencies<F>(&self, substantive_reading_ids: &[String], odds: F) -> Option<Vec<f64>>
    where
        F: Fn(&str) -> f64,
    {
        let propagated = self.propagate(odds);
        let mut frequencies: Vec<f64> = substantive_reading_ids
            .iter()
            .map(|id| propagated.get(id).copied().unwrap_or(0.0))
            .collect();
        let total: f64 = frequencies.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return None;
        }
        for frequency in &mut frequencies {
            *frequency /= total;
        }
        Some(frequencies)
    }
}

pub fn uniform_frequencies(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    vec![1.0 / len as f64; len]
}
