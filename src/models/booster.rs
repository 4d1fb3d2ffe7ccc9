//! Boosted-tree regressor evaluation.
//!
//! The model artifact is an XGBoost JSON tree dump
//! (`Booster.dump_model(path, dump_format="json")`): an array of trees, where
//! each node is either
//!
//! - a split: `{"nodeid", "split", "split_condition", "yes", "no", "missing", "children"}`
//! - a leaf:  `{"nodeid", "leaf"}`
//!
//! Extra statistics (`gain`, `cover`, ...) are ignored.
//!
//! Evaluation follows XGBoost semantics: features and thresholds are compared
//! as `f32`, `x < split_condition` takes the `yes` branch, NaN takes the
//! `missing` branch, and the prediction is `base_score + Σ leaf`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, EstimateError};

/// One node of a dumped tree, as found in `model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DumpNode {
    Split {
        nodeid: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<u32>,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        /// Defaults to `yes` when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<u32>,
        children: Vec<DumpNode>,
    },
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
}

impl DumpNode {
    fn nodeid(&self) -> u32 {
        match self {
            DumpNode::Split { nodeid, .. } | DumpNode::Leaf { nodeid, .. } => *nodeid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf(f64),
}

/// A single regression tree stored as a flat arena; the root is at index 0.
///
/// Every child index is strictly greater than its parent's, so traversal
/// always terminates.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_dump(
        root: &DumpNode,
        tree_idx: usize,
        resolve: &dyn Fn(&str) -> Option<usize>,
    ) -> Result<Self, ArtifactError> {
        let invalid = |msg: String| ArtifactError::invalid(format!("tree {tree_idx}: {msg}"));

        if root.nodeid() != 0 {
            return Err(invalid(format!("root node id is {}, expected 0", root.nodeid())));
        }

        let mut by_id: HashMap<u32, &DumpNode> = HashMap::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if by_id.insert(node.nodeid(), node).is_some() {
                return Err(invalid(format!("duplicate node id {}", node.nodeid())));
            }
            if let DumpNode::Split { children, .. } = node {
                stack.extend(children.iter());
            }
        }

        let mut ids: Vec<u32> = by_id.keys().copied().collect();
        ids.sort_unstable();
        let slot: HashMap<u32, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let child = |parent: u32, id: u32| -> Result<usize, ArtifactError> {
            if id <= parent {
                return Err(invalid(format!("node {parent} points back to node {id}")));
            }
            slot.get(&id)
                .copied()
                .ok_or_else(|| invalid(format!("node {parent} references missing node {id}")))
        };

        let mut nodes = Vec::with_capacity(ids.len());
        for id in &ids {
            let node = match by_id[id] {
                DumpNode::Leaf { leaf, .. } => {
                    if !leaf.is_finite() {
                        return Err(invalid(format!("leaf {id} has non-finite value")));
                    }
                    Node::Leaf(*leaf)
                }
                DumpNode::Split {
                    nodeid,
                    split,
                    split_condition,
                    yes,
                    no,
                    missing,
                    ..
                } => {
                    let feature = resolve(split.as_str())
                        .ok_or_else(|| invalid(format!("node {nodeid} splits on unknown feature `{split}`")))?;
                    if split_condition.is_nan() {
                        return Err(invalid(format!("node {nodeid} has a NaN split condition")));
                    }
                    Node::Split {
                        feature,
                        threshold: *split_condition as f32,
                        yes: child(*nodeid, *yes)?,
                        no: child(*nodeid, *no)?,
                        missing: child(*nodeid, missing.unwrap_or(*yes))?,
                    }
                }
            };
            nodes.push(node);
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(v) => return v,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = features[feature];
                    idx = if x.is_nan() {
                        missing
                    } else if (x as f32) < threshold {
                        yes
                    } else {
                        no
                    };
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A boosted ensemble of regression trees over a fixed feature order.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f64,
    n_features: usize,
}

impl Forest {
    /// Build a forest from a tree dump.
    ///
    /// Split features are resolved by name against `columns`, falling back to
    /// the positional `f<N>` form XGBoost uses when trained without names.
    pub fn from_dump(dump: &[DumpNode], base_score: f64, columns: &[String]) -> Result<Self, ArtifactError> {
        if dump.is_empty() {
            return Err(ArtifactError::invalid("model has no trees"));
        }
        if !base_score.is_finite() {
            return Err(ArtifactError::invalid(format!("base_score {base_score} is not finite")));
        }

        let by_name: HashMap<&str, usize> = columns.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
        let n_features = columns.len();
        let resolve = |name: &str| -> Option<usize> {
            by_name.get(name).copied().or_else(|| {
                name.strip_prefix('f')
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&i| i < n_features)
            })
        };

        let trees = dump
            .iter()
            .enumerate()
            .map(|(i, root)| Tree::from_dump(root, i, &resolve))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            base_score,
            n_features,
        })
    }

    /// Raw margin for one ordered feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<f64, EstimateError> {
        if features.len() != self.n_features {
            return Err(EstimateError::Inference(format!(
                "feature vector has {} values, model expects {}",
                features.len(),
                self.n_features
            )));
        }

        let margin = self.base_score + self.trees.iter().map(|t| t.leaf_value(features)).sum::<f64>();
        if !margin.is_finite() {
            return Err(EstimateError::Inference("model produced a non-finite value".to_string()));
        }
        Ok(margin)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.trees.iter().map(Tree::len).sum()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<String> {
        vec!["age".to_string(), "km_driven".to_string()]
    }

    fn stump(feature: &str, cond: f64, left: f64, right: f64) -> serde_json::Value {
        json!({
            "nodeid": 0, "depth": 0, "split": feature, "split_condition": cond,
            "yes": 1, "no": 2, "missing": 1,
            "children": [
                {"nodeid": 1, "leaf": left},
                {"nodeid": 2, "leaf": right}
            ]
        })
    }

    fn forest(trees: serde_json::Value, base_score: f64) -> Result<Forest, ArtifactError> {
        let dump: Vec<DumpNode> = serde_json::from_value(trees).unwrap();
        Forest::from_dump(&dump, base_score, &columns())
    }

    #[test]
    fn sums_leaves_and_base_score() {
        let f = forest(json!([stump("age", 3.0, 10.0, -10.0), stump("km_driven", 1000.0, 1.0, 2.0)]), 0.5).unwrap();
        assert_eq!(f.predict(&[1.0, 5000.0]).unwrap(), 0.5 + 10.0 + 2.0);
        assert_eq!(f.predict(&[4.0, 10.0]).unwrap(), 0.5 - 10.0 + 1.0);
        assert_eq!(f.n_trees(), 2);
        assert_eq!(f.n_nodes(), 6);
    }

    #[test]
    fn threshold_is_strict_less_than() {
        let f = forest(json!([stump("age", 3.0, 1.0, 2.0)]), 0.0).unwrap();
        assert_eq!(f.predict(&[3.0, 0.0]).unwrap(), 2.0);
        assert_eq!(f.predict(&[2.999, 0.0]).unwrap(), 1.0);
    }

    #[test]
    fn nan_follows_missing_branch() {
        let tree = json!([{
            "nodeid": 0, "split": "age", "split_condition": 3.0,
            "yes": 1, "no": 2, "missing": 2,
            "children": [{"nodeid": 1, "leaf": 1.0}, {"nodeid": 2, "leaf": 2.0}]
        }]);
        let f = forest(tree, 0.0).unwrap();
        assert_eq!(f.predict(&[f64::NAN, 0.0]).unwrap(), 2.0);
    }

    #[test]
    fn positional_feature_names_resolve() {
        let f = forest(json!([stump("f1", 100.0, 1.0, 2.0)]), 0.0).unwrap();
        assert_eq!(f.predict(&[0.0, 50.0]).unwrap(), 1.0);
        assert!(forest(json!([stump("f7", 100.0, 1.0, 2.0)]), 0.0).is_err());
    }

    #[test]
    fn rejects_unknown_features_and_broken_links() {
        assert!(forest(json!([stump("colour", 1.0, 1.0, 2.0)]), 0.0).is_err());

        let dangling = json!([{
            "nodeid": 0, "split": "age", "split_condition": 3.0, "yes": 1, "no": 5,
            "children": [{"nodeid": 1, "leaf": 1.0}, {"nodeid": 2, "leaf": 2.0}]
        }]);
        assert!(forest(dangling, 0.0).is_err());

        let backwards = json!([{
            "nodeid": 0, "split": "age", "split_condition": 3.0, "yes": 0, "no": 1,
            "children": [{"nodeid": 1, "leaf": 1.0}]
        }]);
        assert!(forest(backwards, 0.0).is_err());

        assert!(forest(json!([]), 0.0).is_err());
    }

    #[test]
    fn wrong_vector_length_is_an_inference_error() {
        let f = forest(json!([stump("age", 3.0, 1.0, 2.0)]), 0.0).unwrap();
        assert!(matches!(f.predict(&[1.0]), Err(EstimateError::Inference(_))));
    }
}
