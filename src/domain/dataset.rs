// ============================================================
// Layer 3 - Labeled Dataset
// ============================================================
// The classification data as the engine sees it: aligned texts
// and integer labels, plus the number of classes and the
// original label strings (index i = class i).

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::error::EngineError;

/// Which answer column of the CSV provides the labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    Predicate,
    Framenet,
}

impl LabelType {
    /// CSV column holding this label type
    pub fn column(&self) -> &'static str {
        match self {
            LabelType::Predicate => "predicate_answer",
            LabelType::Framenet  => "framenet_answer",
        }
    }
}

impl FromStr for LabelType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "predicate" => Ok(LabelType::Predicate),
            "framenet"  => Ok(LabelType::Framenet),
            other => Err(EngineError::configuration(format!(
                "label type '{other}' is not recognised; choose 'predicate' or 'framenet'"
            ))),
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelType::Predicate => write!(f, "predicate"),
            LabelType::Framenet  => write!(f, "framenet"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub texts:       Vec<String>,
    pub labels:      Vec<usize>,
    pub num_classes: usize,
    /// Label strings in encoded order
    pub classes:     Vec<String>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Build a subset from example indices, keeping the class table
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            texts:       indices.iter().map(|&i| self.texts[i].clone()).collect(),
            labels:      indices.iter().map(|&i| self.labels[i]).collect(),
            num_classes: self.num_classes,
            classes:     self.classes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_type_is_case_insensitive() {
        assert_eq!("Predicate".parse::<LabelType>().unwrap(), LabelType::Predicate);
        assert_eq!("FRAMENET".parse::<LabelType>().unwrap(), LabelType::Framenet);
    }

    #[test]
    fn test_unknown_label_type_is_configuration_error() {
        let err = "verbnet".parse::<LabelType>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_subset_keeps_alignment() {
        let ds = LabeledDataset {
            texts:       vec!["a".into(), "b".into(), "c".into()],
            labels:      vec![0, 1, 2],
            num_classes: 3,
            classes:     vec!["x".into(), "y".into(), "z".into()],
        };
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.texts, vec!["c".to_string(), "a".to_string()]);
        assert_eq!(sub.labels, vec![2, 0]);
        assert_eq!(sub.num_classes, 3);
    }
}
