// ============================================================
// Layer 4 - CSV Dataset Loader
// ============================================================
// Loads labelled text from a CSV file with a header row:
//
//   text,predicate_answer,framenet_answer
//   "book a table for two",reserve,Reserving
//   "what's the weather",query,Questioning
//   ...
//
// The label type picks which answer column becomes the label:
//   predicate → predicate_answer
//   framenet  → framenet_answer
// Any other label type is a configuration error, raised before
// the file is even opened.
//
// Label encoding: the distinct label strings are sorted and
// numbered 0..num_classes, so the same set of labels always gets
// the same ids regardless of row order.

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::dataset::{LabelType, LabeledDataset};
use crate::domain::error::{EngineError, EngineResult};

pub const TEXT_COLUMN: &str = "text";

/// Load `(texts, labels, num_classes)` for the given label type name.
pub fn load_dataset(path: impl AsRef<Path>, label_type: &str) -> EngineResult<LabeledDataset> {
    let label_type: LabelType = label_type.parse()?;
    load_labeled(path.as_ref(), label_type)
}

pub fn load_labeled(path: &Path, label_type: LabelType) -> EngineResult<LabeledDataset> {
    let mut reader = open(path)?;
    let headers    = reader.headers()?.clone();
    let text_idx   = column_index(&headers, TEXT_COLUMN, path)?;
    let label_idx  = column_index(&headers, label_type.column(), path)?;

    tracing::info!("Extracting labels from {} answers in '{}'", label_type, path.display());

    let prep = Preprocessor::new();
    let mut texts      = Vec::new();
    let mut raw_labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        let text   = required_cell(&record, text_idx, TEXT_COLUMN, path)?;
        let label  = required_cell(&record, label_idx, label_type.column(), path)?;
        texts.push(prep.clean(text));
        raw_labels.push(label.to_string());
    }

    let (labels, classes) = encode_labels(&raw_labels);
    tracing::info!(
        "Loaded {} examples with {} classes from '{}'",
        texts.len(),
        classes.len(),
        path.display()
    );
    for (i, text) in texts.iter().take(5).enumerate() {
        tracing::debug!("  [{}] label={} text={:?}", i, raw_labels[i], text);
    }

    Ok(LabeledDataset { texts, labels, num_classes: classes.len(), classes })
}

/// Read only the `text` column, for prediction input.
pub fn load_texts(path: impl AsRef<Path>) -> EngineResult<Vec<String>> {
    let path       = path.as_ref();
    let mut reader = open(path)?;
    let headers    = reader.headers()?.clone();
    let text_idx   = column_index(&headers, TEXT_COLUMN, path)?;

    let prep = Preprocessor::new();
    let mut texts = Vec::new();
    for record in reader.records() {
        let record = record?;
        texts.push(prep.clean(required_cell(&record, text_idx, TEXT_COLUMN, path)?));
    }
    tracing::info!("Loaded {} texts from '{}'", texts.len(), path.display());
    Ok(texts)
}

/// Sorted distinct labels → ids. Returns (ids, class names).
pub fn encode_labels(raw: &[String]) -> (Vec<usize>, Vec<String>) {
    let classes: Vec<String> = raw.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let ids = raw.iter().map(|l| index[l.as_str()]).collect();
    (ids, classes)
}

/// Re-encode two independently loaded datasets against the sorted
/// union of their label strings, so the same id means the same
/// class in both.
pub fn unify_labels(a: LabeledDataset, b: LabeledDataset) -> (LabeledDataset, LabeledDataset) {
    let classes: Vec<String> = a
        .classes
        .iter()
        .chain(&b.classes)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let remap = |ds: LabeledDataset| LabeledDataset {
        labels:      ds.labels.iter().map(|&l| index[ds.classes[l].as_str()]).collect(),
        texts:       ds.texts,
        num_classes: classes.len(),
        classes:     classes.clone(),
    };
    (remap(a), remap(b))
}

fn open(path: &Path) -> EngineResult<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path).map_err(|e| EngineError::io(path, e))?;
    Ok(csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file))
}

/// Trimmed, non-empty cell; a short row or a blank cell is a
/// configuration error naming the file line.
fn required_cell<'r>(
    record: &'r csv::StringRecord,
    idx:    usize,
    column: &str,
    path:   &Path,
) -> EngineResult<&'r str> {
    match record.get(idx).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            Err(EngineError::configuration(format!(
                "'{}' line {}: no value in column '{}'",
                path.display(),
                line,
                column
            )))
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> EngineResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| {
            EngineError::configuration(format!(
                "'{}' has no '{}' column (found: {})",
                path.display(),
                name,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
}
