// ============================================================
// Layer 6 - Report Writers
// ============================================================
// Every CSV artifact a fit/pred call produces:
//
//   results/{model}_epochs{N}_clf_report.csv
//       ,precision,recall,f1-score,support
//       query,0.8,0.6667,0.7273,6
//       ...
//       accuracy,0.7,0.7,0.7,10
//       macro avg,...
//       weighted avg,...
//
//   results/{model}_epochs{N}_training_stats.csv
//       epoch,train_loss,train_time,val_loss,accuracy,f1
//       1,0.912345,0:00:41,,,               ← no evaluation this epoch
//       5,0.401200,0:00:40,0.455100,0.8100,0.8033
//
//   results/{model}_epochs{N}_pr_curve.csv
//       class,threshold,precision,recall,average_precision
//
//   prediction/{model_type}_{yymmdd}.csv
//       text,prediction
//
// Per-class rows use the class names from label encoding when
// they are known and the numeric id otherwise.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::records::{EpochRecord, EvaluationResult};
use crate::infra::metrics::ClassificationReport;
use crate::infra::pr_curve::PrCurve;
use crate::infra::progress::format_elapsed;

// ─── Paths ────────────────────────────────────────────────────────────────────
pub fn clf_report_path(results: &Path, model_name: &str, epochs: usize) -> PathBuf {
    results.join(format!("{model_name}_epochs{epochs}_clf_report.csv"))
}

pub fn training_stats_path(results: &Path, model_name: &str, epochs: usize) -> PathBuf {
    results.join(format!("{model_name}_epochs{epochs}_training_stats.csv"))
}

pub fn pr_curve_path(results: &Path, model_name: &str, epochs: usize) -> PathBuf {
    results.join(format!("{model_name}_epochs{epochs}_pr_curve.csv"))
}

/// `{prediction}/{model_type}_{yymmdd}.csv` for today's date
pub fn prediction_path(prediction: &Path, model_type: &str) -> PathBuf {
    let date = chrono::Local::now().format("%y%m%d");
    prediction.join(format!("{model_type}_{date}.csv"))
}

fn csv_writer(path: &Path) -> EngineResult<csv::Writer<File>> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    Ok(csv::Writer::from_writer(file))
}

fn finish(mut writer: csv::Writer<File>, path: &Path) -> EngineResult<()> {
    writer.flush().map_err(|e| EngineError::io(path, e))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn class_name(id: usize, class_names: &[String]) -> String {
    class_names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

// ─── Classification report ────────────────────────────────────────────────────
pub fn write_classification_report(
    path:        &Path,
    report:      &ClassificationReport,
    class_names: &[String],
) -> EngineResult<()> {
    let mut w = csv_writer(path)?;
    w.write_record(["", "precision", "recall", "f1-score", "support"])?;

    for c in &report.per_class {
        w.write_record([
            class_name(c.label, class_names),
            c.precision.to_string(),
            c.recall.to_string(),
            c.f1.to_string(),
            c.support.to_string(),
        ])?;
    }

    let acc = report.accuracy.to_string();
    w.write_record(["accuracy".to_string(), acc.clone(), acc.clone(), acc, report.total.to_string()])?;

    for (name, avg) in [("macro avg", &report.macro_avg), ("weighted avg", &report.weighted_avg)] {
        w.write_record([
            name.to_string(),
            avg.precision.to_string(),
            avg.recall.to_string(),
            avg.f1.to_string(),
            report.total.to_string(),
        ])?;
    }

    finish(w, path)
}

// ─── Training statistics ──────────────────────────────────────────────────────
/// One row per epoch; evaluation columns empty when none ran
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    pub record:     EpochRecord,
    pub evaluation: Option<EvalSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    pub val_loss: f64,
    pub accuracy: f64,
    pub f1:       f64,
}

impl From<&EvaluationResult> for EvalSummary {
    fn from(e: &EvaluationResult) -> Self {
        Self { val_loss: e.avg_val_loss, accuracy: e.accuracy, f1: e.f1 }
    }
}

/// Appends epoch statistics to a CSV file as training goes, so
/// an aborted run still leaves the epochs it finished.
pub struct StatsLogger {
    csv_path: PathBuf,
}

impl StatsLogger {
    /// Start a fresh file (any previous run's rows are replaced)
    pub fn create(csv_path: impl Into<PathBuf>) -> EngineResult<Self> {
        let csv_path = csv_path.into();
        let mut w = csv_writer(&csv_path)?;
        w.write_record(["epoch", "train_loss", "train_time", "val_loss", "accuracy", "f1"])?;
        finish(w, &csv_path)?;
        tracing::debug!("Created training stats CSV: '{}'", csv_path.display());
        Ok(Self { csv_path })
    }

    pub fn log(&self, stats: &EpochStats) -> EngineResult<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| EngineError::io(&self.csv_path, e))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        let r = &stats.record;
        let [val_loss, accuracy, f1] = match &stats.evaluation {
            Some(e) => [e.val_loss, e.accuracy, e.f1].map(|v| format!("{v:.6}")),
            None    => Default::default(),
        };
        w.write_record([
            r.epoch.to_string(),
            format!("{:.6}", r.avg_train_loss),
            format_elapsed(r.training_duration),
            val_loss,
            accuracy,
            f1,
        ])?;
        w.flush().map_err(|e| EngineError::io(&self.csv_path, e))?;

        tracing::debug!("Logged epoch {} stats: train_loss={:.4}", r.epoch, r.avg_train_loss);
        Ok(())
    }
}

// ─── PR curves ────────────────────────────────────────────────────────────────
pub fn write_pr_curves(path: &Path, curves: &[PrCurve], class_names: &[String]) -> EngineResult<()> {
    let mut w = csv_writer(path)?;
    w.write_record(["class", "threshold", "precision", "recall", "average_precision"])?;
    for curve in curves {
        let name = class_name(curve.class, class_names);
        let ap   = curve.average_precision.to_string();
        for p in &curve.points {
            w.write_record([
                name.clone(),
                p.threshold.to_string(),
                p.precision.to_string(),
                p.recall.to_string(),
                ap.clone(),
            ])?;
        }
    }
    finish(w, path)
}

// ─── Predictions ──────────────────────────────────────────────────────────────
/// `text,prediction` rows; an empty input still gets the header
pub fn write_predictions(path: &Path, texts: &[String], predictions: &[String]) -> EngineResult<()> {
    let mut w = csv_writer(path)?;
    w.write_record(["text", "prediction"])?;
    for (text, pred) in texts.iter().zip(predictions) {
        w.write_record([text, pred])?;
    }
    finish(w, path)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::pr_curve::PrPoint;
    use std::fs;
    use std::time::Duration;

    fn read_to_string(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_paths() {
        let dir = Path::new("out/results");
        assert_eq!(
            clf_report_path(dir, "bert", 3),
            Path::new("out/results/bert_epochs3_clf_report.csv")
        );
        let p = prediction_path(Path::new("prediction"), "bert");
        let name = p.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("bert_"));
        assert_eq!(name.len(), "bert_".len() + 6 + ".csv".len());
    }

    #[test]
    fn test_classification_report_csv() {
        let tmp    = tempfile::tempdir().unwrap();
        let path   = tmp.path().join("r.csv");
        let report = ClassificationReport::compute(&[0, 1, 1, 0], &[0, 1, 0, 0]);
        write_classification_report(&path, &report, &["neg".into(), "pos".into()]).unwrap();

        let text  = read_to_string(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",precision,recall,f1-score,support");
        assert!(lines[1].starts_with("neg,"));
        assert!(lines[2].starts_with("pos,1,0.5,"));
        assert_eq!(lines[3], "accuracy,0.75,0.75,0.75,4");
        assert!(lines[4].starts_with("macro avg,"));
        assert!(lines[5].starts_with("weighted avg,"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_stats_logger_appends_rows() {
        let tmp    = tempfile::tempdir().unwrap();
        let path   = tmp.path().join("s.csv");
        let logger = StatsLogger::create(&path).unwrap();
        let record = |epoch| EpochRecord {
            epoch,
            avg_train_loss:    0.5,
            training_duration: Duration::from_secs(61),
        };
        logger.log(&EpochStats { record: record(1), evaluation: None }).unwrap();
        logger
            .log(&EpochStats {
                record:     record(2),
                evaluation: Some(EvalSummary { val_loss: 0.25, accuracy: 0.75, f1: 0.7 }),
            })
            .unwrap();

        let text = read_to_string(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_time,val_loss,accuracy,f1");
        assert_eq!(lines[1], "1,0.500000,0:01:01,,,");
        assert_eq!(lines[2], "2,0.500000,0:01:01,0.250000,0.750000,0.700000");
    }

    #[test]
    fn test_stats_logger_create_replaces_previous_run() {
        let tmp    = tempfile::tempdir().unwrap();
        let path   = tmp.path().join("s.csv");
        let record = EpochRecord {
            epoch:             1,
            avg_train_loss:    1.0,
            training_duration: Duration::from_secs(1),
        };
        StatsLogger::create(&path).unwrap().log(&EpochStats { record: record.clone(), evaluation: None }).unwrap();
        let logger = StatsLogger::create(&path).unwrap();
        logger.log(&EpochStats { record, evaluation: None }).unwrap();

        let text = read_to_string(&path);
        assert_eq!(text, "epoch,train_loss,train_time,val_loss,accuracy,f1\n1,1.000000,0:00:01,,,\n");
    }

    #[test]
    fn test_empty_predictions_have_header_only() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("p.csv");
        write_predictions(&path, &[], &[]).unwrap();
        assert_eq!(read_to_string(&path), "text,prediction\n");
    }

    #[test]
    fn test_predictions_quote_commas() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("p.csv");
        write_predictions(&path, &["a, b".into()], &["yes".into()]).unwrap();
        assert_eq!(read_to_string(&path), "text,prediction\n\"a, b\",yes\n");
    }

    #[test]
    fn test_pr_curve_csv() {
        let tmp   = tempfile::tempdir().unwrap();
        let path  = tmp.path().join("pr.csv");
        let curve = PrCurve {
            class:             1,
            points:            vec![PrPoint { threshold: 0.9, precision: 1.0, recall: 0.5 }],
            average_precision: 0.5,
        };
        write_pr_curves(&path, &[curve], &[]).unwrap();
        let text = read_to_string(&path);
        assert_eq!(text.lines().nth(1), Some("1,0.9,1,0.5,0.5"));
    }
}
