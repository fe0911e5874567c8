use chrono::{DateTime, Local};
use cogex_core::Phase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::session::SessionReport;
use crate::task::Task;

/// Written in the response column of unanswered trials.
pub const NO_RESPONSE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Csv,
    Json,
}

impl ResultFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ResultFormat::Csv => "csv",
            ResultFormat::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Columns before the task's stimulus columns.
const LEADING_COLUMNS: [&str; 3] = ["phase", "block", "trial_index"];
/// Columns after the task's stimulus columns.
const TRAILING_COLUMNS: [&str; 4] = ["response", "latency_ms", "ground_truth", "is_correct"];

/// One tabular row per presented trial. `stimulus` holds one value per
/// [`Task::stimulus_columns`] entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub phase: Phase,
    pub block: usize,
    pub trial_index: usize,
    pub stimulus: Vec<String>,
    pub response: String,
    pub latency_ms: Option<f64>,
    pub ground_truth: String,
    pub is_correct: bool,
}

impl ResultRow {
    fn csv_record(&self) -> Vec<String> {
        let mut record = vec![
            self.phase.to_string(),
            self.block.to_string(),
            self.trial_index.to_string(),
        ];
        record.extend(self.stimulus.iter().cloned());
        record.extend([
            self.response.clone(),
            self.latency_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            self.ground_truth.clone(),
            self.is_correct.to_string(),
        ]);
        record
    }

    fn json_object(&self, columns: &[&str]) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert("phase".into(), Value::String(self.phase.to_string()));
        object.insert("block".into(), self.block.into());
        object.insert("trial_index".into(), self.trial_index.into());
        for (column, value) in columns.iter().zip(&self.stimulus) {
            object.insert((*column).to_string(), Value::String(value.clone()));
        }
        object.insert("response".into(), Value::String(self.response.clone()));
        object.insert("latency_ms".into(), self.latency_ms.into());
        object.insert("ground_truth".into(), Value::String(self.ground_truth.clone()));
        object.insert("is_correct".into(), self.is_correct.into());
        object
    }
}

/// Header of a result table whose stimulus is described by `stimulus_columns`.
pub fn header(stimulus_columns: &[&str]) -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .chain(stimulus_columns)
        .chain(TRAILING_COLUMNS.iter())
        .map(|c| (*c).to_string())
        .collect()
}

/// Flattens a session into rows. Practice rows are kept only when asked for.
pub fn rows<T: Task>(
    task: &T,
    report: &SessionReport<T>,
    include_practice: bool,
) -> Vec<ResultRow> {
    report
        .phased_blocks()
        .filter(|(phase, _, _)| include_practice || !phase.is_practice())
        .flat_map(|(phase, block, summary)| {
            summary.records.iter().map(move |record| ResultRow {
                phase,
                block,
                trial_index: record.stimulus.index,
                stimulus: task.stimulus_values(&record.stimulus),
                response: record
                    .response
                    .key
                    .map_or_else(|| NO_RESPONSE.to_string(), |key| key.to_string()),
                latency_ms: record.latency().map(|d| d.as_secs_f64() * 1e3),
                ground_truth: record.ground_truth.to_string(),
                is_correct: record.is_correct,
            })
        })
        .collect()
}

/// `{participant}_{task}_results_{YYYYmmddHHMMSS}.{ext}` inside `dir`.
pub fn result_path(
    dir: &Path,
    participant: &str,
    task: &str,
    at: DateTime<Local>,
    format: ResultFormat,
) -> PathBuf {
    dir.join(format!(
        "{participant}_{task}_results_{}.{}",
        at.format("%Y%m%d%H%M%S"),
        format.extension()
    ))
}

pub fn write_rows(
    path: &Path,
    stimulus_columns: &[&str],
    rows: &[ResultRow],
    format: ResultFormat,
) -> Result<(), ExportError> {
    let io_error = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    match format {
        ResultFormat::Csv => {
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            writer.write_record(header(stimulus_columns))?;
            for row in rows {
                writer.write_record(row.csv_record())?;
            }
            writer.flush().map_err(io_error)?;
        }
        ResultFormat::Json => {
            let objects: Vec<Value> = rows
                .iter()
                .map(|row| Value::Object(row.json_object(stimulus_columns)))
                .collect();
            serde_json::to_writer_pretty(BufWriter::new(file), &objects)?;
        }
    }
    Ok(())
}

/// Writes the session to a fresh file under `dir`, creating the directory if needed.
/// A session without a single trial to report leaves no file behind.
pub fn save<T: Task>(
    task: &T,
    report: &SessionReport<T>,
    dir: &Path,
    participant: &str,
    format: ResultFormat,
    include_practice: bool,
    at: DateTime<Local>,
) -> Result<Option<PathBuf>, ExportError> {
    let rows = rows(task, report, include_practice);
    if rows.is_empty() {
        info!(task = report.task, "no trials to save");
        return Ok(None);
    }
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = result_path(dir, participant, report.task, at, format);
    write_rows(&path, task.stimulus_columns(), &rows, format)?;
    info!(path = %path.display(), rows = rows.len(), "results saved");
    Ok(Some(path))
}
