use crate::error::{Result, Witsml2CsvError};
use crate::extractor::log_extractor::ExtractionOutcome;
use crate::extractor::output_manager::SavedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ConversionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub failures: usize,
}

impl ConversionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            current_file: None,
            start_time: Instant::now(),
            failures: 0,
        }
    }

    pub fn start_file(&mut self, filename: String) {
        self.current_file = Some(filename);
    }

    pub fn finish_file(&mut self, failed: bool) {
        self.files_processed += 1;
        if failed {
            self.failures += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let rate = self.files_processed as f64 / self.elapsed().as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Converted { saved: SavedLog },
    Empty { stem: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileResult {
    pub fn from_outcome(source: PathBuf, outcome: Result<ExtractionOutcome>) -> Self {
        let status = match outcome {
            Ok(ExtractionOutcome::Written(saved)) => FileStatus::Converted { saved },
            Ok(ExtractionOutcome::Empty { stem }) => FileStatus::Empty { stem },
            Err(e) => FileStatus::Failed {
                reason: e.to_string(),
            },
        };
        Self { source, status }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub converted: usize,
    pub empty: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub started_at: DateTime<Utc>,
    pub destination: PathBuf,
    pub summary: ConversionSummary,
    pub files: Vec<FileResult>,
}

impl ConversionReport {
    pub fn new(started_at: DateTime<Utc>, destination: PathBuf, files: Vec<FileResult>, duration: Duration) -> Self {
        let mut summary = ConversionSummary {
            duration,
            ..ConversionSummary::default()
        };

        for file in &files {
            match &file.status {
                FileStatus::Converted { saved } => {
                    summary.converted += 1;
                    summary.rows_written += saved.rows;
                }
                FileStatus::Empty { .. } => summary.empty += 1,
                FileStatus::Failed { .. } => summary.failed += 1,
            }
        }

        Self {
            started_at,
            destination,
            summary,
            files,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| f.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| Witsml2CsvError::Permission {
            path: format!("Cannot write report {}: {}", path.display(), e),
        })?;
        Ok(())
    }
}
