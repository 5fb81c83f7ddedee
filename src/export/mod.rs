//! Report export
//!
//! CSV for spreadsheet-friendly tables, pretty JSON for everything else.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::achievements::AchievementStatus;
use crate::models::{ExerciseProgress, HistoricalWorkout, PersonalRecords, UserProfile};

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportType {
    /// One row per exercise data point
    Progress,
    /// One row per completed workout
    History,
    /// One row per personal record
    Records,
    /// Profile, records, progress and achievements in one document
    Report,
}

impl std::str::FromStr for ExportType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "progress" => Ok(ExportType::Progress),
            "history" => Ok(ExportType::History),
            "records" | "prs" => Ok(ExportType::Records),
            "report" => Ok(ExportType::Report),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("{export_type:?} cannot be exported as {format:?}")]
    Unsupported {
        export_type: ExportType,
        format: ExportFormat,
    },
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// Everything about a user's progress, as one document
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub profile: UserProfile,
    pub level_progress_percent: rust_decimal::Decimal,
    pub personal_records: PersonalRecords,
    pub progress: Vec<ExerciseProgress>,
    pub achievements: Vec<AchievementStatus>,
    pub history: Vec<HistoricalWorkout>,
}

/// Write one export to `output_path`
pub fn export_report<P: AsRef<Path>>(
    report: &ProgressReport,
    export_type: ExportType,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    match (export_type, format) {
        (ExportType::Progress, ExportFormat::Csv) => csv::export_progress(&report.progress, output_path),
        (ExportType::History, ExportFormat::Csv) => csv::export_history(&report.history, output_path),
        (ExportType::Records, ExportFormat::Csv) => {
            csv::export_records(&report.personal_records, output_path)
        }
        (ExportType::Progress, ExportFormat::Json) => json::export_json(&report.progress, output_path),
        (ExportType::History, ExportFormat::Json) => json::export_json(&report.history, output_path),
        (ExportType::Records, ExportFormat::Json) => {
            json::export_json(&report.personal_records, output_path)
        }
        (ExportType::Report, ExportFormat::Json) => json::export_json(report, output_path),
        (ExportType::Report, ExportFormat::Csv) => Err(ExportError::Unsupported { export_type, format }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!("prs".parse::<ExportType>().unwrap(), ExportType::Records);
    }

    #[test]
    fn test_report_csv_rejected() {
        let report = ProgressReport {
            profile: UserProfile::new("u1", "Eva", "eva@example.com"),
            level_progress_percent: rust_decimal::Decimal::ZERO,
            personal_records: PersonalRecords::new(),
            progress: vec![],
            achievements: vec![],
            history: vec![],
        };
        let dir = tempfile::tempdir().unwrap();

        let result = export_report(&report, ExportType::Report, ExportFormat::Csv, dir.path().join("r.csv"));
        assert!(matches!(result, Err(ExportError::Unsupported { .. })));

        export_report(&report, ExportType::Report, ExportFormat::Json, dir.path().join("r.json")).unwrap();
        let content = std::fs::read_to_string(dir.path().join("r.json")).unwrap();
        assert!(content.contains("\"name\": \"Eva\""));
    }
}
