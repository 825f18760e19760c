use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

// ==============================================================================
// STATISTICS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_patients: usize,
    pub new_patients_this_month: usize,
    pub new_patients_last_month: usize,
    pub male_patients: usize,
    pub female_patients: usize,
    pub other_patients: usize,
    pub average_age: i64,
}

/// Rates are whole percentages of `total_appointments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub scheduled_appointments: usize,
    pub cancelled_appointments: usize,
    pub no_show_appointments: usize,
    pub completion_rate: u32,
    pub cancellation_rate: u32,
    pub no_show_rate: u32,
}

/// Lens buckets overlap: a lens type can land in more than one of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionStats {
    pub total_prescriptions: usize,
    pub single_vision: usize,
    pub bifocal: usize,
    pub progressive: usize,
    pub most_common_frame_type: String,
    pub most_common_lens_type: String,
}

impl Default for PrescriptionStats {
    fn default() -> Self {
        Self {
            total_prescriptions: 0,
            single_vision: 0,
            bifocal: 0,
            progressive: 0,
            most_common_frame_type: NOT_AVAILABLE.to_string(),
            most_common_lens_type: NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub patient_stats: PatientStats,
    pub appointment_stats: AppointmentStats,
    pub prescription_stats: PrescriptionStats,
    /// User-facing notes for collections that failed to load.
    pub warnings: Vec<String>,
}

/// One side of the report fetch. A failed fetch still yields an (empty)
/// collection so the other side's statistics can be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCollection<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
}

impl<T> LoadedCollection<T> {
    pub fn loaded(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.error.is_none()
    }
}

// ==============================================================================
// EXPORT
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "PDF"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ReportError::UnsupportedFormat(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("Export as {0} coming soon!")]
    ExportNotImplemented(ExportFormat),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "xlsx".parse::<ExportFormat>(),
            Err(ReportError::UnsupportedFormat("xlsx".to_string()))
        );
    }

    #[test]
    fn test_export_message() {
        let error = ReportError::ExportNotImplemented(ExportFormat::Pdf);
        assert_eq!(error.to_string(), "Export as PDF coming soon!");
    }

    #[test]
    fn test_prescription_defaults_to_not_available() {
        let stats = PrescriptionStats::default();
        assert_eq!(stats.most_common_frame_type, "N/A");
        assert_eq!(stats.most_common_lens_type, "N/A");
    }

    #[test]
    fn test_stats_serialize_in_camel_case() {
        let json = serde_json::to_value(AppointmentStats::default()).unwrap();
        assert!(json.get("noShowRate").is_some());
        assert!(json.get("completedAppointments").is_some());
    }
}
