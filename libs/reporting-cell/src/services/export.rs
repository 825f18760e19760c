use tracing::info;

use crate::models::{ExportFormat, ReportError};

/// Report export is not available yet; every supported format answers with
/// the "coming soon" notice.
pub fn export_report(format: ExportFormat) -> ReportError {
    info!("Export requested as {}", format);
    ReportError::ExportNotImplemented(format)
}
