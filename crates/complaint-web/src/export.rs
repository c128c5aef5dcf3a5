//! CSV rendering for complaint reports.

use database::ReportRow;

use crate::error::{ApiError, Result};

/// Report columns, in output order.
pub const REPORT_FIELDS: [&str; 7] = [
    "id",
    "subject",
    "category",
    "status",
    "user_name",
    "created_at",
    "resolved_at",
];

/// Render rows as CSV with every field quoted. Nulls become empty fields.
pub fn report_csv(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(REPORT_FIELDS)
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {}", e)))?;

    for row in rows {
        let id = row.id.to_string();
        writer
            .write_record([
                id.as_str(),
                row.subject.as_str(),
                row.category.as_str(),
                row.status.as_str(),
                row.user_name.as_deref().unwrap_or(""),
                row.created_at.as_str(),
                row.resolved_at.as_deref().unwrap_or(""),
            ])
            .map_err(|e| ApiError::Internal(format!("CSV write failed: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV flush failed: {}", e)))
}
