//! Complaint report extraction.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::models::ReportRow;
use crate::validation::ValidationError;
use crate::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Filters for the complaint report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// First creation date to include (`YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Last creation date to include (`YYYY-MM-DD`).
    pub end_date: Option<String>,
    /// Category to match; `"All"` disables the filter.
    pub category: Option<String>,
}

impl ReportFilter {
    /// The date range, when both ends are given.
    fn date_range(&self) -> Result<Option<(String, String)>> {
        let start = non_blank(self.start_date.as_deref());
        let end = non_blank(self.end_date.as_deref());

        match (start, end) {
            (Some(start), Some(end)) => {
                let start = parse_date("startDate", start)?;
                let end = parse_date("endDate", end)?;
                Ok(Some((
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string(),
                )))
            }
            _ => Ok(None),
        }
    }

    fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref()).filter(|c| *c != "All")
    }
}

/// Select report rows matching the filter, oldest first.
pub async fn complaint_report(pool: &SqlitePool, filter: &ReportFilter) -> Result<Vec<ReportRow>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT c.id, c.subject, c.category, c.status, u.name AS user_name,
               c.created_at, c.resolved_at
        FROM complaints c
        LEFT JOIN users u ON c.user_id = u.id
        WHERE 1 = 1
        "#,
    );

    if let Some((start, end)) = filter.date_range()? {
        query
            .push(" AND date(c.created_at) BETWEEN date(")
            .push_bind(start)
            .push(") AND date(")
            .push_bind(end)
            .push(")");
    }

    if let Some(category) = filter.category() {
        query.push(" AND c.category = ").push_bind(category.to_string());
    }

    query.push(" ORDER BY c.created_at ASC, c.id ASC");

    let rows = query.build_query_as::<ReportRow>().fetch_all(pool).await?;
    Ok(rows)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a `YYYY-MM-DD` calendar date, optionally followed by a time part
/// (`T` or space separated) which is ignored.
fn parse_date(field: &str, value: &str) -> std::result::Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::Invalid {
        field: field.to_string(),
        reason: format!("'{}' is not a valid YYYY-MM-DD date", value),
    };

    let (date, rest) = match value.get(..10) {
        Some(date) => (date, &value[10..]),
        None => return Err(invalid()),
    };
    if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())
}
