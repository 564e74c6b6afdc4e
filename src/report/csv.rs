//! CSV projection of a [`ReportSummary`].

use super::summary::ReportSummary;

/// Media type of the CSV export.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Header row of the per-employee table.
pub const CSV_HEADER: &str = "EmployeeId,FullName,Email,Hours,Salary";

/// Quotes a field, doubling any internal quotes.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Renders a summary as CSV.
///
/// The output starts with a `key,value` preamble (`Period`, `Start`, `End`,
/// `EmployeeCount`, `TotalHours`, `TotalSalary`), then a blank line, the
/// header row and one row per item. Name and email are always quoted.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::PeriodRange;
/// use attendance_engine::report::{summarize, summary_to_csv};
/// use attendance_engine::store::Snapshot;
///
/// let range = PeriodRange::month(2025, 10).unwrap();
/// let csv = summary_to_csv(&summarize(&range, &Snapshot::default()));
///
/// assert!(csv.starts_with("Period,2025-10\nStart,2025-10-01\nEnd,2025-11-01\n"));
/// assert!(csv.ends_with("\nEmployeeId,FullName,Email,Hours,Salary\n"));
/// ```
pub fn summary_to_csv(summary: &ReportSummary) -> String {
    let mut out = format!(
        "Period,{}\nStart,{}\nEnd,{}\nEmployeeCount,{}\nTotalHours,{}\nTotalSalary,{}\n\n{}\n",
        summary.period,
        summary.start.format("%Y-%m-%d"),
        summary.end.format("%Y-%m-%d"),
        summary.employee_count,
        summary.total_hours,
        summary.total_salary,
        CSV_HEADER,
    );

    for item in &summary.items {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            item.employee_id,
            quoted(&item.full_name),
            quoted(item.email.as_deref().unwrap_or_default()),
            item.hours,
            item.salary
        ));
    }
    out
}

/// Download filename for a summary: `report_<label>.csv`.
///
/// Characters other than ASCII letters, digits, `-`, `_` and `.` become `_`,
/// so the name is safe inside a quoted `Content-Disposition` parameter.
pub fn csv_filename(summary: &ReportSummary) -> String {
    let label: String = summary
        .period
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("report_{}.csv", label)
}
