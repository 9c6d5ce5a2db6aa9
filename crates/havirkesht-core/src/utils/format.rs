use crate::models::{Column, ColumnFormat, Record, Role};

/// Placeholder for missing values
pub const EMPTY_CELL: &str = "-";

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an API timestamp as `YYYY-MM-DD`
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return EMPTY_CELL.to_string();
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%Y-%m-%d").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%Y-%m-%d").to_string()
    } else if date.chars().count() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

/// Dashboard count, or a dash before the first fetch
pub fn format_count(count: Option<u64>) -> String {
    count
        .map(|c| c.to_string())
        .unwrap_or_else(|| EMPTY_CELL.to_string())
}

/// Render one table cell of `record` according to `column`.
pub fn format_cell(record: &Record, column: &Column) -> String {
    match column.format {
        ColumnFormat::Text => record
            .first_text(column.fields)
            .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ColumnFormat::Date => record
            .first_text(column.fields)
            .map(|d| format_date(&d))
            .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ColumnFormat::Role => column
            .fields
            .iter()
            .find_map(|f| record.int(f))
            .map(|id| Role::from_id(id).to_string())
            .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ColumnFormat::Status => {
            let disabled = column
                .fields
                .iter()
                .find_map(|f| record.bool(f))
                .unwrap_or(false);
            if disabled { "Inactive" } else { "Active" }.to_string()
        }
    }
}
