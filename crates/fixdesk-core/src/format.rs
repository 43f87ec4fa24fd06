//! # Number Formatting
//!
//! Assembles the final document number string from a format configuration,
//! an optional branch, a point in time, and an allocated sequence value.
//!
//! ## Segment Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Number Assembly                                   │
//! │                                                                         │
//! │  [prefix] [branch?] [year?] [month?] [day?] [sequence]                 │
//! │                                                                         │
//! │  Each optional segment is included only when its flag is set,          │
//! │  then all segments are joined with the configured separator.           │
//! │                                                                         │
//! │  prefix "JS", separator "-", branch DS1, full year, seq len 3:         │
//! │      JS-DS1-2025-001                                                   │
//! │                                                                         │
//! │  prefix "JS", separator "-", no branch, no year, seq len 4:            │
//! │      JS-0042                                                           │
//! │                                                                         │
//! │  Empty separator concatenates directly:  JS2025001                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Utc};

use crate::types::{BranchRef, DocumentNumberFormat, YearFormat};

/// Formats a document number.
///
/// Pure function: the sequence value must already have been allocated (or,
/// for previews, peeked) by the caller. A `branch` is only rendered when the
/// format's `include_branch` flag is set; enforcement that a branch is
/// *present* when required happens in the service layer, before allocation.
///
/// ## Overflow Policy
/// A sequence value wider than `sequence_length` renders at its full width
/// rather than wrapping or erroring. A longer string is harmless; a wrapped
/// counter would silently collide.
///
/// ## Example
/// ```rust
/// use fixdesk_core::{format_number, DocumentNumberFormat, DocumentType};
/// use chrono::{TimeZone, Utc};
///
/// let format = DocumentNumberFormat::default_for("t1", DocumentType::JobSheet);
/// let at = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
/// assert_eq!(format_number(&format, None, at, 7), "JS-2025-007");
/// ```
pub fn format_number(
    format: &DocumentNumberFormat,
    branch: Option<&BranchRef>,
    at: DateTime<Utc>,
    sequence_value: i64,
) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(6);

    segments.push(format.prefix.clone());

    if format.include_branch {
        if let Some(branch) = branch {
            segments.push(branch.render(format.branch_format).to_string());
        }
    }

    if format.include_year {
        segments.push(render_year(format.year_format, at));
    }

    if format.include_month {
        segments.push(two_digits(at.month()));
    }

    if format.include_day {
        segments.push(two_digits(at.day()));
    }

    segments.push(render_sequence(sequence_value, format.sequence_length));

    segments.join(&format.separator)
}

/// Renders the year segment. Short form keeps the last two digits.
fn render_year(year_format: YearFormat, at: DateTime<Utc>) -> String {
    match year_format {
        YearFormat::Full => format!("{:04}", at.year()),
        YearFormat::Short => format!("{:02}", at.year() % 100),
    }
}

/// Renders the sequence segment, zero-padded to the configured minimum width.
fn render_sequence(value: i64, sequence_length: u32) -> String {
    format!("{:0width$}", value, width = sequence_length as usize)
}

fn two_digits(value: u32) -> String {
    format!("{value:02}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BranchFormat, DocumentType, ResetFrequency};
    use chrono::TimeZone;

    fn base_format() -> DocumentNumberFormat {
        DocumentNumberFormat {
            tenant_id: "t1".to_string(),
            document_type: DocumentType::JobSheet,
            prefix: "JS".to_string(),
            separator: "-".to_string(),
            sequence_reset_frequency: ResetFrequency::Yearly,
            sequence_length: 3,
            include_branch: false,
            branch_format: BranchFormat::Code,
            include_year: false,
            year_format: YearFormat::Full,
            include_month: false,
            include_day: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn march_14() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_branch_and_full_year() {
        let mut format = base_format();
        format.include_branch = true;
        format.include_year = true;

        let branch = BranchRef::new("b1", "DS1", "Downtown");
        let number = format_number(&format, Some(&branch), march_14(), 1);
        assert_eq!(number, "JS-DS1-2025-001");
    }

    #[test]
    fn test_prefix_and_sequence_only() {
        let mut format = base_format();
        format.sequence_length = 4;

        assert_eq!(format_number(&format, None, march_14(), 42), "JS-0042");
    }

    #[test]
    fn test_short_year_month_day() {
        let mut format = base_format();
        format.include_year = true;
        format.year_format = YearFormat::Short;
        format.include_month = true;
        format.include_day = true;

        assert_eq!(format_number(&format, None, march_14(), 9), "JS-25-03-14-009");
    }

    #[test]
    fn test_empty_separator_concatenates() {
        let mut format = base_format();
        format.separator = String::new();
        format.include_year = true;

        assert_eq!(format_number(&format, None, march_14(), 5), "JS2025005");
    }

    #[test]
    fn test_overflow_renders_full_width() {
        let format = base_format();
        // 1000 does not fit in 3 digits; it must render as "1000", never "000"
        assert_eq!(format_number(&format, None, march_14(), 1000), "JS-1000");
    }

    #[test]
    fn test_branch_by_name() {
        let mut format = base_format();
        format.include_branch = true;
        format.branch_format = BranchFormat::Name;

        let branch = BranchRef::new("b1", "DS1", "Downtown");
        assert_eq!(format_number(&format, Some(&branch), march_14(), 1), "JS-Downtown-001");
    }

    #[test]
    fn test_branch_flag_off_ignores_supplied_branch() {
        let format = base_format();
        let branch = BranchRef::new("b1", "DS1", "Downtown");
        assert_eq!(format_number(&format, Some(&branch), march_14(), 1), "JS-001");
    }
}
