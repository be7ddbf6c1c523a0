use crate::domain::model::{Field, Measurement, ABSENT, UNREADABLE};
use chrono::{Local, NaiveDateTime};

/// Fallback barcode layout, 14 digits.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Keep only ASCII letters and digits, the subset Code128 labels encode reliably.
pub fn sanitize_for_code128(value: &str) -> String {
    value.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Pick the barcode payload for a measurement.
///
/// Ticket number first, then serial number, then the current local time.
pub fn select_barcode(m: &Measurement) -> String {
    select_barcode_at(m, Local::now().naive_local())
}

/// [`select_barcode`] with an explicit clock for the timestamp fallback.
pub fn select_barcode_at(m: &Measurement, now: NaiveDateTime) -> String {
    [&m.ticket, &m.serial]
        .into_iter()
        .filter_map(usable_candidate)
        .map(sanitize_for_code128)
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string())
}

fn usable_candidate(field: &Field) -> Option<&str> {
    let text = field.value()?;
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == ABSENT || trimmed.eq_ignore_ascii_case(UNREADABLE) {
        return None;
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap()
    }

    fn with_ids(serial: &str, ticket: &str) -> Measurement {
        Measurement {
            serial: Field::from(serial),
            ticket: Field::from(ticket),
            ..Default::default()
        }
    }

    #[test]
    fn test_ticket_wins_and_is_sanitized() {
        let m = with_ids("S1", "T-001");
        assert_eq!(select_barcode(&m), "T001");
    }

    #[test]
    fn test_serial_used_when_ticket_absent() {
        let m = with_ids("S99!", "-");
        assert_eq!(select_barcode(&m), "S99");
    }

    #[test]
    fn test_error_text_is_rejected_case_insensitively() {
        let m = Measurement {
            ticket: Field::Present("error".to_string()),
            serial: Field::Present("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(select_barcode_at(&m, fixed_clock()), "20240309070501");
    }

    #[test]
    fn test_candidate_emptied_by_sanitizing_falls_through() {
        let m = with_ids("SER 7", "#-#");
        assert_eq!(select_barcode(&m), "SER7");
    }

    #[test]
    fn test_timestamp_fallback_is_fourteen_digits() {
        let m = with_ids("-", "-");
        let value = select_barcode(&m);
        assert_eq!(value.len(), 14);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_selection_is_deterministic_for_a_fixed_clock() {
        let m = Measurement::default();
        assert_eq!(
            select_barcode_at(&m, fixed_clock()),
            select_barcode_at(&m, fixed_clock())
        );
        let m = with_ids("ABC", "-");
        assert_eq!(select_barcode(&m), select_barcode(&m));
    }

    #[test]
    fn test_non_ascii_letters_are_stripped() {
        assert_eq!(sanitize_for_code128("Çeki-Ş42"), "eki42");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in ["T-001", "S99!", "", "ÄÖÜ 12 ab", "^FD~JA"] {
            let once = sanitize_for_code128(input);
            assert_eq!(sanitize_for_code128(&once), once);
        }
    }
}
