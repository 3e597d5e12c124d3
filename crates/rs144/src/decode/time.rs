use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::diag::{DiagSink, Severity};

/**
 * APRS timestamps never carry a full date: they patch day/hour/minute
 * (DHM, `ddhhmmz`) or time-of-day (HMS, `hhmmssh`) into the current
 * UTC wall clock. The 8-byte MDHM form of positionless weather reports
 * is recognised but not decoded.
 */

fn two_digits(field: &[u8]) -> Option<u32> {
    if field[0].is_ascii_digit() && field[1].is_ascii_digit() {
        Some(u32::from(field[0] - b'0') * 10 + u32::from(field[1] - b'0'))
    } else {
        None
    }
}

/// Decode a 7-byte `ddhhmm` timestamp followed by `z` (UTC) or `/`
/// (station local time, treated as UTC with a warning), replacing the
/// day of month and time of day of `now`.
///
/// TODO: subtract one day when the decoded time lands more than an hour
/// in the future (a report stamped 23:59 received just after midnight
/// currently decodes into the wrong day).
pub fn decode_dhm(
    field: &[u8],
    now: DateTime<Utc>,
    diag: &mut dyn DiagSink,
) -> Option<DateTime<Utc>> {
    if field.len() < 7 {
        return None;
    }
    match field[6] {
        b'z' => {}
        b'/' => {
            diag.report(
                Severity::Warning,
                "Timestamp in station local time, interpreting as UTC."
                    .to_string(),
            );
        }
        c => {
            diag.report(
                Severity::Error,
                format!(
                    "Invalid character \"{}\" in timestamp. Expecting \
                     \"z\" or \"/\" after day/hours/minutes.",
                    c as char
                ),
            );
            return None;
        }
    }
    let (Some(day), Some(hour), Some(minute)) = (
        two_digits(&field[0..2]),
        two_digits(&field[2..4]),
        two_digits(&field[4..6]),
    ) else {
        diag.report(
            Severity::Error,
            "Non-digit in day/hours/minutes timestamp.".to_string(),
        );
        return None;
    };
    if !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        diag.report(
            Severity::Error,
            format!(
                "Timestamp day {day}, hour {hour} or minute {minute} is \
                 out of range."
            ),
        );
        return None;
    }
    let patched = now
        .date_naive()
        .with_day(day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc());
    if patched.is_none() {
        diag.report(
            Severity::Error,
            format!("Day {day} does not exist in the current month."),
        );
    }
    patched
}

/// Decode a 7-byte `hhmmss` timestamp followed by `h`, replacing the
/// time of day of `now`.
pub fn decode_hms(
    field: &[u8],
    now: DateTime<Utc>,
    diag: &mut dyn DiagSink,
) -> Option<DateTime<Utc>> {
    if field.len() < 7 || field[6] != b'h' {
        return None;
    }
    let (Some(hour), Some(minute), Some(second)) = (
        two_digits(&field[0..2]),
        two_digits(&field[2..4]),
        two_digits(&field[4..6]),
    ) else {
        diag.report(
            Severity::Error,
            "Non-digit in hours/minutes/seconds timestamp.".to_string(),
        );
        return None;
    };
    if hour > 23 || minute > 59 || second > 59 {
        diag.report(
            Severity::Error,
            format!(
                "Timestamp hour {hour}, minute {minute} or second \
                 {second} is out of range."
            ),
        );
        return None;
    }
    now.with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(second))
        .and_then(|t| t.with_nanosecond(0))
}

/// True if the 8 bytes look like an MDHM timestamp (month, day, hours,
/// minutes, all digits). The value itself is not reconstructed.
pub fn looks_like_mdhm(field: &[u8]) -> bool {
    field.len() >= 8 && field[0..8].iter().all(u8::is_ascii_digit)
}
