use chrono::{DateTime, Utc};

use super::{set_symbol_table, timestamp7};
use crate::decode::comment::process_comment;
use crate::decode::coord::{self, CompressedExtra};
use crate::decode::{extension, weather, DecodedInfo};
use crate::diag::{DiagSink, Severity};

/**
 * ## Position reports
 *
 * `!` and `=` carry a bare position, `/` and `@` put a 7-byte
 * timestamp first; `=` and `@` additionally advertise APRS messaging
 * capability. The position itself is either human-readable
 * (`ddmm.hhN` / table / `dddmm.hhW` / code, 19 bytes) or base-91
 * compressed (13 bytes); a leading digit tells them apart.
 *
 * A `_` symbol code turns the report into a weather station: the tail
 * is weather data and the wind rides in the course/speed slots. For
 * any other symbol, a human-readable position may be followed by a
 * 7-byte data extension before the comment.
 */

/// Decode the position at the start of `body`, then hand the tail to
/// the weather parser or the data-extension/comment pipeline.
pub(crate) fn position_and_tail(
    record: &mut DecodedInfo,
    body: &[u8],
    diag: &mut dyn DiagSink,
) {
    let tail: &[u8];
    if body.first().is_some_and(u8::is_ascii_digit) {
        if body.len() < 19 {
            diag.report(
                Severity::Error,
                "Position field is shorter than 19 characters."
                    .to_string(),
            );
            return;
        }
        record.latitude = coord::latitude_ddmm(&body[0..8], diag);
        set_symbol_table(record, body[8], diag);
        record.longitude = coord::longitude_dddmm(&body[9..18], diag);
        record.symbol_code = body[18] as char;
        tail = &body[19..];

        if record.symbol_code == '_' {
            // Wind is disguised as a course/speed extension
            let consumed = extension::probe(record, tail, diag);
            weather::weather_data(record, &tail[consumed..], true, diag);
        } else {
            let consumed = extension::probe(record, tail, diag);
            process_comment(record, &tail[consumed..], diag);
        }
    } else {
        let Some(position) = coord::compressed(body, diag) else {
            return;
        };
        record.symbol_table = position.symbol_table;
        record.symbol_code = position.symbol_code;
        record.latitude = Some(position.latitude);
        record.longitude = Some(position.longitude);
        match position.extra {
            CompressedExtra::CourseSpeed {
                course_deg,
                speed_mph,
            } => {
                record.course_deg = Some(course_deg);
                record.speed_mph = Some(speed_mph);
            }
            CompressedExtra::Altitude { altitude_ft } => {
                record.altitude_ft = Some(altitude_ft);
            }
            CompressedExtra::Range { range_mi } => {
                record.range_mi = Some(range_mi);
            }
            CompressedExtra::None => {}
        }
        tail = &body[13..];

        if record.symbol_code == '_' {
            weather::weather_data(record, tail, true, diag);
        } else {
            // No data extension is permitted after a compressed
            // position
            process_comment(record, tail, diag);
        }
    }
}

/// `!` and `=`
pub fn without_timestamp(
    record: &mut DecodedInfo,
    info: &[u8],
    messaging: bool,
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type(if messaging {
        "Position without time (messaging capable)"
    } else {
        "Position without time"
    });
    position_and_tail(record, &info[1..], diag);
}

/// `/` and `@`
pub fn with_timestamp(
    record: &mut DecodedInfo,
    info: &[u8],
    now: DateTime<Utc>,
    messaging: bool,
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type(if messaging {
        "Position with time (messaging capable)"
    } else {
        "Position with time"
    });
    if info.len() < 8 {
        diag.report(
            Severity::Error,
            "Position with time is shorter than the 7-byte timestamp."
                .to_string(),
        );
        return;
    }
    timestamp7(record, &info[1..8], now, diag);
    position_and_tail(record, &info[8..], diag);
}
