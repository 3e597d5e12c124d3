use chrono::{DateTime, Utc};

use super::set_symbol_table;
use crate::decode::{coord, time, DecodedInfo};
use crate::diag::{DiagSink, Severity};

/**
 * ## Status reports
 *
 * `>` followed by one of three shapes: a 7-byte DHM timestamp and
 * text, a 4- or 6-character Maidenhead locator with a symbol pair and
 * text, or just text. The last three characters of the text may be
 * `^hp`, a beam heading (10° per digit, letters continue above 100°)
 * and effective radiated power (10·p² watts); when present they are
 * decoded and stripped.
 */
pub fn status(
    record: &mut DecodedInfo,
    info: &[u8],
    now: DateTime<Utc>,
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("Status Report");
    let mut rest = &info[1..];

    if rest.len() >= 7
        && rest[0..6].iter().all(u8::is_ascii_digit)
        && rest[6] == b'z'
    {
        record.timestamp = time::decode_dhm(&rest[0..7], now, diag);
        rest = &rest[7..];
    } else {
        let locator = coord::maidenhead_len(rest, diag);
        if locator > 0 {
            record.set_maidenhead(&String::from_utf8_lossy(
                &rest[..locator],
            ));
            rest = &rest[locator..];
            if rest.len() >= 2 {
                set_symbol_table(record, rest[0], diag);
                record.symbol_code = rest[1] as char;
                rest = &rest[2..];
                match rest.first() {
                    None => {}
                    Some(b' ') => rest = &rest[1..],
                    Some(_) => {
                        diag.report(
                            Severity::Warning,
                            "Status text after the locator and symbol \
                             should start with a space."
                                .to_string(),
                        );
                    }
                }
            } else if !rest.is_empty() {
                diag.report(
                    Severity::Warning,
                    "Locator in a status report should be followed by \
                     a symbol table and code."
                        .to_string(),
                );
                rest = &rest[rest.len()..];
            }
        }
    }

    let mut text = String::from_utf8_lossy(rest).into_owned();
    while text.ends_with(['\r', '\n']) {
        text.pop();
    }

    // Optional ^hp trailer: beam heading and ERP
    let bytes = text.as_bytes();
    if bytes.len() >= 3 && bytes[bytes.len() - 3] == b'^' {
        let h = bytes[bytes.len() - 2];
        let p = bytes[bytes.len() - 1];
        let heading = match h {
            b'0'..=b'9' => Some(u32::from(h - b'0') * 10),
            b'A'..=b'Z' => Some(u32::from(h - b'A') * 10 + 100),
            _ => None,
        };
        if let Some(heading) = heading {
            if p.is_ascii_digit() {
                record.beam_heading_deg = Some(heading);
                record.erp_w = Some(u32::from(p - b'0').pow(2) * 10);
                text.truncate(text.len() - 3);
            }
        }
    }
    record.set_comment(&text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 17, 18, 0, 30).unwrap()
    }

    #[test]
    fn test_plain_text() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        status(
            &mut record,
            b">Net Control Center",
            fixed_now(),
            &mut diag,
        );
        assert_eq!(record.msg_type, "Status Report");
        assert_eq!(record.comment.as_deref(), Some("Net Control Center"));
        assert!(diag.messages.is_empty());
    }

    #[test]
    fn test_with_timestamp() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        status(&mut record, b">092345zNet Control", fixed_now(), &mut diag);
        assert_eq!(
            record.timestamp.unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 9, 23, 45, 0).unwrap()
        );
        assert_eq!(record.comment.as_deref(), Some("Net Control"));
    }

    #[test]
    fn test_with_locator() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        status(
            &mut record,
            b">IO91SX/- My house",
            fixed_now(),
            &mut diag,
        );
        assert_eq!(record.maidenhead.as_deref(), Some("IO91SX"));
        assert_eq!(record.symbol_table, '/');
        assert_eq!(record.symbol_code, '-');
        assert_eq!(record.comment.as_deref(), Some("My house"));
    }

    #[test]
    fn test_locator_only() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        status(&mut record, b">IO91/G", fixed_now(), &mut diag);
        assert_eq!(record.maidenhead.as_deref(), Some("IO91"));
        assert_eq!(record.symbol_code, 'G');
        assert_eq!(record.comment, None);
    }

    #[test]
    fn test_beam_and_erp() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        status(&mut record, b">CQ CQ CQ^B7", fixed_now(), &mut diag);
        // 'B' is 110 degrees, 7^2 * 10 = 490 watts
        assert_eq!(record.beam_heading_deg, Some(110));
        assert_eq!(record.erp_w, Some(490));
        assert_eq!(record.comment.as_deref(), Some("CQ CQ CQ"));
    }
}
