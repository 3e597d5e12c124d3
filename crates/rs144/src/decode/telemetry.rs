use crate::decode::coord::base91_digit;
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Telemetry
 *
 * Three wire forms end up here:
 *
 * - the original report, `T#seq,v1,v2,v3,v4,v5,bbbbbbbb` (five analog
 *   values and eight digital bits);
 * - the base-91 compressed report embedded in a comment between `|`
 *   delimiters: 2 to 7 big-endian base-91 pairs (sequence, up to five
 *   analog channels, one byte of digital bits);
 * - the metadata messages `PARM.` / `UNIT.` / `EQNS.` / `BITS.`
 *   addressed to the station owning the telemetry channel.
 *
 * Everything is rendered into the human-readable `telemetry` string of
 * the decoded record; no channel state is kept across packets.
 */

/// Decode a `T#seq,…` report (the whole information field).
pub fn raw_report(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("Telemetry");
    let text = String::from_utf8_lossy(&info[2..]);
    let mut parts = text.trim_end_matches(['\r', '\n']).split(',');

    let seq = parts.next().unwrap_or_default();
    if seq != "MIC" && !seq.chars().all(|c| c.is_ascii_digit()) {
        diag.report(
            Severity::Error,
            format!(
                "Telemetry sequence \"{seq}\" should be a number or \
                 \"MIC\"."
            ),
        );
    }
    let mut rendered = format!("Seq={seq}");
    for i in 1..=5 {
        let Some(value) = parts.next() else { break };
        if !value.is_empty() && value.parse::<f64>().is_err() {
            diag.report(
                Severity::Error,
                format!("Telemetry analog value \"{value}\" is not numeric."),
            );
        }
        rendered.push_str(&format!(", A{i}={value}"));
    }
    if let Some(bits) = parts.next() {
        if bits.len() != 8 || !bits.chars().all(|c| c == '0' || c == '1') {
            diag.report(
                Severity::Error,
                format!(
                    "Telemetry digital bits \"{bits}\" should be eight \
                     binary digits."
                ),
            );
        }
        rendered.push_str(&format!(", D={bits}"));
    }
    record.set_telemetry(&rendered);
}

/// Decode the base-91 payload found between `|` delimiters in a
/// comment. `inner` excludes the delimiters.
pub fn compressed_report(
    record: &mut DecodedInfo,
    inner: &[u8],
    diag: &mut dyn DiagSink,
) {
    if inner.len() % 2 != 0 || inner.len() < 4 || inner.len() > 14 {
        diag.report(
            Severity::Error,
            "Base-91 telemetry should be 2 to 7 pairs of characters."
                .to_string(),
        );
        return;
    }
    let mut values = Vec::with_capacity(7);
    for pair in inner.chunks_exact(2) {
        let (Some(hi), Some(lo)) =
            (base91_digit(pair[0]), base91_digit(pair[1]))
        else {
            diag.report(
                Severity::Error,
                "Invalid base-91 digit in compressed telemetry."
                    .to_string(),
            );
            return;
        };
        values.push(hi * 91 + lo);
    }
    let mut rendered = format!("Seq={}", values[0]);
    // Channels after the sequence: up to five analog, the seventh pair
    // is always the digital byte.
    for (i, value) in values[1..].iter().enumerate() {
        if i == 5 {
            rendered.push_str(&format!(", D={value:08b}"));
        } else {
            rendered.push_str(&format!(", A{}={value}", i + 1));
        }
    }
    record.set_telemetry(&rendered);
}

/// Telemetry metadata carried in an APRS message body. Returns false
/// if `body` is not one of the four metadata forms.
pub fn metadata_message(
    record: &mut DecodedInfo,
    addressee: &str,
    body: &str,
    _diag: &mut dyn DiagSink,
) -> bool {
    let (msg_type, label) = match body.get(0..5) {
        Some("PARM.") => {
            ("Telemetry Parameter Name Message", "Parameters")
        }
        Some("UNIT.") => ("Telemetry Unit/Label Message", "Units"),
        Some("EQNS.") => {
            ("Telemetry Equation Coefficients Message", "Equations")
        }
        Some("BITS.") => {
            ("Telemetry Bit Sense/Project Name Message", "Bits")
        }
        _ => return false,
    };
    record.set_msg_type(msg_type);
    record.set_telemetry(&format!("{label} for {addressee}: {}", &body[5..]));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;

    #[test]
    fn test_raw_report() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        raw_report(
            &mut record,
            b"T#005,199,000,255,073,123,01101001",
            &mut diag,
        );
        assert_eq!(record.msg_type, "Telemetry");
        assert_eq!(
            record.telemetry.as_deref(),
            Some(
                "Seq=005, A1=199, A2=000, A3=255, A4=073, A5=123, \
                 D=01101001"
            )
        );
        assert!(diag.messages.is_empty());
    }

    #[test]
    fn test_raw_report_mic_sequence() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        raw_report(&mut record, b"T#MIC,199,000", &mut diag);
        assert!(record.telemetry.as_deref().unwrap().starts_with("Seq=MIC"));
        assert!(diag.messages.is_empty());
    }

    #[test]
    fn test_raw_report_bad_bits() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        raw_report(
            &mut record,
            b"T#005,199,000,255,073,123,0110100x",
            &mut diag,
        );
        assert!(diag.contains("binary"));
    }

    #[test]
    fn test_compressed_report() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        // "ss11" -> seq = 82*91+82 = 7544, A1 = 16*91+16 = 1472
        compressed_report(&mut record, b"ss11", &mut diag);
        assert_eq!(
            record.telemetry.as_deref(),
            Some("Seq=7544, A1=1472")
        );
    }

    #[test]
    fn test_compressed_report_odd_length() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        compressed_report(&mut record, b"ss1", &mut diag);
        assert_eq!(record.telemetry, None);
        assert!(diag.contains("pairs"));
    }

    #[test]
    fn test_metadata() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert!(metadata_message(
            &mut record,
            "N0QBF-11",
            "PARM.Battery,Btemp,ATemp,Pres,Alt,Camra,Chut,Sun,10m,ATV",
            &mut diag
        ));
        assert_eq!(record.msg_type, "Telemetry Parameter Name Message");
        assert!(record
            .telemetry
            .as_deref()
            .unwrap()
            .starts_with("Parameters for N0QBF-11: Battery,"));

        assert!(!metadata_message(
            &mut record,
            "N0QBF-11",
            "just a message",
            &mut diag
        ));
    }
}
