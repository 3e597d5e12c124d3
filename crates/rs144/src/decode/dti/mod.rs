pub mod message;
pub mod nmea;
pub mod object;
pub mod position;
pub mod query;
pub mod status;

use chrono::{DateTime, Utc};

use crate::decode::{
    mice, telemetry, time, weather, Ax25Packet, DecodedInfo, Decoder,
    Digipeater,
};
use crate::diag::{DiagSink, Severity};

/// Select the sub-format decoder from the data type identifier (the
/// first byte of the information field).
pub(crate) fn dispatch(
    decoder: &Decoder,
    record: &mut DecodedInfo,
    packet: &Ax25Packet,
    now: DateTime<Utc>,
    depth: usize,
    diag: &mut dyn DiagSink,
) {
    let info = packet.info.as_slice();
    match info[0] {
        b'!' if info.starts_with(b"!!") => {
            weather::ultimeter(record, &info[2..], false, diag)
        }
        b'!' => position::without_timestamp(record, info, false, diag),
        b'=' => position::without_timestamp(record, info, true, diag),
        b'$' if info.starts_with(b"$ULTW") => {
            weather::ultimeter(record, &info[5..], true, diag)
        }
        b'$' => nmea::sentence(record, info, diag),
        b'\'' | b'`' => mice::decode(
            record,
            packet.destination_callsign(),
            info,
            diag,
        ),
        b')' => object::item(record, info, diag),
        b'/' => position::with_timestamp(record, info, now, false, diag),
        b'@' => position::with_timestamp(record, info, now, true, diag),
        b':' => message::message(record, info, diag),
        b';' => object::object(record, info, now, diag),
        b'<' => {
            record.set_msg_type("Station Capabilities");
            record.set_comment(&String::from_utf8_lossy(&info[1..]));
        }
        b'>' => status::status(record, info, now, diag),
        b'?' => query::general_query(record, info, diag),
        b'T' if info.get(1) == Some(&b'#') => {
            telemetry::raw_report(record, info, diag)
        }
        b'_' => positionless_weather(record, info, diag),
        b'{' => user_defined(record, info),
        b'}' => third_party(decoder, record, info, now, depth, diag),
        dti => {
            record.set_msg_type("Unknown Data Type Indicator");
            record.set_comment(&String::from_utf8_lossy(info));
            diag.report(
                Severity::Warning,
                format!(
                    "Unknown data type indicator \"{}\".",
                    dti as char
                ),
            );
        }
    }
}

/// `_`: an 8-byte month/day/hours/minutes stamp (validated, not
/// decoded) followed by the weather fields.
fn positionless_weather(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("Positionless Weather Report");
    if !time::looks_like_mdhm(&info[1..]) {
        diag.report(
            Severity::Error,
            "Positionless weather report should start with an 8-digit \
             month/day/hours/minutes timestamp."
                .to_string(),
        );
        return;
    }
    weather::weather_data(record, &info[9..], false, diag);
}

/// `{`: user-defined data; `{tt` carries raw touch tones and `{mc`
/// morse code, anything else is opaque.
fn user_defined(record: &mut DecodedInfo, info: &[u8]) {
    match info.get(1..3) {
        Some(b"tt") => {
            record.set_msg_type("Raw Touch Tone Data");
            record.set_comment(&String::from_utf8_lossy(&info[3..]));
        }
        Some(b"mc") => {
            record.set_msg_type("Morse Code Data");
            record.set_comment(&String::from_utf8_lossy(&info[3..]));
        }
        _ => {
            record.set_msg_type("User-Defined Data");
            record.set_comment(&String::from_utf8_lossy(&info[1..]));
        }
    }
}

/// `}`: strip the third-party header and decode what the gateway
/// relayed, re-reading source and destination from the inner header.
fn third_party(
    decoder: &Decoder,
    record: &mut DecodedInfo,
    info: &[u8],
    now: DateTime<Utc>,
    depth: usize,
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("Third Party Header");
    if depth >= 3 {
        diag.report(
            Severity::Error,
            "Too many nested third party headers.".to_string(),
        );
        return;
    }
    let text = String::from_utf8_lossy(&info[1..]).into_owned();
    let Some((header, payload)) = text.split_once(':') else {
        diag.report(
            Severity::Error,
            "Third party header should contain \":\".".to_string(),
        );
        return;
    };
    let Some((source, rest)) = header.split_once('>') else {
        diag.report(
            Severity::Error,
            "Third party header should contain \">\".".to_string(),
        );
        return;
    };
    let mut addresses = rest.split(',');
    let destination = addresses.next().unwrap_or_default();
    let mut inner =
        Ax25Packet::new(source, destination, payload.as_bytes().to_vec());
    for digi in addresses {
        let has_been_used = digi.ends_with('*');
        inner.digipeaters.push(Digipeater {
            callsign: digi.trim_end_matches('*').to_string(),
            has_been_used,
        });
    }
    let decoded = decoder.decode_depth(&inner, now, depth + 1, diag);
    let label = format!("Third Party Header: {}", decoded.msg_type);
    *record = decoded;
    record.set_msg_type(&label);
}

/// The 7-byte timestamp of `/`, `@`, `;` and `>` reports: DHM ending
/// in `z` or `/`, or HMS ending in `h`.
pub(crate) fn timestamp7(
    record: &mut DecodedInfo,
    field: &[u8],
    now: DateTime<Utc>,
    diag: &mut dyn DiagSink,
) {
    match field.get(6) {
        Some(&b'z') | Some(&b'/') => {
            record.timestamp = time::decode_dhm(field, now, diag);
        }
        Some(&b'h') => {
            record.timestamp = time::decode_hms(field, now, diag);
        }
        _ => {
            diag.report(
                Severity::Error,
                "Timestamp should end with \"z\", \"/\" or \"h\"."
                    .to_string(),
            );
        }
    }
}

/// Validate a symbol table identifier: the two tables or an overlay.
pub(crate) fn set_symbol_table(
    record: &mut DecodedInfo,
    c: u8,
    diag: &mut dyn DiagSink,
) {
    match c {
        b'/' | b'\\' | b'0'..=b'9' | b'A'..=b'Z' => {
            record.symbol_table = c as char;
        }
        _ => {
            diag.report(
                Severity::Error,
                format!(
                    "Invalid symbol table \"{}\", substituting \"/\".",
                    c as char
                ),
            );
            record.symbol_table = '/';
        }
    }
}
