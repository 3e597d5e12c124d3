use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::decode::coord::KM_TO_MILES;
use crate::decode::telemetry;
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Comment post-processor
 *
 * The free-text tail of most reports is mined for structured items:
 * operating frequency, CTCSS tone, DCS code, repeater offset and
 * range, the `!DAO!` precision refinement, `/A=` altitude, and base-91
 * telemetry between `|` delimiters. Each match is cut out of the
 * comment; whatever survives is the comment proper.
 *
 * Only the frequency is anchored at the start of the comment. The
 * other rules are applied repeatedly, in no particular order, until a
 * full pass finds nothing; a final pass emits suggestions about
 * non-standard spellings without consuming anything.
 *
 * All patterns are compiled once and shared; the set is read-only
 * after initialisation.
 */

/// The fifty standard CTCSS tones, in tenths of hertz.
const CTCSS_TONES: [u32; 50] = [
    670, 693, 719, 744, 770, 797, 825, 854, 885, 915, 948, 974, 1000,
    1035, 1072, 1109, 1148, 1188, 1230, 1273, 1318, 1365, 1413, 1462,
    1514, 1567, 1598, 1622, 1655, 1679, 1713, 1738, 1773, 1799, 1835,
    1862, 1899, 1928, 1966, 1995, 2035, 2065, 2107, 2181, 2257, 2291,
    2336, 2418, 2503, 2541,
];

/// Frequency bands above 999 MHz, keyed by the letter replacing the
/// leading digit: `A23.456MHz` is 23.456 MHz above the `A` band base.
const BAND_MHZ: [u32; 15] = [
    1200, 2300, 2400, 3300, 3400, 5600, 5700, 5800, 10100, 10200, 10400,
    10500, 24000, 24100, 24200,
];

/// Amateur bands where a bare number is probably a frequency, MHz.
const HAM_BANDS: [(f64, f64); 4] =
    [(144., 148.), (222., 225.), (420., 450.), (902., 928.)];

struct Patterns {
    frequency: Regex,
    tone: Regex,
    tone_off: Regex,
    dcs: Regex,
    offset: Regex,
    range: Regex,
    dao: Regex,
    altitude: Regex,
    base91_telemetry: Regex,
    frequency_anywhere: Regex,
    tone_anywhere: Regex,
}

// The loose items (tone, DCS, offset, range) sit between word
// boundaries so that ordinary prose ("Test1234") is left alone; the
// boundary characters themselves stay in the comment, only capture 1
// is cut out.
static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    frequency: Regex::new(
        r"^[/ ]?([0-9A-O])([0-9]{2}\.[0-9]{3}) ?([Mm][Hh][Zz]) ?",
    )
    .unwrap(),
    tone: Regex::new(
        r"(?:^|[^A-Za-z0-9])([TtCc][0-9]{3})(?:[^A-Za-z0-9]|$)",
    )
    .unwrap(),
    tone_off: Regex::new(
        r"(?:^|[^A-Za-z0-9])([TtCc][Oo][Ff][Ff])(?:[^A-Za-z0-9]|$)",
    )
    .unwrap(),
    dcs: Regex::new(
        r"(?:^|[^A-Za-z0-9])([Dd][0-7]{3})(?:[^A-Za-z0-9]|$)",
    )
    .unwrap(),
    offset: Regex::new(
        r"(?:^|[^A-Za-z0-9+-])([+-][0-9]{3})(?:[^0-9]|$)",
    )
    .unwrap(),
    range: Regex::new(
        r"(?:^|[^A-Za-z0-9])(R[0-9]{2}[mk])(?:[^A-Za-z0-9]|$)",
    )
    .unwrap(),
    dao: Regex::new(r"!([A-Za-z])([ -\{])([ -\{])!").unwrap(),
    altitude: Regex::new(r"/A=([0-9]{6})").unwrap(),
    base91_telemetry: Regex::new(r"\|([!-\{]{4,14})\|").unwrap(),
    frequency_anywhere: Regex::new(r"([0-9]{3})\.([0-9]{3,4})").unwrap(),
    tone_anywhere: Regex::new(r"([0-9]{2,3})\.([0-9])").unwrap(),
});

/// Nearest standard CTCSS tone, in hertz, for a 3-digit integer as
/// found on the air.
fn nearest_tone(value: u32) -> f64 {
    let tenths = value * 10;
    let nearest = CTCSS_TONES
        .iter()
        .min_by_key(|&&t| t.abs_diff(tenths))
        .unwrap();
    f64::from(*nearest) / 10.
}

fn parse_f64(bytes: &[u8]) -> f64 {
    String::from_utf8_lossy(bytes).parse().unwrap_or(0.)
}

fn parse_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |n, c| n * 10 + u32::from(c - b'0'))
}

/// Apply the `!DAO!` refinement: one (uppercase datum, decimal) or two
/// (lowercase datum, base-91) extra digits of latitude and longitude
/// precision, added to the magnitudes with the signs preserved.
fn apply_dao(
    record: &mut DecodedInfo,
    datum: u8,
    a: u8,
    o: u8,
    diag: &mut dyn DiagSink,
) {
    if datum == b'T' {
        // Private extension describing an APRStt position
        let loc = match (a, o) {
            (b' ', b' ') => "APRStt corral".to_string(),
            (b'B', o) => format!("APRStt location B{}", o as char),
            (a, b' ') if a.is_ascii_digit() => {
                format!("APRStt location {} of 10", a as char)
            }
            (a, o) if a.is_ascii_digit() && o.is_ascii_digit() => {
                format!("APRStt location {}{} of 100", a as char, o as char)
            }
            _ => {
                diag.report(
                    Severity::Warning,
                    format!(
                        "Unrecognized APRStt !DAO! digits \"{}{}\".",
                        a as char, o as char
                    ),
                );
                return;
            }
        };
        record.set_aprstt_loc(&loc);
        return;
    }
    let (dlat, dlon) = if datum.is_ascii_uppercase() {
        if !a.is_ascii_digit() || !o.is_ascii_digit() {
            diag.report(
                Severity::Warning,
                "!DAO! with an upper case datum should carry two decimal \
                 digits."
                    .to_string(),
            );
            return;
        }
        (
            f64::from(a - b'0') / 60000.,
            f64::from(o - b'0') / 60000.,
        )
    } else {
        if !(b'!'..=b'{').contains(&a) || !(b'!'..=b'{').contains(&o) {
            diag.report(
                Severity::Warning,
                "!DAO! with a lower case datum should carry two base-91 \
                 digits."
                    .to_string(),
            );
            return;
        }
        (
            f64::from(a - b'!') * 1.1 / 600000.,
            f64::from(o - b'!') * 1.1 / 600000.,
        )
    };
    if let Some(lat) = record.latitude {
        record.latitude = Some(lat.signum() * (lat.abs() + dlat));
    }
    if let Some(lon) = record.longitude {
        record.longitude = Some(lon.signum() * (lon.abs() + dlon));
    }
}

/// Post-process the free-text comment of the packet, extracting every
/// structured item it carries and storing the stripped remainder.
pub fn process_comment(
    record: &mut DecodedInfo,
    comment: &[u8],
    diag: &mut dyn DiagSink,
) {
    let mut buf: Vec<u8> = comment.to_vec();
    while buf.ends_with(b"\r") || buf.ends_with(b"\n") {
        buf.pop();
    }

    // Operating frequency, anchored at the very start
    if let Some(caps) = PATTERNS.frequency.captures(&buf) {
        let lead = caps.get(1).unwrap().as_bytes()[0];
        let base = match lead {
            b'0'..=b'9' => f64::from(lead - b'0') * 100.,
            b'A'..=b'O' => f64::from(BAND_MHZ[usize::from(lead - b'A')]),
            _ => unreachable!(),
        };
        record.freq_mhz =
            Some(base + parse_f64(caps.get(2).unwrap().as_bytes()));
        if caps.get(3).unwrap().as_bytes() != b"MHz" {
            diag.report(
                Severity::Warning,
                "The standard spelling for megahertz is \"MHz\"."
                    .to_string(),
            );
        }
        let range = caps.get(0).unwrap().range();
        buf.drain(range);
    } else if record.freq_mhz.is_none() {
        // An object named after a frequency in an amateur band is the
        // frequency itself (e.g. repeater objects "146.955-")
        if let Some(name) = &record.object_name {
            if let Ok(mhz) = name.trim_end_matches(['-', '+']).parse::<f64>()
            {
                if HAM_BANDS.iter().any(|(lo, hi)| mhz >= *lo && mhz <= *hi)
                {
                    record.freq_mhz = Some(mhz);
                }
            }
        }
    }

    // Everything else is unordered: repeat while anything matches
    loop {
        let mut matched = false;

        if let Some(caps) = PATTERNS.tone_off.captures(&buf) {
            record.ctcss_tone_hz = Some(0.);
            let range = caps.get(1).unwrap().range();
            buf.drain(range);
            matched = true;
        }
        if let Some(caps) = PATTERNS.tone.captures(&buf) {
            let token = caps.get(1).unwrap();
            let value = parse_u32(&token.as_bytes()[1..]);
            record.ctcss_tone_hz = Some(nearest_tone(value));
            let range = token.range();
            buf.drain(range);
            matched = true;
        }
        if let Some(caps) = PATTERNS.dcs.captures(&buf) {
            let token = caps.get(1).unwrap();
            record.dcs_octal = Some(
                token.as_bytes()[1..]
                    .iter()
                    .fold(0, |n, c| n * 8 + u32::from(c - b'0')),
            );
            let range = token.range();
            buf.drain(range);
            matched = true;
        }
        if let Some(caps) = PATTERNS.offset.captures(&buf) {
            let token = caps.get(1).unwrap();
            let sign = if token.as_bytes()[0] == b'-' { -1 } else { 1 };
            let tens = parse_u32(&token.as_bytes()[1..]) as i32;
            record.offset_khz = Some(sign * tens * 10);
            let range = token.range();
            buf.drain(range);
            matched = true;
        }
        if let Some(caps) = PATTERNS.range.captures(&buf) {
            let token = caps.get(1).unwrap();
            let value = f64::from(parse_u32(&token.as_bytes()[1..3]));
            record.range_mi = Some(match token.as_bytes()[3] {
                b'm' => value,
                _ => value * KM_TO_MILES,
            });
            let range = token.range();
            buf.drain(range);
            matched = true;
        }
        if let Some(caps) = PATTERNS.dao.captures(&buf) {
            let datum = caps.get(1).unwrap().as_bytes()[0];
            let a = caps.get(2).unwrap().as_bytes()[0];
            let o = caps.get(3).unwrap().as_bytes()[0];
            apply_dao(record, datum, a, o, diag);
            buf.drain(caps.get(0).unwrap().range());
            matched = true;
        }
        if let Some(caps) = PATTERNS.altitude.captures(&buf) {
            record.altitude_ft =
                Some(f64::from(parse_u32(caps.get(1).unwrap().as_bytes())));
            buf.drain(caps.get(0).unwrap().range());
            matched = true;
        }
        if let Some(caps) = PATTERNS.base91_telemetry.captures(&buf) {
            let inner = caps.get(1).unwrap().as_bytes().to_vec();
            telemetry::compressed_report(record, &inner, diag);
            buf.drain(caps.get(0).unwrap().range());
            matched = true;
        }

        if !matched {
            break;
        }
    }

    // One last pass for things people spell their own way
    if let Some(caps) = PATTERNS.frequency_anywhere.captures(&buf) {
        let text = String::from_utf8_lossy(caps.get(0).unwrap().as_bytes())
            .into_owned();
        if let Ok(mhz) = text.parse::<f64>() {
            if HAM_BANDS.iter().any(|(lo, hi)| mhz >= *lo && mhz <= *hi) {
                diag.report(
                    Severity::Hint,
                    format!(
                        "\"{text}\" in the comment looks like a frequency. \
                         The standard spelling would be \"{mhz:.3}MHz\" at \
                         the beginning of the comment."
                    ),
                );
            }
        }
    }
    if let Some(caps) = PATTERNS.tone_anywhere.captures(&buf) {
        let text = String::from_utf8_lossy(caps.get(0).unwrap().as_bytes())
            .into_owned();
        if let Ok(tone) = text.parse::<f64>() {
            let tenths = (tone * 10.).round() as u32;
            if CTCSS_TONES.contains(&tenths) {
                diag.report(
                    Severity::Hint,
                    format!(
                        "\"{text}\" in the comment looks like a CTCSS \
                         tone. The standard spelling would be \"T{:03}\".",
                        tenths / 10
                    ),
                );
            }
        }
    }
    for &byte in &buf {
        if byte == 0xb0 || byte == 0xf8 {
            diag.report(
                Severity::Warning,
                format!(
                    "Byte 0x{byte:02x} in the comment is probably a \
                     degree symbol in a legacy 8-bit encoding; APRS \
                     comments should stick to ASCII or UTF-8."
                ),
            );
        }
    }

    record.set_comment(&String::from_utf8_lossy(&buf));
}
