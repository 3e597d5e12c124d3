use crate::decode::comment::process_comment;
use crate::decode::coord::{base91_digit, KNOTS_TO_MPH, METERS_TO_FEET};
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Mic-E
 *
 * The most compact position format: the whole latitude, three message
 * bits and two longitude flags ride in the six characters of the AX.25
 * destination address, while the information field carries longitude,
 * speed, course and symbol in seven bytes.
 *
 * Destination characters, one per latitude digit:
 *
 * | Character | Digit | Message bit |
 * | --------- | ----- | ----------- |
 * | `0`-`9`   | 0-9   | 0           |
 * | `A`-`J`   | 0-9   | 1 (custom)  |
 * | `K`       | 0     | 1 (custom)  |
 * | `L`       | 0     | 0           |
 * | `P`-`Y`   | 0-9   | 1 (standard)|
 * | `Z`       | 0     | 1 (standard)|
 *
 * The message bits live in characters 1-3 with weights 4, 2, 1.
 * Character 4 selects the hemisphere (`P`-`Z` is north), character 5
 * the +100° longitude offset, character 6 east/west (`P`-`Z` is west).
 */

const STANDARD_MESSAGES: [&str; 8] = [
    "Emergency",
    "Priority",
    "Special",
    "Committed",
    "Returning",
    "In Service",
    "En Route",
    "Off Duty",
];

const CUSTOM_MESSAGES: [&str; 8] = [
    "Emergency",
    "Custom-6",
    "Custom-5",
    "Custom-4",
    "Custom-3",
    "Custom-2",
    "Custom-1",
    "Custom-0",
];

/// Manufacturer signatures found around the seven fixed bytes: a
/// leading byte, an optional two- or one-byte trailing suffix, and how
/// much to cut from each end once identified.
struct Manufacturer {
    leading: u8,
    suffix: &'static [u8],
    name: &'static str,
}

const MANUFACTURERS: [Manufacturer; 20] = [
    Manufacturer { leading: b' ', suffix: b"", name: "Original MIC-E" },
    Manufacturer { leading: b'>', suffix: b"=", name: "Kenwood TH-D72" },
    Manufacturer { leading: b'>', suffix: b"^", name: "Kenwood TH-D74" },
    Manufacturer { leading: b'>', suffix: b"", name: "Kenwood TH-D7A" },
    Manufacturer { leading: b']', suffix: b"=", name: "Kenwood TM-D710" },
    Manufacturer { leading: b']', suffix: b"", name: "Kenwood TM-D700" },
    Manufacturer { leading: b'`', suffix: b"_ ", name: "Yaesu VX-8" },
    Manufacturer { leading: b'`', suffix: b"_\"", name: "Yaesu FTM-350" },
    Manufacturer { leading: b'`', suffix: b"_#", name: "Yaesu VX-8G" },
    Manufacturer { leading: b'`', suffix: b"_$", name: "Yaesu FT1D" },
    Manufacturer { leading: b'`', suffix: b"_%", name: "Yaesu FTM-400DR" },
    Manufacturer { leading: b'`', suffix: b"_)", name: "Yaesu FTM-100D" },
    Manufacturer { leading: b'`', suffix: b"_(", name: "Yaesu FT2D" },
    Manufacturer { leading: b'`', suffix: b" X", name: "AP510" },
    Manufacturer { leading: b'`', suffix: b"", name: "Mic-Emsg" },
    Manufacturer { leading: b'\'', suffix: b"|3", name: "Byonics TinyTrak3" },
    Manufacturer { leading: b'\'', suffix: b"|4", name: "Byonics TinyTrak4" },
    Manufacturer {
        leading: b'\'',
        suffix: b":4",
        name: "SCS GmbH & Co. P4dragon DR-7400 modems",
    },
    Manufacturer {
        leading: b'\'',
        suffix: b":8",
        name: "SCS GmbH & Co. P4dragon DR-7800 modems",
    },
    Manufacturer { leading: b'\'', suffix: b"", name: "McTrackr" },
];

/// Digit value and message-bit class of one destination character.
fn dest_char(c: u8) -> Option<(f64, bool, bool)> {
    match c {
        b'0'..=b'9' => Some((f64::from(c - b'0'), false, false)),
        b'A'..=b'J' => Some((f64::from(c - b'A'), false, true)),
        b'K' => Some((0., false, true)),
        b'L' => Some((0., false, false)),
        b'P'..=b'Y' => Some((f64::from(c - b'P'), true, false)),
        b'Z' => Some((0., true, false)),
        _ => None,
    }
}

fn north(c: u8) -> bool {
    (b'P'..=b'Z').contains(&c)
}

/// Longitude degrees from the first information byte and the +100°
/// flag of destination character 5.
fn longitude_degrees(
    c: u8,
    offset: bool,
    diag: &mut dyn DiagSink,
) -> Option<f64> {
    let deg = match (offset, c) {
        (false, 38..=127) => u32::from(c) - 28,
        (true, 118..=127) => u32::from(c) - 118,
        (true, 108..=117) => u32::from(c) - 8,
        (true, 38..=107) => u32::from(c) + 72,
        _ => {
            diag.report(
                Severity::Error,
                format!(
                    "Mic-E longitude degrees byte {c} is out of range."
                ),
            );
            return None;
        }
    };
    Some(f64::from(deg))
}

fn longitude_minutes(c: u8, diag: &mut dyn DiagSink) -> Option<f64> {
    match c {
        88..=97 => Some(f64::from(c - 88)),
        38..=87 => Some(f64::from(c - 28)),
        _ => {
            diag.report(
                Severity::Error,
                format!("Mic-E longitude minutes byte {c} is out of range."),
            );
            None
        }
    }
}

fn longitude_hundredths(c: u8, diag: &mut dyn DiagSink) -> Option<f64> {
    match c {
        28..=127 => Some(f64::from(c - 28)),
        _ => {
            diag.report(
                Severity::Error,
                format!(
                    "Mic-E longitude hundredths byte {c} is out of range."
                ),
            );
            None
        }
    }
}

/// Decode a Mic-E packet: `destination` is the AX.25 destination
/// address (without SSID), `info` the whole information field starting
/// with the `'` or `` ` `` data type identifier.
pub fn decode(
    record: &mut DecodedInfo,
    destination: &str,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("MIC-E");
    let dest = destination.as_bytes();
    if dest.len() < 6 {
        diag.report(
            Severity::Error,
            format!(
                "Mic-E destination \"{destination}\" is shorter than six \
                 characters."
            ),
        );
        return;
    }
    if info.len() < 9 {
        diag.report(
            Severity::Error,
            "Mic-E information field is shorter than nine bytes."
                .to_string(),
        );
        return;
    }

    // Latitude, message bits and flags from the destination
    let mut digits = [0.; 6];
    let (mut std_bits, mut custom_bits) = (0_u32, 0);
    for (i, &c) in dest[0..6].iter().enumerate() {
        let Some((digit, std, custom)) = dest_char(c) else {
            diag.report(
                Severity::Error,
                format!(
                    "Invalid character \"{}\" in Mic-E destination.",
                    c as char
                ),
            );
            return;
        };
        digits[i] = digit;
        if i < 3 {
            let weight = 4 >> i;
            if std {
                std_bits |= weight;
            }
            if custom {
                custom_bits |= weight;
            }
        }
    }
    let lat = digits[0] * 10.
        + digits[1]
        + (digits[2] * 1000. + digits[3] * 100. + digits[4] * 10.
            + digits[5])
            / 6000.;
    if lat <= 90. {
        record.latitude = Some(if north(dest[3]) { lat } else { -lat });
    } else {
        diag.report(
            Severity::Error,
            format!("Mic-E latitude {lat:.4} is out of range."),
        );
    }

    match (std_bits, custom_bits) {
        (0, 0) => record.set_mic_e_status("Emergency"),
        (std, 0) => {
            record.set_mic_e_status(STANDARD_MESSAGES[std as usize])
        }
        (0, custom) => {
            record.set_mic_e_status(CUSTOM_MESSAGES[custom as usize])
        }
        _ => {
            diag.report(
                Severity::Warning,
                "Mic-E message type mixes standard and custom bits."
                    .to_string(),
            );
        }
    }

    // Longitude from the first three information bytes
    let offset = north(dest[4]);
    let west = north(dest[5]);
    if let (Some(deg), Some(min), Some(hundredths)) = (
        longitude_degrees(info[1], offset, diag),
        longitude_minutes(info[2], diag),
        longitude_hundredths(info[3], diag),
    ) {
        let lon = deg + min / 60. + hundredths / 6000.;
        if lon <= 180. {
            record.longitude = Some(if west { -lon } else { lon });
        } else {
            diag.report(
                Severity::Error,
                format!("Mic-E longitude {lon:.4} is out of range."),
            );
        }
    }

    // Speed and course share the next three bytes
    if info[4] >= 28 && info[5] >= 28 && info[6] >= 28 {
        let mut speed = u32::from(info[4] - 28) * 10
            + u32::from(info[5] - 28) / 10;
        if speed >= 800 {
            speed -= 800;
        }
        record.speed_mph = Some(f64::from(speed) * KNOTS_TO_MPH);

        let mut course =
            (u32::from(info[5] - 28) % 10) * 100 + u32::from(info[6] - 28);
        if course >= 400 {
            course -= 400;
        }
        record.course_deg = match course {
            0 => None,
            360 => Some(0.),
            1..=359 => Some(f64::from(course)),
            _ => {
                diag.report(
                    Severity::Error,
                    format!("Mic-E course {course} is out of range."),
                );
                None
            }
        };
    } else {
        diag.report(
            Severity::Error,
            "Mic-E speed/course bytes are out of range.".to_string(),
        );
    }

    record.symbol_code = info[7] as char;
    match info[8] {
        b'/' | b'\\' | b'0'..=b'9' | b'A'..=b'Z' => {
            record.symbol_table = info[8] as char;
        }
        c => {
            diag.report(
                Severity::Error,
                format!(
                    "Invalid Mic-E symbol table \"{}\", substituting \
                     \"/\".",
                    c as char
                ),
            );
            record.symbol_table = '/';
        }
    }

    // Whatever follows the fixed bytes: manufacturer signature, then
    // possibly a base-91 altitude, then an ordinary comment.
    let mut rest: &[u8] = &info[9..];
    while rest.ends_with(b"\r") || rest.ends_with(b"\n") {
        rest = &rest[..rest.len() - 1];
    }
    if let Some(first) = rest.first() {
        for mfr in &MANUFACTURERS {
            if *first == mfr.leading
                && (mfr.suffix.is_empty() || rest.ends_with(mfr.suffix))
            {
                record.set_mfr(mfr.name);
                rest = &rest[1..rest.len() - mfr.suffix.len()];
                break;
            }
        }
    }
    if rest.len() >= 4 && rest[3] == b'}' {
        if let (Some(d0), Some(d1), Some(d2)) = (
            base91_digit(rest[0]),
            base91_digit(rest[1]),
            base91_digit(rest[2]),
        ) {
            let meters = f64::from(d0 * 91 * 91 + d1 * 91 + d2) - 10000.;
            record.altitude_ft = Some(meters * METERS_TO_FEET);
            rest = &rest[4..];
        }
    }
    process_comment(record, rest, diag);
}
