use crate::diag::{DiagSink, Severity};

/**
 * ## Coordinate primitives
 *
 * APRS carries positions in two encodings:
 *
 * - human-readable, fixed-width `ddmm.hhN` (8 bytes) and `dddmm.hhW`
 *   (9 bytes), degrees and decimal minutes with a hemisphere letter;
 * - base-91 compressed, 13 bytes total:
 *
 *   | table | yyyy | xxxx | symbol | c | s | t |
 *   | ----- | ---- | ---- | ------ | - | - | - |
 *   | 1     | 4    | 4    | 1      | 1 | 1 | 1 |
 *
 *   where each base-91 digit is a printable character in `!`..`{` and
 *   the `c`,`s`,`t` trailer optionally encodes course/speed, altitude
 *   or radio range.
 *
 * Every character position is range-checked independently; the first
 * violation aborts the field with a diagnostic naming the offending
 * character and the class that was expected there.
 */

pub const KNOTS_TO_MPH: f64 = 1.150779;
pub const METERS_TO_FEET: f64 = 3.28084;
pub const KM_TO_MILES: f64 = 0.621371;

/// One base-91 digit, `'!'` (0) through `'{'` (90).
pub fn base91_digit(c: u8) -> Option<u32> {
    if (b'!'..=b'{').contains(&c) {
        Some(u32::from(c) - 33)
    } else {
        None
    }
}

fn digit(c: u8) -> Option<f64> {
    c.is_ascii_digit().then(|| f64::from(c - b'0'))
}

/// Digit, with space read as zero. The APRS position-ambiguity
/// convention (trailing spaces meaning reduced precision) is not
/// honoured here: ambiguous digits simply decode as zero.
fn digit_or_space(c: u8) -> Option<f64> {
    if c == b' ' {
        Some(0.)
    } else {
        digit(c)
    }
}

fn bad_char(
    diag: &mut dyn DiagSink,
    what: &str,
    c: u8,
    expected: &str,
) {
    diag.report(
        Severity::Error,
        format!(
            "Invalid character \"{}\" in {what}. Expecting {expected}.",
            c as char
        ),
    );
}

/// Decode an 8-byte `ddmm.hhN` latitude into signed degrees.
///
/// Returns `None` (and reports the specific violation) as soon as one
/// character position fails its range check.
pub fn latitude_ddmm(field: &[u8], diag: &mut dyn DiagSink) -> Option<f64> {
    if field.len() < 8 {
        diag.report(
            Severity::Error,
            "Latitude field is shorter than 8 characters.".to_string(),
        );
        return None;
    }
    let Some(d10) = digit(field[0]) else {
        bad_char(diag, "latitude", field[0], "a digit for tens of degrees");
        return None;
    };
    let Some(d1) = digit(field[1]) else {
        bad_char(diag, "latitude", field[1], "a digit for degrees");
        return None;
    };
    let degrees = d10 * 10. + d1;
    if degrees > 90. {
        diag.report(
            Severity::Error,
            format!("Latitude degrees {degrees} are out of range [00,90]."),
        );
        return None;
    }
    let Some(m10) = digit_or_space(field[2]) else {
        bad_char(diag, "latitude", field[2], "a digit for tens of minutes");
        return None;
    };
    let Some(m1) = digit_or_space(field[3]) else {
        bad_char(diag, "latitude", field[3], "a digit for minutes");
        return None;
    };
    if field[4] != b'.' {
        bad_char(diag, "latitude", field[4], "a period between minutes");
        return None;
    }
    let Some(h10) = digit_or_space(field[5]) else {
        bad_char(
            diag,
            "latitude",
            field[5],
            "a digit for tenths of minutes",
        );
        return None;
    };
    let Some(h1) = digit_or_space(field[6]) else {
        bad_char(
            diag,
            "latitude",
            field[6],
            "a digit for hundredths of minutes",
        );
        return None;
    };
    let minutes = m10 * 10. + m1;
    if minutes > 59. {
        diag.report(
            Severity::Error,
            format!("Latitude minutes {minutes} are out of range [00,59]."),
        );
        return None;
    }
    let value = degrees + (minutes + h10 / 10. + h1 / 100.) / 60.;
    match field[7] {
        b'N' => Some(value),
        b'S' => Some(-value),
        b'n' => {
            diag.report(
                Severity::Warning,
                "Lower case \"n\" found for latitude hemisphere. \
                 Specification requires upper case \"N\" or \"S\"."
                    .to_string(),
            );
            Some(value)
        }
        b's' => {
            diag.report(
                Severity::Warning,
                "Lower case \"s\" found for latitude hemisphere. \
                 Specification requires upper case \"N\" or \"S\"."
                    .to_string(),
            );
            Some(-value)
        }
        c => {
            bad_char(diag, "latitude", c, "\"N\" or \"S\" for hemisphere");
            None
        }
    }
}

/// Decode a 9-byte `dddmm.hhW` longitude into signed degrees.
pub fn longitude_dddmm(
    field: &[u8],
    diag: &mut dyn DiagSink,
) -> Option<f64> {
    if field.len() < 9 {
        diag.report(
            Severity::Error,
            "Longitude field is shorter than 9 characters.".to_string(),
        );
        return None;
    }
    if field[0] != b'0' && field[0] != b'1' {
        bad_char(
            diag,
            "longitude",
            field[0],
            "\"0\" or \"1\" for hundreds of degrees",
        );
        return None;
    }
    let d100 = f64::from(field[0] - b'0');
    let Some(d10) = digit(field[1]) else {
        bad_char(diag, "longitude", field[1], "a digit for tens of degrees");
        return None;
    };
    let Some(d1) = digit(field[2]) else {
        bad_char(diag, "longitude", field[2], "a digit for degrees");
        return None;
    };
    let degrees = d100 * 100. + d10 * 10. + d1;
    if degrees > 180. {
        diag.report(
            Severity::Error,
            format!("Longitude degrees {degrees} are out of range [000,180]."),
        );
        return None;
    }
    let Some(m10) = digit_or_space(field[3]) else {
        bad_char(diag, "longitude", field[3], "a digit for tens of minutes");
        return None;
    };
    let Some(m1) = digit_or_space(field[4]) else {
        bad_char(diag, "longitude", field[4], "a digit for minutes");
        return None;
    };
    if field[5] != b'.' {
        bad_char(diag, "longitude", field[5], "a period between minutes");
        return None;
    }
    let Some(h10) = digit_or_space(field[6]) else {
        bad_char(
            diag,
            "longitude",
            field[6],
            "a digit for tenths of minutes",
        );
        return None;
    };
    let Some(h1) = digit_or_space(field[7]) else {
        bad_char(
            diag,
            "longitude",
            field[7],
            "a digit for hundredths of minutes",
        );
        return None;
    };
    let minutes = m10 * 10. + m1;
    if minutes > 59. {
        diag.report(
            Severity::Error,
            format!("Longitude minutes {minutes} are out of range [00,59]."),
        );
        return None;
    }
    let value = degrees + (minutes + h10 / 10. + h1 / 100.) / 60.;
    match field[8] {
        b'E' => Some(value),
        b'W' => Some(-value),
        b'e' => {
            diag.report(
                Severity::Warning,
                "Lower case \"e\" found for longitude hemisphere. \
                 Specification requires upper case \"E\" or \"W\"."
                    .to_string(),
            );
            Some(value)
        }
        b'w' => {
            diag.report(
                Severity::Warning,
                "Lower case \"w\" found for longitude hemisphere. \
                 Specification requires upper case \"E\" or \"W\"."
                    .to_string(),
            );
            Some(-value)
        }
        c => {
            bad_char(diag, "longitude", c, "\"E\" or \"W\" for hemisphere");
            None
        }
    }
}

/// What the `c`,`s`,`t` trailer of a compressed position carried.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CompressedExtra {
    None,
    CourseSpeed { course_deg: f64, speed_mph: f64 },
    Altitude { altitude_ft: f64 },
    Range { range_mi: f64 },
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompressedPosition {
    pub symbol_table: char,
    pub symbol_code: char,
    pub latitude: f64,
    pub longitude: f64,
    pub extra: CompressedExtra,
}

fn base91_quad(field: &[u8]) -> Option<f64> {
    let mut sum = 0_u32;
    for &c in field {
        sum = sum * 91 + base91_digit(c)?;
    }
    Some(f64::from(sum))
}

/// Decode a 13-byte compressed position.
///
/// The first byte is the symbol table or an overlay character: `/`, `\`
/// and `A`-`Z` are used directly, `a`-`j` map to the numeric overlays
/// `0`-`9`.
pub fn compressed(
    field: &[u8],
    diag: &mut dyn DiagSink,
) -> Option<CompressedPosition> {
    if field.len() < 13 {
        diag.report(
            Severity::Error,
            "Compressed position is shorter than 13 characters.".to_string(),
        );
        return None;
    }
    let symbol_table = match field[0] {
        b'/' | b'\\' | b'A'..=b'Z' => field[0] as char,
        b'a'..=b'j' => (field[0] - b'a' + b'0') as char,
        c => {
            bad_char(
                diag,
                "compressed position",
                c,
                "\"/\", \"\\\", \"A\"-\"Z\" or \"a\"-\"j\" for the symbol \
                 table",
            );
            return None;
        }
    };
    let Some(y) = base91_quad(&field[1..5]) else {
        diag.report(
            Severity::Error,
            "Invalid base-91 digit in compressed latitude. Expecting \
             characters in \"!\"..\"{\"."
                .to_string(),
        );
        return None;
    };
    let Some(x) = base91_quad(&field[5..9]) else {
        diag.report(
            Severity::Error,
            "Invalid base-91 digit in compressed longitude. Expecting \
             characters in \"!\"..\"{\"."
                .to_string(),
        );
        return None;
    };
    let latitude = 90. - y / 380926.;
    let longitude = -180. + x / 190463.;
    // The top of the base-91 range encodes values slightly below -90
    // (resp. above 180); keep the record within the legal ranges.
    if !(-90. ..=90.).contains(&latitude) {
        diag.report(
            Severity::Error,
            format!("Compressed latitude {latitude:.4} is out of range."),
        );
        return None;
    }
    if !(-180. ..=180.).contains(&longitude) {
        diag.report(
            Severity::Error,
            format!("Compressed longitude {longitude:.4} is out of range."),
        );
        return None;
    }
    let symbol_code = field[9] as char;

    let (c, s, t) = (field[10], field[11], field[12]);
    let extra = if c == b' ' {
        CompressedExtra::None
    } else if base91_digit(t).is_some_and(|t| t & 0x18 == 0x10) {
        match (base91_digit(c), base91_digit(s)) {
            (Some(c), Some(s)) => CompressedExtra::Altitude {
                altitude_ft: 1.002_f64.powf(f64::from(c * 91 + s)),
            },
            _ => {
                diag.report(
                    Severity::Error,
                    "Invalid base-91 digit in compressed altitude."
                        .to_string(),
                );
                CompressedExtra::None
            }
        }
    } else if c == b'{' {
        match base91_digit(s) {
            Some(s) => CompressedExtra::Range {
                range_mi: 2. * 1.08_f64.powf(f64::from(s)),
            },
            None => {
                diag.report(
                    Severity::Error,
                    "Invalid base-91 digit in compressed radio range."
                        .to_string(),
                );
                CompressedExtra::None
            }
        }
    } else if (b'!'..=b'z').contains(&c) {
        match base91_digit(s) {
            Some(s) => CompressedExtra::CourseSpeed {
                course_deg: f64::from((u32::from(c) - 33) * 4),
                speed_mph: (1.08_f64.powf(f64::from(s)) - 1.)
                    * KNOTS_TO_MPH,
            },
            None => {
                diag.report(
                    Severity::Error,
                    "Invalid base-91 digit in compressed speed.".to_string(),
                );
                CompressedExtra::None
            }
        }
    } else {
        CompressedExtra::None
    };

    Some(CompressedPosition {
        symbol_table,
        symbol_code,
        latitude,
        longitude,
        extra,
    })
}

/// Length of the Maidenhead locator starting at `field`: 0 (not a
/// locator), 4, or 6. Lower case letters are accepted with a warning.
pub fn maidenhead_len(field: &[u8], diag: &mut dyn DiagSink) -> usize {
    if field.len() < 4 {
        return 0;
    }
    let mut lower = false;
    for &c in &field[0..2] {
        match c {
            b'A'..=b'R' => {}
            b'a'..=b'r' => lower = true,
            _ => return 0,
        }
    }
    if !field[2].is_ascii_digit() || !field[3].is_ascii_digit() {
        return 0;
    }
    let len = if field.len() >= 6
        && matches!(field[4], b'A'..=b'X' | b'a'..=b'x')
        && matches!(field[5], b'A'..=b'X' | b'a'..=b'x')
    {
        if field[4].is_ascii_lowercase() || field[5].is_ascii_lowercase() {
            lower = true;
        }
        6
    } else {
        4
    };
    if lower {
        diag.report(
            Severity::Warning,
            "Lower case letter in Maidenhead locator. Specification \
             requires upper case."
                .to_string(),
        );
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;
    use approx::assert_relative_eq;

    #[test]
    fn test_latitude() {
        let mut diag = CaptureSink::new();
        let lat = latitude_ddmm(b"4237.14N", &mut diag).unwrap();
        assert_relative_eq!(lat, 42. + 37.14 / 60., epsilon = 1e-9);
        assert!(diag.messages.is_empty());

        let lat = latitude_ddmm(b"4903.50S", &mut diag).unwrap();
        assert_relative_eq!(lat, -(49. + 3.50 / 60.), epsilon = 1e-9);
    }

    #[test]
    fn test_latitude_lower_case_hemisphere() {
        let mut diag = CaptureSink::new();
        let lat = latitude_ddmm(b"4237.14n", &mut diag).unwrap();
        assert!(lat > 0.);
        assert!(diag.contains("Lower case"));
    }

    #[test]
    fn test_latitude_ambiguity_reads_as_zero() {
        // Trailing spaces mean reduced precision in the APRS spec but
        // decode as zeros here.
        let mut diag = CaptureSink::new();
        let lat = latitude_ddmm(b"42  .  N", &mut diag).unwrap();
        assert_relative_eq!(lat, 42., epsilon = 1e-9);
    }

    #[test]
    fn test_latitude_out_of_range() {
        let mut diag = CaptureSink::new();
        assert_eq!(latitude_ddmm(b"9137.14N", &mut diag), None);
        assert!(diag.contains("out of range"));

        let mut diag = CaptureSink::new();
        assert_eq!(latitude_ddmm(b"4262.14N", &mut diag), None);
        assert!(diag.contains("minutes"));

        let mut diag = CaptureSink::new();
        assert_eq!(latitude_ddmm(b"4x37.14N", &mut diag), None);
        assert!(diag.contains("Invalid character \"x\""));
    }

    #[test]
    fn test_longitude() {
        let mut diag = CaptureSink::new();
        let lon = longitude_dddmm(b"07120.83W", &mut diag).unwrap();
        assert_relative_eq!(lon, -(71. + 20.83 / 60.), epsilon = 1e-9);

        assert_eq!(longitude_dddmm(b"27120.83W", &mut diag), None);
        assert!(diag.contains("hundreds of degrees"));
    }

    #[test]
    fn test_compressed() {
        // Example straight from the APRS specification
        let mut diag = CaptureSink::new();
        let pos = compressed(b"/5L!!<*e7>7P[", &mut diag).unwrap();
        assert_eq!(pos.symbol_table, '/');
        assert_eq!(pos.symbol_code, '>');
        assert_relative_eq!(pos.latitude, 49.5, epsilon = 1e-3);
        assert_relative_eq!(pos.longitude, -72.75, epsilon = 1e-3);
    }

    #[test]
    fn test_compressed_range_in_bounds() {
        // Any 4-digit base-91 value must close into the legal ranges
        let mut diag = CaptureSink::new();
        for probe in [b"!!!!", b"{{{{", b"!{!{", b"P091"] {
            let mut field = Vec::from(&b"/"[..]);
            field.extend_from_slice(probe);
            field.extend_from_slice(probe);
            field.extend_from_slice(b">   ");
            // Either a position in the legal ranges, or nothing at all:
            // the very top of the base-91 range decodes out of bounds
            // and is rejected.
            if let Some(pos) = compressed(&field, &mut diag) {
                assert!(pos.latitude >= -90. && pos.latitude <= 90.);
                assert!(pos.longitude >= -180. && pos.longitude <= 180.);
            }
        }
    }

    #[test]
    fn test_compressed_overlay() {
        let mut diag = CaptureSink::new();
        let pos = compressed(b"c5L!!<*e7>7P[", &mut diag).unwrap();
        assert_eq!(pos.symbol_table, '2');
    }

    #[test]
    fn test_compressed_extra() {
        let mut diag = CaptureSink::new();

        // c = ' ': nothing in the trailer
        let pos = compressed(b"/5L!!<*e7>  !", &mut diag).unwrap();
        assert_eq!(pos.extra, CompressedExtra::None);

        // (t-33) & 0x18 == 0x10: altitude, 1.002^(c91 + s)
        let pos = compressed(b"/5L!!<*e7>S]1", &mut diag).unwrap();
        match pos.extra {
            CompressedExtra::Altitude { altitude_ft } => {
                let exp = 1.002_f64.powf(f64::from(
                    (u32::from(b'S') - 33) * 91 + u32::from(b']') - 33,
                ));
                assert_relative_eq!(altitude_ft, exp, epsilon = 1e-6);
            }
            _ => unreachable!(),
        }

        // c = '{': pre-computed radio range
        let pos = compressed(b"/5L!!<*e7>{?!", &mut diag).unwrap();
        match pos.extra {
            CompressedExtra::Range { range_mi } => {
                assert_relative_eq!(
                    range_mi,
                    2. * 1.08_f64.powf(30.),
                    epsilon = 1e-6
                );
            }
            _ => unreachable!(),
        }

        // course/speed: course = (c-33)*4, speed = 1.08^(s-33)-1 knots
        let pos = compressed(b"/5L!!<*e7>7P[", &mut diag).unwrap();
        match pos.extra {
            CompressedExtra::CourseSpeed {
                course_deg,
                speed_mph,
            } => {
                assert_relative_eq!(course_deg, 88., epsilon = 1e-9);
                assert_relative_eq!(
                    speed_mph,
                    (1.08_f64.powf(47.) - 1.) * KNOTS_TO_MPH,
                    epsilon = 1e-6
                );
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_maidenhead() {
        let mut diag = CaptureSink::new();
        assert_eq!(maidenhead_len(b"FN42", &mut diag), 4);
        assert_eq!(maidenhead_len(b"FN42ab", &mut diag), 6);
        assert!(diag.contains("Lower case"));
        assert_eq!(maidenhead_len(b"ZZ42", &mut diag), 0);
        assert_eq!(maidenhead_len(b"FN4", &mut diag), 0);
    }

    // Encode then decode stays within 1/6000 of a degree, the
    // resolution of the hundredths-of-minutes format
    #[test]
    fn test_human_readable_round_trip() {
        fn encode_lat(lat: f64) -> Vec<u8> {
            let h = if lat < 0. { 'S' } else { 'N' };
            let lat = lat.abs();
            let deg = lat.floor();
            let min = (lat - deg) * 60.;
            format!("{:02.0}{:05.2}{}", deg, min, h).into_bytes()
        }
        fn encode_lon(lon: f64) -> Vec<u8> {
            let h = if lon < 0. { 'W' } else { 'E' };
            let lon = lon.abs();
            let deg = lon.floor();
            let min = (lon - deg) * 60.;
            format!("{:03.0}{:05.2}{}", deg, min, h).into_bytes()
        }
        let mut diag = CaptureSink::new();
        for i in 0..90 {
            let lat = -89.98 + 1.997 * f64::from(i);
            let lon = -179.98 + 3.997 * f64::from(i);
            let decoded =
                latitude_ddmm(&encode_lat(lat), &mut diag).unwrap();
            assert_relative_eq!(decoded, lat, epsilon = 1. / 6000.);
            let decoded =
                longitude_dddmm(&encode_lon(lon), &mut diag).unwrap();
            assert_relative_eq!(decoded, lon, epsilon = 1. / 6000.);
        }
        assert!(diag.messages.is_empty());
    }
}
