use crate::decode::coord::KNOTS_TO_MPH;
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## 7-byte data extension
 *
 * The first seven bytes after a human-readable position and symbol may
 * hold one of five fixed-width extensions:
 *
 * | Shape     | Meaning                                              |
 * | --------- | ---------------------------------------------------- |
 * | `Tyy/Cxx` | area object descriptor (skipped)                     |
 * | `DDD/SSS` | course in degrees / speed in knots                   |
 * | `PHGphgd` | power (p-0)², height 10·2^h ft, gain dBi, direction  |
 * | `RNGrrrr` | pre-computed radio range in miles                    |
 * | `DFSshgd` | DF signal strength in S-points, then as PHG          |
 * |
 *
 * Anything else is not an extension and belongs to the comment.
 */

const DIRECTIVITY: [&str; 9] =
    ["omni", "NE", "E", "SE", "S", "SW", "W", "NW", "N"];

fn three_digits(field: &[u8]) -> Option<u32> {
    if field.iter().all(u8::is_ascii_digit) {
        Some(field.iter().fold(0, |n, c| n * 10 + u32::from(c - b'0')))
    } else {
        None
    }
}

fn unknown_number(field: &[u8]) -> bool {
    field.iter().all(|&c| c == b'.') || field.iter().all(|&c| c == b' ')
}

/// Probe `tail` for a data extension, filling the matching fields of
/// the record. Returns the number of bytes consumed: 7 for a
/// recognised extension, 0 otherwise.
pub fn probe(
    record: &mut DecodedInfo,
    tail: &[u8],
    diag: &mut dyn DiagSink,
) -> usize {
    if tail.len() < 7 {
        return 0;
    }
    let ext = &tail[0..7];
    match &ext[0..3] {
        b"PHG" => {
            let &[p, h, g, d] = &ext[3..7] else { unreachable!() };
            if !ext[3..7].iter().all(u8::is_ascii_digit) || d > b'8' {
                diag.report(
                    Severity::Error,
                    "PHG extension should be followed by four digits, \
                     the last one in 0-8."
                        .to_string(),
                );
                return 0;
            }
            record.power_w = Some(u32::from(p - b'0').pow(2));
            record.height_ft = Some((1_u32 << (h - b'0')) * 10);
            record.gain_dbi = Some(u32::from(g - b'0'));
            record
                .set_directivity(DIRECTIVITY[usize::from(d - b'0')]);
            7
        }
        b"RNG" => {
            let Some(range) = ext[3..7]
                .iter()
                .all(u8::is_ascii_digit)
                .then(|| {
                    ext[3..7]
                        .iter()
                        .fold(0_u32, |n, c| n * 10 + u32::from(c - b'0'))
                })
            else {
                diag.report(
                    Severity::Error,
                    "RNG extension should be followed by four digits."
                        .to_string(),
                );
                return 0;
            };
            record.range_mi = Some(f64::from(range));
            7
        }
        b"DFS" => {
            let &[s, h, g, d] = &ext[3..7] else { unreachable!() };
            if !ext[3..7].iter().all(u8::is_ascii_digit) || d > b'8' {
                diag.report(
                    Severity::Error,
                    "DFS extension should be followed by four digits, \
                     the last one in 0-8."
                        .to_string(),
                );
                return 0;
            }
            record.df_strength_s = Some(u32::from(s - b'0'));
            record.height_ft = Some((1_u32 << (h - b'0')) * 10);
            record.gain_dbi = Some(u32::from(g - b'0'));
            record
                .set_directivity(DIRECTIVITY[usize::from(d - b'0')]);
            7
        }
        _ if ext[3] == b'/' => {
            // Area object descriptor, carried between the position and
            // the object shape details. Nothing of it is kept.
            if ext[0] == b'T' && ext[4] == b'C' {
                return 7;
            }
            course_speed(record, ext, diag)
        }
        _ => 0,
    }
}

/// `DDD/SSS`: degrees 1-360 (0, spaces or dots mean unknown, 360 is
/// rewritten to 0) and speed in knots.
fn course_speed(
    record: &mut DecodedInfo,
    ext: &[u8],
    diag: &mut dyn DiagSink,
) -> usize {
    let course = &ext[0..3];
    let speed = &ext[4..7];
    match three_digits(course) {
        Some(0) => {} // explicitly unknown
        Some(n) if n <= 360 => {
            record.course_deg = Some(f64::from(n % 360));
        }
        Some(n) => {
            diag.report(
                Severity::Error,
                format!("Course {n} is out of range [0,360]."),
            );
        }
        None if unknown_number(course) => {}
        None => return 0,
    }
    match three_digits(speed) {
        Some(n) => {
            record.speed_mph = Some(f64::from(n) * KNOTS_TO_MPH);
        }
        None if unknown_number(speed) => {}
        None => {
            // A course without a speed is not an extension after all
            record.course_deg = None;
            return 0;
        }
    }
    7
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;
    use approx::assert_relative_eq;

    #[test]
    fn test_phg() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"PHG7140Chelmsford", &mut diag), 7);
        assert_eq!(record.power_w, Some(49));
        assert_eq!(record.height_ft, Some(20));
        assert_eq!(record.gain_dbi, Some(4));
        assert_eq!(record.directivity.as_deref(), Some("omni"));
    }

    #[test]
    fn test_course_speed() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"088/036", &mut diag), 7);
        assert_eq!(record.course_deg, Some(88.));
        assert_relative_eq!(
            record.speed_mph.unwrap(),
            36. * KNOTS_TO_MPH,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_course_zero_and_360() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"000/036", &mut diag), 7);
        assert_eq!(record.course_deg, None);

        let mut record = DecodedInfo::new("W1ABC");
        assert_eq!(probe(&mut record, b"360/036", &mut diag), 7);
        assert_eq!(record.course_deg, Some(0.));
    }

    #[test]
    fn test_course_unknown() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b".../036", &mut diag), 7);
        assert_eq!(record.course_deg, None);
        assert!(record.speed_mph.is_some());
    }

    #[test]
    fn test_rng() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"RNG0050", &mut diag), 7);
        assert_eq!(record.range_mi, Some(50.));
    }

    #[test]
    fn test_dfs() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"DFS2360", &mut diag), 7);
        assert_eq!(record.df_strength_s, Some(2));
        assert_eq!(record.height_ft, Some(80));
        assert_eq!(record.gain_dbi, Some(6));
        assert_eq!(record.directivity.as_deref(), Some("omni"));
    }

    #[test]
    fn test_area_object_skipped() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"T21/C12", &mut diag), 7);
        assert_eq!(record.course_deg, None);
    }

    #[test]
    fn test_not_an_extension() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        assert_eq!(probe(&mut record, b"Chelmsf", &mut diag), 0);
        assert_eq!(probe(&mut record, b"Hi!", &mut diag), 0);
    }
}
