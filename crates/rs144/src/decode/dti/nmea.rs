use crate::decode::coord::{KNOTS_TO_MPH, METERS_TO_FEET};
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Raw NMEA sentences
 *
 * Some trackers put a GPS sentence on the air untouched. `$GPRMC`
 * carries position, speed over ground (knots) and course; `$GPGGA`
 * carries position and antenna altitude (metres). Anything else with
 * a `$` stays an opaque "Raw GPS data" record.
 */

/// NMEA packs latitude as `ddmm.mmmm` and longitude as `dddmm.mmmm`;
/// the hemisphere rides in the following field.
fn angle(
    value: &str,
    hemisphere: &str,
    negative: char,
    max: f64,
    diag: &mut dyn DiagSink,
) -> Option<f64> {
    let raw: f64 = value.parse().ok().or_else(|| {
        diag.report(
            Severity::Error,
            format!("NMEA coordinate \"{value}\" is not numeric."),
        );
        None
    })?;
    let degrees = (raw / 100.).trunc();
    let minutes = raw - degrees * 100.;
    let result = degrees + minutes / 60.;
    if result > max || minutes >= 60. {
        diag.report(
            Severity::Error,
            format!("NMEA coordinate \"{value}\" is out of range."),
        );
        return None;
    }
    let hemisphere = hemisphere.trim();
    if hemisphere.len() == 1
        && hemisphere.chars().next() == Some(negative)
    {
        Some(-result)
    } else {
        Some(result)
    }
}

pub fn sentence(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("Raw GPS data");
    let text = String::from_utf8_lossy(info).into_owned();
    let text = text.trim_end_matches(['\r', '\n']);
    // Drop the *hh checksum; the link layer already checked the frame
    let text = text.split('*').next().unwrap_or(text);
    let fields: Vec<&str> = text.split(',').collect();

    match fields[0] {
        "$GPRMC" if fields.len() >= 9 => {
            if fields[2] != "A" {
                diag.report(
                    Severity::Warning,
                    "GPRMC sentence flags its fix as not valid."
                        .to_string(),
                );
            }
            record.latitude = angle(fields[3], fields[4], 'S', 90., diag);
            record.longitude =
                angle(fields[5], fields[6], 'W', 180., diag);
            if let Ok(knots) = fields[7].parse::<f64>() {
                record.speed_mph = Some(knots * KNOTS_TO_MPH);
            }
            if let Ok(course) = fields[8].parse::<f64>() {
                record.course_deg = Some(course);
            }
        }
        "$GPGGA" if fields.len() >= 10 => {
            record.latitude = angle(fields[2], fields[3], 'S', 90., diag);
            record.longitude =
                angle(fields[4], fields[5], 'W', 180., diag);
            if let Ok(meters) = fields[9].parse::<f64>() {
                record.altitude_ft = Some(meters * METERS_TO_FEET);
            }
        }
        _ => {
            record.set_comment(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;
    use approx::assert_relative_eq;

    #[test]
    fn test_gprmc() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        sentence(
            &mut record,
            b"$GPRMC,063909,A,3349.4302,N,11700.3721,W,43.022,89.3,\
              291099,13.6,E*52",
            &mut diag,
        );
        assert_eq!(record.msg_type, "Raw GPS data");
        assert_relative_eq!(
            record.latitude.unwrap(),
            33. + 49.4302 / 60.,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            record.longitude.unwrap(),
            -(117. + 0.3721 / 60.),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            record.speed_mph.unwrap(),
            43.022 * KNOTS_TO_MPH,
            epsilon = 1e-6
        );
        assert_eq!(record.course_deg, Some(89.3));
        assert!(diag.messages.is_empty());
    }

    #[test]
    fn test_gpgga() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        sentence(
            &mut record,
            b"$GPGGA,063909,3349.4302,N,11700.3721,W,1,08,1.1,530.6,M,\
              -21.9,M,,*7D",
            &mut diag,
        );
        assert_relative_eq!(
            record.altitude_ft.unwrap(),
            530.6 * METERS_TO_FEET,
            epsilon = 1e-6
        );
        assert!(record.latitude.is_some());
    }

    #[test]
    fn test_unknown_sentence() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        sentence(&mut record, b"$GPWPT,something,else", &mut diag);
        assert_eq!(record.comment.as_deref(), Some("$GPWPT,something,else"));
    }

    #[test]
    fn test_invalid_fix_warns() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        sentence(
            &mut record,
            b"$GPRMC,063909,V,3349.4302,N,11700.3721,W,0.0,0.0,291099,,",
            &mut diag,
        );
        assert!(diag.contains("not valid"));
    }
}
