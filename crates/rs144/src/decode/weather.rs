use crate::decode::coord::{KM_TO_MILES, KNOTS_TO_MPH};
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Weather fields
 *
 * Weather measurements are keyed by a single letter and carry a fixed
 * number of digits. Wind comes first and takes one of three shapes:
 * `DDD/SSS` in a position report (already decoded into course/speed by
 * the data-extension probe), the compressed `c`,`s` trailer (same), or
 * the inline `cDDDsSSS` of a positionless report.
 *
 * After the peak gust (`g`) and temperature (`t`), the remaining
 * elements may appear in any order:
 *
 * | Key | Width | Meaning                               |
 * | --- | ----- | ------------------------------------- |
 * | r   | 3     | rain in the last hour, 0.01 in        |
 * | p   | 3     | rain in the last 24 hours, 0.01 in    |
 * | P   | 3     | rain since midnight, 0.01 in          |
 * | h   | 2     | humidity %, 00 means 100              |
 * | b   | 5     | barometric pressure, 0.1 mbar         |
 * | L   | 3     | luminosity W/m², 0-999                |
 * | l   | 3     | luminosity W/m², add 1000             |
 * | s   | 3     | snowfall in the last 24 hours, inches |
 * | #   | 3     | raw rain counter                      |
 * | X   | 3     | radiation                             |
 *
 * `s` means wind speed before the temperature and snowfall after it;
 * only the post-temperature scan may read it as snow.
 *
 * An element may be present but unknown: dots or spaces of the element
 * width. Anything unrecognised ends the scan and is kept verbatim (in
 * practice the weather station identifier, e.g. `wRSW`).
 */

/// 1 inch of mercury in millibars.
const MBAR_PER_INHG: f64 = 33.8639;

enum Element {
    Value(i32),
    Unknown,
    NotANumber,
}

fn element(data: &[u8], width: usize) -> Element {
    if data.len() < width {
        return Element::NotANumber;
    }
    let field = &data[0..width];
    if field.iter().all(|&c| c == b'.') || field.iter().all(|&c| c == b' ')
    {
        return Element::Unknown;
    }
    let negative = field[0] == b'-';
    let digits = if negative { &field[1..] } else { field };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Element::NotANumber;
    }
    let n = digits.iter().fold(0, |n, c| n * 10 + i32::from(c - b'0'));
    Element::Value(if negative { -n } else { n })
}

/// Decode the weather payload into the `weather` string of the record.
///
/// `wind_in_record` is true when course/speed were already decoded from
/// the position (data extension or compressed trailer); they are moved
/// to the weather line and cleared. Otherwise the payload starts with
/// the positionless `cDDDsSSS` wind.
pub fn weather_data(
    record: &mut DecodedInfo,
    data: &[u8],
    wind_in_record: bool,
    diag: &mut dyn DiagSink,
) {
    let mut out = String::new();
    let mut pos = 0;

    let (mut direction, mut speed) = (None, None);
    if wind_in_record {
        direction = record.course_deg;
        speed = record.speed_mph;
    } else {
        if data.first() == Some(&b'c') {
            match element(&data[1..], 3) {
                Element::Value(n) if (0..=360).contains(&n) => {
                    direction = Some(f64::from(n % 360));
                    pos += 4;
                }
                Element::Unknown => pos += 4,
                _ => {
                    diag.report(
                        Severity::Error,
                        "Wind direction should be three digits."
                            .to_string(),
                    );
                }
            }
        }
        if data.get(pos) == Some(&b's') {
            match element(&data[pos + 1..], 3) {
                Element::Value(n) => {
                    speed = Some(f64::from(n) * KNOTS_TO_MPH);
                    pos += 4;
                }
                Element::Unknown => pos += 4,
                _ => {
                    diag.report(
                        Severity::Error,
                        "Wind speed should be three digits.".to_string(),
                    );
                }
            }
        }
    }
    if let Some(speed) = speed {
        out.push_str(&format!("wind {speed:.1} mph"));
    }
    if let Some(direction) = direction {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&format!("direction {direction:.0}"));
    }

    let push = |out: &mut String, s: String| {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&s);
    };

    // Fixed order: peak gust then temperature
    if data.get(pos) == Some(&b'g') {
        match element(&data[pos + 1..], 3) {
            Element::Value(n) => {
                push(&mut out, format!("gust {n}"));
                pos += 4;
            }
            Element::Unknown => pos += 4,
            Element::NotANumber => {}
        }
    }
    if data.get(pos) == Some(&b't') {
        match element(&data[pos + 1..], 3) {
            Element::Value(n) => {
                push(&mut out, format!("temperature {n}"));
                pos += 4;
            }
            Element::Unknown => pos += 4,
            Element::NotANumber => {}
        }
    }

    // Any order from here on
    loop {
        let Some(&key) = data.get(pos) else { break };
        let width = match key {
            b'r' | b'p' | b'P' | b'L' | b'l' | b's' | b'#' | b'X' => 3,
            b'h' => 2,
            b'b' => 5,
            _ => break,
        };
        match element(&data[pos + 1..], width) {
            Element::Value(n) => {
                match key {
                    b'r' => push(
                        &mut out,
                        format!(
                            "rain {:.2} in last hour",
                            f64::from(n) / 100.
                        ),
                    ),
                    b'p' => push(
                        &mut out,
                        format!(
                            "rain {:.2} in last 24 hours",
                            f64::from(n) / 100.
                        ),
                    ),
                    b'P' => push(
                        &mut out,
                        format!(
                            "rain {:.2} since midnight",
                            f64::from(n) / 100.
                        ),
                    ),
                    b'h' => push(
                        &mut out,
                        format!(
                            "humidity {}",
                            if n == 0 { 100 } else { n }
                        ),
                    ),
                    b'b' => push(
                        &mut out,
                        format!(
                            "barometer {:.2}",
                            f64::from(n) / 10. / MBAR_PER_INHG
                        ),
                    ),
                    b'L' => push(&mut out, format!("luminosity {n}")),
                    b'l' => {
                        push(&mut out, format!("luminosity {}", n + 1000))
                    }
                    b's' => push(
                        &mut out,
                        format!("snow {n} in last 24 hours"),
                    ),
                    b'#' => push(&mut out, format!("rain counter {n}")),
                    b'X' => push(&mut out, format!("radiation {n}")),
                    _ => unreachable!(),
                }
                pos += 1 + width;
            }
            Element::Unknown => pos += 1 + width,
            Element::NotANumber => break,
        }
    }

    // Whatever is left is usually the station identifier
    let rest = String::from_utf8_lossy(&data[pos..]);
    let rest = rest.trim_end_matches(['\r', '\n']).trim();
    if !rest.is_empty() {
        push(&mut out, format!("\"{rest}\""));
    }

    record.set_weather(&out);
    // Wind belongs to the weather line, not the motion line
    record.course_deg = None;
    record.speed_mph = None;
}

/**
 * ## Peet Brothers Ultimeter
 *
 * The Ultimeter 2000 emits its own frames of 4-digit hexadecimal
 * groups (`----` when a sensor is absent): `!!` in logging mode, or a
 * `$ULTW` sentence in packet mode. The groups of interest here are
 * wind peak (0.1 km/h), wind direction (0-255), outdoor temperature
 * (0.1 °F), barometer (0.1 mbar) and outdoor humidity (0.1 %).
 */
pub fn ultimeter(
    record: &mut DecodedInfo,
    data: &[u8],
    packet_mode: bool,
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type(if packet_mode {
        "Ultimeter (packet mode)"
    } else {
        "Ultimeter (logging mode)"
    });

    let mut groups = Vec::new();
    let mut pos = 0;
    while pos + 4 <= data.len() {
        let field = &data[pos..pos + 4];
        if field == b"----" {
            groups.push(None);
        } else if field.iter().all(u8::is_ascii_hexdigit) {
            let n = field.iter().fold(0_u32, |n, &c| {
                let digit = match c {
                    b'0'..=b'9' => c - b'0',
                    b'A'..=b'F' => c - b'A' + 10,
                    _ => c - b'a' + 10,
                };
                n * 16 + u32::from(digit)
            });
            groups.push(Some(n));
        } else {
            break;
        }
        pos += 4;
    }
    if groups.len() < 4 {
        diag.report(
            Severity::Error,
            "Ultimeter frame should carry at least four groups of four \
             hexadecimal digits."
                .to_string(),
        );
        return;
    }

    let mut out = String::new();
    let push = |out: &mut String, s: String| {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&s);
    };
    if let Some(Some(wind)) = groups.first() {
        push(
            &mut out,
            format!(
                "wind {:.1} mph",
                f64::from(*wind) * 0.1 * KM_TO_MILES
            ),
        );
    }
    if let Some(Some(direction)) = groups.get(1) {
        push(
            &mut out,
            format!(
                "direction {:.0}",
                f64::from(direction % 256) * 360. / 256.
            ),
        );
    }
    if let Some(Some(temperature)) = groups.get(2) {
        // Sign convention matches the wire: 16-bit two's complement
        let t = *temperature as i32;
        let t = if t > 0x7fff { t - 0x10000 } else { t };
        push(&mut out, format!("temperature {:.1}", f64::from(t) / 10.));
    }
    if let Some(Some(barometer)) = groups.get(4) {
        push(
            &mut out,
            format!(
                "barometer {:.2}",
                f64::from(*barometer) / 10. / MBAR_PER_INHG
            ),
        );
    }
    if let Some(Some(humidity)) = groups.get(8) {
        push(
            &mut out,
            format!("humidity {:.0}", f64::from(*humidity) / 10.),
        );
    }
    record.set_weather(&out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::CaptureSink;

    #[test]
    fn test_positionless_weather() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        weather_data(
            &mut record,
            b"c220s004g005t077r000p000P000h50b09900wRSW",
            false,
            &mut diag,
        );
        let weather = record.weather.as_deref().unwrap();
        assert_eq!(
            weather,
            "wind 4.6 mph, direction 220, gust 5, temperature 77, \
             rain 0.00 in last hour, rain 0.00 in last 24 hours, \
             rain 0.00 since midnight, humidity 50, barometer 29.23, \
             \"wRSW\""
        );
        assert_eq!(record.course_deg, None);
        assert_eq!(record.speed_mph, None);
        assert!(diag.messages.is_empty());
    }

    #[test]
    fn test_wind_from_record() {
        let mut record = DecodedInfo::new("W1ABC");
        record.course_deg = Some(220.);
        record.speed_mph = Some(4. * KNOTS_TO_MPH);
        let mut diag = CaptureSink::new();
        weather_data(&mut record, b"g005t077", true, &mut diag);
        let weather = record.weather.as_deref().unwrap();
        assert!(weather.starts_with("wind 4.6 mph, direction 220"));
        assert!(weather.contains("gust 5"));
        assert_eq!(record.course_deg, None);
    }

    #[test]
    fn test_unknown_elements_skipped() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        weather_data(
            &mut record,
            b"c...s...g...t077h..b.....",
            false,
            &mut diag,
        );
        assert_eq!(record.weather.as_deref(), Some("temperature 77"));
    }

    #[test]
    fn test_negative_temperature() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        weather_data(&mut record, b"c220s004g005t-07", false, &mut diag);
        assert!(record
            .weather
            .as_deref()
            .unwrap()
            .contains("temperature -7"));
    }

    #[test]
    fn test_humidity_zero_means_100() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        weather_data(&mut record, b"c220s004g005t077h00", false, &mut diag);
        assert!(record.weather.as_deref().unwrap().contains("humidity 100"));
    }

    #[test]
    fn test_snow_only_after_temperature() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        weather_data(&mut record, b"c220s010g005t077s123", false, &mut diag);
        let weather = record.weather.as_deref().unwrap();
        assert!(weather.contains("wind 11.5 mph"));
        assert!(weather.contains("snow 123 in last 24 hours"));
    }

    #[test]
    fn test_ultimeter_logging_mode() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        // 0x00A4 = 164 * 0.1 km/h = 10.2 mph, 0x00B6 = 182 -> 256 deg,
        // 0x02C1 = 705 -> 70.5 F, barometer 0x2655 = 9813 -> 28.98 inHg
        ultimeter(
            &mut record,
            b"00A400B602C1----26550001----011901CC",
            false,
            &mut diag,
        );
        assert_eq!(record.msg_type, "Ultimeter (logging mode)");
        let weather = record.weather.as_deref().unwrap();
        assert!(weather.contains("wind 10.2 mph"));
        assert!(weather.contains("direction 256"));
        assert!(weather.contains("temperature 70.5"));
        assert!(weather.contains("barometer 28.98"));
    }

    #[test]
    fn test_ultimeter_too_short() {
        let mut record = DecodedInfo::new("W1ABC");
        let mut diag = CaptureSink::new();
        ultimeter(&mut record, b"00A4", true, &mut diag);
        assert!(diag.contains("four groups"));
    }
}
