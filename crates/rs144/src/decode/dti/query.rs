use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## General queries
 *
 * `?type?` optionally followed by a footprint, `lat,lon,radius`: the
 * sender only wants answers from stations inside that circle.
 */
pub fn general_query(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("General Query");
    let text = String::from_utf8_lossy(&info[1..]).into_owned();
    let text = text.trim_end_matches(['\r', '\n']);

    let Some((query_type, footprint)) = text.split_once('?') else {
        diag.report(
            Severity::Error,
            "General query should end with a second \"?\".".to_string(),
        );
        record.set_query_type(text);
        return;
    };
    record.set_query_type(query_type);

    if footprint.is_empty() {
        return;
    }
    let parts: Vec<&str> = footprint.split(',').collect();
    let values: Vec<f64> = parts
        .iter()
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    if parts.len() != 3 || values.len() != 3 {
        diag.report(
            Severity::Error,
            "Query footprint should be \"latitude,longitude,radius\"."
                .to_string(),
        );
        return;
    }
    let (lat, lon, radius) = (values[0], values[1], values[2]);
    if lat.abs() > 90. || lon.abs() > 180. || !(0. ..=9999.).contains(&radius)
    {
        diag.report(
            Severity::Error,
            format!(
                "Query footprint {lat},{lon},{radius} is out of range."
            ),
        );
        return;
    }
    record.footprint_lat = Some(lat);
    record.footprint_lon = Some(lon);
    record.footprint_radius_mi = Some(radius);
}
