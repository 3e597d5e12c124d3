use crate::decode::{telemetry, DecodedInfo};
use crate::diag::{DiagSink, Severity};

/**
 * ## Messages
 *
 * `:addressee:body`: the addressee occupies exactly nine characters
 * (space padded) followed by a second colon. The body selects the
 * actual meaning: telemetry metadata (`PARM.`, `UNIT.`, `EQNS.`,
 * `BITS.`), a directed station query (`?` prefix), or a plain user
 * message kept verbatim.
 */
pub fn message(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    record.set_msg_type("APRS Message");
    if info.len() < 11 || info[10] != b':' {
        diag.report(
            Severity::Error,
            "Message should have a 9-character addressee followed by \
             \":\"."
                .to_string(),
        );
        return;
    }
    let addressee = String::from_utf8_lossy(&info[1..10]);
    let addressee = addressee.trim_end().to_string();
    record.set_addressee(&addressee);

    let body = String::from_utf8_lossy(&info[11..]).into_owned();
    let body = body.trim_end_matches(['\r', '\n']);

    if telemetry::metadata_message(record, &addressee, body, diag) {
        return;
    }
    if let Some(query) = body.strip_prefix('?') {
        record.set_msg_type("Directed Station Query");
        let end = query.len().min(5);
        record.set_query_type(&query[..end]);
        // TODO: extract the optional callsign after the query type;
        // where it begins when the type is shorter than five
        // characters is not pinned down by the published format.
        return;
    }
    record.set_comment(body);
}
