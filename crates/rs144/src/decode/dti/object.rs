use chrono::{DateTime, Utc};

use super::position::position_and_tail;
use super::timestamp7;
use crate::decode::DecodedInfo;
use crate::diag::{DiagSink, Severity};

/**
 * ## Objects and items
 *
 * Both name something other than the transmitting station. An object
 * (`;`) has a fixed 9-character name, a live (`*`) or killed (`_`)
 * flag and a 7-byte timestamp; an item (`)`) has a 3-9 character name
 * terminated by `!` (live) or `_` (killed) and no timestamp. The rest
 * is an ordinary position with its extensions.
 */

/// `;`
pub fn object(
    record: &mut DecodedInfo,
    info: &[u8],
    now: DateTime<Utc>,
    diag: &mut dyn DiagSink,
) {
    if info.len() < 18 {
        diag.report(
            Severity::Error,
            "Object report is shorter than name, flag and timestamp."
                .to_string(),
        );
        record.set_msg_type("Object");
        return;
    }
    let name = String::from_utf8_lossy(&info[1..10]);
    record.set_object_name(name.trim_end());
    match info[10] {
        b'*' => record.set_msg_type("Object"),
        b'_' => record.set_msg_type("Killed Object"),
        c => {
            record.set_msg_type("Object");
            diag.report(
                Severity::Error,
                format!(
                    "Object flag should be \"*\" (live) or \"_\" \
                     (killed), found \"{}\".",
                    c as char
                ),
            );
        }
    }
    timestamp7(record, &info[11..18], now, diag);
    position_and_tail(record, &info[18..], diag);
}

/// `)`
pub fn item(
    record: &mut DecodedInfo,
    info: &[u8],
    diag: &mut dyn DiagSink,
) {
    // Name runs to the first "!" or "_", between 3 and 9 characters
    let terminator = info[1..]
        .iter()
        .position(|&c| c == b'!' || c == b'_')
        .map(|i| i + 1);
    let Some(terminator) = terminator.filter(|&i| (4..=10).contains(&i))
    else {
        record.set_msg_type("Item");
        diag.report(
            Severity::Error,
            "Item name should be 3 to 9 characters ended by \"!\" or \
             \"_\"."
                .to_string(),
        );
        return;
    };
    let name = String::from_utf8_lossy(&info[1..terminator]);
    record.set_object_name(&name);
    record.set_msg_type(if info[terminator] == b'!' {
        "Item"
    } else {
        "Killed Item"
    });
    position_and_tail(record, &info[terminator + 1..], diag);
}
