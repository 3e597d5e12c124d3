use std::fmt;

use chrono::Utc;
use tracing::warn;

use crate::decode::tocalls::TocallTable;
use crate::decode::{Ax25Packet, DecodedInfo, Decoder};
use crate::diag::NullSink;

/**
 * ## Packet filters
 *
 * A filter is a boolean expression over one decoded packet:
 *
 * ```text
 * expr        = or_expr
 * or_expr     = and_expr ( '|' and_expr )*
 * and_expr    = primary ( '&' primary )*
 * primary     = '(' expr ')' | '!' primary | FILTER_SPEC
 * FILTER_SPEC = any run of non-space, non-operator characters
 * ```
 *
 * Leaf specs start with a type letter; the very next character is the
 * list separator, so `b/W2UB/N2GH` and `b#W2UB#N2GH` are the same
 * filter:
 *
 * | Spec | Passes when                                             |
 * | ---- | ------------------------------------------------------- |
 * | `0` `1` | never / always (testing)                             |
 * | `b`  | source callsign is listed (`*` suffix matches a prefix) |
 * | `o`  | object or item name is listed                           |
 * | `d`  | a digipeater with the has-been-used bit set is listed   |
 * | `v`  | a digipeater with the bit clear is listed               |
 * | `g`  | message addressee is listed                             |
 * | `u`  | destination (unproto) is listed, except for Mic-E       |
 * | `t`  | packet type is one of the given letters                 |
 * | `r`  | position within `lat`,`lon`,`km`                        |
 * | `s`  | symbol from the given primary/alternate/overlay sets    |
 *
 * Evaluation returns pass, drop, or a syntax error located by a caret
 * diagnostic carrying the channel tags.
 */

/// Where a packet came from or goes to; shows up in filter
/// diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// A radio channel number
    Chan(u8),
    /// The internet gateway side
    IGate,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chan(n) => write!(f, "{n}"),
            Self::IGate => write!(f, "IG"),
        }
    }
}

/// A syntax error, rendered as the classic three-line caret
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    pub filter: String,
    pub offset: usize,
    pub message: String,
    pub from: Channel,
    pub to: Channel,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = format!("[{}>{}] ", self.from, self.to);
        writeln!(f, "{tag}{}", self.filter)?;
        writeln!(f, "{:>width$}", "^", width = tag.len() + self.offset + 1)?;
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Spec,
    End,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
    offset: usize,
}

struct Evaluator<'a> {
    filter: String,
    bytes: Vec<u8>,
    pos: usize,
    token: Token,
    packet: &'a Ax25Packet,
    decoded: DecodedInfo,
    from: Channel,
    to: Channel,
}

/// Evaluate `filter` against one packet: `Ok(true)` passes, `Ok(false)`
/// drops, `Err` is a syntax error. The channel tags only decorate
/// diagnostics.
pub fn evaluate(
    from: Channel,
    to: Channel,
    filter: &str,
    packet: &Ax25Packet,
) -> Result<bool, FilterError> {
    // Control characters are mapped to spaces before tokenizing
    let sanitized: String = filter
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let decoder = Decoder::with_tocalls(TocallTable::empty());
    let decoded = decoder.decode_at(packet, Utc::now(), &mut NullSink);

    let mut evaluator = Evaluator {
        bytes: sanitized.clone().into_bytes(),
        filter: sanitized,
        pos: 0,
        token: Token {
            kind: TokenKind::End,
            text: String::new(),
            offset: 0,
        },
        packet,
        decoded,
        from,
        to,
    };
    evaluator.next_token();
    if evaluator.token.kind == TokenKind::End {
        return Err(evaluator.error(0, "Filter is empty."));
    }
    let result = evaluator.or_expr()?;
    if evaluator.token.kind != TokenKind::End {
        return Err(evaluator.error(
            evaluator.token.offset,
            "Expected end of filter.",
        ));
    }
    Ok(result)
}

/// C-shaped adapter: 1 pass, 0 drop, -1 syntax error (logged).
pub fn pfilter(
    from: Channel,
    to: Channel,
    filter: &str,
    packet: &Ax25Packet,
) -> i32 {
    match evaluate(from, to, filter, packet) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            warn!("{e}");
            -1
        }
    }
}

impl Evaluator<'_> {
    fn error(&self, offset: usize, message: &str) -> FilterError {
        FilterError {
            filter: self.filter.clone(),
            offset,
            message: message.to_string(),
            from: self.from,
            to: self.to,
        }
    }

    fn next_token(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] == b' ' {
            self.pos += 1;
        }
        let offset = self.pos;
        if self.pos >= self.bytes.len() {
            self.token = Token {
                kind: TokenKind::End,
                text: String::new(),
                offset,
            };
            return;
        }
        let kind = match self.bytes[self.pos] {
            b'&' => Some(TokenKind::And),
            b'|' => Some(TokenKind::Or),
            b'!' => Some(TokenKind::Not),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = kind {
            self.pos += 1;
            self.token = Token {
                kind,
                text: (self.bytes[offset] as char).to_string(),
                offset,
            };
            return;
        }
        let start = self.pos;
        while self.pos < self.bytes.len()
            && !matches!(self.bytes[self.pos], b' ' | b'&' | b'|' | b'!'
                | b'(' | b')')
        {
            self.pos += 1;
        }
        self.token = Token {
            kind: TokenKind::Spec,
            text: String::from_utf8_lossy(&self.bytes[start..self.pos])
                .into_owned(),
            offset,
        };
    }

    fn or_expr(&mut self) -> Result<bool, FilterError> {
        let mut result = self.and_expr()?;
        while self.token.kind == TokenKind::Or {
            self.next_token();
            result |= self.and_expr()?;
        }
        Ok(result)
    }

    fn and_expr(&mut self) -> Result<bool, FilterError> {
        let mut result = self.primary()?;
        while self.token.kind == TokenKind::And {
            self.next_token();
            result &= self.primary()?;
        }
        Ok(result)
    }

    fn primary(&mut self) -> Result<bool, FilterError> {
        match self.token.kind {
            TokenKind::LParen => {
                self.next_token();
                let result = self.or_expr()?;
                if self.token.kind != TokenKind::RParen {
                    return Err(self.error(
                        self.token.offset,
                        "Expected \")\" here.",
                    ));
                }
                self.next_token();
                Ok(result)
            }
            TokenKind::Not => {
                self.next_token();
                Ok(!self.primary()?)
            }
            TokenKind::Spec => {
                let token = self.token.clone();
                let result = self.leaf(&token)?;
                self.next_token();
                Ok(result)
            }
            _ => Err(self.error(
                self.token.offset,
                "Expected a filter specification, \"(\" or \"!\" here.",
            )),
        }
    }

    fn leaf(&self, token: &Token) -> Result<bool, FilterError> {
        let spec = token.text.as_str();
        match spec {
            "0" => return Ok(false),
            "1" => return Ok(true),
            _ => {}
        }
        let mut chars = spec.chars();
        let letter = chars.next().unwrap();
        let Some(separator) = chars.next() else {
            return Err(self.error(
                token.offset,
                "Filter specification is missing its separator \
                 character.",
            ));
        };
        let rest = &spec[letter.len_utf8() + separator.len_utf8()..];
        match letter {
            'b' => self.match_list(
                token,
                rest,
                separator,
                &[self.packet.source.as_str()],
            ),
            'o' => {
                let names: Vec<&str> = self
                    .decoded
                    .object_name
                    .iter()
                    .map(String::as_str)
                    .collect();
                self.match_list(token, rest, separator, &names)
            }
            'd' => {
                let digis: Vec<&str> = self
                    .packet
                    .digipeaters
                    .iter()
                    .filter(|d| d.has_been_used)
                    .map(|d| d.callsign.as_str())
                    .collect();
                self.match_list(token, rest, separator, &digis)
            }
            'v' => {
                let digis: Vec<&str> = self
                    .packet
                    .digipeaters
                    .iter()
                    .filter(|d| !d.has_been_used)
                    .map(|d| d.callsign.as_str())
                    .collect();
                self.match_list(token, rest, separator, &digis)
            }
            'g' => {
                if self.packet.dti() != b':' {
                    return Ok(false);
                }
                let addressees: Vec<&str> = self
                    .decoded
                    .addressee
                    .iter()
                    .map(String::as_str)
                    .collect();
                self.match_list(token, rest, separator, &addressees)
            }
            'u' => {
                // The destination of a Mic-E packet encodes latitude,
                // not an address
                if matches!(self.packet.dti(), b'\'' | b'`') {
                    return Ok(false);
                }
                self.match_list(
                    token,
                    rest,
                    separator,
                    &[self.packet.destination.as_str()],
                )
            }
            't' => self.match_type(token, rest),
            'r' => self.match_range(token, rest, separator),
            's' => self.match_symbol(token, rest, separator),
            _ => Err(self.error(
                token.offset,
                "Unknown filter type letter.",
            )),
        }
    }

    /// `b/ o/ d/ v/ g/ u/` all share the same list match with an
    /// optional `*` prefix wildcard.
    fn match_list(
        &self,
        token: &Token,
        rest: &str,
        separator: char,
        candidates: &[&str],
    ) -> Result<bool, FilterError> {
        if rest.is_empty() {
            return Err(self.error(
                token.offset,
                "Filter specification has an empty pattern list.",
            ));
        }
        let mut result = false;
        for pattern in rest.split(separator) {
            if pattern.is_empty() {
                return Err(self.error(
                    token.offset,
                    "Empty pattern in filter specification.",
                ));
            }
            if let Some(prefix) = pattern.strip_suffix('*') {
                if prefix.contains('*') {
                    return Err(self.error(
                        token.offset,
                        "\"*\" is only allowed at the end of a pattern.",
                    ));
                }
                result |=
                    candidates.iter().any(|c| c.starts_with(prefix));
            } else {
                if pattern.contains('*') {
                    return Err(self.error(
                        token.offset,
                        "\"*\" is only allowed at the end of a pattern.",
                    ));
                }
                result |= candidates.contains(&pattern);
            }
        }
        Ok(result)
    }

    fn match_type(
        &self,
        token: &Token,
        letters: &str,
    ) -> Result<bool, FilterError> {
        let info = self.packet.info.as_slice();
        let mut result = false;
        for letter in letters.chars() {
            result |= match letter {
                'p' => {
                    matches!(self.packet.dti(), b'!' | b'\'' | b'/'
                        | b'=' | b'@' | b'`')
                }
                'o' => self.packet.dti() == b';',
                'i' => self.packet.dti() == b')',
                'm' => self.decoded.msg_type == "APRS Message",
                'q' => {
                    self.packet.dti() == b'?'
                        || self.decoded.msg_type
                            == "Directed Station Query"
                }
                's' => self.packet.dti() == b'>',
                't' => {
                    self.packet.dti() == b'T'
                        || self.decoded.msg_type.starts_with("Telemetry")
                }
                'u' => self.packet.dti() == b'{',
                'w' => {
                    self.packet.dti() == b'_'
                        || info.starts_with(b"$ULTW")
                        || info.starts_with(b"!!")
                        || self.decoded.weather.is_some()
                }
                'n' => self.is_nws(),
                _ => {
                    return Err(self.error(
                        token.offset,
                        "Unknown letter in type filter.",
                    ));
                }
            };
        }
        Ok(result)
    }

    /// National Weather Service products: messages to NWS/SKY/BOM
    /// addressees from six-letter offices, and objects named after
    /// their originating office.
    fn is_nws(&self) -> bool {
        let source = self.packet.source.as_str();
        if source.len() != 6
            || !source.bytes().all(|c| c.is_ascii_uppercase())
        {
            return false;
        }
        if let Some(addressee) = &self.decoded.addressee {
            if ["NWS", "SKY", "BOM"]
                .iter()
                .any(|prefix| addressee.starts_with(prefix))
            {
                return true;
            }
        }
        if let Some(name) = &self.decoded.object_name {
            if name.len() >= 3
                && source.as_bytes().starts_with(&name.as_bytes()[..3])
            {
                return true;
            }
        }
        false
    }

    fn match_range(
        &self,
        token: &Token,
        rest: &str,
        separator: char,
    ) -> Result<bool, FilterError> {
        let values: Vec<f64> = rest
            .split(separator)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| {
                self.error(
                    token.offset,
                    "Range filter should be r/latitude/longitude/km.",
                )
            })?;
        if values.len() != 3 {
            return Err(self.error(
                token.offset,
                "Range filter should be r/latitude/longitude/km.",
            ));
        }
        let (Some(lat), Some(lon)) =
            (self.decoded.latitude, self.decoded.longitude)
        else {
            return Ok(false);
        };
        Ok(haversine_km(values[0], values[1], lat, lon) <= values[2])
    }

    fn match_symbol(
        &self,
        token: &Token,
        rest: &str,
        separator: char,
    ) -> Result<bool, FilterError> {
        let parts: Vec<&str> = rest.split(separator).collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(self.error(
                token.offset,
                "Symbol filter should be s/primary/alternate/overlays.",
            ));
        }
        let table = self.decoded.symbol_table;
        let code = self.decoded.symbol_code;
        if table == '/' {
            return Ok(parts[0].contains(code));
        }
        let Some(alternate) = parts.get(1) else {
            return Ok(false);
        };
        if !alternate.contains(code) {
            return Ok(false);
        }
        match parts.get(2) {
            // Overlay set given: the table character must be listed,
            // including "\" itself for no overlay
            Some(overlays) => Ok(overlays.contains(table)),
            None => Ok(table == '\\'),
        }
    }
}

fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos()
            * lat2.to_radians().cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();
    let c = 2.0 * libm::atan2(libm::sqrt(a), libm::sqrt(1.0 - a));
    const R: f64 = 6371.0; // Earth's radius in kilometers
    R * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_packet() -> Ax25Packet {
        Ax25Packet::new(
            "WB2OSZ-5",
            "APDW12",
            b"!4237.14NS07120.83W#PHG7140Chelmsford MA".to_vec(),
        )
        .via("W2UB", true)
        .via("WIDE2-1", false)
    }

    fn check(filter: &str, packet: &Ax25Packet, expected: i32) {
        assert_eq!(
            pfilter(Channel::Chan(0), Channel::IGate, filter, packet),
            expected,
            "filter {filter:?}"
        );
    }

    #[test]
    fn test_constants_and_operators() {
        let p = position_packet();
        check("1", &p, 1);
        check("0", &p, 0);
        check("1 | 0", &p, 1);
        check("1 & 0", &p, 0);
        check("! 0", &p, 1);
        check("!!1", &p, 1);
        check("( 1 | 0 ) & 1", &p, 1);
    }

    #[test]
    fn test_syntax_errors() {
        let p = position_packet();
        check("", &p, -1);
        check("  ", &p, -1);
        check("( 1", &p, -1);
        check("1 |", &p, -1);
        check("1 1", &p, -1);
        check("x/foo", &p, -1);
        check("b", &p, -1);
        check("b/", &p, -1);
        check("b/W2*UB", &p, -1);
        check("t/pxq", &p, -1);
        check("r/42.6/-71.3", &p, -1);
    }

    #[test]
    fn test_buddy_list() {
        let p = position_packet();
        check("b/WB2OSZ-5", &p, 1);
        check("b/W2UB/WB2OSZ-5/N8VIM", &p, 1);
        check("b#W2UB#WB2OSZ-5#N8VIM", &p, 1);
        check("b/WB2OSZ", &p, 0);
        check("b/WB2OSZ*", &p, 1);
        check("b/W*", &p, 1);
        check("! b/WB2OSZ-5", &p, 0);
    }

    #[test]
    fn test_digipeaters() {
        let p = position_packet();
        // W2UB has been used, WIDE2-1 has not
        check("d/W2UB", &p, 1);
        check("d/WIDE2-1", &p, 0);
        check("v/WIDE2-1", &p, 1);
        check("v/W2UB", &p, 0);
        check("d/WIDE2*", &p, 0);
        check("v/WIDE2*", &p, 1);
    }

    #[test]
    fn test_unproto() {
        let p = position_packet();
        check("u/APDW12", &p, 1);
        check("u/APDW11", &p, 0);
        check("u/APDW*", &p, 1);

        // Mic-E destinations are latitude, not addresses
        let mic_e = Ax25Packet::new(
            "N1ABC-9",
            "T2SP0W",
            b"`c_Vm6hk/>TH-D7A".to_vec(),
        );
        check("u/T2SP0W", &mic_e, 0);
        check("t/p", &mic_e, 1);
    }

    #[test]
    fn test_message_addressee() {
        let msg = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b":WB2OSZ   :Hello there{001".to_vec(),
        );
        check("g/WB2OSZ", &msg, 1);
        check("g/W1ABC", &msg, 0);
        check("t/m", &msg, 1);
        check("t/t", &msg, 0);

        // Addressee filters only apply to messages
        let pos = position_packet();
        check("g/WB2OSZ", &pos, 0);
    }

    #[test]
    fn test_object_and_item() {
        let object = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b";LEADER   *092345z4903.50N/07201.75W>".to_vec(),
        );
        check("o/LEADER", &object, 1);
        check("o/FOLLOWER", &object, 0);
        check("t/o", &object, 1);
        check("t/i", &object, 0);

        let item = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b")AID#2!4903.50N/07201.75WA".to_vec(),
        );
        check("t/i", &item, 1);
        check("o/AID#2", &item, 1);
    }

    #[test]
    fn test_type_filters() {
        let p = position_packet();
        check("t/p", &p, 1);
        check("t/poimqstuwn", &p, 1);
        check("t/oimqstun", &p, 0);

        let telemetry = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"T#005,199,000,255,073,123,01101001".to_vec(),
        );
        check("t/t", &telemetry, 1);
        check("t/p", &telemetry, 0);

        // Telemetry metadata messages count as telemetry, not
        // messages
        let metadata = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b":N0QBF-11 :PARM.Battery,Btemp".to_vec(),
        );
        check("t/t", &metadata, 1);
        check("t/m", &metadata, 0);

        let query = Ax25Packet::new("W1ABC", "APRS", b"?APRS?".to_vec());
        check("t/q", &query, 1);

        let status =
            Ax25Packet::new("W1ABC", "APRS", b">Testing".to_vec());
        check("t/s", &status, 1);

        let userdef =
            Ax25Packet::new("W1ABC", "APRS", b"{ttABCD".to_vec());
        check("t/u", &userdef, 1);
    }

    #[test]
    fn test_weather_types() {
        let positionless = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"_10090556c220s004g005t077".to_vec(),
        );
        check("t/w", &positionless, 1);

        // Raw Ultimeter frames count as weather too
        let ultw = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"$ULTW00A400B602C1----26550001----011901CC".to_vec(),
        );
        check("t/w", &ultw, 1);

        let wx_position = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"!4237.14N/07120.83W_220/004g005t077".to_vec(),
        );
        check("t/w", &wx_position, 1);

        check("t/w", &position_packet(), 0);
    }

    #[test]
    fn test_nws() {
        let nws_msg = Ax25Packet::new(
            "KGYX  ",
            "APRS",
            b":NWS-WARN :Flood warning".to_vec(),
        );
        // Source must be exactly six upper case letters
        check("t/n", &nws_msg, 0);

        let nws_msg = Ax25Packet::new(
            "KGYXGM",
            "APRS",
            b":NWS-WARN :Flood warning".to_vec(),
        );
        check("t/n", &nws_msg, 1);
        check("t/n", &position_packet(), 0);

        // Objects whose name starts like the source office
        let nws_obj = Ax25Packet::new(
            "KGYXGM",
            "APRS",
            b";KGY_WARN *092345z4903.50N/07201.75W>".to_vec(),
        );
        check("t/n", &nws_obj, 1);
    }

    #[test]
    fn test_range() {
        let p = position_packet();
        // Chelmsford MA is a few km from 42.6, -71.3
        check("r/42.6/-71.3/10", &p, 1);
        check("r/42.6/-71.3/1", &p, 0);
        check("r/48.9/2.3/100", &p, 0);

        // No position, no match
        let status =
            Ax25Packet::new("W1ABC", "APRS", b">Testing".to_vec());
        check("r/42.6/-71.3/10000", &status, 0);
    }

    #[test]
    fn test_symbol() {
        // Primary table, house symbol
        let house = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"!4237.14N/07120.83W-".to_vec(),
        );
        check("s/-", &house, 1);
        check("s/->", &house, 1);
        check("s/>", &house, 0);

        // Alternate table, no overlay
        let alt = Ax25Packet::new(
            "W1ABC",
            "APRS",
            b"!4237.14N\\07120.83W#".to_vec(),
        );
        check("s//#", &alt, 1);
        check("s//$", &alt, 0);
        check("s/#", &alt, 0);

        // Digipeater with overlay S, L or 1
        let overlay = position_packet(); // table S, code #
        check("s//#/LS1", &overlay, 1);
        check("s//#/XY", &overlay, 0);
        // Overlay set given: plain "\" must be listed to match
        check("s//#/\\S", &overlay, 1);
        check("s//#", &overlay, 0);
    }

    #[test]
    fn test_boolean_laws() {
        // Disjunction and double negation distribute over any
        // pair of leaf filters
        let packets = [
            position_packet(),
            Ax25Packet::new(
                "W1ABC",
                "APRS",
                b":WB2OSZ   :Hello".to_vec(),
            ),
        ];
        let filters =
            ["b/WB2OSZ-5", "t/p", "g/WB2OSZ", "s/-", "0", "1"];
        for packet in &packets {
            for f1 in &filters {
                let e1 = evaluate(
                    Channel::Chan(0),
                    Channel::IGate,
                    f1,
                    packet,
                )
                .unwrap();
                let doubled = format!("!!{f1}");
                assert_eq!(
                    evaluate(
                        Channel::Chan(0),
                        Channel::IGate,
                        &doubled,
                        packet
                    )
                    .unwrap(),
                    e1
                );
                for f2 in &filters {
                    let e2 = evaluate(
                        Channel::Chan(0),
                        Channel::IGate,
                        f2,
                        packet,
                    )
                    .unwrap();
                    let or = format!("{f1} | {f2}");
                    assert_eq!(
                        evaluate(
                            Channel::Chan(0),
                            Channel::IGate,
                            &or,
                            packet
                        )
                        .unwrap(),
                        e1 | e2
                    );
                }
            }
        }
    }

    #[test]
    fn test_error_rendering() {
        let p = position_packet();
        let error = evaluate(
            Channel::Chan(0),
            Channel::IGate,
            "b/W2UB | x/foo",
            &p,
        )
        .unwrap_err();
        let rendered = format!("{error}");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[0>IG] b/W2UB | x/foo");
        // The caret points at the offending token
        assert_eq!(lines[1].find('^'), Some("[0>IG] ".len() + 9));
        assert!(lines[2].contains("Unknown filter type letter"));
    }

    #[test]
    fn test_control_characters_are_spaces() {
        let p = position_packet();
        check("1\t&\t1", &p, 1);
    }
}
