pub mod comment;
pub mod coord;
pub mod dti;
pub mod extension;
pub mod mice;
pub mod telemetry;
pub mod time;
pub mod tocalls;
pub mod weather;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decode::tocalls::TocallTable;
use crate::diag::{DiagSink, LogSink, Severity};

/**
 * The decoded record and the top-level dispatcher.
 *
 * One packet in, one [`DecodedInfo`] out. The first byte of the
 * information field (the data type identifier) selects the sub-format:
 *
 * | DTI        | Sub-format                                        |
 * | ---------- | ------------------------------------------------- |
 * | `!` `=`    | position without timestamp (`!!` is Ultimeter)    |
 * | `$`        | raw NMEA (`$ULTW` is Ultimeter packet mode)       |
 * | `'` `` ` `` | Mic-E                                            |
 * | `)`        | item                                              |
 * | `/` `@`    | position with timestamp                           |
 * | `:`        | message, directed query, telemetry metadata       |
 * | `;`        | object                                            |
 * | `<`        | station capabilities                              |
 * | `>`        | status report                                     |
 * | `?`        | general query                                     |
 * | `T`        | telemetry                                         |
 * | `_`        | positionless weather                              |
 * | `{`        | user-defined (touch-tone, morse)                  |
 * | `}`        | third-party header                                |
 *
 * Decoding is one-shot and stateless per packet: errors leave fields
 * empty and flow to the [`DiagSink`], never abort the record.
 */

// Documented maxima for the bounded strings of the record. Longer
// inputs are silently truncated.
const MAX_NAME: usize = 12;
const MAX_MSG_TYPE: usize = 60;
const MAX_STATUS: usize = 32;
const MAX_QUERY: usize = 12;
const MAX_WEATHER: usize = 500;
const MAX_TELEMETRY: usize = 256;
const MAX_COMMENT: usize = 256;
const MAX_MFR: usize = 80;
const MAX_DIRECTIVITY: usize = 12;

fn truncated(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// One hop of the AX.25 digipeater path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digipeater {
    /// Callsign with SSID, e.g. `WIDE2-2`
    pub callsign: String,
    /// The has-been-used bit ("H bit") of the address field
    pub has_been_used: bool,
}

/// An AX.25 packet whose address fields were already parsed by the
/// framing layer. Source and destination are callsign+SSID strings of
/// at most 9 significant characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ax25Packet {
    pub source: String,
    pub destination: String,
    pub digipeaters: Vec<Digipeater>,
    pub info: Vec<u8>,
}

impl Ax25Packet {
    pub fn new(source: &str, destination: &str, info: Vec<u8>) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            digipeaters: Vec::new(),
            info,
        }
    }

    /// Append one digipeater to the path (builder style).
    pub fn via(mut self, callsign: &str, has_been_used: bool) -> Self {
        self.digipeaters.push(Digipeater {
            callsign: callsign.to_string(),
            has_been_used,
        });
        self
    }

    /// First byte of the information field, the data type identifier.
    pub fn dti(&self) -> u8 {
        self.info.first().copied().unwrap_or(b' ')
    }

    /// Number of address fields: destination, source, digipeaters.
    pub fn num_addresses(&self) -> usize {
        2 + self.digipeaters.len()
    }

    /// Address by position: 0 is the destination, 1 the source, 2 and
    /// up the digipeater path.
    pub fn address(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.destination),
            1 => Some(&self.source),
            i => self
                .digipeaters
                .get(i - 2)
                .map(|d| d.callsign.as_str()),
        }
    }

    /// Index (into the path) of the furthest digipeater with the
    /// has-been-used bit set.
    pub fn heard_index(&self) -> Option<usize> {
        self.digipeaters.iter().rposition(|d| d.has_been_used)
    }

    /// Destination without the SSID, as used by Mic-E and TOCALL.
    pub fn destination_callsign(&self) -> &str {
        self.destination
            .split_once('-')
            .map_or(self.destination.as_str(), |(call, _)| call)
    }
}

/// Everything extracted from one packet. Every field is optional
/// except the source, the message type label and the symbol pair,
/// which default to the primary table and the space (no symbol) code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedInfo {
    pub src: String,
    pub msg_type: String,
    pub symbol_table: char,
    pub symbol_code: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addressee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maidenhead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Clockwise from true north, 0 is north
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_ft: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_dbi: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directivity: Option<String>,
    /// DF signal strength in S-points, from the DFS extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df_strength_s: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_mi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq_mhz: Option<f64>,
    /// 0 means explicitly "no tone"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctcss_tone_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcs_octal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_khz: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mic_e_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footprint_radius_mi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam_heading_deg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aprstt_loc: Option<String>,
}

impl DecodedInfo {
    /// A record with every field at its sentinel, ready for dispatch.
    pub fn new(src: &str) -> Self {
        Self {
            src: truncated(src, MAX_NAME),
            msg_type: String::new(),
            symbol_table: '/',
            symbol_code: ' ',
            addressee: None,
            object_name: None,
            latitude: None,
            longitude: None,
            maidenhead: None,
            timestamp: None,
            course_deg: None,
            speed_mph: None,
            altitude_ft: None,
            power_w: None,
            height_ft: None,
            gain_dbi: None,
            directivity: None,
            df_strength_s: None,
            range_mi: None,
            freq_mhz: None,
            ctcss_tone_hz: None,
            dcs_octal: None,
            offset_khz: None,
            mfr: None,
            mic_e_status: None,
            query_type: None,
            query_callsign: None,
            footprint_lat: None,
            footprint_lon: None,
            footprint_radius_mi: None,
            beam_heading_deg: None,
            erp_w: None,
            weather: None,
            telemetry: None,
            comment: None,
            aprstt_loc: None,
        }
    }

    pub(crate) fn set_msg_type(&mut self, label: &str) {
        self.msg_type = truncated(label, MAX_MSG_TYPE);
    }

    pub(crate) fn set_addressee(&mut self, value: &str) {
        self.addressee = Some(truncated(value, MAX_NAME));
    }

    pub(crate) fn set_object_name(&mut self, value: &str) {
        self.object_name = Some(truncated(value, MAX_NAME));
    }

    pub(crate) fn set_maidenhead(&mut self, value: &str) {
        self.maidenhead = Some(truncated(value, 6));
    }

    pub(crate) fn set_directivity(&mut self, value: &str) {
        self.directivity = Some(truncated(value, MAX_DIRECTIVITY));
    }

    pub(crate) fn set_mfr(&mut self, value: &str) {
        self.mfr = Some(truncated(value, MAX_MFR));
    }

    pub(crate) fn set_mic_e_status(&mut self, value: &str) {
        self.mic_e_status = Some(truncated(value, MAX_STATUS));
    }

    pub(crate) fn set_query_type(&mut self, value: &str) {
        self.query_type = Some(truncated(value, MAX_QUERY));
    }

    pub(crate) fn set_weather(&mut self, value: &str) {
        if !value.is_empty() {
            self.weather = Some(truncated(value, MAX_WEATHER));
        }
    }

    pub(crate) fn set_telemetry(&mut self, value: &str) {
        self.telemetry = Some(truncated(value, MAX_TELEMETRY));
    }

    pub(crate) fn set_comment(&mut self, value: &str) {
        if !value.is_empty() {
            self.comment = Some(truncated(value, MAX_COMMENT));
        }
    }

    pub(crate) fn set_aprstt_loc(&mut self, value: &str) {
        self.aprstt_loc = Some(truncated(value, MAX_COMMENT));
    }
}

impl fmt::Display for DecodedInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {}, {}", self.src, self.msg_type)?;
        if let Some(mfr) = &self.mfr {
            write!(f, ", {mfr}")?;
        }
        if let Some(status) = &self.mic_e_status {
            write!(f, ", {status}")?;
        }
        writeln!(f)?;
        if let Some(addressee) = &self.addressee {
            writeln!(f, "  Addressee:     {addressee}")?;
        }
        if let Some(name) = &self.object_name {
            writeln!(f, "  Name:          {name}")?;
        }
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            writeln!(f, "  Position:      {lat:.4}, {lon:.4}")?;
        }
        if self.symbol_code != ' ' {
            writeln!(
                f,
                "  Symbol:        {}{}",
                self.symbol_table, self.symbol_code
            )?;
        }
        if let Some(maidenhead) = &self.maidenhead {
            writeln!(f, "  Locator:       {maidenhead}")?;
        }
        if let Some(speed) = self.speed_mph {
            writeln!(f, "  Speed:         {speed:.1} mph")?;
        }
        if let Some(course) = self.course_deg {
            writeln!(f, "  Course:        {course:.0}°")?;
        }
        if let Some(altitude) = self.altitude_ft {
            writeln!(f, "  Altitude:      {altitude:.0} ft")?;
        }
        if let Some(freq) = self.freq_mhz {
            writeln!(f, "  Frequency:     {freq:.3} MHz")?;
        }
        if let Some(tone) = self.ctcss_tone_hz {
            if tone == 0. {
                writeln!(f, "  Tone:          off")?;
            } else {
                writeln!(f, "  Tone:          {tone:.1} Hz")?;
            }
        }
        if let Some(offset) = self.offset_khz {
            writeln!(f, "  Offset:        {offset:+} kHz")?;
        }
        if let Some(weather) = &self.weather {
            writeln!(f, "  Weather:       {weather}")?;
        }
        if let Some(telemetry) = &self.telemetry {
            writeln!(f, "  Telemetry:     {telemetry}")?;
        }
        if let Some(comment) = &self.comment {
            writeln!(f, "  Comment:       {comment}")?;
        }
        Ok(())
    }
}

/// The decoder instance: owns the immutable TOCALL table, loaded
/// eagerly at construction.
pub struct Decoder {
    tocalls: TocallTable,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// A decoder with the TOCALL table loaded from the usual search
    /// paths; a missing table file is a one-time warning.
    pub fn new() -> Self {
        Self {
            tocalls: TocallTable::load(&mut LogSink),
        }
    }

    /// A decoder with a caller-supplied table (tests, embedded use).
    pub fn with_tocalls(tocalls: TocallTable) -> Self {
        Self { tocalls }
    }

    /// Decode one packet against the current wall clock.
    pub fn decode(
        &self,
        packet: &Ax25Packet,
        diag: &mut dyn DiagSink,
    ) -> DecodedInfo {
        self.decode_at(packet, Utc::now(), diag)
    }

    /// Decode one packet, timestamps patched into `now` (UTC).
    pub fn decode_at(
        &self,
        packet: &Ax25Packet,
        now: DateTime<Utc>,
        diag: &mut dyn DiagSink,
    ) -> DecodedInfo {
        self.decode_depth(packet, now, 0, diag)
    }

    pub(crate) fn decode_depth(
        &self,
        packet: &Ax25Packet,
        now: DateTime<Utc>,
        depth: usize,
        diag: &mut dyn DiagSink,
    ) -> DecodedInfo {
        let mut record = DecodedInfo::new(&packet.source);
        if packet.info.is_empty() {
            diag.report(
                Severity::Error,
                "Empty information field.".to_string(),
            );
            record.set_msg_type("Unknown Data Type Indicator");
            return record;
        }
        dti::dispatch(self, &mut record, packet, now, depth, diag);
        if packet.dti() == b'}' {
            // The recursive decode already resolved symbol and
            // manufacturer against the inner header
            return record;
        }

        // A packet without an explicit symbol may still name one
        // through its destination address
        if record.symbol_table == '/' && record.symbol_code == ' ' {
            symbol_from_destination(
                &mut record,
                packet.destination_callsign(),
            );
        }
        if record.mfr.is_none() {
            if let Some(description) =
                self.tocalls.lookup(packet.destination_callsign())
            {
                let description = description.to_string();
                record.set_mfr(&description);
            }
        }
        record
    }
}

/// `GPSCnn` and `GPSEnn` destinations select a symbol by number: 01-94
/// into the primary (C) or alternate (E) table.
fn symbol_from_destination(record: &mut DecodedInfo, destination: &str) {
    let Some((table, digits)) = destination
        .strip_prefix("GPSC")
        .map(|d| ('/', d))
        .or_else(|| destination.strip_prefix("GPSE").map(|d| ('\\', d)))
    else {
        return;
    };
    let digits = digits.as_bytes();
    if digits.len() < 2
        || !digits[0].is_ascii_digit()
        || !digits[1].is_ascii_digit()
    {
        return;
    }
    let nn = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
    if (1..=94).contains(&nn) {
        record.symbol_table = table;
        record.symbol_code = (b'!' + nn as u8 - 1) as char;
    }
}
