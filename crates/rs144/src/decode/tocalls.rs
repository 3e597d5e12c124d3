use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::diag::{DiagSink, Severity};

/**
 * ## TOCALL classifier
 *
 * The AX.25 destination of an APRS packet is not a station: it names
 * the application that built the packet, by convention a callsign-shaped
 * string starting with `AP`. A human-maintained table maps those
 * prefixes to descriptions:
 *
 * ```text
 *       APAGW     AGWtracker
 *       APC       Cellular
 *       APDR      APRSdroid (Android)
 * ```
 *
 * The table is loaded once, owned by the decoder instance, and matched
 * longest prefix first.
 */

const SEARCH_PATHS: &[&str] = &[
    "tocalls.txt",
    "/usr/share/direwolf/tocalls.txt",
    "/usr/local/share/direwolf/tocalls.txt",
];

/// Column where the description starts in both accepted layouts.
const DESCRIPTION_COLUMN: usize = 14;

#[derive(Debug, Clone)]
struct Tocall {
    prefix: String,
    description: String,
}

#[derive(Debug, Default)]
pub struct TocallTable {
    entries: Vec<Tocall>,
}

impl TocallTable {
    /// An empty table: every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from the first search path that exists. A missing
    /// file is a one-time warning, not an error: lookups simply miss.
    pub fn load(diag: &mut dyn DiagSink) -> Self {
        for path in SEARCH_PATHS {
            if Path::new(path).exists() {
                match File::open(path) {
                    Ok(file) => {
                        let table = Self::from_reader(BufReader::new(file));
                        debug!(
                            "{} destination prefixes loaded from {path}",
                            table.entries.len()
                        );
                        return table;
                    }
                    Err(e) => {
                        diag.report(
                            Severity::Warning,
                            format!("Could not open {path}: {e}"),
                        );
                    }
                }
            }
        }
        diag.report(
            Severity::Warning,
            "Could not find tocalls.txt. Destination identification is \
             disabled."
                .to_string(),
        );
        Self::empty()
    }

    /// Extract `(prefix, description)` pairs from the table text.
    ///
    /// A line is accepted only in one of the two historical layouts:
    /// space at column 0, prefix `AP…` beginning at column 6 or at
    /// column 1, description at column 14. Everything else (headings,
    /// dividers, commentary) is skipped.
    pub fn from_reader(reader: impl BufRead) -> Self {
        let mut entries: Vec<Tocall> = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { break };
            let bytes = line.as_bytes();
            if bytes.len() <= DESCRIPTION_COLUMN
                || bytes[0] != b' '
                || !line.is_ascii()
            {
                continue;
            }
            let start = if bytes[6] == b'A' && bytes[7] == b'P' {
                6
            } else if bytes[1] == b'A' && bytes[2] == b'P' {
                1
            } else {
                continue;
            };
            let prefix: String = line[start..]
                .chars()
                .take_while(|c| !c.is_whitespace())
                .collect();
            if prefix.len() < 2 || prefix.len() > 6 {
                continue;
            }
            let description =
                line[DESCRIPTION_COLUMN..].trim().to_string();
            if description.is_empty() {
                continue;
            }
            entries.push(Tocall {
                prefix,
                description,
            });
        }
        // Longest prefix first, so that the first match wins below.
        entries.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { entries }
    }

    /// Description of the application owning `destination`, if any.
    pub fn lookup(&self, destination: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|t| destination.starts_with(&t.prefix))
            .map(|t| t.description.as_str())
    }
}
