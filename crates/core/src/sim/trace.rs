//! Per-core memory-reference trace reading.
//!
//! Each core consumes one trace file, `<app>_procN.trace`, one record per
//! line: an `R` or `W` opcode (case-insensitive) followed by a hex address
//! with an optional `0x` prefix. Records are read lazily. A blank line ends
//! the trace for that core; a malformed line is skipped with a warning and
//! does not end it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::common::{addr, SimError};

/// Kind of one memory reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// A load.
    Read,
    /// A store.
    Write,
}

/// One parsed trace record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Read or write.
    pub kind: AccessKind,
    /// The 32-bit reference address.
    pub address: u32,
}

/// Lazy reader over one core's trace.
pub struct TraceStream {
    label: String,
    source: Box<dyn BufRead>,
    peeked: Option<TraceRecord>,
    ended: bool,
    line_no: u64,
}

impl std::fmt::Debug for TraceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceStream")
            .field("label", &self.label)
            .field("peeked", &self.peeked)
            .field("ended", &self.ended)
            .field("line_no", &self.line_no)
            .finish()
    }
}

impl TraceStream {
    /// Opens a trace file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SimError::TraceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(
            BufReader::new(file),
            path.display().to_string(),
        ))
    }

    /// Wraps any buffered reader as a trace; `label` names it in warnings.
    pub fn from_reader(reader: impl BufRead + 'static, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: Box::new(reader),
            peeked: None,
            ended: false,
            line_no: 0,
        }
    }

    /// True while the trace still has a valid record to deliver.
    pub fn has_more(&mut self) -> bool {
        self.refill();
        self.peeked.is_some()
    }

    /// Takes the next record, or `None` once the trace is exhausted.
    pub fn next_record(&mut self) -> Option<TraceRecord> {
        self.refill();
        self.peeked.take()
    }

    /// Advances to the next parseable record, skipping malformed lines.
    fn refill(&mut self) {
        if self.ended || self.peeked.is_some() {
            return;
        }
        loop {
            let mut line = String::new();
            match self.source.read_line(&mut line) {
                Ok(0) => {
                    self.ended = true;
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("{}: read error, treating as end of trace: {}", self.label, err);
                    self.ended = true;
                    return;
                }
            }
            self.line_no += 1;
            let text = line.trim();
            if text.is_empty() {
                // A blank line ends this core's trace.
                self.ended = true;
                return;
            }
            match parse_record(text) {
                Ok(record) => {
                    self.peeked = Some(record);
                    return;
                }
                Err(reason) => {
                    warn!(
                        "{}:{}: skipping malformed trace line: {}",
                        self.label, self.line_no, reason
                    );
                }
            }
        }
    }
}

/// Parses one non-blank trace line.
fn parse_record(text: &str) -> Result<TraceRecord, String> {
    let mut fields = text.split_whitespace();
    let op = fields.next().ok_or_else(|| "missing operation".to_string())?;
    let operand = fields.next().ok_or_else(|| "missing address".to_string())?;

    let kind = match op {
        "R" | "r" => AccessKind::Read,
        "W" | "w" => AccessKind::Write,
        other => return Err(format!("unknown operation {:?}", other)),
    };
    let address = addr::parse_hex(operand)
        .map_err(|err| format!("unparseable address {:?}: {}", operand, err))?;

    Ok(TraceRecord { kind, address })
}

/// Opens the per-core trace files `<prefix>_proc0.trace` .. `<prefix>_procN-1.trace`.
///
/// Fails if any of them cannot be opened.
pub fn open_traces(prefix: &str, num_cores: usize) -> Result<Vec<TraceStream>, SimError> {
    (0..num_cores)
        .map(|core| TraceStream::open(format!("{}_proc{}.trace", prefix, core)))
        .collect()
}
