use std::fmt;
use std::io::{self, BufRead};

use log::{debug, info, warn};

use crate::common::{Record, RecordKind};
use crate::image::{AddressWindow, MemoryImage};
use crate::parse::parse_line;

/// What folding a single record did to the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Stored { addr: u32, len: usize },
    /// Data ran past the window's upper bound; only `stored` bytes were kept.
    Clipped { addr: u32, stored: usize, dropped: usize },
    Empty { addr: u32 },
    OutOfRange { addr: u32 },
    BaseChanged(u32),
    InvalidBase { addr: u16, byte_count: usize },
    Unsupported(RecordKind),
    EndOfFile,
}

/// Folds `record` into `image`, keeping only data inside `window`.
pub fn apply_record(image: &mut MemoryImage, record: Record, window: AddressWindow) -> Outcome {
    match record.kind {
        RecordKind::Data(data) => {
            let addr = image.extended_base | record.addr as u32;
            if data.is_empty() {
                return Outcome::Empty { addr };
            }
            if !window.contains(addr) {
                return Outcome::OutOfRange { addr };
            }
            let room = (window.hi() - addr) as usize;
            if data.len() > room {
                image.store(addr, &data[..room]);
                Outcome::Clipped {
                    addr,
                    stored: room,
                    dropped: data.len() - room,
                }
            } else {
                image.store(addr, &data);
                Outcome::Stored {
                    addr,
                    len: data.len(),
                }
            }
        }
        RecordKind::EndOfFile => Outcome::EndOfFile,
        RecordKind::ExtendedLinearAddress(data) => match (record.addr, data.as_slice()) {
            (0, &[high, low]) => {
                image.extended_base = (high as u32) << 24 | (low as u32) << 16;
                Outcome::BaseChanged(image.extended_base)
            }
            (addr, data) => Outcome::InvalidBase {
                addr,
                byte_count: data.len(),
            },
        },
        kind @ (RecordKind::ExtendedSegmentAddress
        | RecordKind::StartSegmentAddress
        | RecordKind::StartLinearAddress) => Outcome::Unsupported(kind),
    }
}

/// Reads Intel HEX lines from `reader` until an end of file record or the
/// end of input, folding every valid record into a fresh image.
///
/// Malformed lines and records that cannot be used are logged and skipped.
/// The only failures are a read error and an input with no usable data.
pub fn build_image<R: BufRead>(mut reader: R, window: AddressWindow) -> ProcessResult {
    let mut image = MemoryImage::new();
    let mut line = Vec::new();
    let mut line_no = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(ProcessError::ReadSource)? == 0 {
            break;
        }
        line_no += 1;
        trim_line_end(&mut line);

        let record = match parse_line(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "line {line_no}: ignoring malformed line: {e} [{}]",
                    String::from_utf8_lossy(&line)
                );
                continue;
            }
        };

        let outcome = apply_record(&mut image, record, window);
        log_outcome(line_no, &outcome);
        if outcome == Outcome::EndOfFile {
            break;
        }
    }

    let Some(first_addr) = image.first_addr() else {
        return Err(ProcessError::NoDataRecords);
    };

    let total_bytes = image.last_addr().saturating_sub(window.lo());
    info!(
        "decoded {first_addr:08x} -> {:08x}, program bytes = {total_bytes:08x} or {}KB, {window}",
        image.last_addr(),
        total_bytes.div_ceil(1024),
    );
    Ok(image)
}

fn trim_line_end(line: &mut Vec<u8>) {
    while let Some(b'\n' | b'\r') = line.last() {
        line.pop();
    }
}

fn log_outcome(line_no: usize, outcome: &Outcome) {
    use Outcome::*;
    match outcome {
        Stored { addr, len } => debug!("line {line_no}: stored {len} bytes @ {addr:04x}"),
        Clipped {
            addr,
            stored,
            dropped,
        } => warn!(
            "line {line_no}: data @ {addr:04x} runs past the upper bound, \
             kept {stored} bytes and dropped {dropped}"
        ),
        Empty { .. } => warn!("line {line_no}: ignoring empty data record"),
        OutOfRange { addr } => info!("line {line_no}: ignoring out-of-range data @ {addr:04x}"),
        BaseChanged(base) => debug!("line {line_no}: extended linear address set to {base:08x}"),
        InvalidBase { addr, byte_count } => warn!(
            "line {line_no}: ignoring invalid extended linear address [aaaa={addr:04x}, bb={byte_count}]"
        ),
        Unsupported(kind) => warn!("line {line_no}: ignoring unhandled {kind} record"),
        EndOfFile => debug!("line {line_no}: end of file record"),
    }
}

#[derive(Debug)]
pub enum ProcessError {
    ReadSource(io::Error),
    NoDataRecords,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ProcessError::*;
        match self {
            ReadSource(e) => write!(f, "error reading the source: {e}"),
            NoDataRecords => write!(f, "file contains no data records"),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::ReadSource(e) => Some(e),
            ProcessError::NoDataRecords => None,
        }
    }
}

pub type ProcessResult = std::result::Result<MemoryImage, ProcessError>;
