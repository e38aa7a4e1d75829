//! Converts Intel HEX32 firmware into a flat binary image for the SMB
//! programmer, optionally preceded by a checksummed header sector.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use ihex_image::{convert, AddressWindow, OutputFormat};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = BufReader::new(File::open("firmware.hex")?);
//! let window = AddressWindow::new(0x1000, 0x10000)?;
//! let conversion = convert(source, window, OutputFormat::Header)?;
//! std::fs::write("firmware.bin", &conversion.output)?;
//! # Ok(())
//! # }
//! ```

use std::io::BufRead;

use bytes::Bytes;

pub mod common;
pub mod crc;
pub mod encode;
mod hex;
pub mod image;
pub mod parse;
pub mod process;

pub use common::{Record, RecordKind};
pub use encode::{encode, final_length, OutputFormat};
pub use image::{AddressWindow, MemoryImage, WindowError};
pub use parse::{parse_line, LineError};
pub use process::{apply_record, build_image, Outcome, ProcessError};

/// Result of a successful conversion.
#[derive(Debug)]
pub struct Conversion {
    pub first_addr: u32,
    /// One past the highest address written.
    pub last_addr: u32,
    /// Length of the data section, excluding any header.
    pub final_len: usize,
    pub output: Bytes,
}

/// Reads all of `source` and encodes the data that falls inside `window`.
pub fn convert<R: BufRead>(
    source: R,
    window: AddressWindow,
    format: OutputFormat,
) -> Result<Conversion, ProcessError> {
    let image = build_image(source, window)?;
    let output = encode(&image, window, format);
    Ok(Conversion {
        first_addr: image.first_addr().unwrap_or(window.lo()),
        last_addr: image.last_addr(),
        final_len: final_length(&image, window.lo()),
        output,
    })
}
