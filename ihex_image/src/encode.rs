//! Serializes a window of a [`MemoryImage`] into the programmer's binary format.
//!
//! Header layout (one 512 byte sector, little-endian fields):
//!
//! | offset | size | field                                          |
//! |--------|------|------------------------------------------------|
//! | 0      | 4    | magic `SMB!`                                   |
//! | 4      | 2    | CRC16 of the 8192 bytes starting at `lo`       |
//! | 6      | 2    | CRC16 of the data that follows the header      |
//! | 8      | 2    | data length, low 16 bits only                  |
//! | 10     | 502  | zero                                           |

use bytes::{BufMut, Bytes, BytesMut};
use log::warn;

use crate::crc;
use crate::image::{AddressWindow, MemoryImage};

pub const SECTOR_SIZE: usize = 512;
pub const HEADER_MAGIC: &[u8; 4] = b"SMB!";
/// Bytes covered by the header CRC, whatever the data length.
pub const HEADER_CRC_SPAN: usize = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A header sector followed by the data.
    Header,
    /// The data alone.
    Raw,
}

/// Length of the data written for `image`: everything from `lo` up to the
/// last stored byte, rounded up to a whole sector.
pub fn final_length(image: &MemoryImage, lo: u32) -> usize {
    let used = image.last_addr().saturating_sub(lo) as usize;
    used.div_ceil(SECTOR_SIZE) * SECTOR_SIZE
}

pub fn encode(image: &MemoryImage, window: AddressWindow, format: OutputFormat) -> Bytes {
    let lo = window.lo();
    let len = final_length(image, lo);

    let header_len = match format {
        OutputFormat::Header => SECTOR_SIZE,
        OutputFormat::Raw => 0,
    };
    let mut out = BytesMut::with_capacity(header_len + len);

    if format == OutputFormat::Header {
        if len > u16::MAX as usize {
            warn!("data length {len:#x} does not fit the 16 bit header field, writing {:#06x}", len as u16);
        }
        out.put_slice(HEADER_MAGIC);
        out.put_u16_le(crc::checksum(image.span(lo, HEADER_CRC_SPAN)));
        out.put_u16_le(crc::checksum(image.span(lo, len)));
        out.put_u16_le(len as u16);
        out.put_bytes(0, SECTOR_SIZE - out.len());
    }

    out.extend(image.span(lo, len));
    out.freeze()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::{Record, RecordKind};
    use crate::image::FILL;
    use crate::process::apply_record;

    fn window(lo: u32, hi: u32) -> AddressWindow {
        AddressWindow::new(lo, hi).unwrap()
    }

    fn image_with(window: AddressWindow, addr: u16, data: &[u8]) -> MemoryImage {
        let mut image = MemoryImage::new();
        let record = Record {
            addr,
            kind: RecordKind::Data(data.to_vec()),
        };
        apply_record(&mut image, record, window);
        image
    }

    fn sixteen_bytes_at_0x1000() -> (MemoryImage, AddressWindow) {
        let window = window(0x1000, 0x2000);
        let data: Vec<u8> = (0..16).collect();
        (image_with(window, 0x1000, &data), window)
    }

    #[test]
    fn rounds_up_to_sector() {
        let window = window(0x1000, 0x10000);
        assert_eq!(final_length(&image_with(window, 0x1000, &[0]), 0x1000), 512);
        assert_eq!(final_length(&image_with(window, 0x11FF, &[0]), 0x1000), 512);
        assert_eq!(final_length(&image_with(window, 0x1200, &[0]), 0x1000), 1024);
        assert_eq!(final_length(&MemoryImage::new(), 0x1000), 0);
    }

    #[test]
    fn header_layout() {
        let (image, window) = sixteen_bytes_at_0x1000();
        let out = encode(&image, window, OutputFormat::Header);

        assert_eq!(out.len(), SECTOR_SIZE + 512);
        assert_eq!(&out[0..4], b"SMB!");
        assert_eq!(&out[4..6], &0xB0A7u16.to_le_bytes());
        assert_eq!(&out[6..8], &0x9AD1u16.to_le_bytes());
        assert_eq!(&out[8..10], &512u16.to_le_bytes());
        assert!(out[10..SECTOR_SIZE].iter().all(|&b| b == 0));

        let data = &out[SECTOR_SIZE..];
        assert_eq!(&data[..16], (0..16).collect::<Vec<u8>>().as_slice());
        assert!(data[16..].iter().all(|&b| b == FILL));
    }

    #[test]
    fn raw_is_data_only() {
        let (image, window) = sixteen_bytes_at_0x1000();
        let raw = encode(&image, window, OutputFormat::Raw);
        let headed = encode(&image, window, OutputFormat::Header);
        assert_eq!(raw.len(), 512);
        assert_eq!(&raw[..], &headed[SECTOR_SIZE..]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let (image, window) = sixteen_bytes_at_0x1000();
        assert_eq!(
            encode(&image, window, OutputFormat::Header),
            encode(&image, window, OutputFormat::Header)
        );
    }

    #[test]
    fn header_crc_ignores_data_length() {
        let window = window(0x1000, 0x10000);
        let image = image_with(window, 0x2000, &[0x55]);
        let out = encode(&image, window, OutputFormat::Header);
        let expected = crc::checksum(image.bytes()[0x1000..0x3000].iter().copied());
        assert_eq!(&out[4..6], &expected.to_le_bytes());

        // The data CRC covers 0x1000..0x2200 and so differs from the header CRC.
        let data_crc = crc::checksum(image.bytes()[0x1000..0x2200].iter().copied());
        assert_eq!(&out[6..8], &data_crc.to_le_bytes());
        assert_eq!(&out[8..10], &0x1200u16.to_le_bytes());
    }

    #[test]
    fn reads_past_image_end_as_fill() {
        let window = window(0xFF00, 0x10000);
        let image = image_with(window, 0xFF00, &[1, 2]);
        let out = encode(&image, window, OutputFormat::Raw);
        assert_eq!(out.len(), 512);
        assert_eq!(&out[..2], &[1, 2]);
        assert!(out[2..].iter().all(|&b| b == FILL));
    }

    #[test]
    fn length_field_keeps_low_16_bits() {
        let window = window(0, 0x10000);
        let image = image_with(window, 0xFFFF, &[0]);
        let out = encode(&image, window, OutputFormat::Header);
        assert_eq!(out.len(), SECTOR_SIZE + 0x10000);
        assert_eq!(&out[8..10], &[0, 0]);
    }
}
