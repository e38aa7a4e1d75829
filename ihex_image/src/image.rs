use std::fmt;
use std::iter;

/// Number of addressable bytes in a memory image.
pub const IMAGE_SIZE: usize = 0x10000;

/// Value of every byte no record has written, matching erased flash.
pub const FILL: u8 = 0xFF;

/// Half-open address range `[lo, hi)` that data must fall in to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    lo: u32,
    hi: u32,
}

impl AddressWindow {
    pub fn new(lo: u32, hi: u32) -> Result<Self, WindowError> {
        if hi > IMAGE_SIZE as u32 {
            return Err(WindowError::OutOfImage { hi });
        }
        if lo >= hi {
            return Err(WindowError::Empty { lo, hi });
        }
        Ok(AddressWindow { lo, hi })
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.lo && addr < self.hi
    }
}

impl fmt::Display for AddressWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lo = {:#x}, hi = {:#x}", self.lo, self.hi)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    Empty { lo: u32, hi: u32 },
    OutOfImage { hi: u32 },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use WindowError::*;
        match self {
            Empty { lo, hi } => write!(f, "address range is empty: lo {lo:#x} is not below hi {hi:#x}"),
            OutOfImage { hi } => {
                write!(f, "hi {hi:#x} is beyond the end of the {IMAGE_SIZE:#x} byte image")
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// The 64KB memory a single conversion decodes into.
///
/// Created fresh for every conversion with all bytes set to [`FILL`]. Only
/// the record fold in [`crate::process`] mutates it.
pub struct MemoryImage {
    pub(crate) bytes: Vec<u8>,
    pub(crate) extended_base: u32,
    pub(crate) first_addr: u32,
    pub(crate) last_addr: u32,
    pub(crate) record_count: usize,
}

impl MemoryImage {
    pub fn new() -> Self {
        MemoryImage {
            bytes: vec![FILL; IMAGE_SIZE],
            extended_base: 0,
            first_addr: IMAGE_SIZE as u32,
            last_addr: 0,
            record_count: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upper address bits set by the last extended linear address record.
    pub fn extended_base(&self) -> u32 {
        self.extended_base
    }

    /// Lowest address written, or `None` while nothing has been stored.
    pub fn first_addr(&self) -> Option<u32> {
        (self.record_count > 0).then_some(self.first_addr)
    }

    /// One past the highest address written; 0 while nothing has been stored.
    pub fn last_addr(&self) -> u32 {
        self.last_addr
    }

    /// Number of data records stored.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// `len` bytes starting at `start`. Addresses past the end of the image
    /// read as [`FILL`].
    pub fn span(&self, start: u32, len: usize) -> impl Iterator<Item = u8> + '_ {
        let start = (start as usize).min(self.bytes.len());
        let end = start.saturating_add(len).min(self.bytes.len());
        let stored = &self.bytes[start..end];
        stored
            .iter()
            .copied()
            .chain(iter::repeat(FILL).take(len - stored.len()))
    }

    pub(crate) fn store(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        self.first_addr = self.first_addr.min(addr);
        self.last_addr = self.last_addr.max(addr + data.len() as u32);
        self.record_count += 1;
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("extended_base", &format_args!("{:#010x}", self.extended_base))
            .field("first_addr", &self.first_addr())
            .field("last_addr", &self.last_addr)
            .field("record_count", &self.record_count)
            .finish_non_exhaustive()
    }
}
