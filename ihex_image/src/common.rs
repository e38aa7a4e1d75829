use std::fmt;

/// One parsed line of an Intel HEX file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub addr: u16,
    pub kind: RecordKind,
}

/// Record type, carrying the payload for the kinds that use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Data(Vec<u8>),
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress(Vec<u8>),
    StartLinearAddress,
}

impl RecordKind {
    /// Builds the kind for record type code `kind`, taking `data` for the
    /// kinds that keep a payload. Unknown codes are handed back.
    pub fn from_int(kind: u8, data: Vec<u8>) -> Result<Self, u8> {
        use RecordKind::*;
        match kind {
            0 => Ok(Data(data)),
            1 => Ok(EndOfFile),
            2 => Ok(ExtendedSegmentAddress),
            3 => Ok(StartSegmentAddress),
            4 => Ok(ExtendedLinearAddress(data)),
            5 => Ok(StartLinearAddress),
            t => Err(t),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RecordKind::*;
        match self {
            Data(_) => write!(f, "Data"),
            EndOfFile => write!(f, "EndOfFile"),
            ExtendedSegmentAddress => write!(f, "ExtendedSegmentAddress"),
            StartSegmentAddress => write!(f, "StartSegmentAddress"),
            ExtendedLinearAddress(_) => write!(f, "ExtendedLinearAddress"),
            StartLinearAddress => write!(f, "StartLinearAddress"),
        }
    }
}
