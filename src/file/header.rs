//! Binary header of a variable file.
//!
//! Fixed 128-byte little-endian layout, followed by the data region of
//! fixed-width records:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "TVAR"
//! 4       2     format version (currently 1)
//! 6       2     reserved (0)
//! 8       64    datatype string, NUL-padded canonical grammar
//! 72      8     record length in elements (u64, redundant with the
//!               datatype string, validated on open)
//! 80      8     capacity in records (u64)
//! 88      8     committed count (u64)
//! 96      32    reserved (0)
//! ```
//!
//! The committed-count field is the commit marker of the write
//! protocol: record bytes are flushed before the count is advanced, so
//! a concurrent reader re-reading this field never observes a torn
//! record.

use crate::datatype::TypeDescriptor;
use crate::error::{Error, Result};
use std::path::Path;

/// Magic bytes at offset 0 of every variable file.
pub const MAGIC: [u8; 4] = *b"TVAR";

/// Current header format version.
pub const FORMAT_VERSION: u16 = 1;

/// Total header size; the data region starts here.
pub const HEADER_LEN: u64 = 128;

/// Size of the NUL-padded datatype string field.
pub const TYPE_FIELD_LEN: usize = 64;

/// Byte offset of the capacity field.
pub const CAPACITY_OFFSET: u64 = 80;

/// Byte offset of the committed-count field.
pub const COMMITTED_OFFSET: u64 = 88;

/// Decoded header of a variable file.
#[derive(Debug, Clone)]
pub struct Header {
    /// Datatype of every record in the file.
    pub datatype: TypeDescriptor,
    /// Number of records the data region is currently sized for.
    pub capacity: u64,
    /// Number of fully written, readable records.
    pub committed: u64,
}

impl Header {
    /// Encodes the header into its fixed on-disk form.
    ///
    /// # Errors
    ///
    /// Fails with `BadTypeSpec` if the datatype's canonical rendering
    /// does not fit the type field (no datatype of the closed grammar
    /// does; the check guards future grammar growth).
    pub fn encode(&self) -> Result<[u8; HEADER_LEN as usize]> {
        let mut buf = [0u8; HEADER_LEN as usize];
        let spec = self.datatype.to_string();
        if spec.len() > TYPE_FIELD_LEN {
            return Err(Error::BadTypeSpec(spec));
        }
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf[8..8 + spec.len()].copy_from_slice(spec.as_bytes());
        buf[72..80].copy_from_slice(&(self.datatype.record_len() as u64).to_le_bytes());
        buf[80..88].copy_from_slice(&self.capacity.to_le_bytes());
        buf[88..96].copy_from_slice(&self.committed.to_le_bytes());
        Ok(buf)
    }

    /// Decodes and validates a header read from `path`.
    ///
    /// # Errors
    ///
    /// Fails with `Corrupt` naming the specific defect: wrong magic,
    /// unknown version, unparseable datatype string, a record-length
    /// field disagreeing with the datatype, or a committed count past
    /// the capacity.
    pub fn decode(buf: &[u8; HEADER_LEN as usize], path: &Path) -> Result<Self> {
        let corrupt = |reason: String| Error::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if buf[0..4] != MAGIC {
            return Err(corrupt("bad magic, not a variable file".to_string()));
        }
        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {version} (expected {FORMAT_VERSION})"
            )));
        }

        let type_field = &buf[8..8 + TYPE_FIELD_LEN];
        let end = type_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TYPE_FIELD_LEN);
        let spec = std::str::from_utf8(&type_field[..end])
            .map_err(|_| corrupt("datatype field is not valid UTF-8".to_string()))?;
        let datatype: TypeDescriptor = spec
            .parse()
            .map_err(|_| corrupt(format!("unparseable datatype string '{spec}'")))?;

        let record_len = u64::from_le_bytes(buf[72..80].try_into().unwrap());
        if record_len != datatype.record_len() as u64 {
            return Err(corrupt(format!(
                "record length field {record_len} disagrees with datatype '{datatype}' ({})",
                datatype.record_len()
            )));
        }

        let capacity = u64::from_le_bytes(buf[80..88].try_into().unwrap());
        let committed = u64::from_le_bytes(buf[88..96].try_into().unwrap());
        if committed > capacity {
            return Err(corrupt(format!(
                "committed count {committed} exceeds capacity {capacity}"
            )));
        }

        Ok(Self {
            datatype,
            capacity,
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(header: &Header) -> Header {
        let buf = header.encode().unwrap();
        Header::decode(&buf, Path::new("/t/x.var")).unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let header = Header {
            datatype: "Map1D<Scalar>=500".parse().unwrap(),
            capacity: 1000,
            committed: 42,
        };
        let back = roundtrip(&header);
        assert_eq!(back.datatype, header.datatype);
        assert_eq!(back.capacity, 1000);
        assert_eq!(back.committed, 42);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let header = Header {
            datatype: TypeDescriptor::Scalar,
            capacity: 1,
            committed: 0,
        };
        let mut buf = header.encode().unwrap();
        buf[0] = b'X';
        let err = Header::decode(&buf, Path::new("/t/x.var")).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let header = Header {
            datatype: TypeDescriptor::Scalar,
            capacity: 1,
            committed: 0,
        };
        let mut buf = header.encode().unwrap();
        buf[4..6].copy_from_slice(&99u16.to_le_bytes());
        let err = Header::decode(&buf, Path::new("/t/x.var")).unwrap_err();
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn test_decode_rejects_record_len_disagreement() {
        let header = Header {
            datatype: "Map1D<Scalar>=10".parse().unwrap(),
            capacity: 1,
            committed: 0,
        };
        let mut buf = header.encode().unwrap();
        buf[72..80].copy_from_slice(&7u64.to_le_bytes());
        let err = Header::decode(&buf, Path::new("/t/x.var")).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
    }

    #[test]
    fn test_decode_rejects_committed_past_capacity() {
        let header = Header {
            datatype: TypeDescriptor::Scalar,
            capacity: 4,
            committed: 5,
        };
        let buf = header.encode().unwrap();
        let err = Header::decode(&buf, Path::new("/t/x.var")).unwrap_err();
        assert!(err.to_string().contains("exceeds capacity"));
    }
}
