//! Binary format of persisted id assignments.
//!
//! ```text
//! i32 version
//! i32 count
//! count x { string name, i32 id }
//! ```
//!
//! Integers are little-endian. Strings are a 7-bit varint byte length followed
//! by UTF-8 bytes. Only the name <-> id mapping is stored, never entry data.

use crate::id_map::Conflict;
use crate::{DecodeError, IdMap};

/// Newest format this crate writes and understands.
pub const FORMAT_VERSION: i32 = 1;

/// Result of decoding a registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Version tag found in the data, which may be newer than [`FORMAT_VERSION`].
    pub version: i32,
    pub ids: IdMap,
}

impl Decoded {
    pub fn is_known_version(&self) -> bool {
        self.version == FORMAT_VERSION
    }
}

pub fn encode(ids: &IdMap) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + ids.len() * 16);
    write_i32(&mut out, FORMAT_VERSION);
    // Counts beyond i32::MAX cannot be represented by the format.
    write_i32(&mut out, i32::try_from(ids.len()).unwrap_or(i32::MAX));
    for (name, id) in ids.sorted_by_id() {
        write_string(&mut out, name);
        write_i32(&mut out, id);
    }
    out
}

/// Decodes a registry file.
///
/// Versions other than [`FORMAT_VERSION`] are decoded with the newest known
/// layout; callers can tell via [`Decoded::is_known_version`].
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeError> {
    let mut reader = Reader::new(bytes);
    let version = reader.read_i32()?;
    let ids = match version {
        1 => decode_v1(&mut reader)?,
        _ => decode_v1(&mut reader)?,
    };
    Ok(Decoded { version, ids })
}

fn decode_v1(reader: &mut Reader<'_>) -> Result<IdMap, DecodeError> {
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(DecodeError::NegativeCount(count));
    }
    let mut ids = IdMap::new();
    for _ in 0..count {
        let name = reader.read_string()?;
        let id = reader.read_i32()?;
        if let Err(conflict) = ids.insert(name.clone(), id) {
            return Err(match conflict {
                Conflict::Name { .. } => DecodeError::DuplicateName(name),
                Conflict::Id { .. } => DecodeError::DuplicateId(id),
            });
        }
    }
    Ok(ids)
}

fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_string(out: &mut Vec<u8>, value: &str) {
    let mut len = value.len();
    while len >= 0x80 {
        out.push((len as u8) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(value.as_bytes());
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err(DecodeError::UnexpectedEof);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Length prefix: at most five 7-bit groups, value must fit an i32.
    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            // the fifth group only has room for the top four bits
            if shift == 28 && byte > 0x0f {
                return Err(DecodeError::VarintOverflow);
            }
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                if value > i32::MAX as u32 {
                    return Err(DecodeError::VarintOverflow);
                }
                return Ok(value as usize);
            }
        }
        Err(DecodeError::VarintOverflow)
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}
