use crate::error::*;
use byteorder::{ByteOrder, LE};
use n64io::{ByteCursor, ByteWriter};
use std::fmt;
use std::io::Write;

#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct ID([u8; 4]);

impl ID {
    pub const FORM: ID = ID(*b"FORM");
    pub const AIFC: ID = ID(*b"AIFC");
    pub const COMM: ID = ID(*b"COMM");
    pub const SSND: ID = ID(*b"SSND");
    pub const APPL: ID = ID(*b"APPL");
    pub const VAPC: ID = ID(*b"VAPC");

    pub fn data(&self) -> &[u8; 4] {
        &self.0
    }

    pub(crate) fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let bytes = cursor.read_array::<4>()?;
        ID::try_from(bytes)
    }
}

impl TryFrom<[u8; 4]> for ID {
    type Error = AifcError;

    /// Printable ASCII, with spaces only allowed as trailing padding.
    fn try_from(value: [u8; 4]) -> Result<Self> {
        let mut has_spaces = false;
        for b in value.iter() {
            match b {
                b' ' => {
                    has_spaces = true;
                }
                0x21..=0x7e => {
                    if has_spaces {
                        return Err(AifcError::InvalidFormat("space inside chunk id"));
                    }
                }

                _ => return Err(AifcError::InvalidFormat("non-printable chunk id")),
            }
        }

        Ok(Self(value))
    }
}

impl fmt::Debug for ID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID(")?;
        fmt::Display::fmt(&self, f)?;
        write!(f, ")")
    }
}

impl fmt::Display for ID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.0[0] as char, self.0[1] as char, self.0[2] as char, self.0[3] as char,
        )
    }
}

/// Position and extent of one chunk inside the FORM body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkHeader {
    pub id: ID,
    /// Offset of the chunk payload.
    pub offset: usize,
    pub size: u32,
}

/// Reads a chunk header and skips over its payload and pad byte.
pub(crate) fn read_chunk_header(cursor: &mut ByteCursor) -> Result<ChunkHeader> {
    let id = ID::read(cursor)?;
    let size = cursor.read_u32()?;
    let offset = cursor.position();
    cursor.skip(size as usize)?;
    if size % 2 == 1 && !cursor.is_at_end() {
        cursor.skip(1)?;
    }
    Ok(ChunkHeader { id, offset, size })
}

pub(crate) fn write_chunk_header<W: Write>(
    w: &mut ByteWriter<W>,
    id: ID,
    size: u32,
) -> std::io::Result<()> {
    w.write_bytes(id.data())?;
    w.write_u32(size)
}

pub(crate) fn write_pad<W: Write>(w: &mut ByteWriter<W>, size: u32) -> std::io::Result<()> {
    if size % 2 == 1 {
        w.write_u8(0)?;
    }
    Ok(())
}

/// Reads a Pascal string that must hold exactly `N` characters.
pub(crate) fn read_fixed_pstring<const N: usize>(cursor: &mut ByteCursor) -> Result<[u8; N]> {
    let len = cursor.read_u8()? as usize;
    if len != N {
        return Err(AifcError::InvalidFormat("unexpected string length"));
    }
    Ok(cursor.read_array::<N>()?)
}

/// An 80-bit IEEE-754 extended float.
///
/// The value is held in x87 memory order (little-endian: 64-bit mantissa
/// first, then sign and exponent) and reversed as one 10-byte blob when it
/// crosses the file boundary. Conversions never go through a native
/// extended type.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Extended80 {
    le: [u8; 10],
}

const EXPONENT_BIAS: i32 = 16383;

impl Extended80 {
    pub fn from_le_bytes(le: [u8; 10]) -> Self {
        Self { le }
    }

    pub fn to_le_bytes(self) -> [u8; 10] {
        self.le
    }

    /// The big-endian image, as stored in a file.
    pub fn to_be_bytes(self) -> [u8; 10] {
        let mut be = self.le;
        be.reverse();
        be
    }

    pub(crate) fn read(cursor: &mut ByteCursor) -> Result<Self> {
        Ok(Self::from_le_bytes(cursor.read_reversed::<10>()?))
    }

    pub(crate) fn write<W: Write>(&self, w: &mut ByteWriter<W>) -> std::io::Result<()> {
        w.write_reversed(&self.le)
    }

    fn mantissa(&self) -> u64 {
        LE::read_u64(&self.le[0..8])
    }

    fn sign_exponent(&self) -> u16 {
        LE::read_u16(&self.le[8..10])
    }

    pub fn from_u32(value: u32) -> Self {
        let mut le = [0; 10];
        if value != 0 {
            let zeros = value.leading_zeros();
            let exponent = (EXPONENT_BIAS + 31 - zeros as i32) as u16;
            let mantissa = (value as u64) << (32 + zeros);
            LE::write_u64(&mut le[0..8], mantissa);
            LE::write_u16(&mut le[8..10], exponent);
        }
        Self { le }
    }

    /// The integral part of the value, for sample rates.
    pub fn to_u32(&self) -> Result<u32> {
        let se = self.sign_exponent();
        let mantissa = self.mantissa();
        let exponent = se & 0x7fff;

        if exponent == 0 && mantissa == 0 {
            return Ok(0);
        }
        if se >> 15 != 0 {
            return Err(AifcError::InvalidSampleRate("negative"));
        }
        if exponent == 0x7fff {
            return Err(AifcError::InvalidSampleRate("infinity or nan"));
        }

        let exponent = exponent as i32 - EXPONENT_BIAS;
        if exponent < 0 {
            return Ok(0);
        }
        if exponent > 31 {
            return Err(AifcError::InvalidSampleRate("too large"));
        }
        Ok((mantissa >> (63 - exponent)) as u32)
    }

    pub fn to_f64(&self) -> Result<f64> {
        let se = self.sign_exponent();
        let mantissa = self.mantissa();

        let sign = (se >> 15) != 0;
        let exponent = se & 0b0111_1111_1111_1111;

        if exponent == 0 {
            if mantissa == 0 {
                return Ok(if sign { -0.0 } else { 0.0 });
            }
            return Err(AifcError::InvalidSampleRate("denormal f80"));
        }
        if exponent == (1 << 15) - 1 {
            return Err(AifcError::InvalidSampleRate("infinity/nan f80"));
        }
        if (mantissa >> 63) == 0 {
            return Err(AifcError::InvalidSampleRate("unnormal f80"));
        }

        let exponent = exponent as i32 - EXPONENT_BIAS;
        if !(-1022..=1023).contains(&exponent) {
            return Err(AifcError::InvalidSampleRate("f80 exponent out of f64 range"));
        }

        // drop the explicit integer bit, keep the top 52 fraction bits
        let fraction = (mantissa << 1) >> 12;
        let exponent = (exponent + 1023) as u64;
        Ok(f64::from_bits(
            fraction | (exponent << 52) | if sign { 1 << 63 } else { 0 },
        ))
    }
}

impl fmt::Debug for Extended80 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_f64() {
            Ok(value) => write!(f, "Extended80({})", value),
            Err(_) => write!(f, "Extended80({:02x?})", self.to_be_bytes()),
        }
    }
}
