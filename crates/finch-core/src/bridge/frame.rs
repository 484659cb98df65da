//! Length-delimited frames: a base-128 varint byte count followed by the bytes.

use std::io::{self, Read, Write};

/// Longest varint encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Parse(&'static str),
    #[error("frame io: {0}")]
    Io(#[from] io::Error),
}

pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Decode a varint from the front of `buf`; returns the value and the bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), FrameError> {
    let mut value = 0u64;
    for (i, &b) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        value |= u64::from(b & 0x7f) << (7 * i);
        if b & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if buf.len() >= MAX_VARINT_LEN {
        Err(FrameError::Parse("varint too long"))
    } else {
        Err(FrameError::Parse("truncated varint"))
    }
}

/// Encoded size of `frame` once delimited.
pub fn delimited_len(frame: &[u8]) -> usize {
    let mut prefix = Vec::with_capacity(MAX_VARINT_LEN);
    encode_varint(frame.len() as u64, &mut prefix);
    prefix.len() + frame.len()
}

pub fn encode_delimited(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + MAX_VARINT_LEN);
    encode_varint(frame.len() as u64, &mut out);
    out.extend_from_slice(frame);
    out
}

/// Write one frame with a single `write_all`, so a frame is never split across calls.
pub fn write_delimited<W: Write>(w: &mut W, frame: &[u8]) -> io::Result<()> {
    w.write_all(&encode_delimited(frame))
}

/// Read one frame. `Ok(None)` on clean EOF before the length prefix.
pub fn read_delimited<R: Read>(r: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut first = true;
    loop {
        let mut byte = [0u8; 1];
        match r.read(&mut byte) {
            Ok(0) if first => return Ok(None),
            Ok(0) => return Err(FrameError::Parse("truncated length prefix")),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
        first = false;
        value |= u64::from(byte[0] & 0x7f) << shift;
        if byte[0] & 0x80 == 0 {
            break;
        }
        shift += 7;
        if shift >= 7 * MAX_VARINT_LEN as u32 {
            return Err(FrameError::Parse("varint too long"));
        }
    }
    let len = usize::try_from(value).map_err(|_| FrameError::Parse("frame length overflow"))?;
    let mut body = Vec::new();
    r.by_ref().take(value).read_to_end(&mut body)?;
    if body.len() != len {
        return Err(FrameError::Parse("truncated frame body"));
    }
    Ok(Some(body))
}
