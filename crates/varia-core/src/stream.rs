//! Byte-stream writer and reader used by per-type save/load operations.
//!
//! The wire convention is deliberately small: fixed-width integers and IEEE
//! floats are written in the stream's native byte order; text and byte
//! sequences are length-prefixed with a `u32`. Custom types own their
//! payload layout entirely; the core imposes no framing beyond invoking
//! their save/load pair.

use crate::StreamError;

/// Appends wire-format fields to a growable byte buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_ne_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_ne_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_ne_bytes());
    }

    pub fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_u16(v as u16);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_u32(v as u32);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_u64(v as u64);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    /// Length-prefixed raw bytes.
    pub fn write_bytes(&mut self, v: &[u8]) {
        self.write_u32(v.len() as u32);
        self.buf.extend_from_slice(v);
    }

    /// Length-prefixed UTF-8 text.
    pub fn write_str(&mut self, v: &str) {
        self.write_bytes(v.as_bytes());
    }
}

/// Consumes wire-format fields from a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over `buf`, positioned at the start.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns true once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StreamError> {
        if self.remaining() < n {
            return Err(StreamError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, StreamError> {
        Ok(u16::from_ne_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(u32::from_ne_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64, StreamError> {
        Ok(u64::from_ne_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_i8(&mut self) -> Result<i8, StreamError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, StreamError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i64(&mut self) -> Result<i64, StreamError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, StreamError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        Ok(self.read_u8()? != 0)
    }

    /// Length-prefixed raw bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, StreamError> {
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(StreamError::LengthOutOfBounds {
                len,
                remaining: self.remaining(),
            });
        }
        Ok(self.take(len)?.to_vec())
    }

    /// Length-prefixed UTF-8 text.
    pub fn read_str(&mut self) -> Result<String, StreamError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| StreamError::InvalidUtf8)
    }
}

/// Payload types that know how to write and read themselves on the wire.
///
/// Implemented by the built-in payload types and by any custom type that
/// wants the registry's generic save/load shims instead of hand-written
/// operation pointers.
pub trait StreamCodec: Sized {
    fn save(&self, w: &mut Writer);
    fn load(r: &mut Reader<'_>) -> Result<Self, StreamError>;
}

macro_rules! impl_codec_scalar {
    ($($ty:ty => $write:ident / $read:ident),* $(,)?) => {
        $(
            impl StreamCodec for $ty {
                fn save(&self, w: &mut Writer) {
                    w.$write(*self);
                }

                fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
                    r.$read()
                }
            }
        )*
    };
}

impl_codec_scalar! {
    bool => write_bool / read_bool,
    i8 => write_i8 / read_i8,
    i16 => write_i16 / read_i16,
    i32 => write_i32 / read_i32,
    i64 => write_i64 / read_i64,
    u8 => write_u8 / read_u8,
    u16 => write_u16 / read_u16,
    u32 => write_u32 / read_u32,
    u64 => write_u64 / read_u64,
    f32 => write_f32 / read_f32,
    f64 => write_f64 / read_f64,
}

impl StreamCodec for String {
    fn save(&self, w: &mut Writer) {
        w.write_str(self);
    }

    fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
        r.read_str()
    }
}

impl StreamCodec for Vec<u8> {
    fn save(&self, w: &mut Writer) {
        w.write_bytes(self);
    }

    fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
        r.read_bytes()
    }
}

impl StreamCodec for Vec<String> {
    fn save(&self, w: &mut Writer) {
        w.write_u32(self.len() as u32);
        for s in self {
            w.write_str(s);
        }
    }

    fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
        let len = r.read_u32()? as usize;
        let mut out = Vec::with_capacity(len.min(r.remaining()));
        for _ in 0..len {
            out.push(r.read_str()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut w = Writer::new();
        w.write_i32(-42);
        w.write_u64(7);
        w.write_f64(1.5);
        w.write_bool(true);

        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_i32().unwrap(), -42);
        assert_eq!(r.read_u64().unwrap(), 7);
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert!(r.read_bool().unwrap());
        assert!(r.is_empty());
    }

    #[test]
    fn text_round_trip_preserves_utf8() {
        let mut w = Writer::new();
        w.write_str("héllo");
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_str().unwrap(), "héllo");
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut w = Writer::new();
        w.write_u32(9);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes[..2]);
        assert!(matches!(
            r.read_u32(),
            Err(StreamError::UnexpectedEof { needed: 4, .. })
        ));
    }

    #[test]
    fn bad_length_prefix_is_an_error() {
        let mut w = Writer::new();
        w.write_u32(1000);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.read_bytes(),
            Err(StreamError::LengthOutOfBounds { len: 1000, .. })
        ));
    }

    #[test]
    fn string_list_codec() {
        let list = vec!["a".to_string(), "héllo".to_string()];
        let mut w = Writer::new();
        list.save(&mut w);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(Vec::<String>::load(&mut r).unwrap(), list);
    }
}
