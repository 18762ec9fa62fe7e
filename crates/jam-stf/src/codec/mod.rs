//! Canonical little-endian binary serialization (§4.1).
//!
//! - Sized integers: fixed-width little-endian.
//! - Sequences: length-prefixed with [`compact`]; fixed-size arrays carry no
//!   prefix.
//! - Optionals: a single existence-marker byte (`0` absent, `1` present).
//! - Enums: a one-byte discriminant followed by the variant's payload.
//!
//! Every domain type implements [`Codec`]; `serialize`/`deserialize` free
//! functions are thin wrappers so callers rarely need the trait in scope.

pub mod compact;

use crate::error::CodecError;
use compact::{decode_compact, encode_compact};

/// A cursor over a byte slice, tracking how much has been consumed.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() - self.pos < n {
            return Err(CodecError::UnexpectedEof);
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn compact(&mut self) -> Result<u64, CodecError> {
        let (value, consumed) = decode_compact(self.remaining())?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

/// A growable output buffer. A thin wrapper over `Vec<u8>` kept separate so
/// encoders read naturally as "push fields in declaration order".
#[derive(Default)]
pub struct Writer(pub Vec<u8>);

impl Writer {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn byte(&mut self, b: u8) {
        self.0.push(b);
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.0.extend_from_slice(b);
    }

    pub fn compact(&mut self, v: u64) {
        self.0.extend_from_slice(&encode_compact(v));
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

/// Canonical encode/decode for one domain type.
pub trait Codec: Sized {
    fn encode(&self, w: &mut Writer);
    fn decode(r: &mut Reader) -> Result<Self, CodecError>;
}

pub fn serialize<T: Codec>(value: &T) -> Vec<u8> {
    let mut w = Writer::new();
    value.encode(&mut w);
    w.into_vec()
}

pub fn deserialize<T: Codec>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut r = Reader::new(bytes);
    T::decode(&mut r)
}

macro_rules! impl_codec_uint_le {
    ($t:ty) => {
        impl Codec for $t {
            fn encode(&self, w: &mut Writer) {
                w.bytes(&self.to_le_bytes());
            }

            fn decode(r: &mut Reader) -> Result<Self, CodecError> {
                let bytes = r.take(std::mem::size_of::<$t>())?;
                Ok(<$t>::from_le_bytes(bytes.try_into().unwrap()))
            }
        }
    };
}

impl_codec_uint_le!(u8);
impl_codec_uint_le!(u16);
impl_codec_uint_le!(u32);
impl_codec_uint_le!(u64);

impl Codec for bool {
    fn encode(&self, w: &mut Writer) {
        w.byte(*self as u8);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::InvalidEncoding),
        }
    }
}

impl<const N: usize> Codec for [u8; N] {
    fn encode(&self, w: &mut Writer) {
        w.bytes(self);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        let bytes = r.take(N)?;
        Ok(bytes.try_into().unwrap())
    }
}

impl<T: Codec> Codec for Option<T> {
    fn encode(&self, w: &mut Writer) {
        match self {
            None => w.byte(0),
            Some(v) => {
                w.byte(1);
                v.encode(w);
            }
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        match r.byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(r)?)),
            _ => Err(CodecError::InvalidExistenceMarker),
        }
    }
}

/// Length-prefixed sequence. `Vec<T>`'s own length prefix comes from the
/// compact integer, matching §4.1/§6's "Sequences: length-prefixed via
/// compact integer" rule.
impl<T: Codec> Codec for Vec<T> {
    fn encode(&self, w: &mut Writer) {
        w.compact(self.len() as u64);
        for item in self {
            item.encode(w);
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        let len = r.compact()? as usize;
        if len > bound::MAX_SEQUENCE_LEN {
            return Err(CodecError::LengthExceedsMax);
        }
        let mut out = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            out.push(T::decode(r)?);
        }
        Ok(out)
    }
}

/// Conservative decode-time bound so a corrupt length prefix cannot force
/// an unbounded allocation before the real length-check sub-step rejects
/// it.
mod bound {
    pub const MAX_SEQUENCE_LEN: usize = 1 << 24;
}

impl<A: Codec, B: Codec> Codec for (A, B) {
    fn encode(&self, w: &mut Writer) {
        self.0.encode(w);
        self.1.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok((A::decode(r)?, B::decode(r)?))
    }
}

/// Encoded as a key-sorted `Vec`, since hash-map iteration order is not
/// canonical.
impl<K: Codec + Ord + std::hash::Hash, V: Codec> Codec for std::collections::HashMap<K, V> {
    fn encode(&self, w: &mut Writer) {
        let mut keys: Vec<&K> = self.keys().collect();
        keys.sort();
        w.compact(keys.len() as u64);
        for k in keys {
            k.encode(w);
            self.get(k).expect("key came from self").encode(w);
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        let len = r.compact()? as usize;
        if len > bound::MAX_SEQUENCE_LEN {
            return Err(CodecError::LengthExceedsMax);
        }
        let mut map = std::collections::HashMap::with_capacity(len.min(4096));
        for _ in 0..len {
            let k = K::decode(r)?;
            let v = V::decode(r)?;
            map.insert(k, v);
        }
        Ok(map)
    }
}

/// Encoded as a sorted `Vec`, for the same reason as `HashMap`.
impl<T: Codec + Ord + std::hash::Hash> Codec for std::collections::HashSet<T> {
    fn encode(&self, w: &mut Writer) {
        let mut items: Vec<&T> = self.iter().collect();
        items.sort();
        w.compact(items.len() as u64);
        for item in items {
            item.encode(w);
        }
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        let len = r.compact()? as usize;
        if len > bound::MAX_SEQUENCE_LEN {
            return Err(CodecError::LengthExceedsMax);
        }
        let mut set = std::collections::HashSet::with_capacity(len.min(4096));
        for _ in 0..len {
            set.insert(T::decode(r)?);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_primitives() {
        assert_eq!(deserialize::<u32>(&serialize(&123_456u32)).unwrap(), 123_456);
        assert_eq!(deserialize::<bool>(&serialize(&true)).unwrap(), true);
    }

    #[test]
    fn roundtrip_option() {
        let some: Option<u16> = Some(7);
        let none: Option<u16> = None;
        assert_eq!(deserialize::<Option<u16>>(&serialize(&some)).unwrap(), some);
        assert_eq!(deserialize::<Option<u16>>(&serialize(&none)).unwrap(), none);
    }

    #[test]
    fn invalid_existence_marker_rejected() {
        let bytes = [2u8, 0, 0];
        let err = deserialize::<Option<u16>>(&bytes).unwrap_err();
        assert_eq!(err, CodecError::InvalidExistenceMarker);
    }

    #[test]
    fn roundtrip_vec() {
        let v: Vec<u32> = vec![1, 2, 3, 4, 5];
        assert_eq!(deserialize::<Vec<u32>>(&serialize(&v)).unwrap(), v);
    }

    #[test]
    fn empty_input_is_eof() {
        let err = deserialize::<u32>(&[]).unwrap_err();
        assert_eq!(err, CodecError::UnexpectedEof);
    }
}
