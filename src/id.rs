use std::{fmt, str};

use fstr::FStr;

use crate::codec::{self, Variant, Version, VARIANT_INDEX, VERSION_INDEX};
use crate::error::{Error, ParseError, Result};

/// Represents a Universally Unique IDentifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Length of the binary representation in bytes.
    pub const SIZE: usize = 16;

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns a copy of the underlying byte array. Mutating the copy never affects `self`.
    pub const fn bytes(&self) -> [u8; 16] {
        self.0
    }

    /// Returns the length of the binary representation, which is always 16.
    pub const fn size(&self) -> usize {
        Self::SIZE
    }

    /// Returns true if every byte is zero.
    pub fn is_nil(&self) -> bool {
        self.0 == Self::NIL.0
    }

    /// Creates a UUID from raw bytes, stamping the given version nibble and variant marker.
    ///
    /// # Panics
    ///
    /// Panics if `version` does not fit in four bits or `variant` is not one of the markers
    /// listed in [`codec`](crate::codec). Both indicate a defect in the caller, not bad data.
    pub fn with_layout(bytes: [u8; 16], version: u8, variant: u8) -> Self {
        let variant = match Variant::try_from(variant) {
            Ok(v) => v,
            Err(err) => panic!("{err}"),
        };
        let mut bytes = bytes;
        codec::set_version(&mut bytes[VERSION_INDEX], version);
        codec::set_variant(&mut bytes[VARIANT_INDEX], variant);
        Self(bytes)
    }

    /// Creates a time-based (version 1) UUID from its field values.
    ///
    /// `timestamp` counts 100-nanosecond intervals since 1582-10-15 00:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is not a 60-bit integer or `clock_seq` is not a 14-bit integer.
    pub fn from_fields_v1(timestamp: u64, clock_seq: u16, node: [u8; 6]) -> Self {
        if timestamp >= 1 << 60 || clock_seq >= 1 << 14 {
            panic!("invalid field value");
        }

        let mut bytes = [
            (timestamp >> 24) as u8,
            (timestamp >> 16) as u8,
            (timestamp >> 8) as u8,
            timestamp as u8,
            (timestamp >> 40) as u8,
            (timestamp >> 32) as u8,
            (timestamp >> 56) as u8,
            (timestamp >> 48) as u8,
            (clock_seq >> 8) as u8,
            clock_seq as u8,
            node[0],
            node[1],
            node[2],
            node[3],
            node[4],
            node[5],
        ];
        codec::set_version(&mut bytes[VERSION_INDEX], Version::TimeBased.into());
        codec::set_variant(&mut bytes[VARIANT_INDEX], Variant::Rfc4122);
        Self(bytes)
    }

    /// Returns the version, or [`Version::Unknown`] if the nibble is outside `1..=5`.
    pub const fn version(&self) -> Version {
        Version::from_bits(codec::version_bits(self.0[VERSION_INDEX]))
    }

    /// Returns the variant.
    pub const fn variant(&self) -> Variant {
        codec::variant(self.0[VARIANT_INDEX])
    }

    /// Returns the 60-bit Gregorian timestamp of a time-based UUID.
    pub const fn timestamp(&self) -> Option<u64> {
        if !matches!(self.version(), Version::TimeBased) {
            return None;
        }
        let b = &self.0;
        Some(
            ((b[6] as u64 & 0x0f) << 56)
                | (b[7] as u64) << 48
                | (b[4] as u64) << 40
                | (b[5] as u64) << 32
                | (b[0] as u64) << 24
                | (b[1] as u64) << 16
                | (b[2] as u64) << 8
                | b[3] as u64,
        )
    }

    /// Returns the 14-bit clock sequence of a time-based UUID.
    pub const fn clock_sequence(&self) -> Option<u16> {
        if !matches!(self.version(), Version::TimeBased) {
            return None;
        }
        Some(((self.0[8] as u16 & 0x3f) << 8) | self.0[9] as u16)
    }

    /// Returns the node id of a time-based UUID.
    pub const fn node(&self) -> Option<[u8; 6]> {
        if !matches!(self.version(), Version::TimeBased) {
            return None;
        }
        let b = &self.0;
        Some([b[10], b[11], b[12], b[13], b[14], b[15]])
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rfc4122::Uuid;
    ///
    /// let x = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "6ba7b810-9dad-11d1-80b4-00c04fd430c8");
    /// assert_eq!(format!("{}", y), "6ba7b810-9dad-11d1-80b4-00c04fd430c8");
    /// # Ok::<(), rfc4122::ParseError>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut r = 0;
        let mut w = 0;
        while r < 16 {
            let e = self.0[r] as usize;
            buffer[w] = DIGITS[e >> 4];
            buffer[w + 1] = DIGITS[e & 15];
            if r == 3 || r == 5 || r == 7 || r == 9 {
                buffer[w + 2] = b'-';
                w += 1;
            }
            r += 1;
            w += 2;
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: every byte written above is an ASCII hex digit or hyphen
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Returns the binary representation: the 16 bytes in RFC 4122 field order.
    pub fn marshal_binary(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Replaces `self` with the UUID held in `data`.
    ///
    /// Fails with [`Error::Length`] unless `data` is exactly 16 bytes long, leaving `self`
    /// unchanged.
    pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<()> {
        *self = Self::try_from(data)?;
        Ok(())
    }

    /// Returns the canonical string representation as UTF-8 bytes.
    pub fn marshal_text(&self) -> Vec<u8> {
        self.encode().as_bytes().to_vec()
    }

    /// Replaces `self` with the UUID parsed from the UTF-8 text in `data`, leaving `self`
    /// unchanged on failure.
    pub fn unmarshal_text(&mut self, data: &[u8]) -> Result<()> {
        let text = str::from_utf8(data).map_err(|_| ParseError {})?;
        *self = text.parse()?;
        Ok(())
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = ParseError;

    /// Creates an object from a hexadecimal string representation.
    ///
    /// Accepts the 8-4-4-4-12 form in either case, the 32-digit form without hyphens, and
    /// either of those wrapped in braces or prefixed with `urn:uuid:`.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const ERR: ParseError = ParseError {};
        let src = src.strip_prefix("urn:uuid:").unwrap_or(src);
        let src = match src.strip_prefix('{') {
            Some(inner) => inner.strip_suffix('}').ok_or(ERR)?,
            None => src,
        };
        let hyphenated = match src.len() {
            36 => true,
            32 => false,
            _ => return Err(ERR),
        };

        let mut dst = [0u8; 16];
        let mut iter = src.chars();
        for (i, e) in dst.iter_mut().enumerate() {
            let hi = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            let lo = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            *e = (hi << 4) | lo;
            if hyphenated
                && (i == 3 || i == 5 || i == 7 || i == 9)
                && iter.next().ok_or(ERR)? != '-'
            {
                return Err(ERR);
            }
        }
        if iter.next().is_none() {
            Ok(Self(dst))
        } else {
            Err(ERR)
        }
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 16]>::try_from(src)
            .map(Self)
            .map_err(|_| Error::Length(src.len()))
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Uuid::try_from(value).map_err(de::Error::custom)
        }
    }

}
