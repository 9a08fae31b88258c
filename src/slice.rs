use fstr::FStr;

use crate::codec::{Variant, Version};
use crate::error::Result;
use crate::external::ExternalValue;
use crate::Uuid;

/// A UUID view over caller-owned bytes.
///
/// Construction never fails and never copies. The length is checked by each accessor instead, so
/// a view over anything but 16 bytes reports [`Error::Length`](crate::Error::Length) from every
/// fallible method. For well-formed input every method agrees with the one of [`Uuid`].
///
/// There is no `Display` impl, since formatting cannot report a bad length; use
/// [`UuidSlice::encode`] for the text form.
///
/// # Examples
///
/// ```rust
/// use rfc4122::{UuidSlice, Version};
///
/// let row: &[u8] = &[
///     0x6b, 0xa7, 0xb8, 0x10, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30,
///     0xc8,
/// ];
/// let id = UuidSlice::new(row);
/// assert_eq!(id.version()?, Version::TimeBased);
/// assert_eq!(&id.encode()? as &str, "6ba7b810-9dad-11d1-80b4-00c04fd430c8");
///
/// assert!(UuidSlice::new(&row[..4]).version().is_err());
/// assert!(UuidSlice::new(&row[..4]).encode().is_err());
/// # Ok::<(), rfc4122::Error>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct UuidSlice<'a>(&'a [u8]);

impl<'a> UuidSlice<'a> {
    /// Wraps `bytes` without inspecting them.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Returns the wrapped bytes as given.
    pub const fn as_slice(&self) -> &'a [u8] {
        self.0
    }

    /// Copies the view into an owned [`Uuid`].
    pub fn to_uuid(&self) -> Result<Uuid> {
        Uuid::try_from(self.0)
    }

    /// Returns a copy of the 16 bytes.
    pub fn bytes(&self) -> Result<[u8; 16]> {
        self.to_uuid().map(|id| id.bytes())
    }

    /// Returns the length of a well-formed binary representation, which is always 16.
    pub const fn size(&self) -> usize {
        Uuid::SIZE
    }

    /// Returns the version, or [`Version::Unknown`] if the nibble is outside `1..=5`.
    pub fn version(&self) -> Result<Version> {
        self.to_uuid().map(|id| id.version())
    }

    /// Returns the variant.
    pub fn variant(&self) -> Result<Variant> {
        self.to_uuid().map(|id| id.variant())
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string.
    pub fn encode(&self) -> Result<FStr<36>> {
        self.to_uuid().map(|id| id.encode())
    }

    /// Returns the binary representation.
    pub fn marshal_binary(&self) -> Result<Vec<u8>> {
        self.to_uuid().map(|id| id.marshal_binary())
    }

    /// Returns the canonical text, or [`ExternalValue::Null`] for the nil UUID.
    pub fn value(&self) -> Result<ExternalValue> {
        self.to_uuid().map(|id| id.value())
    }
}

impl<'a> From<&'a [u8]> for UuidSlice<'a> {
    fn from(src: &'a [u8]) -> Self {
        Self(src)
    }
}

impl<'a> From<&'a Uuid> for UuidSlice<'a> {
    fn from(src: &'a Uuid) -> Self {
        Self(src.as_bytes())
    }
}
