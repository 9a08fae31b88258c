//! Version and variant bit fields of an RFC 4122 byte layout.
//!
//! The version lives in the high nibble of byte 6 (`time_hi_and_version`). The variant occupies
//! one to three leading bits of byte 8 (`clock_seq_hi_and_reserved`), depending on its kind:
//!
//! | Variant               | Leading bits | Marker |
//! | --------------------- | ------------ | ------ |
//! | [`Variant::Ncs`]       | `0`          | `0x00` |
//! | [`Variant::Rfc4122`]   | `10`         | `0x80` |
//! | [`Variant::Microsoft`] | `110`        | `0xc0` |
//! | [`Variant::Future`]    | `111`        | `0xe0` |

use crate::error::InvalidVariant;

/// Index of the byte that carries the version nibble.
pub const VERSION_INDEX: usize = 6;

/// Index of the byte that carries the variant bits.
pub const VARIANT_INDEX: usize = 8;

/// Algorithm that produced a UUID, as stored in its version nibble.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[repr(u8)]
pub enum Version {
    /// Any nibble outside `1..=5`, including the zero of a fresh buffer.
    #[default]
    Unknown = 0,
    /// Version 1: Gregorian timestamp, clock sequence, and node id.
    TimeBased = 1,
    /// Version 2: DCE Security.
    DceSecurity = 2,
    /// Version 3: MD5 hash of a namespace and a name.
    NameBasedMd5 = 3,
    /// Version 4: random bits.
    Random = 4,
    /// Version 5: SHA-1 hash of a namespace and a name.
    NameBasedSha1 = 5,
}

impl Version {
    /// Maps a raw version nibble to a known version, or [`Version::Unknown`].
    pub const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::TimeBased,
            2 => Self::DceSecurity,
            3 => Self::NameBasedMd5,
            4 => Self::Random,
            5 => Self::NameBasedSha1,
            _ => Self::Unknown,
        }
    }
}

impl From<Version> for u8 {
    fn from(src: Version) -> Self {
        src as u8
    }
}

/// Layout family of a UUID, as stored in the leading bits of byte 8.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Variant {
    /// Reserved for NCS backward compatibility (`0xxx`).
    Ncs = 0x00,
    /// The variant specified by RFC 4122 (`10xx`).
    Rfc4122 = 0x80,
    /// Reserved for Microsoft backward compatibility (`110x`).
    Microsoft = 0xc0,
    /// Reserved for future definition (`111x`).
    Future = 0xe0,
}

impl Variant {
    /// Returns the marker byte whose leading bits encode this variant.
    pub const fn marker(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Variant {
    type Error = InvalidVariant;

    /// Converts a variant marker byte. Only the exact markers in the module table are accepted.
    fn try_from(marker: u8) -> Result<Self, Self::Error> {
        match marker {
            0x00 => Ok(Self::Ncs),
            0x80 => Ok(Self::Rfc4122),
            0xc0 => Ok(Self::Microsoft),
            0xe0 => Ok(Self::Future),
            _ => Err(InvalidVariant(marker)),
        }
    }
}

/// Writes `version` into the high nibble of `byte`, keeping the low nibble.
///
/// # Panics
///
/// Panics if `version` does not fit in four bits.
pub fn set_version(byte: &mut u8, version: u8) {
    assert!(version < 16, "version must be a 4-bit integer");
    *byte &= 0x0f;
    *byte |= version << 4;
}

/// Reads the raw version nibble of `byte`.
pub const fn version_bits(byte: u8) -> u8 {
    byte >> 4
}

/// Writes the leading bits of `variant` into `byte`, keeping as many trailing bits as the
/// variant leaves free.
pub fn set_variant(byte: &mut u8, variant: Variant) {
    *byte &= match variant {
        Variant::Ncs => 0x7f,
        Variant::Rfc4122 => 0x3f,
        Variant::Microsoft | Variant::Future => 0x1f,
    };
    *byte |= variant.marker();
}

/// Classifies the leading bits of `byte`.
///
/// The patterns share prefixes, so the two-bit RFC 4122 pattern is tested before the one-bit NCS
/// pattern, and both before the three-bit patterns.
pub const fn variant(byte: u8) -> Variant {
    if byte & 0xc0 == 0x80 {
        Variant::Rfc4122
    } else if byte & 0x80 == 0x00 {
        Variant::Ncs
    } else if byte & 0xe0 == 0xc0 {
        Variant::Microsoft
    } else {
        Variant::Future
    }
}
