//! Random (version 4) UUIDs.

use crate::codec::{self, Variant, Version, VARIANT_INDEX, VERSION_INDEX};
use crate::Uuid;

impl Uuid {
    /// Creates a version 4 UUID from 16 random bytes, overwriting the version and variant bits.
    pub fn new_v4_from_bytes(bytes: [u8; 16]) -> Self {
        let mut bytes = bytes;
        codec::set_version(&mut bytes[VERSION_INDEX], Version::Random.into());
        codec::set_variant(&mut bytes[VARIANT_INDEX], Variant::Rfc4122);
        Self::from(bytes)
    }
}

/// Generates a UUIDv4 object.
///
/// # Examples
///
/// ```rust
/// use rfc4122::uuid4;
///
/// let uuid = uuid4();
/// println!("{}", uuid); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
/// ```
pub fn uuid4() -> Uuid {
    Uuid::new_v4_from_bytes(rand::random())
}
