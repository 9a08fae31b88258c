//! Conversion to and from the values that storage drivers exchange.
//!
//! [`ExternalValue`] models the small set of column values a typical driver hands over, without
//! tying the crate to any particular driver. [`Uuid::scan`] accepts one and [`Uuid::value`]
//! produces one; storage layers go through this pair and nothing else.

use crate::error::{Error, Result};
use crate::Uuid;

/// A driver-level value.
#[derive(Clone, PartialEq, Debug, Default)]
pub enum ExternalValue {
    /// SQL `NULL` or an absent value.
    #[default]
    Null,
    /// A textual column.
    Text(String),
    /// A binary column.
    Bytes(Vec<u8>),
    /// An integral column.
    Integer(i64),
    /// A floating-point column.
    Float(f64),
    /// A boolean column.
    Bool(bool),
}

impl ExternalValue {
    /// Returns a short name of the value kind for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<&str> for ExternalValue {
    fn from(src: &str) -> Self {
        Self::Text(src.to_owned())
    }
}

impl From<String> for ExternalValue {
    fn from(src: String) -> Self {
        Self::Text(src)
    }
}

impl From<&[u8]> for ExternalValue {
    fn from(src: &[u8]) -> Self {
        Self::Bytes(src.to_vec())
    }
}

impl From<Vec<u8>> for ExternalValue {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl From<i64> for ExternalValue {
    fn from(src: i64) -> Self {
        Self::Integer(src)
    }
}

impl From<f64> for ExternalValue {
    fn from(src: f64) -> Self {
        Self::Float(src)
    }
}

impl From<bool> for ExternalValue {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl<T: Into<ExternalValue>> From<Option<T>> for ExternalValue {
    fn from(src: Option<T>) -> Self {
        src.map_or(Self::Null, Into::into)
    }
}

impl From<Uuid> for ExternalValue {
    fn from(src: Uuid) -> Self {
        src.value()
    }
}

impl Uuid {
    /// Replaces `self` with the UUID held in a driver value.
    ///
    /// - `Null`, empty text, and empty bytes set the nil UUID.
    /// - Exactly 16 bytes are taken as the binary representation.
    /// - Any other bytes are read as UTF-8 text and parsed like text.
    /// - Text is parsed as described in [`Uuid::from_str`](std::str::FromStr).
    /// - Other kinds fail with [`Error::Type`].
    ///
    /// `self` is left unchanged on failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rfc4122::{ExternalValue, Uuid};
    ///
    /// let mut id = Uuid::NIL;
    /// id.scan(&"6ba7b810-9dad-11d1-80b4-00c04fd430c8".into())?;
    /// assert_eq!(id.value(), ExternalValue::Text(id.to_string()));
    ///
    /// id.scan(&ExternalValue::Null)?;
    /// assert!(id.is_nil());
    ///
    /// assert!(id.scan(&ExternalValue::Integer(22)).is_err());
    /// # Ok::<(), rfc4122::Error>(())
    /// ```
    pub fn scan(&mut self, src: &ExternalValue) -> Result<()> {
        match src {
            ExternalValue::Null => *self = Self::NIL,
            ExternalValue::Text(text) if text.is_empty() => *self = Self::NIL,
            ExternalValue::Text(text) => *self = text.parse()?,
            ExternalValue::Bytes(bytes) if bytes.is_empty() => *self = Self::NIL,
            ExternalValue::Bytes(bytes) if bytes.len() == Self::SIZE => {
                self.unmarshal_binary(bytes)?
            }
            ExternalValue::Bytes(bytes) => self.unmarshal_text(bytes)?,
            other => return Err(Error::Type(other.kind())),
        }
        Ok(())
    }

    /// Returns the canonical text as a driver value, or [`ExternalValue::Null`] for the nil UUID.
    pub fn value(&self) -> ExternalValue {
        if self.is_nil() {
            ExternalValue::Null
        } else {
            ExternalValue::Text(self.to_string())
        }
    }
}
