//! RFC 4122 UUIDs with a time-based generator whose state survives restarts
//!
//! ```rust
//! use rfc4122::uuid1;
//!
//! let uuid = uuid1();
//! println!("{}", uuid); // e.g. "c232ab00-9414-11ec-b3c8-9f6bdeced846"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//! ```
//!
//! See [RFC 4122](https://www.rfc-editor.org/rfc/rfc4122).
//!
//! # Field and bit layout
//!
//! Version 1 identifiers produced by this library have the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          time_low                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       time_mid                |  ver  |       time_high       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|         clock_seq         |             node              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              node                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 60-bit timestamp counts 100-nanosecond intervals since 1582-10-15 00:00:00 UTC and is
//!   split into `time_low`, `time_mid`, and `time_high`.
//! - The 4-bit `ver` field is set at `0001`.
//! - The 2-bit `var` field is set at `10`.
//! - The 14-bit `clock_seq` field is incremented whenever the clock fails to advance between two
//!   calls, and reseeded whenever the node changes.
//! - The 48-bit `node` field holds the configured node id, or a random one with the multicast bit
//!   set.
//!
//! # Persistence
//!
//! A [`Generator`] built with a [`Saver`] loads the last timestamp, clock sequence, and node on
//! startup and writes them back periodically and at shutdown:
//!
//! ```rust
//! use rfc4122::{FileSystemSaver, Generator};
//! use std::time::Duration;
//!
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("generator.state");
//! let g = Generator::builder()
//!     .saver(FileSystemSaver::new(path, Duration::from_secs(1)))
//!     .build()?;
//! for id in (&g).take(4) {
//!     println!("{}", id);
//! }
//! g.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Other features
//!
//! This library also supports the generation of UUID version 4:
//!
//! ```rust
//! use rfc4122::uuid4;
//!
//! let uuid = uuid4();
//! println!("{}", uuid); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//! ```
//!
//! Borrowed 16-byte buffers can be inspected through [`UuidSlice`], and values exchanged with
//! storage drivers go through [`ExternalValue`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub use error::{Error, InvalidVariant, ParseError, Result};

pub mod codec;
pub use codec::{Variant, Version};

mod id;
pub use id::Uuid;

mod slice;
pub use slice::UuidSlice;

mod external;
pub use external::ExternalValue;

pub mod generator;
pub use generator::{Builder, Generator, StdSystemTime, TimeSource};

pub mod saver;
pub use saver::{filesystem::FileSystemSaver, Saver, Schedule, Scheduler, Store};

mod v4;
pub use v4::uuid4;

mod global_gen;
pub use global_gen::uuid1;
