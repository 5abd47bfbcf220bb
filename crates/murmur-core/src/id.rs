//! [`ObjectId`]: 12-byte identifiers rendered as 24 lowercase hex characters.
//!
//! Layout: 4 bytes big-endian Unix seconds, 5 random bytes fixed for the
//! lifetime of the process, 3 bytes of a process-wide counter. Byte-wise
//! ordering therefore follows creation time, and it matches the
//! lexicographic ordering of the hex rendering.

use std::{
  fmt,
  str::FromStr,
  sync::{
    LazyLock,
    atomic::{AtomicU32, Ordering},
  },
};

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

const COUNTER_MASK: u32 = 0x00ff_ffff;

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
  let mut bytes = [0u8; 5];
  OsRng.fill_bytes(&mut bytes);
  bytes
});

static COUNTER: LazyLock<AtomicU32> =
  LazyLock::new(|| AtomicU32::new(OsRng.next_u32() & COUNTER_MASK));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
  /// Length of the canonical hex rendering.
  pub const HEX_LEN: usize = 24;

  /// Generate a fresh identifier stamped with the current time.
  pub fn new() -> Self {
    let secs = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
    let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
    bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
    Self(bytes)
  }

  pub const fn from_bytes(bytes: [u8; 12]) -> Self { Self(bytes) }

  pub const fn bytes(&self) -> [u8; 12] { self.0 }

  /// Parse exactly 24 hex characters. Anything else is
  /// [`Error::MalformedIdentifier`].
  pub fn parse_str(s: &str) -> Result<Self> {
    if s.len() != Self::HEX_LEN {
      return Err(Error::MalformedIdentifier(s.to_owned()));
    }
    let mut bytes = [0u8; 12];
    hex::decode_to_slice(s, &mut bytes)
      .map_err(|_| Error::MalformedIdentifier(s.to_owned()))?;
    Ok(Self(bytes))
  }

  /// The lowercase hex rendering stored in databases and sent to clients.
  pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl Default for ObjectId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for ObjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

impl FromStr for ObjectId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse_str(s) }
}

impl Serialize for ObjectId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_hex())
  }
}

impl<'de> Deserialize<'de> for ObjectId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse_str(&s).map_err(de::Error::custom)
  }
}
