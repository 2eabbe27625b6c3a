//! Octal permission modes

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Highest value accepted: setuid/setgid/sticky plus rwx for all classes.
const MAX_MODE: u32 = 0o7777;

/// A numeric permission value such as `0644`.
///
/// Policy documents write modes as quoted octal strings (`"0644"`, `"644"`,
/// `"0o644"`). Unquoted integers are rejected: YAML and TOML have already
/// resolved `0o644` to 420 and `0644` to 644 by the time they reach us, so the
/// intended value cannot be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileMode(u32);

impl FileMode {
    /// Conventional WordPress file mode.
    pub const FILE: FileMode = FileMode(0o644);
    /// Conventional WordPress directory mode.
    pub const DIRECTORY: FileMode = FileMode(0o755);
    /// Mode used when a policy document has no usable `default` section.
    pub const LEGACY_FALLBACK: FileMode = FileMode(0o755);

    pub(crate) const fn from_raw(bits: u32) -> Self {
        Self(bits & MAX_MODE)
    }

    /// Build from raw permission bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits > MAX_MODE {
            return Err(Error::InvalidMode {
                value: format!("{bits:o}"),
                reason: "exceeds 7777".into(),
            });
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl FromStr for FileMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);

        let invalid = |reason: &str| Error::InvalidMode {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        if digits.is_empty() {
            return Err(invalid("empty"));
        }
        if !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(invalid("not an octal number"));
        }
        let bits = u32::from_str_radix(digits, 8).map_err(|e| invalid(&e.to_string()))?;
        Self::from_bits(bits).map_err(|_| invalid("exceeds 7777"))
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl Serialize for FileMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ModeVisitor;

        impl Visitor<'_> for ModeVisitor {
            type Value = FileMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an octal permission such as \"0644\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FileMode, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<FileMode, E> {
                Err(E::custom(unquoted(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<FileMode, E> {
                Err(E::custom(unquoted(v)))
            }
        }

        deserializer.deserialize_any(ModeVisitor)
    }
}

fn unquoted(value: impl fmt::Display) -> String {
    format!("permission mode {value} must be quoted, e.g. \"0644\"")
}
