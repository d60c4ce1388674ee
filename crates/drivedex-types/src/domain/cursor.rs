use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Opaque change-feed position marker.
///
/// Drive hands these out per page; they advance monotonically. The value is
/// treated as an uninterpreted string everywhere except display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PageToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PageToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which paginated feed a stored cursor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorScope {
    Change,
    File,
}

impl CursorScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CursorScope::Change => "change",
            CursorScope::File => "file",
        }
    }
}

impl FromStr for CursorScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "change" => Ok(CursorScope::Change),
            "file" => Ok(CursorScope::File),
            other => Err(Error::Parse(format!("unknown cursor scope '{}'", other))),
        }
    }
}

/// What to do with the stored cursor when a walk dies mid-feed.
///
/// `Discard` clears it, forcing the operator to pick a fresh start token on
/// the next run. `KeepLastSeen` stores the last token that served a
/// successful page; the next run reprocesses that page but cannot skip
/// anything unseen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    Discard,
    KeepLastSeen,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        Self::KeepLastSeen
    }
}

impl FromStr for ResumePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "discard" => Ok(ResumePolicy::Discard),
            "keep-last-seen" => Ok(ResumePolicy::KeepLastSeen),
            other => Err(Error::Parse(format!("unknown resume policy '{}'", other))),
        }
    }
}
