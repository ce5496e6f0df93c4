//! Bounded chain identifiers.

use std::{
    convert::TryFrom,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a [`Name`] in bytes.
pub const MAX_NAME_LENGTH: usize = 12;

/// Error while parsing a [`Name`] from a string.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum FromStrError {
    /// The input was empty.
    #[error("name must not be empty")]
    Empty,
    /// The input exceeded [`MAX_NAME_LENGTH`].
    #[error("name exceeds {MAX_NAME_LENGTH} characters: got {0}")]
    TooLong(usize),
    /// The input contained a character outside the allowed set.
    #[error("invalid character {1:?} at position {0} (allowed: a-z, 1-5, '.')")]
    InvalidCharacter(usize, char),
}

/// An identifier for an account, action, permission or table.
///
/// Names are 1 to [`MAX_NAME_LENGTH`] characters drawn from the set
/// `a-z`, `1-5` and `.`, compared and ordered as plain bytes. The
/// restricted charset keeps identifiers unambiguous in consoles, logs
/// and structured payloads.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Parses and validates a name.
    pub fn new(value: &str) -> Result<Self, FromStrError> {
        value.parse()
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_lowercase() || ('1'..='5').contains(&ch) || ch == '.'
}

impl FromStr for Name {
    type Err = FromStrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(FromStrError::Empty);
        }
        if input.len() > MAX_NAME_LENGTH {
            return Err(FromStrError::TooLong(input.len()));
        }
        if let Some((index, ch)) = input.chars().enumerate().find(|(_, ch)| !is_allowed(*ch)) {
            return Err(FromStrError::InvalidCharacter(index, ch));
        }
        Ok(Name(input.to_string()))
    }
}

impl TryFrom<String> for Name {
    type Error = FromStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, formatter)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Name({})", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
