//! Device access URLs.
//!
//! Listers describe how a device can be reached as a list of URLs (`file:///media/usb`,
//! `ipod:///media/ipod`, `afc://<udid>/`, ...). Only the scheme matters for driver dispatch and
//! only the path matters for the mount path shown in the UI, so this is a thin wrapper rather
//! than a full RFC 3986 parser.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A parsed `scheme:rest` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceUrl {
    raw: String,
    /// Byte offset of the `:` that ends the scheme.
    scheme_end: usize,
}

/// Error returned when a string has no valid scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlParseError {
    MissingScheme(String),
    InvalidScheme(String),
}

impl fmt::Display for UrlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScheme(url) => write!(f, "URL has no scheme: {url}"),
            Self::InvalidScheme(url) => write!(f, "URL has an invalid scheme: {url}"),
        }
    }
}

impl std::error::Error for UrlParseError {}

impl DeviceUrl {
    pub fn parse(input: &str) -> Result<Self, UrlParseError> {
        let Some(scheme_end) = input.find(':') else {
            return Err(UrlParseError::MissingScheme(input.to_string()));
        };
        let scheme = &input[..scheme_end];
        let mut chars = scheme.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return Err(UrlParseError::InvalidScheme(input.to_string()));
        }

        // Schemes are case-insensitive; store them lowercased so lookups can compare bytes.
        let raw = format!("{}{}", scheme.to_ascii_lowercase(), &input[scheme_end..]);
        Ok(Self { raw, scheme_end })
    }

    pub fn scheme(&self) -> &str {
        &self.raw[..self.scheme_end]
    }

    /// Returns the path component: everything after the authority for `scheme://authority/path`
    /// URLs, everything after the colon otherwise.
    pub fn path(&self) -> &str {
        let rest = &self.raw[self.scheme_end + 1..];
        match rest.strip_prefix("//") {
            Some(after_slashes) => match after_slashes.find('/') {
                Some(slash) => &after_slashes[slash..],
                None => "",
            },
            None => rest,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for DeviceUrl {
    type Err = UrlParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DeviceUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
