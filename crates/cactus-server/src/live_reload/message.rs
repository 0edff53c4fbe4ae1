//! Live reload wire messages.

use std::fmt;
use std::str::FromStr;

/// Message pushed to connected browsers.
///
/// Sent as a bare text frame holding the literal tag; there is no payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Full page reload (`reloadPage`).
    Page,
    /// Stylesheet refresh without reloading the page (`reloadCSS`).
    Css,
}

impl ReloadMessage {
    /// Wire literal for this message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "reloadPage",
            Self::Css => "reloadCSS",
        }
    }
}

impl fmt::Display for ReloadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown message tag.
#[derive(Debug, thiserror::Error)]
#[error("Unknown reload message: {0:?}")]
pub struct UnknownMessage(String);

impl FromStr for ReloadMessage {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reloadPage" => Ok(Self::Page),
            "reloadCSS" => Ok(Self::Css),
            other => Err(UnknownMessage(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_literals() {
        assert_eq!(ReloadMessage::Page.as_str(), "reloadPage");
        assert_eq!(ReloadMessage::Css.to_string(), "reloadCSS");
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!("reloadCSS".parse::<ReloadMessage>().unwrap(), ReloadMessage::Css);
        assert!("reloadcss".parse::<ReloadMessage>().is_err());
        assert!("reload".parse::<ReloadMessage>().is_err());
    }
}
