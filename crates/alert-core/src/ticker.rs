//! Exchange-qualified ticker symbols.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TickerError;

/// A normalised ticker such as `"VALE3.SA"` or `"^BVSP"`.
///
/// Always upper case and trimmed. Lookups by `&str` work through
/// `Borrow<str>`, but only with an already-normalised string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Normalise and validate a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(TickerError::Empty);
        }
        if !symbol.chars().all(is_symbol_char) {
            return Err(TickerError::InvalidCharacters(raw.trim().to_string()));
        }
        Ok(Ticker(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_')
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ticker::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_whitespace() {
        let t = Ticker::parse("  vale3.sa ").unwrap();
        assert_eq!(t.as_str(), "VALE3.SA");
        assert_eq!(t.to_string(), "VALE3.SA");
    }

    #[test]
    fn accepts_index_and_fx_symbols() {
        assert!(Ticker::parse("^BVSP").is_ok());
        assert!(Ticker::parse("BRL=X").is_ok());
        assert!(Ticker::parse("BRK-B").is_ok());
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(Ticker::parse("   "), Err(TickerError::Empty));
        assert!(matches!(
            Ticker::parse("VALE 3"),
            Err(TickerError::InvalidCharacters(_))
        ));
        assert!(Ticker::parse("PETR4;DROP").is_err());
    }

    #[test]
    fn deserialises_through_validation() {
        let t: Ticker = serde_json::from_str("\"petr4.sa\"").unwrap();
        assert_eq!(t.as_str(), "PETR4.SA");
        assert!(serde_json::from_str::<Ticker>("\"\"").is_err());
    }
}
