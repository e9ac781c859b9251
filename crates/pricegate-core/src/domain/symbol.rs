use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 128;

/// Canonical instrument symbol.
///
/// Input is case-insensitive; the canonical spelling is upper-case. The
/// content is otherwise opaque (`M&M.NS`, `BRK-B`, `^GSPC` all pass) and is
/// percent-encoded by each provider when it builds a URL. Provider specific
/// spellings (lower-case Stooq tickers, CoinGecko ids) are derived from it by
/// [`crate::symbol_map::translate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, reject empty or oversized input, and normalize to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" aapl ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "AAPL");
    }

    #[test]
    fn keeps_index_and_future_markers() {
        assert_eq!(Symbol::parse("^gspc").expect("index").as_str(), "^GSPC");
        assert_eq!(Symbol::parse("cl=f").expect("future").as_str(), "CL=F");
        assert_eq!(Symbol::parse("brk.b").expect("class share").as_str(), "BRK.B");
    }

    #[test]
    fn rejects_empty_symbol() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
    }

    #[test]
    fn punctuation_is_passed_through() {
        assert_eq!(Symbol::parse("m&m.ns").expect("ampersand").as_str(), "M&M.NS");
        assert_eq!(Symbol::parse("AAPL;X").expect("semicolon").as_str(), "AAPL;X");
    }

    #[test]
    fn long_coin_ids_fit() {
        let id = "harrypotterobamasonic10inu-eth-wrapped-bridged-token";
        assert_eq!(Symbol::parse(id).expect("long id").as_str(), id.to_ascii_uppercase());
    }

    #[test]
    fn rejects_overlong_symbol() {
        let err = Symbol::parse(&"A".repeat(200)).expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolTooLong { len: 200, .. }));
    }
}
