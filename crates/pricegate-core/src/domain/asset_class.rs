use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Instrument class that drives provider selection and symbol translation.
///
/// `Stock` covers both equities and ETFs; nothing downstream tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Stock,
    Future,
    Index,
    Crypto,
}

impl AssetClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Future => "future",
            Self::Index => "index",
            Self::Crypto => "crypto",
        }
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw symbol.
///
/// Rules are checked in order: a leading `^` is an index, any `=` is a future,
/// everything else is a stock. Crypto is never inferred from the spelling.
pub fn classify(symbol: &str) -> AssetClass {
    if symbol.starts_with('^') {
        AssetClass::Index
    } else if symbol.contains('=') {
        AssetClass::Future
    } else {
        AssetClass::Stock
    }
}
