//! Per-provider symbol spelling.
//!
//! Translation is one-way and best effort: it never fails, even when the
//! result is meaningless to the target provider.

use crate::{AssetClass, ProviderId, Symbol};

/// Spell `symbol` the way `provider` expects it.
pub fn translate(symbol: &Symbol, asset_class: AssetClass, provider: ProviderId) -> String {
    match provider {
        ProviderId::YahooChart => symbol.as_str().to_owned(),
        ProviderId::Stooq => stooq_symbol(symbol.as_str(), asset_class),
        ProviderId::Coingecko => symbol.as_str().to_ascii_lowercase(),
    }
}

fn stooq_symbol(symbol: &str, asset_class: AssetClass) -> String {
    match asset_class {
        AssetClass::Future => {
            let base = symbol.to_ascii_uppercase().replace("=F", "");
            format!("{}.f", base.to_ascii_lowercase())
        }
        AssetClass::Index => symbol.to_ascii_lowercase(),
        // Stooq only lists US shares under `.us`; crypto has no Stooq spelling.
        AssetClass::Stock | AssetClass::Crypto => format!("{}.us", symbol.to_ascii_lowercase()),
    }
}
