use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Quote provider identifiers reported as the `source` of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Yahoo Finance chart API, the primary source.
    YahooChart,
    /// Stooq last-close endpoint, the secondary source.
    Stooq,
    /// CoinGecko simple price endpoint, crypto only.
    Coingecko,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::YahooChart, Self::Stooq, Self::Coingecko];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YahooChart => "yahoo_chart",
            Self::Stooq => "stooq",
            Self::Coingecko => "coingecko",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo_chart" | "yahoo" => Ok(Self::YahooChart),
            "stooq" => Ok(Self::Stooq),
            "coingecko" => Ok(Self::Coingecko),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for provider in ProviderId::ALL {
            assert_eq!(provider.as_str().parse::<ProviderId>(), Ok(provider));
        }
        assert_eq!("Yahoo".parse::<ProviderId>(), Ok(ProviderId::YahooChart));
        assert!("polygon".parse::<ProviderId>().is_err());
    }
}
