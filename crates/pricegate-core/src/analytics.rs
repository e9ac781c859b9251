//! Close-series summary: last move and realised volatility.

use serde::Serialize;

use crate::PriceHistory;

const LOW_RISK_BELOW_PCT: f64 = 1.5;
const HIGH_RISK_ABOVE_PCT: f64 = 4.0;

/// One dated close, timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: i64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a volatility percentage.
    pub fn from_vol_pct(vol_pct: f64) -> Self {
        if vol_pct < LOW_RISK_BELOW_PCT {
            Self::Low
        } else if vol_pct > HIGH_RISK_ABOVE_PCT {
            Self::High
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSummary {
    pub current: f64,
    pub change: f64,
    pub change_pct: f64,
    /// Population standard deviation of closes as a percentage of their mean.
    pub vol_pct: f64,
    pub risk: RiskLevel,
}

/// Dated closes, skipping bars where either the timestamp or close is null.
pub fn close_points(history: &PriceHistory) -> Vec<HistoryPoint> {
    history
        .timestamps()
        .iter()
        .zip(history.close())
        .filter_map(|(ts, close)| match (ts, close) {
            (Some(ts), Some(close)) => Some(HistoryPoint {
                date: ts.saturating_mul(1000),
                close: *close,
            }),
            _ => None,
        })
        .collect()
}

impl PriceSummary {
    /// `None` when there are no points.
    pub fn from_points(points: &[HistoryPoint]) -> Option<Self> {
        let current = points.last()?.close;
        let previous = match points.len() {
            0 | 1 => current,
            n => points[n - 2].close,
        };

        let change = current - previous;
        let change_pct = if previous != 0.0 {
            change / previous * 100.0
        } else {
            0.0
        };

        let count = points.len() as f64;
        let mean = points.iter().map(|p| p.close).sum::<f64>() / count;
        let variance = points
            .iter()
            .map(|p| (p.close - mean).powi(2))
            .sum::<f64>()
            / count;
        let vol_pct = if mean != 0.0 {
            variance.sqrt() / mean * 100.0
        } else {
            0.0
        };

        Some(Self {
            current,
            change,
            change_pct,
            vol_pct,
            risk: RiskLevel::from_vol_pct(vol_pct),
        })
    }
}
