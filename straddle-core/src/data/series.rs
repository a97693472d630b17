//! Straddle series construction.
//!
//! Joins the call and put legs on exact timestamp equality, keeps only
//! timestamps present in both legs and inside the session window, and
//! derives the straddle price. No forward-fill: a timestamp missing from
//! either leg is dropped.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::SessionWindow;
use crate::domain::{DatasetHash, OptionSide, QuoteRecord, StraddleObservation};

/// Data-quality faults detected while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("no overlapping in-session observations for the selected call/put pair")]
    EmptySeries,

    #[error(
        "duplicate or out-of-order timestamp {timestamp} in {} series",
        .side.map(|s| s.to_string()).unwrap_or_else(|| "straddle".into())
    )]
    DuplicateOrUnsortedTimestamp {
        /// Leg the fault was found in; `None` for a pre-built straddle series.
        side: Option<OptionSide>,
        timestamp: NaiveDateTime,
    },

    #[error("{side} price {price} at {timestamp} is negative or not finite")]
    InvalidPrice {
        side: OptionSide,
        timestamp: NaiveDateTime,
        price: f64,
    },
}

/// Non-empty straddle observations with strictly ascending timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<StraddleObservation>",
    into = "Vec<StraddleObservation>"
)]
pub struct StraddleSeries {
    observations: Vec<StraddleObservation>,
}

impl StraddleSeries {
    /// Wrap pre-built observations, enforcing the series invariants.
    pub fn from_observations(observations: Vec<StraddleObservation>) -> Result<Self, SeriesError> {
        if observations.is_empty() {
            return Err(SeriesError::EmptySeries);
        }
        if let Some(pair) = observations
            .windows(2)
            .find(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::DuplicateOrUnsortedTimestamp {
                side: None,
                timestamp: pair[1].timestamp,
            });
        }
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[StraddleObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false: a series is never empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> &StraddleObservation {
        &self.observations[0]
    }

    /// Observation at exactly `timestamp`, if any.
    pub fn at(&self, timestamp: NaiveDateTime) -> Option<&StraddleObservation> {
        self.observations
            .binary_search_by_key(&timestamp, |o| o.timestamp)
            .ok()
            .map(|i| &self.observations[i])
    }

    /// Index of the first observation at or after `timestamp`.
    pub fn position_from(&self, timestamp: NaiveDateTime) -> usize {
        self.observations.partition_point(|o| o.timestamp < timestamp)
    }

    /// Global maximum straddle price; ties resolve to the earliest timestamp.
    pub fn daily_high(&self) -> (f64, NaiveDateTime) {
        let first = self.first();
        self.observations
            .iter()
            .skip(1)
            .fold((first.straddle_price, first.timestamp), |best, o| {
                if o.straddle_price > best.0 {
                    (o.straddle_price, o.timestamp)
                } else {
                    best
                }
            })
    }

    /// BLAKE3 over timestamps and both leg prices, in order.
    pub fn dataset_hash(&self) -> DatasetHash {
        let mut bytes = Vec::with_capacity(self.observations.len() * 32);
        for o in &self.observations {
            bytes.extend_from_slice(&o.timestamp.and_utc().timestamp().to_le_bytes());
            bytes.extend_from_slice(&o.put_price.to_bits().to_le_bytes());
            bytes.extend_from_slice(&o.call_price.to_bits().to_le_bytes());
        }
        DatasetHash::from_bytes(&bytes)
    }
}

impl TryFrom<Vec<StraddleObservation>> for StraddleSeries {
    type Error = SeriesError;

    fn try_from(observations: Vec<StraddleObservation>) -> Result<Self, Self::Error> {
        Self::from_observations(observations)
    }
}

impl From<StraddleSeries> for Vec<StraddleObservation> {
    fn from(series: StraddleSeries) -> Self {
        series.observations
    }
}

/// Join the two legs into a session-bounded straddle series.
///
/// Input order does not matter; the output is ascending by timestamp.
pub fn build_straddle_series(
    calls: &[QuoteRecord],
    puts: &[QuoteRecord],
    session: SessionWindow,
) -> Result<StraddleSeries, SeriesError> {
    let call_by_ts = index_leg(calls, OptionSide::Call)?;
    let put_by_ts = index_leg(puts, OptionSide::Put)?;

    let observations: Vec<StraddleObservation> = put_by_ts
        .iter()
        .filter(|(ts, _)| session.contains(ts.time()))
        .filter_map(|(ts, put)| {
            call_by_ts
                .get(ts)
                .map(|call| StraddleObservation::new(*ts, *put, *call))
        })
        .collect();

    StraddleSeries::from_observations(observations)
}

/// Timestamp → close lookup for one leg, rejecting duplicates.
fn index_leg(
    quotes: &[QuoteRecord],
    side: OptionSide,
) -> Result<BTreeMap<NaiveDateTime, f64>, SeriesError> {
    let mut by_ts = BTreeMap::new();
    for q in quotes {
        if !(q.close.is_finite() && q.close >= 0.0) {
            return Err(SeriesError::InvalidPrice {
                side,
                timestamp: q.timestamp,
                price: q.close,
            });
        }
        if by_ts.insert(q.timestamp, q.close).is_some() {
            warn!(%side, timestamp = %q.timestamp, "duplicate quote timestamp");
            return Err(SeriesError::DuplicateOrUnsortedTimestamp {
                side: Some(side),
                timestamp: q.timestamp,
            });
        }
    }
    Ok(by_ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn quote(side: OptionSide, h: u32, m: u32, close: f64) -> QuoteRecord {
        QuoteRecord {
            timestamp: ts(h, m),
            ticker: "SPY".into(),
            side,
            strike: 515.0,
            close,
        }
    }

    fn call(h: u32, m: u32, close: f64) -> QuoteRecord {
        quote(OptionSide::Call, h, m, close)
    }

    fn put(h: u32, m: u32, close: f64) -> QuoteRecord {
        quote(OptionSide::Put, h, m, close)
    }

    #[test]
    fn inner_join_drops_unmatched_timestamps() {
        let calls = vec![call(9, 30, 2.0), call(9, 31, 2.1), call(9, 33, 2.2)];
        let puts = vec![put(9, 30, 3.0), put(9, 32, 3.1), put(9, 33, 3.2)];

        let series = build_straddle_series(&calls, &puts, SessionWindow::default()).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.observations()[0].timestamp, ts(9, 30));
        assert!((series.observations()[0].straddle_price - 500.0).abs() < 1e-9);
        assert_eq!(series.observations()[1].timestamp, ts(9, 33));
    }

    #[test]
    fn session_bounds_are_inclusive() {
        let calls = vec![call(9, 29, 1.0), call(9, 30, 1.0), call(16, 0, 1.0), call(16, 1, 1.0)];
        let puts = vec![put(9, 29, 1.0), put(9, 30, 1.0), put(16, 0, 1.0), put(16, 1, 1.0)];

        let series = build_straddle_series(&calls, &puts, SessionWindow::default()).unwrap();

        let times: Vec<_> = series.observations().iter().map(|o| o.timestamp).collect();
        assert_eq!(times, vec![ts(9, 30), ts(16, 0)]);
    }

    #[test]
    fn output_is_sorted_regardless_of_input_order() {
        let calls = vec![call(10, 0, 1.0), call(9, 30, 1.0), call(9, 45, 1.0)];
        let puts = vec![put(9, 45, 1.0), put(10, 0, 1.0), put(9, 30, 1.0)];

        let series = build_straddle_series(&calls, &puts, SessionWindow::default()).unwrap();
        let times: Vec<_> = series.observations().iter().map(|o| o.timestamp).collect();
        assert_eq!(times, vec![ts(9, 30), ts(9, 45), ts(10, 0)]);
    }

    #[test]
    fn no_common_timestamps_is_empty_series() {
        let calls = vec![call(9, 30, 1.0)];
        let puts = vec![put(9, 31, 1.0)];
        assert_eq!(
            build_straddle_series(&calls, &puts, SessionWindow::default()),
            Err(SeriesError::EmptySeries)
        );
    }

    #[test]
    fn out_of_session_only_is_empty_series() {
        let calls = vec![call(8, 0, 1.0)];
        let puts = vec![put(8, 0, 1.0)];
        assert_eq!(
            build_straddle_series(&calls, &puts, SessionWindow::default()),
            Err(SeriesError::EmptySeries)
        );
    }

    #[test]
    fn duplicate_timestamp_in_leg_is_rejected() {
        let calls = vec![call(9, 30, 1.0), call(9, 30, 1.1)];
        let puts = vec![put(9, 30, 1.0)];
        assert_eq!(
            build_straddle_series(&calls, &puts, SessionWindow::default()),
            Err(SeriesError::DuplicateOrUnsortedTimestamp {
                side: Some(OptionSide::Call),
                timestamp: ts(9, 30),
            })
        );
    }

    #[test]
    fn negative_leg_price_is_rejected() {
        let calls = vec![call(9, 30, 1.0)];
        let puts = vec![put(9, 30, -0.5)];
        assert!(matches!(
            build_straddle_series(&calls, &puts, SessionWindow::default()),
            Err(SeriesError::InvalidPrice {
                side: OptionSide::Put,
                ..
            })
        ));
    }

    #[test]
    fn from_observations_rejects_unsorted() {
        let obs = vec![
            StraddleObservation::new(ts(9, 31), 1.0, 1.0),
            StraddleObservation::new(ts(9, 30), 1.0, 1.0),
        ];
        assert_eq!(
            StraddleSeries::from_observations(obs),
            Err(SeriesError::DuplicateOrUnsortedTimestamp {
                side: None,
                timestamp: ts(9, 30),
            })
        );
    }

    #[test]
    fn daily_high_picks_first_maximum() {
        let obs = vec![
            StraddleObservation::new(ts(9, 30), 1.0, 1.0),
            StraddleObservation::new(ts(9, 31), 2.0, 2.0),
            StraddleObservation::new(ts(9, 32), 1.5, 1.0),
            StraddleObservation::new(ts(9, 33), 2.0, 2.0),
        ];
        let series = StraddleSeries::from_observations(obs).unwrap();
        let (price, time) = series.daily_high();
        assert!((price - 400.0).abs() < 1e-9);
        assert_eq!(time, ts(9, 31));
    }

    #[test]
    fn exact_lookup_and_position() {
        let obs = vec![
            StraddleObservation::new(ts(9, 30), 1.0, 1.0),
            StraddleObservation::new(ts(9, 35), 1.0, 1.0),
        ];
        let series = StraddleSeries::from_observations(obs).unwrap();
        assert!(series.at(ts(9, 35)).is_some());
        assert!(series.at(ts(9, 31)).is_none());
        assert_eq!(series.position_from(ts(9, 31)), 1);
        assert_eq!(series.position_from(ts(9, 30)), 0);
    }

    #[test]
    fn dataset_hash_tracks_prices() {
        let a = StraddleSeries::from_observations(vec![StraddleObservation::new(ts(9, 30), 1.0, 1.0)])
            .unwrap();
        let b = StraddleSeries::from_observations(vec![StraddleObservation::new(ts(9, 30), 1.0, 1.01)])
            .unwrap();
        assert_eq!(a.dataset_hash(), a.clone().dataset_hash());
        assert_ne!(a.dataset_hash(), b.dataset_hash());
    }

    #[test]
    fn serde_rejects_empty_series() {
        assert!(serde_json::from_str::<StraddleSeries>("[]").is_err());
    }
}
