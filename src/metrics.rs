//! Derived metrics and metric-based ranking.
//!
//! Every [`MetricKey`] maps to a fixed formula over the seven base stats.
//! A metric is undefined (`None`) as soon as any stat it reads is missing;
//! there is no zero substitution.
//!
//! | Key | Formula |
//! |-----|---------|
//! | `totalStatus` | kick + control + technique + pressure + physical + agility + intelligence |
//! | `shootAT` | kick + control |
//! | `focusAT` | floor(technique + control + kick × 0.5) |
//! | `focusDF` | floor(technique + intelligence + agility × 0.5) |
//! | `scrambleAT` | intelligence + physical |
//! | `scrambleDF` | intelligence + pressure |
//! | `wallDF` | physical + pressure |
//! | `KP` | agility × 4 + physical × 3 + pressure × 2 |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::models::{CharacterRecord, Stats};

/// Closed set of derived statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    #[serde(rename = "totalStatus")]
    TotalStatus,
    #[serde(rename = "shootAT")]
    ShootAt,
    #[serde(rename = "focusAT")]
    FocusAt,
    #[serde(rename = "focusDF")]
    FocusDf,
    #[serde(rename = "scrambleAT")]
    ScrambleAt,
    #[serde(rename = "scrambleDF")]
    ScrambleDf,
    #[serde(rename = "wallDF")]
    WallDf,
    #[serde(rename = "KP")]
    Kp,
}

impl MetricKey {
    /// All keys in display order.
    pub const ALL: [MetricKey; 8] = [
        MetricKey::TotalStatus,
        MetricKey::ShootAt,
        MetricKey::FocusAt,
        MetricKey::FocusDf,
        MetricKey::ScrambleAt,
        MetricKey::ScrambleDf,
        MetricKey::WallDf,
        MetricKey::Kp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::TotalStatus => "totalStatus",
            MetricKey::ShootAt => "shootAT",
            MetricKey::FocusAt => "focusAT",
            MetricKey::FocusDf => "focusDF",
            MetricKey::ScrambleAt => "scrambleAT",
            MetricKey::ScrambleDf => "scrambleDF",
            MetricKey::WallDf => "wallDF",
            MetricKey::Kp => "KP",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match MetricKey::ALL.iter().find(|k| k.as_str() == s) {
            Some(key) => Ok(*key),
            None => bail!(
                "Unknown metric key: '{}'. Use one of: {}",
                s,
                MetricKey::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Compute one derived metric, or `None` if any input stat is missing.
///
/// A result that does not fit in `i64` is also `None`.
pub fn compute_metric(stats: &Stats, key: MetricKey) -> Option<i64> {
    let Stats {
        kick,
        control,
        technique,
        pressure,
        physical,
        agility,
        intelligence,
    } = *stats;

    match key {
        MetricKey::TotalStatus => checked_sum(&[
            kick?,
            control?,
            technique?,
            pressure?,
            physical?,
            agility?,
            intelligence?,
        ]),
        MetricKey::ShootAt => checked_sum(&[kick?, control?]),
        MetricKey::FocusAt => checked_sum(&[technique?, control?, kick?.div_euclid(2)]),
        MetricKey::FocusDf => checked_sum(&[technique?, intelligence?, agility?.div_euclid(2)]),
        MetricKey::ScrambleAt => checked_sum(&[intelligence?, physical?]),
        MetricKey::ScrambleDf => checked_sum(&[intelligence?, pressure?]),
        MetricKey::WallDf => checked_sum(&[physical?, pressure?]),
        MetricKey::Kp => checked_sum(&[
            agility?.checked_mul(4)?,
            physical?.checked_mul(3)?,
            pressure?.checked_mul(2)?,
        ]),
    }
}

fn checked_sum(values: &[i64]) -> Option<i64> {
    values.iter().try_fold(0i64, |acc, v| acc.checked_add(*v))
}

impl CharacterRecord {
    /// Shorthand for [`compute_metric`] on this record's stats.
    pub fn metric(&self, key: MetricKey) -> Option<i64> {
        compute_metric(&self.stats, key)
    }
}

/// Ascending by character number; a missing number sorts after every real one.
fn cmp_character_no(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Return a copy of `records` ordered by `key`.
///
/// Defined values come first, largest first. Ties (including two undefined
/// values) go to the smaller character number, with missing numbers last.
/// The sort is stable, so records that still compare equal keep their
/// input order.
pub fn rank_by_metric(records: &[CharacterRecord], key: MetricKey) -> Vec<CharacterRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| {
        let by_value = match (a.metric(key), b.metric(key)) {
            (Some(av), Some(bv)) => bv.cmp(&av),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_value.then_with(|| cmp_character_no(a.character_no, b.character_no))
    });
    ranked
}
