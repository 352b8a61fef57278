//! Westgard multi-rules for Levey-Jennings charts.
//!
//! Each rule is an independent predicate over `(values, limits, i)` that
//! answers "does point `i` take part in a violation of this rule?". The
//! engine runs every enabled predicate over every index and returns one
//! boolean mask per rule, so a point may be flagged by several rules.
//!
//! Window rules consider every alignment of the window that contains the
//! evaluated point. An alignment that would reach past either end of the
//! series is simply not satisfied; it never indexes out of bounds.
//!
//! # References
//!
//! - Westgard, J.O., Barry, P.L., Hunt, M.R. & Groth, T. (1981). "A
//!   multi-rule Shewhart chart for quality control in clinical chemistry",
//!   *Clinical Chemistry* 27(3), pp. 493-501.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::limits::LimitSet;
use crate::error::{QcError, Result};
use crate::series::Series;

/// The six Westgard rules supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WestgardRule {
    /// One point at or beyond ±2 SD (warning rule).
    #[serde(rename = "1-2s")]
    OneTwoS,
    /// One point at or beyond ±3 SD.
    #[serde(rename = "1-3s")]
    OneThreeS,
    /// Two adjacent points at or beyond the same 2 SD limit.
    #[serde(rename = "2-2s")]
    TwoTwoS,
    /// Adjacent points on opposite 2 SD limits (range of at least 4 SD).
    #[serde(rename = "R-4s")]
    RFourS,
    /// Four consecutive points at or beyond the same 1 SD limit.
    #[serde(rename = "4-1s")]
    FourOneS,
    /// Ten consecutive points strictly on the same side of the mean.
    #[serde(rename = "10x")]
    TenX,
}

/// Predicate deciding whether point `i` participates in a violation.
pub type RulePredicate = fn(&[f64], &LimitSet, usize) -> bool;

impl WestgardRule {
    /// Every rule, in display order.
    pub const ALL: [WestgardRule; 6] = [
        WestgardRule::OneTwoS,
        WestgardRule::OneThreeS,
        WestgardRule::TwoTwoS,
        WestgardRule::RFourS,
        WestgardRule::FourOneS,
        WestgardRule::TenX,
    ];

    /// Canonical rule name, e.g. `"R-4s"`.
    pub fn name(self) -> &'static str {
        match self {
            WestgardRule::OneTwoS => "1-2s",
            WestgardRule::OneThreeS => "1-3s",
            WestgardRule::TwoTwoS => "2-2s",
            WestgardRule::RFourS => "R-4s",
            WestgardRule::FourOneS => "4-1s",
            WestgardRule::TenX => "10x",
        }
    }

    /// The predicate implementing this rule.
    pub fn predicate(self) -> RulePredicate {
        match self {
            WestgardRule::OneTwoS => one_two_s,
            WestgardRule::OneThreeS => one_three_s,
            WestgardRule::TwoTwoS => two_two_s,
            WestgardRule::RFourS => r_four_s,
            WestgardRule::FourOneS => four_one_s,
            WestgardRule::TenX => ten_x,
        }
    }

    /// Whether point `i` of `values` participates in a violation.
    ///
    /// Returns `false` for `i` past the end of `values`.
    pub fn is_violated(self, values: &[f64], limits: &LimitSet, i: usize) -> bool {
        i < values.len() && (self.predicate())(values, limits, i)
    }
}

impl fmt::Display for WestgardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WestgardRule {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        WestgardRule::ALL
            .into_iter()
            .find(|rule| rule.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| QcError::invalid("rule", format!("unknown Westgard rule '{trimmed}'")))
    }
}

// ---------------------------------------------------------------------------
// Window helpers
// ---------------------------------------------------------------------------

/// Whether the `len`-point window starting at `start` lies inside the series
/// and every value in it satisfies `pred`.
fn window_all(values: &[f64], start: isize, len: usize, pred: impl Fn(f64) -> bool) -> bool {
    if start < 0 {
        return false;
    }
    let start = start as usize;
    match values.get(start..start + len) {
        Some(window) => window.iter().all(|&v| pred(v)),
        None => false,
    }
}

/// Whether any `len`-point window containing `i` satisfies `pred` throughout.
fn any_window_containing(
    values: &[f64],
    i: usize,
    len: usize,
    pred: impl Fn(f64) -> bool + Copy,
) -> bool {
    let i = i as isize;
    (0..len as isize).any(|offset| window_all(values, i - offset, len, pred))
}

/// Value of the neighbour at `i + offset`, if it exists.
fn neighbour(values: &[f64], i: usize, offset: isize) -> Option<f64> {
    let j = i as isize + offset;
    if j < 0 {
        return None;
    }
    values.get(j as usize).copied()
}

// ---------------------------------------------------------------------------
// Rule predicates
// ---------------------------------------------------------------------------

fn one_two_s(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    values
        .get(i)
        .is_some_and(|&x| x >= limits.plus_2sd || x <= limits.minus_2sd)
}

fn one_three_s(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    values
        .get(i)
        .is_some_and(|&x| x >= limits.plus_3sd || x <= limits.minus_3sd)
}

/// Point and its predecessor, or point and its successor, beyond the same
/// 2 SD limit. Only immediate neighbours count.
fn two_two_s(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    let above = |v: f64| v >= limits.plus_2sd;
    let below = |v: f64| v <= limits.minus_2sd;
    any_window_containing(values, i, 2, above) || any_window_containing(values, i, 2, below)
}

/// Point beyond one 2 SD limit while an immediate neighbour is beyond the other.
fn r_four_s(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    let Some(&x) = values.get(i) else {
        return false;
    };
    let neighbours = [neighbour(values, i, -1), neighbour(values, i, 1)];
    if x >= limits.plus_2sd {
        neighbours.iter().flatten().any(|&n| n <= limits.minus_2sd)
    } else if x <= limits.minus_2sd {
        neighbours.iter().flatten().any(|&n| n >= limits.plus_2sd)
    } else {
        false
    }
}

fn four_one_s(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    let above = |v: f64| v >= limits.plus_1sd;
    let below = |v: f64| v <= limits.minus_1sd;
    any_window_containing(values, i, 4, above) || any_window_containing(values, i, 4, below)
}

fn ten_x(values: &[f64], limits: &LimitSet, i: usize) -> bool {
    let mean = limits.mean;
    let above = move |v: f64| v > mean;
    let below = move |v: f64| v < mean;
    any_window_containing(values, i, 10, above) || any_window_containing(values, i, 10, below)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Per-rule violation masks, each the same length as the evaluated series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleViolationMask {
    len: usize,
    masks: BTreeMap<WestgardRule, Vec<bool>>,
}

impl RuleViolationMask {
    /// The mask for `rule`, or `None` if it was not enabled.
    pub fn mask(&self, rule: WestgardRule) -> Option<&[bool]> {
        self.masks.get(&rule).map(Vec::as_slice)
    }

    /// Indices flagged by `rule`; empty if the rule was not enabled.
    pub fn flagged(&self, rule: WestgardRule) -> Vec<usize> {
        self.mask(rule)
            .map(|m| {
                m.iter()
                    .enumerate()
                    .filter(|(_, &hit)| hit)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The enabled rules, in display order.
    pub fn rules(&self) -> impl Iterator<Item = WestgardRule> + '_ {
        self.masks.keys().copied()
    }

    /// Per-index OR over every enabled rule.
    pub fn any_violation(&self) -> Vec<bool> {
        let mut combined = vec![false; self.len];
        for mask in self.masks.values() {
            for (slot, &hit) in combined.iter_mut().zip(mask) {
                *slot |= hit;
            }
        }
        combined
    }

    /// Rules flagging point `i`.
    pub fn rules_at(&self, i: usize) -> Vec<WestgardRule> {
        self.masks
            .iter()
            .filter(|(_, mask)| mask.get(i).copied().unwrap_or(false))
            .map(|(&rule, _)| rule)
            .collect()
    }

    /// `true` when no enabled rule flags any point.
    pub fn is_in_control(&self) -> bool {
        self.masks.values().all(|m| m.iter().all(|&hit| !hit))
    }

    /// Length of the evaluated series.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the evaluated series was empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A set of enabled Westgard rules.
///
/// # Examples
///
/// ```
/// use u_iqc::series::Series;
/// use u_iqc::spc::{LimitSet, LimitSource, WestgardRule, WestgardRules};
///
/// let limits = LimitSet::from_mean_sd(0.0, 1.0, LimitSource::Custom).unwrap();
/// let series = Series::from(vec![2.5, -2.5]);
/// let result = WestgardRules::new([WestgardRule::RFourS])
///     .evaluate(&series, &limits)
///     .unwrap();
/// assert_eq!(result.flagged(WestgardRule::RFourS), vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WestgardRules {
    enabled: Vec<WestgardRule>,
}

impl WestgardRules {
    /// Enables the given rules. Duplicates are ignored.
    pub fn new(rules: impl IntoIterator<Item = WestgardRule>) -> Self {
        let mut enabled: Vec<WestgardRule> = rules.into_iter().collect();
        enabled.sort();
        enabled.dedup();
        Self { enabled }
    }

    /// All six rules.
    pub fn all() -> Self {
        Self::new(WestgardRule::ALL)
    }

    /// The enabled rules.
    pub fn enabled(&self) -> &[WestgardRule] {
        &self.enabled
    }

    /// Evaluates every enabled rule at every index of `series`.
    ///
    /// # Errors
    ///
    /// [`QcError::MissingData`] if `series` is empty.
    pub fn evaluate(&self, series: &Series, limits: &LimitSet) -> Result<RuleViolationMask> {
        if series.is_empty() {
            return Err(QcError::MissingData {
                what: "Westgard rule evaluation",
            });
        }
        let values = series.values();
        let masks: BTreeMap<WestgardRule, Vec<bool>> = self
            .enabled
            .iter()
            .map(|&rule| {
                let predicate = rule.predicate();
                let mask: Vec<bool> = (0..values.len())
                    .map(|i| predicate(values, limits, i))
                    .collect();
                debug!(
                    rule = rule.name(),
                    flagged = mask.iter().filter(|&&hit| hit).count(),
                    "evaluated Westgard rule"
                );
                (rule, mask)
            })
            .collect();
        Ok(RuleViolationMask {
            len: values.len(),
            masks,
        })
    }
}
