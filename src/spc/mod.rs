//! Levey-Jennings charts with Westgard multi-rule evaluation.
//!
//! # Limits
//!
//! - [`LimitSet`]: center line and ±1/2/3 SD bands, from the series
//!   ([`LimitMode::Sample`], population SD) or a laboratory target
//!   ([`LimitMode::Custom`])
//!
//! # Rules
//!
//! - [`WestgardRules`]: evaluates any subset of 1-2s, 1-3s, 2-2s, R-4s,
//!   4-1s, and 10x, producing a [`RuleViolationMask`] per rule
//!
//! # Reporting
//!
//! - [`PerformanceSummary`]: mean, SD, and CV% rounded for display
//!
//! # References
//!
//! - Levey, S. & Jennings, E.R. (1950). *American Journal of Clinical
//!   Pathology* 20(11), pp. 1059-1066.
//! - Westgard, J.O. et al. (1981). "A multi-rule Shewhart chart for quality
//!   control in clinical chemistry", *Clinical Chemistry* 27(3), pp. 493-501.

mod limits;
mod performance;
mod rules;

pub use limits::{LimitMode, LimitSet, LimitSource};
pub use performance::{PerformanceSummary, REPORT_DECIMALS};
pub use rules::{RulePredicate, RuleViolationMask, WestgardRule, WestgardRules};
