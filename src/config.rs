//! Configuration of one quality control evaluation.
//!
//! A presentation layer collects the rule toggles, the limit source, and the
//! EWMA/CUSUM parameters and hands them over as a [`QcConfig`], usually as
//! JSON. Every field has a default, so `{}` is a valid configuration.
//!
//! ```
//! use u_iqc::config::QcConfig;
//! use u_iqc::spc::{LimitMode, WestgardRule};
//!
//! let config = QcConfig::from_json(r#"{
//!     "rules": ["1-3s", "2-2s", "R-4s"],
//!     "limits": { "mode": "custom", "mean": 5.2, "sd": 0.1 },
//!     "lambda": 0.1
//! }"#).unwrap();
//! assert_eq!(config.rules.len(), 3);
//! assert_eq!(config.limits, LimitMode::Custom { mean: 5.2, sd: 0.1 });
//! assert_eq!(config.cusum_h, 5.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::{Ewma, DEFAULT_H, DEFAULT_K};
use crate::error::{QcError, Result};
use crate::spc::{LimitMode, LimitSet, LimitSource, WestgardRule, WestgardRules};

/// Default EWMA smoothing constant.
pub const DEFAULT_LAMBDA: f64 = 0.2;

/// Rule toggles, limit source, and chart parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QcConfig {
    /// Enabled Westgard rules.
    pub rules: Vec<WestgardRule>,
    /// Source of the mean and SD.
    pub limits: LimitMode,
    /// EWMA smoothing constant; must be a tabulated value.
    pub lambda: f64,
    /// CUSUM reference value.
    pub cusum_k: f64,
    /// CUSUM decision interval.
    pub cusum_h: f64,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            rules: WestgardRule::ALL.to_vec(),
            limits: LimitMode::Sample,
            lambda: DEFAULT_LAMBDA,
            cusum_k: DEFAULT_K,
            cusum_h: DEFAULT_H,
        }
    }
}

impl QcConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// - [`QcError::Config`] for malformed JSON, unknown fields, or unknown
    ///   rule names.
    /// - [`QcError::InvalidParameter`] for values [`validate`](Self::validate)
    ///   rejects.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| QcError::Config(e.to_string()))?;
        config.validate()?;
        debug!(?config, "loaded QC configuration");
        Ok(config)
    }

    /// Serializes the configuration as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| QcError::Config(e.to_string()))
    }

    /// Checks every parameter against the domain of the engine using it.
    ///
    /// # Errors
    ///
    /// [`QcError::InvalidParameter`] for an unsupported lambda, a negative
    /// `cusum_k`, a non-positive `cusum_h`, or invalid custom limits.
    pub fn validate(&self) -> Result<()> {
        Ewma::limit_multiplier(self.lambda)?;
        if !self.cusum_k.is_finite() || self.cusum_k < 0.0 {
            return Err(QcError::invalid("k", "must be finite and non-negative"));
        }
        if !self.cusum_h.is_finite() || self.cusum_h <= 0.0 {
            return Err(QcError::invalid("h", "must be finite and positive"));
        }
        if let LimitMode::Custom { mean, sd } = self.limits {
            LimitSet::from_mean_sd(mean, sd, LimitSource::Custom)?;
        }
        Ok(())
    }

    /// The enabled rules as an evaluator.
    pub fn westgard_rules(&self) -> WestgardRules {
        WestgardRules::new(self.rules.iter().copied())
    }
}
