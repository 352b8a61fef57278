//! End-to-end evaluation of a control run.
//!
//! [`QcAnalysis`] wires the engines together in the order data flows
//! through them:
//!
//! ```text
//! observations -> Series -> LimitSet -> { Westgard masks, EWMA, CUSUM, summary }
//! ```
//!
//! Sigma-metric calculators take scalar inputs and are called directly from
//! [`capability`](crate::capability).

use serde::Serialize;
use tracing::{debug, info};

use crate::config::QcConfig;
use crate::detection::{Cusum, CusumResult, Ewma, EwmaResult};
use crate::error::{QcError, Result};
use crate::series::{Observation, Series};
use crate::spc::{LimitSet, PerformanceSummary, RuleViolationMask, WestgardRules};

/// Everything computed for one control run.
///
/// The CUSUM chart is kept as its own result because it needs a positive SD
/// while the other charts tolerate `sd = 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcReport {
    pub series: Series,
    pub limits: LimitSet,
    pub violations: RuleViolationMask,
    pub ewma: EwmaResult,
    pub cusum: std::result::Result<CusumResult, QcError>,
    pub performance: PerformanceSummary,
}

impl QcReport {
    /// `true` when no Westgard rule, EWMA limit, or CUSUM interval was hit.
    pub fn is_in_control(&self) -> bool {
        let cusum_quiet = match &self.cusum {
            Ok(c) => c.signal_points().is_empty(),
            Err(_) => true,
        };
        self.violations.is_in_control() && self.ewma.signal_points().is_empty() && cusum_quiet
    }
}

/// A validated configuration ready to evaluate control runs.
///
/// # Examples
///
/// ```
/// use u_iqc::analysis::QcAnalysis;
/// use u_iqc::config::QcConfig;
/// use u_iqc::series::Observation;
///
/// let analysis = QcAnalysis::new(QcConfig::default()).unwrap();
/// let observations: Vec<Observation> = [5.1, 4.9, 5.0, 5.2, 4.8]
///     .iter()
///     .map(|&v| Observation::new(v))
///     .collect();
/// let report = analysis.run(&observations).unwrap();
/// assert_eq!(report.series.len(), 5);
/// assert!((report.limits.mean - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct QcAnalysis {
    config: QcConfig,
    rules: WestgardRules,
}

impl QcAnalysis {
    /// Validates `config`.
    ///
    /// # Errors
    ///
    /// Whatever [`QcConfig::validate`] rejects.
    pub fn new(config: QcConfig) -> Result<Self> {
        config.validate()?;
        let rules = config.westgard_rules();
        Ok(Self { config, rules })
    }

    /// The configuration in use.
    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// Prepares `observations` and evaluates them.
    ///
    /// # Errors
    ///
    /// See [`run_series`](Self::run_series).
    pub fn run(&self, observations: &[Observation]) -> Result<QcReport> {
        self.run_series(Series::prepare(observations))
    }

    /// Evaluates an already prepared series.
    ///
    /// # Errors
    ///
    /// - [`QcError::MissingData`] if the series is empty.
    /// - Any error from limit computation or the EWMA chart.
    ///
    /// A CUSUM failure (zero SD) is recorded in [`QcReport::cusum`] instead.
    pub fn run_series(&self, series: Series) -> Result<QcReport> {
        if series.is_empty() {
            return Err(QcError::MissingData {
                what: "quality control evaluation",
            });
        }

        let limits = LimitSet::compute(&series, self.config.limits)?;
        let violations = self.rules.evaluate(&series, &limits)?;
        let ewma_chart = Ewma::new(limits.mean, limits.sd, self.config.lambda)?;
        let ewma = ewma_chart.analyze(series.values())?;
        let cusum = Cusum::with_params(
            limits.mean,
            limits.sd,
            self.config.cusum_k,
            self.config.cusum_h,
        )
        .and_then(|c| c.analyze(series.values()));
        if let Err(err) = &cusum {
            debug!(%err, "CUSUM chart unavailable");
        }
        let performance = PerformanceSummary::from_limits(&limits);

        let report = QcReport {
            series,
            limits,
            violations,
            ewma,
            cusum,
            performance,
        };
        info!(
            n = report.series.len(),
            in_control = report.is_in_control(),
            "evaluated control run"
        );
        Ok(report)
    }
}
