use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{DEFAULT_EMA_ALPHA, DEFAULT_WINDOW_SIZE};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregatorConfigError {
    #[error("window_size must be greater than zero")]
    ZeroWindow,
    #[error("alpha must be within (0, 1], got {0}")]
    AlphaOutOfRange(f64),
}

/// How per-frame observations become a stabilized slot decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecisionRule {
    /// Occupied iff occupied in a strict majority of the frames held in
    /// the sliding window (or of all frames seen, while the window fills).
    Majority,
    /// `s_t = alpha * observed + (1 - alpha) * s_{t-1}`, starting at 0;
    /// occupied iff `s_t >= 0.5`.
    Ema { alpha: f64 },
}

impl DecisionRule {
    pub fn ema(alpha: f64) -> Result<Self, AggregatorConfigError> {
        if alpha.is_nan() || alpha <= 0.0 || alpha > 1.0 {
            return Err(AggregatorConfigError::AlphaOutOfRange(alpha));
        }
        Ok(Self::Ema { alpha })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Majority,
    Ema,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Majority => write!(f, "majority"),
            RuleKind::Ema => write!(f, "ema"),
        }
    }
}

impl std::str::FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "majority" => Ok(RuleKind::Majority),
            "ema" => Ok(RuleKind::Ema),
            other => Err(format!("rule must be 'majority' or 'ema', got '{other}'")),
        }
    }
}

/// Serialized aggregator options: `{rule, window_size, alpha}`.
///
/// `alpha` is only consulted by the `ema` rule but must lie in (0, 1]
/// whichever rule is selected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    #[serde(default)]
    pub rule: RuleKind,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_alpha() -> f64 {
    DEFAULT_EMA_ALPHA
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            rule: RuleKind::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            alpha: DEFAULT_EMA_ALPHA,
        }
    }
}

impl AggregatorConfig {
    pub fn decision_rule(&self) -> Result<DecisionRule, AggregatorConfigError> {
        if self.window_size == 0 {
            return Err(AggregatorConfigError::ZeroWindow);
        }
        let ema = DecisionRule::ema(self.alpha)?;
        match self.rule {
            RuleKind::Majority => Ok(DecisionRule::Majority),
            RuleKind::Ema => Ok(ema),
        }
    }
}
