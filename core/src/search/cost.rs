//! Auxiliary cost functions
//!
//! Turn a path's pre-cost (its residual norm) into the cost that orders the
//! search stack, compensating for how many atoms the path still lacks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AstarError, AstarResult};

/// Path-length compensation applied to the pre-cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuxiliaryMode {
    /// `pre * alpha^(K - len)`
    #[default]
    #[serde(alias = "MUL")]
    Multiplicative,

    /// `pre - beta * (old - pre) * (K - len)`
    #[serde(alias = "ADAP")]
    AdaptiveAdditive,

    /// `pre * (alpha * pre / old)^(K - len)`
    #[serde(alias = "ADAPMUL")]
    AdaptiveMultiplicative,
}

impl AuxiliaryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuxiliaryMode::Multiplicative => "multiplicative",
            AuxiliaryMode::AdaptiveAdditive => "adaptive-additive",
            AuxiliaryMode::AdaptiveMultiplicative => "adaptive-multiplicative",
        }
    }

    fn uses_alpha(self) -> bool {
        !matches!(self, AuxiliaryMode::AdaptiveAdditive)
    }
}

impl fmt::Display for AuxiliaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuxiliaryMode {
    type Err = AstarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiplicative" | "MUL" => Ok(AuxiliaryMode::Multiplicative),
            "adaptive-additive" | "ADAP" => Ok(AuxiliaryMode::AdaptiveAdditive),
            "adaptive-multiplicative" | "ADAPMUL" => Ok(AuxiliaryMode::AdaptiveMultiplicative),
            other => Err(AstarError::InvalidAuxiliaryMode(other.to_string())),
        }
    }
}

/// Cost function parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    pub mode: AuxiliaryMode,

    /// Decay base for the multiplicative modes, in (0, 1)
    pub alpha: f64,

    /// Slope reward for the adaptive-additive mode
    pub beta: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            mode: AuxiliaryMode::Multiplicative,
            alpha: 0.8,
            beta: 0.5,
        }
    }
}

impl CostConfig {
    pub fn validate(&self) -> AstarResult<()> {
        if self.mode.uses_alpha() && !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AstarError::InvalidCostParameter(format!(
                "alpha must lie in (0, 1) for {} mode, got {}",
                self.mode, self.alpha
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(AstarError::InvalidCostParameter(format!(
                "beta must be finite and non-negative, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Validated cost function for a fixed sparsity
#[derive(Debug, Clone)]
pub struct CostModel {
    config: CostConfig,
    sparsity: usize,
    /// `alpha^r` for every remaining length `r` in `0..=K`
    alpha_powers: Vec<f64>,
}

impl CostModel {
    pub fn new(config: CostConfig, sparsity: usize) -> AstarResult<Self> {
        config.validate()?;
        let alpha_powers = std::iter::successors(Some(1.0), |p| Some(p * config.alpha))
            .take(sparsity + 1)
            .collect();
        Ok(Self {
            config,
            sparsity,
            alpha_powers,
        })
    }

    pub fn config(&self) -> &CostConfig {
        &self.config
    }

    pub fn mode(&self) -> AuxiliaryMode {
        self.config.mode
    }

    /// Cost of a path of `path_length` atoms whose pre-cost moved from
    /// `parent_pre_cost` to `pre_cost` with its last extension.
    pub fn cost(&self, pre_cost: f64, parent_pre_cost: f64, path_length: usize) -> f64 {
        let remaining = self.sparsity.saturating_sub(path_length);
        match self.config.mode {
            AuxiliaryMode::Multiplicative => pre_cost * self.alpha_powers[remaining],
            AuxiliaryMode::AdaptiveAdditive => {
                pre_cost - self.config.beta * (parent_pre_cost - pre_cost) * remaining as f64
            }
            AuxiliaryMode::AdaptiveMultiplicative => {
                let rate = if parent_pre_cost > 0.0 {
                    self.config.alpha * pre_cost / parent_pre_cost
                } else {
                    0.0
                };
                pre_cost * powi(rate, remaining)
            }
        }
    }
}

fn powi(base: f64, exp: usize) -> f64 {
    // K is small; the exponent always fits
    base.powi(i32::try_from(exp).unwrap_or(i32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(mode: AuxiliaryMode, sparsity: usize) -> CostModel {
        let config = CostConfig {
            mode,
            alpha: 0.5,
            beta: 0.25,
        };
        CostModel::new(config, sparsity).unwrap()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("MUL".parse::<AuxiliaryMode>().unwrap(), AuxiliaryMode::Multiplicative);
        assert_eq!("adaptive-additive".parse::<AuxiliaryMode>().unwrap(), AuxiliaryMode::AdaptiveAdditive);
        assert_eq!("ADAPMUL".parse::<AuxiliaryMode>().unwrap(), AuxiliaryMode::AdaptiveMultiplicative);
        assert!(matches!(
            "geometric".parse::<AuxiliaryMode>(),
            Err(AstarError::InvalidAuxiliaryMode(s)) if s == "geometric"
        ));
    }

    #[test]
    fn test_mode_display_roundtrips() {
        for mode in [
            AuxiliaryMode::Multiplicative,
            AuxiliaryMode::AdaptiveAdditive,
            AuxiliaryMode::AdaptiveMultiplicative,
        ] {
            assert_eq!(mode.to_string().parse::<AuxiliaryMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_multiplicative_cost() {
        let m = model(AuxiliaryMode::Multiplicative, 3);
        assert_eq!(m.cost(8.0, 100.0, 0), 1.0);
        assert_eq!(m.cost(8.0, 100.0, 1), 2.0);
        assert_eq!(m.cost(8.0, 100.0, 3), 8.0);
        // longer than K is treated as complete
        assert_eq!(m.cost(8.0, 100.0, 5), 8.0);
    }

    #[test]
    fn test_adaptive_additive_cost() {
        let m = model(AuxiliaryMode::AdaptiveAdditive, 4);
        // 6 - 0.25 * (10 - 6) * 2
        assert_eq!(m.cost(6.0, 10.0, 2), 4.0);
        assert_eq!(m.cost(6.0, 10.0, 4), 6.0);
    }

    #[test]
    fn test_adaptive_multiplicative_cost() {
        let m = model(AuxiliaryMode::AdaptiveMultiplicative, 3);
        // 4 * (0.5 * 4 / 8)^2
        assert_eq!(m.cost(4.0, 8.0, 1), 0.25);
        assert_eq!(m.cost(4.0, 0.0, 1), 0.0);
        assert_eq!(m.cost(4.0, 8.0, 3), 4.0);
    }

    #[test]
    fn test_alpha_out_of_range_rejected() {
        for alpha in [0.0, 1.0, -0.5, f64::NAN] {
            let config = CostConfig {
                alpha,
                ..CostConfig::default()
            };
            assert!(matches!(
                CostModel::new(config, 3),
                Err(AstarError::InvalidCostParameter(_))
            ));
        }
    }

    #[test]
    fn test_alpha_ignored_for_additive_mode() {
        let config = CostConfig {
            mode: AuxiliaryMode::AdaptiveAdditive,
            alpha: 2.0,
            beta: 1.0,
        };
        assert!(CostModel::new(config, 3).is_ok());
    }

    #[test]
    fn test_negative_beta_rejected() {
        let config = CostConfig {
            beta: -1.0,
            ..CostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_deserializes_legacy_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: AuxiliaryMode,
        }
        let w: Wrapper = serde_json::from_str(r#"{"mode": "ADAP"}"#).unwrap();
        assert_eq!(w.mode, AuxiliaryMode::AdaptiveAdditive);
        let w: Wrapper = serde_json::from_str(r#"{"mode": "adaptive-multiplicative"}"#).unwrap();
        assert_eq!(w.mode, AuxiliaryMode::AdaptiveMultiplicative);
    }
}
