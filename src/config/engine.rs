use serde::{Deserialize, Serialize};

/// Full engine configuration, passed in explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub models: ModelToggles,
    pub statistical: StatisticalParams,
    pub pattern: PatternParams,
    pub rules: RuleParams,
    pub learner: LearnerParams,
    pub ensemble: EnsembleSettings,
    pub general: GeneralSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models: ModelToggles::default(),
            statistical: StatisticalParams::default(),
            pattern: PatternParams::default(),
            rules: RuleParams::default(),
            learner: LearnerParams::default(),
            ensemble: EnsembleSettings::default(),
            general: GeneralSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.statistical.lookback_period == 0 {
            errors.push("statistical: lookback_period must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.statistical.ema_alpha) {
            errors.push("statistical: ema_alpha must be between 0 and 1".to_string());
        }

        if self.pattern.min_pattern_length == 0 {
            errors.push("pattern: min_pattern_length must be > 0".to_string());
        }
        if self.pattern.min_pattern_length > self.pattern.max_pattern_length {
            errors.push("pattern: min_pattern_length must be <= max_pattern_length".to_string());
        }
        if !(0.0..=1.0).contains(&self.pattern.similarity_threshold) {
            errors.push("pattern: similarity_threshold must be between 0 and 1".to_string());
        }

        if self.rules.streak_threshold == 0 {
            errors.push("rules: streak_threshold must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.rules.reversal_confidence) {
            errors.push("rules: reversal_confidence must be between 0 and 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.learner.learning_rate) {
            errors.push("learner: learning_rate must be between 0 and 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.learner.discount_factor) {
            errors.push("learner: discount_factor must be between 0 and 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.learner.exploration_rate) {
            errors.push("learner: exploration_rate must be between 0 and 1".to_string());
        }

        if !(0.0..=100.0).contains(&self.ensemble.min_confidence) {
            errors.push("ensemble: min_confidence must be between 0 and 100 (%)".to_string());
        }

        if self.general.max_history < 25 {
            errors.push("general: max_history must be >= 25".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Minimum-confidence threshold as a fraction for score comparison.
    pub fn min_confidence_fraction(&self) -> f64 {
        self.ensemble.min_confidence / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelToggles {
    pub statistical: bool,
    pub pattern: bool,
    pub rule: bool,
    pub learner: bool,
}

impl Default for ModelToggles {
    fn default() -> Self {
        Self {
            statistical: true,
            pattern: true,
            rule: true,
            learner: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalParams {
    pub lookback_period: usize,
    pub ema_alpha: f64,
}

impl Default for StatisticalParams {
    fn default() -> Self {
        Self {
            lookback_period: 50,
            ema_alpha: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternParams {
    pub min_pattern_length: usize,
    pub max_pattern_length: usize,
    pub similarity_threshold: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            min_pattern_length: 5,
            max_pattern_length: 10,
            similarity_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleParams {
    pub streak_threshold: usize,
    pub reversal_confidence: f64,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            streak_threshold: 3,
            reversal_confidence: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerParams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
}

impl Default for LearnerParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            exploration_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleSettings {
    /// One of "equal", "performance", "confidence". Unknown values fall back
    /// to equal weighting.
    pub weight_method: String,
    /// Only "weighted" activates the Monte Carlo gate; any other value is
    /// accepted and runs the fusion without the gate.
    pub ensemble_method: String,
    /// Percentage; compared against the fused confidence as a fraction.
    pub min_confidence: f64,
    pub monte_carlo_iterations: usize,
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            weight_method: "performance".to_string(),
            ensemble_method: "weighted".to_string(),
            min_confidence: 60.0,
            monte_carlo_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Maximum retained tick history; bounds pattern-search latency.
    pub max_history: usize,
    /// Decimal places of the quote feed, for terminal-digit extraction.
    pub pip_digits: u32,
    /// Fixed RNG seed for reproducible exploration and simulation.
    pub seed: Option<u64>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            max_history: 500,
            pip_digits: 2,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let mut cfg = EngineConfig::default();
        cfg.pattern.min_pattern_length = 12;
        cfg.learner.exploration_rate = 1.5;
        cfg.ensemble.min_confidence = 120.0;
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_min_confidence_fraction() {
        let cfg = EngineConfig::default();
        assert!((cfg.min_confidence_fraction() - 0.6).abs() < 1e-12);
    }
}
