use hitl_contract::InterruptConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Approval tier assigned from a risk attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTier {
    /// Executes without pausing.
    Auto,
    /// Pauses for a reviewer.
    Review,
    /// Pauses for a supervisor.
    Supervisor,
}

impl EscalationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Review => "review",
            Self::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for EscalationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier plus the capabilities its reviewer may exercise (`None` for auto).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: EscalationTier,
    pub capabilities: Option<InterruptConfig>,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid escalation thresholds: {0}")]
    InvalidThresholds(String),

    #[error("failed to read escalation config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse escalation config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Amount-based escalation policy.
///
/// `amount <= auto_max` is auto, `amount <= review_max` is review, anything
/// above is supervisor. Upper edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscalationPolicy {
    pub auto_max: f64,
    pub review_max: f64,
    pub review: InterruptConfig,
    pub supervisor: InterruptConfig,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            auto_max: 100.0,
            review_max: 500.0,
            review: InterruptConfig::reviewer(),
            supervisor: InterruptConfig::reviewer(),
        }
    }
}

impl EscalationPolicy {
    /// Policy with custom thresholds and default capabilities.
    pub fn with_thresholds(auto_max: f64, review_max: f64) -> Result<Self, PolicyError> {
        let policy = Self {
            auto_max,
            review_max,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.auto_max.is_finite() || !self.review_max.is_finite() {
            return Err(PolicyError::InvalidThresholds(
                "thresholds must be finite".to_string(),
            ));
        }
        if self.auto_max < 0.0 {
            return Err(PolicyError::InvalidThresholds(format!(
                "auto_max {} is negative",
                self.auto_max
            )));
        }
        if self.auto_max > self.review_max {
            return Err(PolicyError::InvalidThresholds(format!(
                "auto_max {} exceeds review_max {}",
                self.auto_max, self.review_max
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON policy. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(raw)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn tier(&self, amount: f64) -> EscalationTier {
        if amount <= self.auto_max {
            EscalationTier::Auto
        } else if amount <= self.review_max {
            EscalationTier::Review
        } else {
            EscalationTier::Supervisor
        }
    }

    pub fn capabilities(&self, tier: EscalationTier) -> Option<InterruptConfig> {
        match tier {
            EscalationTier::Auto => None,
            EscalationTier::Review => Some(self.review),
            EscalationTier::Supervisor => Some(self.supervisor),
        }
    }

    pub fn classify(&self, amount: f64) -> Classification {
        let tier = self.tier(amount);
        Classification {
            tier,
            capabilities: self.capabilities(tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_boundaries_are_inclusive_upper_edges() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.tier(0.0), EscalationTier::Auto);
        assert_eq!(policy.tier(100.0), EscalationTier::Auto);
        assert_eq!(policy.tier(100.01), EscalationTier::Review);
        assert_eq!(policy.tier(101.0), EscalationTier::Review);
        assert_eq!(policy.tier(500.0), EscalationTier::Review);
        assert_eq!(policy.tier(501.0), EscalationTier::Supervisor);
    }

    #[test]
    fn auto_tier_has_no_capabilities() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.classify(50.0).capabilities, None);

        let review = policy.classify(300.0).capabilities.unwrap();
        assert!(review.allow_accept && review.allow_edit && review.allow_respond);
        assert!(!review.allow_ignore);
        assert_eq!(
            policy.classify(900.0).capabilities,
            Some(InterruptConfig::reviewer())
        );
    }

    #[test]
    fn custom_threshold_edges() {
        let policy = EscalationPolicy::with_thresholds(10.0, 20.0).unwrap();
        assert_eq!(policy.tier(10.0), EscalationTier::Auto);
        assert_eq!(policy.tier(11.0), EscalationTier::Review);
        assert_eq!(policy.tier(20.0), EscalationTier::Review);
        assert_eq!(policy.tier(21.0), EscalationTier::Supervisor);

        let flat = EscalationPolicy::with_thresholds(0.0, 0.0).unwrap();
        assert_eq!(flat.tier(0.0), EscalationTier::Auto);
        assert_eq!(flat.tier(0.5), EscalationTier::Supervisor);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        assert!(matches!(
            EscalationPolicy::with_thresholds(600.0, 500.0),
            Err(PolicyError::InvalidThresholds(_))
        ));
        assert!(matches!(
            EscalationPolicy::with_thresholds(-1.0, 500.0),
            Err(PolicyError::InvalidThresholds(_))
        ));
        assert!(EscalationPolicy::with_thresholds(f64::NAN, 500.0).is_err());
    }

    #[test]
    fn json_config_overrides_capabilities() {
        let policy = EscalationPolicy::from_json_str(
            r#"{
                "auto_max": 50,
                "supervisor": {
                    "allow_ignore": false,
                    "allow_respond": true,
                    "allow_edit": false,
                    "allow_accept": true
                }
            }"#,
        )
        .unwrap();
        assert_eq!(policy.auto_max, 50.0);
        assert_eq!(policy.review_max, 500.0);
        assert!(!policy.supervisor.allow_edit);
        assert!(policy.review.allow_edit);

        assert!(matches!(
            EscalationPolicy::from_json_str(r#"{"auto_max": 900}"#),
            Err(PolicyError::InvalidThresholds(_))
        ));
        assert!(matches!(
            EscalationPolicy::from_json_str(r#"{"bogus": 1}"#),
            Err(PolicyError::Parse(_))
        ));
    }
}
