use serde::{Deserialize, Serialize};

/// Thresholds applied to compatibility scores. Scores must exceed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub visibility_threshold: u8,
    pub notification_threshold: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 50,
            notification_threshold: 50,
        }
    }
}
