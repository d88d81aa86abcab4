mod config;
mod rules;

pub use config::MatchingConfig;

use serde::{Deserialize, Serialize};

use super::domain::{BuyerProfile, Listing};

/// Scored dimension of a buyer/listing match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    Region,
    Industry,
    Price,
    Revenue,
}

impl MatchFactor {
    pub const fn weight(self) -> u8 {
        match self {
            Self::Region | Self::Industry => 30,
            Self::Price | Self::Revenue => 20,
        }
    }
}

/// Discrete contribution to a match score so rankings stay explainable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchComponent {
    pub factor: MatchFactor,
    pub points: u8,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub total: u8,
    pub components: Vec<MatchComponent>,
}

impl MatchScore {
    pub fn exceeds(&self, threshold: u8) -> bool {
        self.total > threshold
    }
}

/// Deterministic, pure compatibility score in `0..=100`.
pub fn score(listing: &Listing, profile: &BuyerProfile) -> MatchScore {
    let components = rules::score_components(listing, &profile.preferences);
    let total = components
        .iter()
        .map(|component| u16::from(component.points))
        .sum::<u16>()
        .min(100) as u8;

    MatchScore { total, components }
}

/// Stateless matcher applying the configured thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: MatchingConfig,
}

impl Matcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MatchingConfig {
        self.config
    }

    pub fn score(&self, listing: &Listing, profile: &BuyerProfile) -> MatchScore {
        score(listing, profile)
    }

    /// Score surfaced in buyer-facing views; hidden at or below the visibility threshold.
    pub fn visible_score(&self, listing: &Listing, profile: &BuyerProfile) -> Option<u8> {
        let score = self.score(listing, profile);
        score
            .exceeds(self.config.visibility_threshold)
            .then_some(score.total)
    }

    pub fn should_notify(&self, listing: &Listing, profile: &BuyerProfile) -> bool {
        self.score(listing, profile)
            .exceeds(self.config.notification_threshold)
    }
}
