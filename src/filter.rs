//! Post-fetch filtering of recommendation batches.

use crate::types::RecommendationItem;
use serde::{Deserialize, Serialize};

/// User-configured thresholds. A rule only applies when its flag is set
/// and its threshold is non-zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub min_play_count_enabled: bool,
    pub min_play_count: u64,
    pub min_duration_enabled: bool,
    pub min_duration_secs: u64,
}

impl FilterConfig {
    pub fn any_enabled(&self) -> bool {
        self.min_play_count_enabled || self.min_duration_enabled
    }

    /// Whether a single item passes every enabled rule.
    ///
    /// Unknown play counts and zero or unknown durations never fail a rule.
    pub fn keeps(&self, item: &RecommendationItem) -> bool {
        if let Some(play) = item.play_count {
            if self.min_play_count_enabled
                && self.min_play_count > 0
                && play < self.min_play_count
            {
                return false;
            }
        }

        if let Some(duration) = item.duration_secs.filter(|d| *d > 0) {
            if self.min_duration_enabled
                && self.min_duration_secs > 0
                && duration < self.min_duration_secs
            {
                return false;
            }
        }

        true
    }
}

/// Drop items that fail the configured rules, preserving order.
///
/// With no rule enabled the input is handed back untouched.
pub fn apply(items: Vec<RecommendationItem>, config: &FilterConfig) -> Vec<RecommendationItem> {
    if !config.any_enabled() {
        return items;
    }

    items.into_iter().filter(|item| config.keeps(item)).collect()
}
