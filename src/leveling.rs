use serde::{Deserialize, Serialize};

use crate::error::GamificationError;
use crate::models::WorkoutSummaryData;

/// XP tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationConfig {
    /// Flat XP for finishing any workout (default: 50)
    pub completion_bonus: u64,

    /// XP per minute of nominal duration (default: 1)
    pub xp_per_minute: u64,

    /// Volume units (weight × reps) per XP, rounded up (default: 1).
    /// Only a divisor of 1 makes XP strictly increasing in volume.
    pub volume_per_xp: u64,

    /// XP per exercise flagged as a new personal record (default: 25)
    pub pr_bonus: u64,

    /// XP to leave level 1; level n needs base × n (default: 100)
    pub base_level_threshold: u64,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        GamificationConfig {
            completion_bonus: 50,
            xp_per_minute: 1,
            volume_per_xp: 1,
            pr_bonus: 25,
            base_level_threshold: 100,
        }
    }
}

impl GamificationConfig {
    /// Reject settings that would stall level progression
    pub fn validate(&self) -> Result<(), GamificationError> {
        if self.volume_per_xp == 0 {
            return Err(GamificationError::InvalidConfig {
                setting: "volume_per_xp".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.base_level_threshold == 0 {
            return Err(GamificationError::InvalidConfig {
                setting: "base_level_threshold".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Level state after applying earned XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOutcome {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub levels_gained: u32,
}

/// XP and level progression rules
#[derive(Debug, Clone)]
pub struct LevelCalculator {
    config: GamificationConfig,
}

impl LevelCalculator {
    pub fn new() -> Self {
        LevelCalculator {
            config: GamificationConfig::default(),
        }
    }

    pub fn with_config(config: GamificationConfig) -> Result<Self, GamificationError> {
        config.validate()?;
        Ok(LevelCalculator { config })
    }

    pub fn config(&self) -> &GamificationConfig {
        &self.config
    }

    /// XP earned for a workout summary.
    ///
    /// Completion bonus + minutes + volume (rounded up per `volume_per_xp`)
    /// + a bonus per new personal record.
    pub fn earned_xp(&self, summary: &WorkoutSummaryData) -> u64 {
        let duration_xp = u64::from(summary.duration).saturating_mul(self.config.xp_per_minute);
        let volume_xp = summary.total_volume.div_ceil(self.config.volume_per_xp);
        let pr_xp = (summary.new_pr_count() as u64).saturating_mul(self.config.pr_bonus);

        self.config
            .completion_bonus
            .saturating_add(duration_xp)
            .saturating_add(volume_xp)
            .saturating_add(pr_xp)
    }

    /// XP needed to leave `level`; strictly increasing in `level`
    pub fn threshold_for_level(&self, level: u32) -> u64 {
        self.config
            .base_level_threshold
            .saturating_mul(u64::from(level.max(1)))
    }

    /// Add earned XP and roll over as many levels as it covers.
    ///
    /// The stored `xp_to_next_level` is honored for the current level; later
    /// thresholds come from `threshold_for_level`.
    pub fn apply_xp(
        &self,
        level: u32,
        xp: u64,
        xp_to_next_level: u64,
        earned: u64,
    ) -> Result<LevelOutcome, GamificationError> {
        if level == 0 {
            return Err(GamificationError::invalid_state("profile level must be at least 1"));
        }
        if xp_to_next_level == 0 {
            return Err(GamificationError::invalid_state(
                "xp_to_next_level must be greater than zero",
            ));
        }

        let mut outcome = LevelOutcome {
            level,
            xp: xp.saturating_add(earned),
            xp_to_next_level,
            levels_gained: 0,
        };

        while outcome.xp >= outcome.xp_to_next_level {
            outcome.xp -= outcome.xp_to_next_level;
            outcome.level = outcome.level.saturating_add(1);
            outcome.levels_gained += 1;
            outcome.xp_to_next_level = self.threshold_for_level(outcome.level);
        }

        Ok(outcome)
    }
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self::new()
    }
}
