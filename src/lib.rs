// Library interface for FocoTotal modules
// This allows integration tests and benches to access the core functionality

pub mod achievements;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod gamification;
pub mod leveling;
pub mod logging;
pub mod models;
pub mod planner;
pub mod progress;
pub mod records;
pub mod service;
pub mod stats;
pub mod storage;
pub mod summary;

// Re-export commonly used types for convenience
pub use models::*;
pub use achievements::{Achievement, AchievementContext, AchievementStatus, ACHIEVEMENTS};
pub use error::{FocoError, GamificationError, Result, StorageError};
pub use gamification::{GamificationEngine, GamificationResult};
pub use leveling::{GamificationConfig, LevelCalculator};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progress::ProgressAggregator;
pub use records::RecordTracker;
pub use service::{WorkoutRecord, WorkoutService};
pub use stats::StatsCalculator;
pub use storage::{CompletionStore, HistoryStore, InMemoryStore, PersonalRecordsStore, ProfileStore};
pub use summary::SummaryCalculator;
