use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use focototal::achievements::AchievementStatus;
use focototal::config::AppConfig;
use focototal::database::Database;
use focototal::export::{self, ExportFormat, ExportType, ProgressReport};
use focototal::gamification::GamificationEngine;
use focototal::logging::{self, LogLevel};
use focototal::models::{HistoricalWorkout, UserProfile, WorkoutPlan};
use focototal::planner::{self, AiGeneratedWeeklyPlan, CustomWorkoutPlan, DayOfWeek};
use focototal::progress::ProgressAggregator;
use focototal::service::{WorkoutRecord, WorkoutService};
use focototal::stats::StreakTier;
use focototal::FocoError;

/// FocoTotal - workout progress and gamification CLI
///
/// Records completed workouts, awards XP and achievements, tracks personal
/// records and shows strength trends per exercise.
#[derive(Parser)]
#[command(name = "focototal")]
#[command(version)]
#[command(about = "Workout progress and gamification CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// User to act on (defaults to settings.default_user)
    #[arg(short, long)]
    user: Option<String>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a profile
    Init {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Contact e-mail
        #[arg(short, long)]
        email: String,

        /// User id (random when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Record a completed workout from a JSON file
    Complete {
        /// Completed workout or workout plan (JSON)
        file: PathBuf,

        /// Completion time for plans, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show strength progress per exercise
    Progress {
        /// Only this exercise (exact name)
        #[arg(short, long)]
        exercise: Option<String>,
    },

    /// Show personal records
    Records,

    /// Show achievements
    Achievements {
        /// Include locked achievements
        #[arg(short, long)]
        all: bool,
    },

    /// Show profile, level and stats
    Profile,

    /// Show recent workouts
    History {
        /// Number of recent workouts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Export progress data and reports
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// What to export (progress, history, records, report)
        #[arg(short = 't', long = "type", default_value = "progress")]
        export_type: String,

        /// Export format (csv, json)
        #[arg(short = 'f', long, default_value = "csv")]
        format: String,
    },

    /// Merge a generated weekly plan into a plans file
    Plan {
        /// Generated weekly plan (JSON)
        generated: PathBuf,

        /// Existing custom plans (JSON), updated in place
        #[arg(short, long)]
        plans: PathBuf,
    },

    /// Show or initialize configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<FocoError>() {
            Some(foco) => {
                logging::report_error(foco);
                eprintln!("{} {}", "Error:".red().bold(), foco.user_message());
                if logging::suggests_retry(foco) {
                    eprintln!("{}", "This may be temporary, try again.".dimmed());
                }
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = if config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    let mut log_config = config.logging.clone();
    log_config.level = match cli.verbose {
        0 => log_config.level,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    logging::init_logging(&log_config)?;

    if let Commands::Config { init } = cli.command {
        return show_config(&mut config, &config_path, init);
    }
    if let Commands::Plan { generated, plans } = &cli.command {
        return merge_plan(generated, plans);
    }

    let db_path = config.settings.database_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    let db = Database::new(&db_path).map_err(FocoError::from)?;
    let engine = GamificationEngine::with_config(config.gamification.clone()).map_err(FocoError::from)?;
    let mut service =
        WorkoutService::with_calculators(db, engine, config.settings.stats_calculator()?);

    if let Commands::Init { name, email, id } = &cli.command {
        let id = id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let profile = UserProfile::new(id.clone(), name.clone(), email.clone());
        service.create_profile(&profile)?;
        println!("{} {} ({})", "✓ Profile created:".green().bold(), name, id);

        if config.settings.default_user.is_none() {
            config.settings.default_user = Some(id);
            config.save_to_file(&config_path)?;
            println!("  Set as default user in {}", config_path.display());
        }
        return Ok(());
    }

    let user_id = match cli.user.or_else(|| config.settings.default_user.clone()) {
        Some(user_id) => user_id,
        None => bail!("No user given; pass --user or run `focototal init` first"),
    };

    match cli.command {
        Commands::Complete { file, at } => {
            let workout = read_workout(&file, at.as_deref())?;
            let record = service.record_workout(&user_id, workout)?;
            print_record(&record);
        }

        Commands::Progress { exercise } => {
            let history = service.history(&user_id)?;
            let progress: Vec<_> = match exercise {
                Some(name) => ProgressAggregator::progress_for(&history, &name)
                    .into_iter()
                    .collect(),
                None => ProgressAggregator::compute_progress(&history),
            };

            if progress.is_empty() {
                println!("{}", "No weighted sets logged yet.".yellow());
                return Ok(());
            }

            let rows: Vec<ProgressRow> = progress
                .iter()
                .map(|p| ProgressRow {
                    exercise: p.name.clone(),
                    sessions: p.workout_count,
                    initial: p.initial_weight.to_string(),
                    current: p.current_weight.to_string(),
                    evolution: if p.evolution > Decimal::ZERO {
                        format!("+{}", p.evolution)
                    } else {
                        p.evolution.to_string()
                    },
                    trend: format!("{:?}", p.trend()),
                })
                .collect();
            print_table(rows);
        }

        Commands::Records => {
            let records = service.personal_records(&user_id)?;
            if records.is_empty() {
                println!("{}", "No personal records yet.".yellow());
                return Ok(());
            }

            let rows: Vec<RecordRow> = records
                .iter()
                .map(|(exercise, weight)| RecordRow {
                    exercise: exercise.to_string(),
                    best: weight.to_string(),
                })
                .collect();
            print_table(rows);
            println!("{} personal records", records.len());
        }

        Commands::Achievements { all } => {
            let statuses = service.achievement_statuses(&user_id)?;
            let unlocked = statuses.iter().filter(|s| s.unlocked).count();

            let rows: Vec<AchievementRow> = statuses
                .iter()
                .filter(|s| all || s.unlocked)
                .map(AchievementRow::from)
                .collect();
            if !rows.is_empty() {
                print_table(rows);
            }
            println!("{}/{} unlocked", unlocked, statuses.len());
        }

        Commands::Profile => {
            let profile = service.profile(&user_id)?;
            let stats = profile.stats;
            println!("{} ({})", profile.name.bold(), profile.email);
            println!(
                "  Level {}  {}/{} XP ({}%)",
                profile.level.to_string().cyan().bold(),
                profile.xp,
                profile.xp_to_next_level,
                profile.level_progress_percent()
            );
            println!("  Workouts:   {}", stats.total_workouts);
            println!("  Volume:     {} kg", stats.total_volume);
            println!("  Time:       {} min", stats.time_spent);
            println!(
                "  Streak:     {} day(s) {}",
                stats.current_streak,
                streak_badge(StreakTier::from_streak(stats.current_streak))
            );
            println!("  Records:    {}", service.personal_record_count(&user_id)?);
        }

        Commands::History { limit } => {
            let history = service.history(&user_id)?;
            let rows: Vec<HistoryRow> = history
                .iter()
                .take(limit)
                .map(|w| HistoryRow {
                    date: w.completed_at.format("%Y-%m-%d %H:%M").to_string(),
                    title: w.title.clone(),
                    focus: w.focus.clone(),
                    minutes: w.duration,
                    exercises: w.exercises.len(),
                })
                .collect();
            if rows.is_empty() {
                println!("{}", "No workouts recorded yet.".yellow());
            } else {
                print_table(rows);
            }
        }

        Commands::Export {
            output,
            export_type,
            format,
        } => {
            let export_type: ExportType = export_type.parse().map_err(FocoError::from)?;
            let format: ExportFormat = format.parse().map_err(FocoError::from)?;

            let profile = service.profile(&user_id)?;
            let history = service.history(&user_id)?;
            let report = ProgressReport {
                level_progress_percent: profile.level_progress_percent(),
                profile,
                personal_records: service.personal_records(&user_id)?,
                progress: ProgressAggregator::compute_progress(&history),
                achievements: service.achievement_statuses(&user_id)?,
                history,
            };

            export::export_report(&report, export_type, format, &output).map_err(FocoError::from)?;
            println!("{} {}", "✓ Exported to".green(), output.display());
        }

        Commands::Init { .. } | Commands::Plan { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

/// Accept either a completed workout or a plan to stamp with `at`
fn read_workout(path: &Path, at: Option<&str>) -> Result<HistoricalWorkout> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read workout file: {}", path.display()))?;

    if let Ok(workout) = serde_json::from_str::<HistoricalWorkout>(&content) {
        return Ok(workout);
    }

    let plan: WorkoutPlan = serde_json::from_str(&content)
        .with_context(|| format!("Not a workout or workout plan: {}", path.display()))?;
    let completed_at = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid completion time: {}", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(HistoricalWorkout::from_plan(plan, completed_at))
}

fn print_record(record: &WorkoutRecord) {
    let result = &record.gamification;
    let profile = &result.updated_profile;

    println!("{} {}", "✓ Workout recorded:".green().bold(), record.summary.title);
    println!(
        "  {} min, {} kg total volume",
        record.summary.duration, record.summary.total_volume
    );

    for exercise in &record.summary.exercises {
        let last = exercise
            .last
            .map(|l| format!("last {}", l.max_weight))
            .unwrap_or_else(|| "first time".to_string());
        let badge = if exercise.is_new_pr {
            " NEW PR".yellow().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}: {} ({}){}",
            exercise.name, exercise.current.max_weight, last, badge
        );
    }

    println!("  {} XP", format!("+{}", result.earned_xp).cyan().bold());
    if result.level_up {
        println!("  {} Level {}", "LEVEL UP!".magenta().bold(), profile.level);
    }
    println!(
        "  Level {}: {}/{} XP, streak {}",
        profile.level, profile.xp, profile.xp_to_next_level, profile.stats.current_streak
    );
    for achievement in &result.unlocked_achievements {
        println!(
            "  {} {}: {}",
            "Achievement unlocked:".yellow().bold(),
            achievement.name,
            achievement.description
        );
    }
}

fn merge_plan(generated_path: &Path, plans_path: &Path) -> Result<()> {
    let generated: AiGeneratedWeeklyPlan = serde_json::from_str(
        &fs::read_to_string(generated_path)
            .with_context(|| format!("Failed to read plan file: {}", generated_path.display()))?,
    )
    .with_context(|| "Failed to parse generated weekly plan")?;

    let current: Vec<CustomWorkoutPlan> = if plans_path.exists() {
        serde_json::from_str(&fs::read_to_string(plans_path)?)
            .with_context(|| format!("Failed to parse plans file: {}", plans_path.display()))?
    } else {
        Vec::new()
    };

    let update = planner::merge_generated_plan(&current, generated);
    fs::write(plans_path, serde_json::to_string_pretty(&update)?)
        .with_context(|| format!("Failed to write plans file: {}", plans_path.display()))?;

    for day in DayOfWeek::ALL {
        let plan = update
            .schedule
            .plan_for(day, &update.plans)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "rest".dimmed().to_string());
        println!("  {:<10} {}", day.to_string(), plan);
    }
    println!("{} {}", "✓ Plans saved to".green(), plans_path.display());
    Ok(())
}

fn show_config(config: &mut AppConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            config.save_to_file(path)?;
            println!("{} {}", "✓ Config written to".green(), path.display());
        }
    }

    println!("{}", toml::to_string_pretty(&*config)?);

    let db_path = config.settings.database_path();
    if db_path.exists() {
        let stats = Database::new(&db_path).map_err(FocoError::from)?.get_stats().map_err(FocoError::from)?;
        println!(
            "# {}: {} profiles, {} workouts, {} records",
            db_path.display(),
            stats.profile_count,
            stats.workout_count,
            stats.record_count
        );
    }
    Ok(())
}

fn streak_badge(tier: StreakTier) -> ColoredString {
    match tier {
        StreakTier::Cold => "".normal(),
        StreakTier::Warm => "warm".yellow(),
        StreakTier::Hot => "hot".red(),
        StreakTier::Blazing => "blazing".red().bold(),
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

#[derive(Tabled)]
struct ProgressRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Initial")]
    initial: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Evolution")]
    evolution: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Best")]
    best: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Workout")]
    title: String,
    #[tabled(rename = "Focus")]
    focus: String,
    #[tabled(rename = "Minutes")]
    minutes: u32,
    #[tabled(rename = "Exercises")]
    exercises: usize,
}

#[derive(Tabled)]
struct AchievementRow {
    #[tabled(rename = "")]
    status: String,
    #[tabled(rename = "Achievement")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&AchievementStatus> for AchievementRow {
    fn from(status: &AchievementStatus) -> Self {
        AchievementRow {
            status: if status.unlocked { "✓" } else { " " }.to_string(),
            name: status.achievement.name.to_string(),
            description: status.achievement.description.to_string(),
        }
    }
}
