use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};

use biosync::alerts::AlertSeverity;
use biosync::config::AppConfig;
use biosync::error::BioSyncError;
use biosync::export::{self, ExportFormat, SessionExport};
use biosync::logging::{init_logging, LogFormat, LogLevel};
use biosync::medical::{analyze_report, RandomReportAnalyzer, ReportDocument, DEFAULT_ANALYSIS_DELAY};
use biosync::models::{format_elapsed, ActivityLevel, ExerciseType, Gender, HeartRateZone};
use biosync::profile::{ProfileInputs, UserProfile};
use biosync::session::{Simulation, TickUpdate};
use biosync::zones::ZoneCalculator;
use biosync::SessionClock;

/// BioSync - Exercise Physiology Simulator
///
/// Simulates heart rate, hydration, glycogen, temperature and fatigue
/// during a workout and issues personalised recommendations and alerts.
#[derive(Parser)]
#[command(name = "biosync")]
#[command(author = "BioSync Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Exercise physiology simulator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct ProfileArgs {
    /// Athlete name used to personalise messages
    #[arg(long, default_value = "")]
    name: String,

    /// Age in years
    #[arg(long)]
    age: Option<u32>,

    /// Gender (male, female, other)
    #[arg(long)]
    gender: Option<Gender>,

    /// Body weight in kilograms
    #[arg(long)]
    weight: Option<f64>,

    /// Height in centimetres
    #[arg(long)]
    height: Option<f64>,

    /// Activity level (sedentary, light, moderate, active, athlete)
    #[arg(long)]
    activity: Option<ActivityLevel>,

    /// Medical condition, repeatable (e.g. Diabetes, Hypertension)
    #[arg(long = "condition")]
    conditions: Vec<String>,

    /// Fitness goal, repeatable
    #[arg(long = "goal")]
    goals: Vec<String>,
}

impl ProfileArgs {
    fn into_profile(self) -> UserProfile {
        UserProfile::new(ProfileInputs {
            name: self.name,
            age: self.age,
            gender: self.gender,
            weight_kg: self.weight,
            height_cm: self.height,
            activity_level: self.activity,
            fitness_goals: self.goals.into_iter().collect(),
            medical_conditions: self.conditions.into_iter().collect(),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout simulation
    Simulate {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Exercise type (running, cycling, swimming, strength, yoga, or any other name)
        #[arg(short, long, default_value = "running")]
        exercise: ExerciseType,

        /// Session length in simulated seconds
        #[arg(short, long, default_value = "600")]
        duration: u64,

        /// Drive ticks from the wall clock instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Medical report to analyse before the session starts
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Seed for the report analyzer
        #[arg(long)]
        seed: Option<u64>,

        /// Mark hydration, energy and cooling advice done as soon as it appears
        #[arg(long)]
        auto_complete: bool,

        /// Print every tick instead of only changes
        #[arg(long)]
        every_tick: bool,

        /// Write the session history to a .csv or .json file
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Show derived metrics and daily needs for a profile
    Profile {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Configure application settings
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(metric: &str, value: impl ToString) -> SummaryRow {
    SummaryRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error, preferring the friendly message of a BioSync error
fn report_error(err: &anyhow::Error) {
    match BioSyncError::find_in_chain(err) {
        Some(app_err) => {
            let level = app_err.severity().to_tracing_level();
            if level == tracing::Level::ERROR {
                tracing::error!(error = %err, "Command failed");
            } else if level == tracing::Level::WARN {
                tracing::warn!(error = %err, "Command failed");
            } else {
                tracing::info!(error = %err, "Command failed");
            }
            eprintln!("{} {}", "Error:".red().bold(), app_err.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match (&cli.command, cli.config.as_deref()) {
        // The file being initialised does not have to exist yet
        (Commands::Config { init: true, .. }, Some(path)) if !path.exists() => AppConfig::default(),
        (_, path) => AppConfig::load_or_default(path)?,
    };

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    if cli.verbose > 0 {
        eprintln!("{}", format!("Log level: {}", log_config.level.to_filter()).dimmed());
    }

    match cli.command {
        Commands::Simulate {
            profile,
            exercise,
            duration,
            realtime,
            report,
            seed,
            auto_complete,
            every_tick,
            export,
        } => {
            let options = SimulateOptions {
                exercise,
                duration,
                report,
                seed,
                auto_complete,
                every_tick,
                export,
            };
            let profile = profile.into_profile();
            if let Err(err) = profile.validate() {
                eprintln!(
                    "{} {}",
                    "Profile incomplete:".yellow(),
                    BioSyncError::from(err).user_message()
                );
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| BioSyncError::Internal(format!("Failed to build async runtime: {}", e)))?;

            if realtime {
                runtime.block_on(simulate_realtime(config, profile, options))?;
            } else {
                runtime.block_on(simulate_fast(config, profile, options))?;
            }
        }

        Commands::Profile { profile } => {
            show_profile(&profile.into_profile());
        }

        Commands::Config { show, init } => {
            handle_config(&config, cli.config.as_deref(), show, init)?;
        }
    }

    Ok(())
}

struct SimulateOptions {
    exercise: ExerciseType,
    duration: u64,
    report: Option<PathBuf>,
    seed: Option<u64>,
    auto_complete: bool,
    every_tick: bool,
    export: Option<PathBuf>,
}

async fn prepare_simulation(config: AppConfig, options: &SimulateOptions) -> Result<Simulation> {
    let mut simulation = Simulation::new(config);
    simulation
        .set_exercise_type(options.exercise.clone())
        .map_err(BioSyncError::from)?;

    if let Some(path) = &options.report {
        let document = ReportDocument::from_path(path)
            .map_err(BioSyncError::from)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        let mut analyzer = match options.seed {
            Some(seed) => RandomReportAnalyzer::seeded(seed),
            None => RandomReportAnalyzer::new(),
        };

        println!("{}", format!("Analysing {}...", document.file_name()).blue());
        let analysis = analyze_report(&mut analyzer, &document, DEFAULT_ANALYSIS_DELAY).await;
        for (marker, flag) in analysis.markers() {
            println!("  {:<12} {}", marker, flag);
        }
        for line in &analysis.recommendations {
            println!("  {} {}", "•".cyan(), line);
        }
        simulation.set_report_analysis(Some(analysis));
    }

    Ok(simulation)
}

async fn simulate_fast(config: AppConfig, profile: UserProfile, options: SimulateOptions) -> Result<()> {
    let mut simulation = prepare_simulation(config, &options).await?;
    print_header(&profile, &options.exercise);

    simulation.start(profile).map_err(BioSyncError::from)?;
    let mut printer = TickPrinter::new(options.every_tick);
    for _ in 0..options.duration {
        let Some(update) = simulation.tick() else {
            break;
        };
        printer.print(&update);

        if options.auto_complete {
            for rec in update.recommendations.iter().filter(|r| r.is_open()) {
                simulation
                    .complete_recommendation(rec.id)
                    .map_err(BioSyncError::from)?;
                println!("  {} {}", "✓ done:".green(), rec.title);
            }
        }
    }
    simulation.stop();

    finish(&simulation, options.export.as_deref())
}

async fn simulate_realtime(
    config: AppConfig,
    profile: UserProfile,
    options: SimulateOptions,
) -> Result<()> {
    let simulation = prepare_simulation(config, &options).await?;
    print_header(&profile, &options.exercise);

    let mut clock = SessionClock::new(simulation);
    let mut updates = clock.subscribe();
    clock.start(profile).await.map_err(BioSyncError::from)?;

    let mut printer = TickPrinter::new(options.every_tick);
    // Half a period of slack so the final tick lands before the deadline
    let deadline = tokio::time::sleep(
        clock.period() * options.duration.min(u64::from(u32::MAX)) as u32 + clock.period() / 2,
    );
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Interrupted".yellow());
                break;
            }
            received = updates.recv() => {
                let update = match received {
                    Ok(update) => update,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Display fell behind the tick driver");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                printer.print(&update);

                if options.auto_complete {
                    for rec in update.recommendations.iter().filter(|r| r.is_open()) {
                        // It may already have been replaced by a newer tick
                        if clock.complete_recommendation(rec.id).await.is_ok() {
                            println!("  {} {}", "✓ done:".green(), rec.title);
                        }
                    }
                }
            }
        }
    }

    clock.stop().await;
    let simulation = clock.snapshot().await;

    finish(&simulation, options.export.as_deref())
}

fn print_header(profile: &UserProfile, exercise: &ExerciseType) {
    let athlete = if profile.name().is_empty() {
        "anonymous athlete".to_string()
    } else {
        profile.name().to_string()
    };
    let (low, high) = ZoneCalculator::target_band(profile.max_heart_rate_or_default());

    println!("{}", format!("Starting {} session for {}", exercise, athlete).green().bold());
    println!("  Target heart rate: {}-{} bpm", low, high);
}

/// Prints only what changed since the previous tick unless asked otherwise
struct TickPrinter {
    every_tick: bool,
    last_zone: Option<HeartRateZone>,
    /// Open actionable recommendations already shown
    shown: HashSet<u64>,
}

impl TickPrinter {
    fn new(every_tick: bool) -> Self {
        Self {
            every_tick,
            last_zone: None,
            shown: HashSet::new(),
        }
    }

    fn print(&mut self, update: &TickUpdate) {
        let state = &update.state;
        let zone_changed = self.last_zone != Some(state.heart_rate_zone);
        if self.every_tick || zone_changed {
            println!(
                "{} HR {:>3} ({}) | hydration {:>5.1}% | glycogen {:>5.1}% | core {:.1}°C | fatigue {:>5.1}%",
                format_elapsed(update.snapshot.time).dimmed(),
                state.heart_rate,
                state.heart_rate_zone,
                state.hydration_level,
                state.glycogen_stores,
                state.core_temp_c,
                state.fatigue,
            );
        }
        self.last_zone = Some(state.heart_rate_zone);

        for rec in update.recommendations.iter().filter(|r| r.is_open()) {
            if self.shown.insert(rec.id.0) {
                println!("  {} {}", format!("[{}]", rec.category).yellow(), rec.message);
            }
        }
        // Completed ones are never shown again, so only open ids are kept
        self.shown
            .retain(|id| update.recommendations.iter().any(|r| r.id.0 == *id && r.is_open()));

        for alert in &update.alerts {
            if self.every_tick || zone_changed {
                let label = match alert.severity {
                    AlertSeverity::Critical => "CRITICAL".red().bold(),
                    AlertSeverity::Warning => "WARNING".yellow().bold(),
                };
                println!("  {} {}", label, alert.message);
            }
        }
    }
}

fn finish(simulation: &Simulation, export_path: Option<&Path>) -> Result<()> {
    println!("{}", "✓ Session complete".green());

    if let Some(summary) = simulation.summary() {
        let rows = vec![
            row("Samples", summary.samples),
            row(
                "Window",
                format!(
                    "{} - {}",
                    format_elapsed(summary.first_time),
                    format_elapsed(summary.last_time)
                ),
            ),
            row("Average HR", format!("{:.1} bpm", summary.avg_heart_rate)),
            row("HR std dev", format!("{:.1}", summary.heart_rate_std_dev)),
            row("Max HR", format!("{} bpm", summary.max_heart_rate)),
            row("Min hydration", format!("{}%", summary.min_hydration)),
            row("Min glycogen", format!("{}%", summary.min_glycogen)),
            row("Peak fatigue", format!("{}%", summary.peak_fatigue)),
        ];
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if let Some(path) = export_path {
        let format = ExportFormat::from_path(path).map_err(BioSyncError::from)?;
        let data = SessionExport::from_simulation(simulation);
        export::export_session(&data, format, path).map_err(BioSyncError::from)?;
        println!("{}", format!("✓ History written to {}", path.display()).green());
    }

    Ok(())
}

fn show_profile(profile: &UserProfile) {
    println!("{}", "Profile".blue().bold());

    let derived = profile.derived();
    let bmi = derived
        .bmi
        .map(|b| b.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let bmr = derived
        .bmr
        .map(|b| format!("{} kcal", b))
        .unwrap_or_else(|| "n/a".to_string());
    let (low, high) = ZoneCalculator::target_band(profile.max_heart_rate_or_default());

    let rows = vec![
        row("BMI", bmi),
        row("BMR", bmr),
        row("Max HR", format!("{} bpm", profile.max_heart_rate_or_default())),
        row("Target band", format!("{}-{} bpm", low, high)),
        row("Daily calories", format!("{} kcal", profile.daily_calorie_needs())),
        row("Daily water", format!("{} ml", profile.daily_water_ml())),
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    if let Err(err) = profile.validate() {
        println!("{} {}", "⚠".yellow(), err);
    }
}

fn handle_config(config: &AppConfig, custom_path: Option<&Path>, show: bool, init: bool) -> Result<()> {
    if init {
        let path = custom_path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::default_config_path);
        if AppConfig::init_file(&path)? {
            println!("{}", format!("✓ Wrote default config to {}", path.display()).green());
        } else {
            println!("{}", format!("Config already exists at {}", path.display()).yellow());
        }
    }

    if show || !init {
        let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
        println!("{}", rendered);
    }

    Ok(())
}
