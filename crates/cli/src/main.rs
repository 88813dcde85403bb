//! Forma CLI - goals, achievements, body metrics and workout sessions.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use forma_core::{
    Achievement, AchievementCategory, AttemptInput, BodyMetric, BodyMetricKind, Clock, Direction, ExerciseId,
    FitnessGoal, GoalType, MeasurementType, MetricTracking, MetricType, PlannedExercise, SessionId, SystemClock,
    UserId, WorkoutSession,
};
use forma_progress::{GoalProgressService, ProgressTracker, ProgressUpdate};
use forma_session::{SessionEngine, SessionService};
use forma_storage::{JsonStorage, Storage};
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "forma")]
#[command(about = "Fitness progress and workout session tracker", long_about = None)]
struct Cli {
    /// Config file (defaults to ./forma.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage directory, overrides the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fitness goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Achievements
    #[command(subcommand)]
    Achievement(AchievementCommand),
    /// Body and tracked metrics
    #[command(subcommand)]
    Metric(MetricCommand),
    /// Workout sessions
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Create a goal
    Add {
        /// Goal title
        title: String,
        /// Goal type (weight_loss, muscle_gain, strength, endurance, ...)
        #[arg(long = "type", default_value = "custom")]
        goal_type: String,
        /// Starting value
        #[arg(long, default_value = "0")]
        start: f64,
        /// Target value
        #[arg(long)]
        target: Option<f64>,
        /// Override the direction implied by the type (increasing, decreasing, stable)
        #[arg(long)]
        direction: Option<String>,
        /// Unit
        #[arg(long)]
        unit: Option<String>,
    },
    /// Record a new reading
    Update {
        /// Goal ID
        id: String,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Show goal details
    Show {
        /// Goal ID
        id: String,
    },
    /// List goals
    List,
    /// Recompute every goal's cached progress
    Refresh,
}

#[derive(Subcommand)]
enum AchievementCommand {
    /// Create an achievement
    Add {
        /// Achievement name
        name: String,
        /// Category (workout, strength, endurance, consistency, milestone)
        #[arg(long, default_value = "workout")]
        category: String,
        /// Progress needed
        #[arg(long)]
        target: f64,
        /// Points awarded
        #[arg(long, default_value = "10")]
        points: u32,
    },
    /// Add progress
    Bump {
        /// Achievement ID
        id: String,
        /// Amount to add
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        by: f64,
    },
    /// List achievements
    List,
}

#[derive(Subcommand)]
enum MetricCommand {
    /// Start tracking a metric
    Add {
        /// Metric name, or body metric kind with --body (weight, body_fat, waist, ...)
        name: String,
        /// Initial reading
        #[arg(long)]
        baseline: f64,
        /// Target value
        #[arg(long)]
        target: Option<f64>,
        /// Track a body measurement
        #[arg(long)]
        body: bool,
        /// Metric type for tracked metrics
        #[arg(long = "type", default_value = "performance")]
        metric_type: String,
        /// Direction for tracked metrics
        #[arg(long, default_value = "increasing")]
        direction: String,
        /// Unit
        #[arg(long)]
        unit: Option<String>,
    },
    /// Record a reading
    Record {
        /// Metric ID
        id: String,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// The ID refers to a body metric
        #[arg(long)]
        body: bool,
    },
    /// List body and tracked metrics
    List,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Create a session from a plan
    New {
        /// Session name
        name: String,
        /// Planned exercise as NAME:SETSxREPS[:MEASUREMENT], repeatable
        #[arg(long = "exercise", short = 'e')]
        exercises: Vec<String>,
        /// Create it pending instead of starting right away
        #[arg(long)]
        pending: bool,
    },
    /// Start a pending session
    Start {
        /// Session ID
        id: String,
    },
    /// Add an exercise that is not in the plan
    Add {
        /// Session ID
        id: String,
        /// Exercise name
        name: String,
        /// Measurement (weighted, repetitions, duration)
        #[arg(long, default_value = "weighted")]
        measurement: String,
    },
    /// Record an attempt
    Record(RecordArgs),
    /// Mark an exercise done
    Complete {
        /// Session ID
        id: String,
        /// Exercise name or ID
        exercise: String,
    },
    /// Skip an exercise
    Skip {
        /// Session ID
        id: String,
        /// Exercise name or ID
        exercise: String,
    },
    /// Build the summary and complete the session when everything is done
    Finalize {
        /// Session ID
        id: String,
    },
    /// Abandon an active session
    Abandon {
        /// Session ID
        id: String,
    },
    /// Show session details
    Show {
        /// Session ID
        id: String,
    },
    /// List sessions
    List,
}

#[derive(Args)]
struct RecordArgs {
    /// Session ID
    id: String,
    /// Exercise name or ID
    exercise: String,
    /// Repetitions
    #[arg(long, default_value = "0")]
    reps: u32,
    /// Form score, 0-10
    #[arg(long)]
    form: f64,
    /// Load
    #[arg(long)]
    weight: Option<f64>,
    /// Duration in seconds
    #[arg(long, default_value = "0")]
    duration: f64,
    /// Calories burned
    #[arg(long)]
    calories: Option<f64>,
    /// Notes
    #[arg(long)]
    notes: Option<String>,
}

/// Everything a command needs.
struct App {
    storage: Arc<Mutex<JsonStorage>>,
    progress: GoalProgressService<JsonStorage>,
    sessions: SessionService<JsonStorage>,
    clock: SystemClock,
    user: UserId,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    debug!("Using data directory {}", config.data_dir.display());

    let app = App::open(config).await?;

    match cli.command {
        Commands::Goal(cmd) => app.goal(cmd).await,
        Commands::Achievement(cmd) => app.achievement(cmd).await,
        Commands::Metric(cmd) => app.metric(cmd).await,
        Commands::Session(cmd) => app.session(cmd).await,
    }
}

impl App {
    async fn open(config: CliConfig) -> Result<Self> {
        let storage = JsonStorage::new(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open storage at {}", config.data_dir.display()))?;
        let user = match config.user {
            Some(user) => user,
            None => local_user(&config.data_dir).await?,
        };

        let storage = Arc::new(Mutex::new(storage));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let tracker = ProgressTracker::new(clock.clone()).with_config(config.progress);
        let engine = SessionEngine::new(clock).with_config(config.session);

        Ok(Self {
            progress: GoalProgressService::new(storage.clone(), tracker),
            sessions: SessionService::new(storage.clone(), engine),
            storage,
            clock: SystemClock,
            user,
        })
    }

    async fn goal(&self, cmd: GoalCommand) -> Result<()> {
        match cmd {
            GoalCommand::Add {
                title,
                goal_type,
                start,
                target,
                direction,
                unit,
            } => {
                let goal_type: GoalType = goal_type.parse().map_err(|e: String| anyhow!(e))?;
                let mut goal = FitnessGoal::new(self.user, title, goal_type, start, target, self.clock.now());
                if let Some(direction) = direction {
                    goal = goal.with_direction(parse_direction(&direction)?);
                }
                if let Some(unit) = unit {
                    goal = goal.with_unit(unit);
                }
                let update = self.progress.create_goal(&mut goal).await?;
                println!("Added goal: {} - {}", goal.id, goal.title);
                print_update(&update);
            }
            GoalCommand::Update { id, value } => {
                let update = self.progress.update_goal(parse_id(&id, "goal")?, value).await?;
                print_update(&update);
            }
            GoalCommand::Show { id } => {
                let id = parse_id(&id, "goal")?;
                let Some(goal) = self.storage.lock().await.load_goal(id).await? else {
                    println!("Goal not found");
                    return Ok(());
                };

                println!("Goal: {}", goal.id);
                println!("  Title: {}", goal.title);
                println!("  Type: {}", goal.goal_type.as_str());
                println!("  Direction: {}", goal.direction.as_str());
                println!(
                    "  Value: {} (start {}, target {})",
                    with_unit(goal.current_value, goal.unit.as_deref()),
                    optional(goal.start_value),
                    optional(goal.target_value)
                );
                println!("  Progress: {:.1}%", goal.progress);
                println!("  Completed: {}", completion(goal.is_completed, goal.completed_at));
            }
            GoalCommand::List => {
                let goals = self.storage.lock().await.list_goals().await?;
                println!("Goals ({})", goals.len());
                for goal in goals {
                    println!(
                        "  {} | {:>5.1}% | {} - {}",
                        goal.id,
                        goal.progress,
                        if goal.is_completed { "DONE" } else { "OPEN" },
                        goal.title
                    );
                }
            }
            GoalCommand::Refresh => {
                let report = self.progress.refresh_goals().await?;
                println!("Refreshed {} goals, {} unchanged", report.refreshed, report.unchanged);
                for (id, reason) in &report.failures {
                    println!("  {} failed: {}", id, reason);
                }
            }
        }
        Ok(())
    }

    async fn achievement(&self, cmd: AchievementCommand) -> Result<()> {
        match cmd {
            AchievementCommand::Add {
                name,
                category,
                target,
                points,
            } => {
                let category: AchievementCategory = category.parse().map_err(|e: String| anyhow!(e))?;
                let mut achievement =
                    Achievement::new(self.user, name, category, target, self.clock.now()).with_points(points);
                self.progress.create_achievement(&mut achievement).await?;
                println!("Added achievement: {} - {}", achievement.id, achievement.name);
            }
            AchievementCommand::Bump { id, by } => {
                let update = self
                    .progress
                    .add_achievement_progress(parse_id(&id, "achievement")?, by)
                    .await?;
                print_update(&update);
            }
            AchievementCommand::List => {
                let achievements = self.storage.lock().await.list_achievements().await?;
                println!("Achievements ({})", achievements.len());
                for a in achievements {
                    println!(
                        "  {} | {:>5.1}% | {} pts - {}",
                        a.id, a.progress, a.points, a.name
                    );
                }
            }
        }
        Ok(())
    }

    async fn metric(&self, cmd: MetricCommand) -> Result<()> {
        match cmd {
            MetricCommand::Add {
                name,
                baseline,
                target,
                body: true,
                unit,
                ..
            } => {
                let kind: BodyMetricKind = name.parse().map_err(|e: String| anyhow!(e))?;
                let mut metric = BodyMetric::new(self.user, kind, unit.unwrap_or_default(), baseline, self.clock.now());
                if let Some(target) = target {
                    metric = metric.with_target(target);
                }
                let update = self.progress.create_body_metric(&mut metric).await?;
                println!("Added body metric: {}", metric.id);
                print_update(&update);
            }
            MetricCommand::Add {
                name,
                baseline,
                target,
                metric_type,
                direction,
                unit,
                ..
            } => {
                let metric_type: MetricType = metric_type.parse().map_err(|e: String| anyhow!(e))?;
                let mut metric = MetricTracking::new(
                    self.user,
                    name,
                    metric_type,
                    baseline,
                    target,
                    parse_direction(&direction)?,
                    self.clock.now(),
                );
                metric.unit = unit;
                let update = self.progress.create_metric(&mut metric).await?;
                println!("Added metric: {} - {}", metric.id, metric.name);
                print_update(&update);
            }
            MetricCommand::Record { id, value, body } => {
                let id = parse_id(&id, "metric")?;
                let update = if body {
                    self.progress.record_body_metric(id, value).await?
                } else {
                    self.progress.record_metric(id, value).await?
                };
                print_update(&update);
            }
            MetricCommand::List => {
                let storage = self.storage.lock().await;
                let body = storage.list_body_metrics().await?;
                let tracked = storage.list_metrics().await?;

                println!("Body metrics ({})", body.len());
                for m in body {
                    println!(
                        "  {} | {:>5.1}% | {:?} {}",
                        m.id,
                        m.progress,
                        m.kind,
                        with_unit(m.value, Some(m.unit.as_str()).filter(|u| !u.is_empty()))
                    );
                }
                println!("Tracked metrics ({})", tracked.len());
                for m in tracked {
                    println!(
                        "  {} | {:>5.1}% | {:?} | {} {}",
                        m.id,
                        m.progress,
                        m.trend,
                        m.name,
                        with_unit(m.current_value, m.unit.as_deref())
                    );
                }
            }
        }
        Ok(())
    }

    async fn session(&self, cmd: SessionCommand) -> Result<()> {
        match cmd {
            SessionCommand::New {
                name,
                exercises,
                pending,
            } => {
                let plan = parse_plan(&exercises)?;
                let now = self.clock.now();
                let session = if pending {
                    WorkoutSession::scheduled(self.user, name, plan, now, now)
                } else {
                    WorkoutSession::new(self.user, name, plan, now)
                };
                self.sessions.create(&session).await?;
                println!("Created session: {} - {} ({})", session.id, session.name, session.status);
            }
            SessionCommand::Start { id } => {
                let session = self.sessions.start(parse_id(&id, "session")?).await?;
                println!("Session {} is {}", session.id, session.status);
            }
            SessionCommand::Add { id, name, measurement } => {
                let measurement: MeasurementType = measurement.parse().map_err(|e: String| anyhow!(e))?;
                let exercise_id = ExerciseId::new();
                self.sessions
                    .add_exercise(parse_id(&id, "session")?, exercise_id, name.clone(), measurement)
                    .await?;
                println!("Added exercise: {} - {}", exercise_id, name);
            }
            SessionCommand::Record(args) => {
                let (id, exercise_id) = self.resolve(&args.id, &args.exercise).await?;
                let mut input = AttemptInput::reps(args.reps, args.form).with_duration(args.duration);
                input.weight = args.weight;
                input.calories = args.calories;
                input.notes = args.notes;

                let outcome = self.sessions.record_attempt(id, exercise_id, input).await?;
                println!(
                    "Attempt {} recorded ({}){}",
                    outcome.attempt_number,
                    outcome.exercise_status,
                    if outcome.is_best { " - new best" } else { "" }
                );
            }
            SessionCommand::Complete { id, exercise } => {
                let (id, exercise_id) = self.resolve(&id, &exercise).await?;
                self.sessions.complete_exercise(id, exercise_id).await?;
                println!("Exercise {} completed", exercise);
            }
            SessionCommand::Skip { id, exercise } => {
                let (id, exercise_id) = self.resolve(&id, &exercise).await?;
                self.sessions.skip_exercise(id, exercise_id).await?;
                println!("Exercise {} skipped", exercise);
            }
            SessionCommand::Finalize { id } => {
                let outcome = self.sessions.finalize(parse_id(&id, "session")?).await?;
                let s = &outcome.summary;
                println!("{}", if outcome.completed { "Session completed" } else { "Session summary" });
                println!("  Exercises: {} ({} unique)", s.total_exercises, s.unique_exercises);
                println!("  Sets: {}", s.total_sets);
                println!("  Volume: {:.1}", s.total_volume);
                println!("  Duration: {} min", s.total_duration);
                println!("  Calories: {:.0}", s.total_calories);
                println!("  Form: {:.1}/10", s.form_score);
            }
            SessionCommand::Abandon { id } => {
                let session = self.sessions.abandon(parse_id(&id, "session")?).await?;
                info!("Abandoned session {}", session.id);
                println!("Session {} is {}", session.id, session.status);
            }
            SessionCommand::Show { id } => {
                let session = self.sessions.get(parse_id(&id, "session")?).await?;
                print_session(&session);
            }
            SessionCommand::List => {
                let sessions = self.sessions.list().await?;
                println!("Sessions ({})", sessions.len());
                for s in sessions {
                    println!("  {} | {:<9} | {}", s.id, s.status.as_str(), s.name);
                }
            }
        }
        Ok(())
    }

    /// Resolve a session ID and an exercise given by ID or name.
    async fn resolve(&self, session: &str, exercise: &str) -> Result<(SessionId, ExerciseId)> {
        let session = self.sessions.get(parse_id(session, "session")?).await?;
        let exercise_id = find_exercise(&session, exercise)
            .ok_or_else(|| anyhow!("No exercise '{}' in session {}", exercise, session.id))?;
        Ok((session.id, exercise_id))
    }
}

fn find_exercise(session: &WorkoutSession, token: &str) -> Option<ExerciseId> {
    if let Ok(id) = token.parse::<ExerciseId>() {
        return Some(id);
    }
    session
        .planned_exercises
        .iter()
        .map(|p| (p.exercise_id, p.name.as_str()))
        .chain(session.exercise_results.values().map(|r| (r.exercise_id, r.name.as_str())))
        .find(|(_, name)| name.eq_ignore_ascii_case(token))
        .map(|(id, _)| id)
}

/// Parse `NAME:SETSxREPS[:MEASUREMENT]` entries into a plan. Entries with
/// the same name share one exercise ID.
fn parse_plan(entries: &[String]) -> Result<Vec<PlannedExercise>> {
    let mut plan: Vec<PlannedExercise> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let mut parts = entry.split(':');
        let name = parts.next().map(str::trim).filter(|n| !n.is_empty());
        let (Some(name), Some(scheme)) = (name, parts.next()) else {
            bail!("Expected NAME:SETSxREPS, got '{}'", entry);
        };
        let (sets, reps) = scheme
            .split_once('x')
            .ok_or_else(|| anyhow!("Expected SETSxREPS, got '{}'", scheme))?;
        let sets: u32 = sets.trim().parse().with_context(|| format!("Invalid set count in '{}'", entry))?;
        let reps: u32 = reps.trim().parse().with_context(|| format!("Invalid rep count in '{}'", entry))?;
        let measurement = match parts.next() {
            Some(m) => m.parse().map_err(|e: String| anyhow!(e))?,
            None => MeasurementType::default(),
        };

        let exercise_id = plan
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.exercise_id)
            .unwrap_or_default();
        plan.push(PlannedExercise::new(exercise_id, name, i as u32 + 1, sets, reps).measured_by(measurement));
    }
    Ok(plan)
}

fn parse_id<T: std::str::FromStr>(s: &str, kind: &str) -> Result<T> {
    s.parse().map_err(|_| anyhow!("Invalid {} ID: {}", kind, s))
}

fn parse_direction(s: &str) -> Result<Direction> {
    s.parse().map_err(|e: String| anyhow!(e))
}

/// Read the local user ID from the data directory, creating it on first use.
async fn local_user(data_dir: &Path) -> Result<UserId> {
    let path = data_dir.join("user");
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => parse_id(content.trim(), "user"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let user = UserId::new();
            tokio::fs::write(&path, user.to_string())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Created local user {}", user);
            Ok(user)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn print_update(update: &ProgressUpdate) {
    println!("Progress: {:.1}%", update.progress_percent);
    if let Some(trend) = update.trend {
        println!("  Trend: {:?}", trend);
    }
    if update.just_completed {
        println!("  Target reached!");
    }
}

fn print_session(session: &WorkoutSession) {
    println!("Session: {}", session.id);
    println!("  Name: {}", session.name);
    println!("  Status: {}", session.status);
    if let Some(start) = session.start_time {
        println!("  Started: {}", start);
    }
    if let Some(end) = session.end_time {
        println!("  Ended: {}", end);
    }
    println!("  Plan:");
    for p in &session.planned_exercises {
        println!(
            "    {}. {} {}x{} [{}]",
            p.order,
            p.name,
            p.target_sets,
            optional(p.target_reps.map(f64::from)),
            p.exercise_id
        );
    }
    println!("  Exercises:");
    for r in session.exercise_results.values() {
        let best = r
            .best_result
            .as_ref()
            .map(|b| format!(" best #{} form {:.1}", b.attempt_number, b.form_score))
            .unwrap_or_default();
        println!("    {} | {} | {} attempts{}", r.name, r.status, r.attempts.len(), best);
    }
    if session.summary.finalized_at.is_some() {
        println!(
            "  Summary: volume {:.1}, {} min, form {:.1}/10",
            session.summary.total_volume, session.summary.total_duration, session.summary.form_score
        );
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn with_unit(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{} {}", value, unit),
        None => value.to_string(),
    }
}

fn completion(done: bool, at: Option<forma_core::Time>) -> String {
    match (done, at) {
        (true, Some(at)) => format!("yes ({})", at),
        (true, None) => "yes".to_string(),
        (false, _) => "no".to_string(),
    }
}
