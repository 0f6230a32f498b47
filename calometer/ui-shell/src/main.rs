//! Terminal front end for the calorie tracker.
//!
//! Each invocation restores the saved session cookie, mounts the screen behind the requested
//! command (running its session gate), performs the action, and follows any navigation the
//! screen asks for. Notifications are printed as they are produced; the cookie jar is written
//! back on exit so the next command starts from the same session.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use calometer_core::form::{FormField, FormState};
use calometer_core::model::{month_label, Goal, LogStatus};
use calometer_core::screens::{
    BodyDetailsField, BodyDetailsScreen, CalorieField, DashboardScreen, LogListScreen,
    LoginField, LoginScreen, SignupField, SignupScreen,
};
use calometer_core::{
    CalometerApi, ClientConfig, GateDecision, HttpTransport, Level as NoticeLevel,
    NavigationIntent, Navigator, RecordingNotifier, Route, ScreenContext, SessionRule,
    SubmitOutcome,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const CONFIG_PATH_ENV: &str = "CALOMETER_CONFIG";
const SESSION_PATH_ENV: &str = "CALOMETER_SESSION_PATH";
const MAX_HOPS: usize = 4;

/// Calorie tracker client.
#[derive(Parser, Debug)]
#[command(author, version, about = "Calorie tracker client", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit log level (trace, debug, info, warn, error); overrides -v.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write JSON logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, env = CONFIG_PATH_ENV, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:8080.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Which probe codes count as an expired session: `unauthorized` or `not-ok`.
    #[arg(long, global = true)]
    session_rule: Option<SessionRule>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Repeat of the password.
        #[arg(long)]
        confirm: String,
    },
    /// Log in and continue to the dashboard or onboarding.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session.
    Logout,
    /// Record body details (first login only).
    Onboard {
        #[arg(long)]
        age: String,
        /// Kilograms, in steps of 0.5.
        #[arg(long)]
        weight: String,
        /// Centimetres.
        #[arg(long)]
        height: String,
        /// M or F.
        #[arg(long, default_value = "M")]
        gender: String,
        /// L (lose) or G (gain).
        #[arg(long, default_value = "L")]
        goal: String,
    },
    /// Show the net caloric balance and monthly logs.
    Dashboard,
    /// List the days of one month, e.g. "October, 2024".
    Month { label: String },
    /// Work with daily logs.
    #[command(subcommand)]
    Log(LogCommand),
    /// Change the weight goal (L or G).
    Goal { goal: Goal },
}

#[derive(Subcommand, Debug)]
enum LogCommand {
    /// Start the log for a day (today by default).
    Create {
        #[arg(long)]
        date: Option<String>,
    },
    /// Add calories to a day's totals.
    Update {
        date: NaiveDate,
        #[arg(long, default_value = "")]
        consumed: String,
        #[arg(long, default_value = "")]
        burnt: String,
    },
    /// Mark a day done (D) or in progress (I).
    Status { date: NaiveDate, status: LogStatus },
    /// Remove a day's log.
    Delete { date: NaiveDate },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = load_config(&cli)?;
    let session_path = session_store_path()?;
    let mut shell = Shell::open(&config, session_path)?;

    let result = shell.run(cli.command).await;
    shell.flush();
    shell.save_session()?;
    result
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .map(|lvl| lvl.to_ascii_uppercase())
        .map(|lvl| match lvl.as_str() {
            "TRACE" => Level::TRACE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "ERROR" => Level::ERROR,
            _ => Level::WARN,
        })
        .unwrap_or(match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        });
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Defaults, then the TOML file, then environment, then flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    config = config
        .apply_env()
        .context("applying environment overrides")?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(rule) = cli.session_rule {
        config.session_rule = rule;
    }
    Ok(config)
}

fn session_store_path() -> Result<PathBuf> {
    if let Ok(custom) = std::env::var(SESSION_PATH_ENV) {
        let path = PathBuf::from(custom);
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating parent directory {}", parent.display()))?;
        }
        return Ok(path);
    }

    let base = match std::env::var("APPDATA")
        .or_else(|_| std::env::var("HOME"))
        .map(PathBuf::from)
    {
        Ok(dir) => dir,
        Err(_) => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let dir = base.join(".calometer");
    std::fs::create_dir_all(&dir).context("creating session directory")?;
    Ok(dir.join("session"))
}

fn load_session(path: &Path, transport: &HttpTransport) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let saved = std::fs::read_to_string(path)
        .with_context(|| format!("reading session from {}", path.display()))?;
    if !saved.trim().is_empty() {
        transport.restore_cookies(saved.trim());
        debug!(path = %path.display(), "session restored");
    }
    Ok(())
}

/// Write the jar back; an empty jar (after logout) removes the file.
fn save_session(path: &Path, transport: &HttpTransport) -> Result<()> {
    match transport.cookie_header() {
        Some(header) => std::fs::write(path, header)
            .with_context(|| format!("writing session to {}", path.display())),
        None if path.exists() => std::fs::remove_file(path)
            .with_context(|| format!("removing session at {}", path.display())),
        None => Ok(()),
    }
}

struct Shell {
    ctx: ScreenContext,
    notifier: RecordingNotifier,
    transport: Arc<HttpTransport>,
    session_path: PathBuf,
    navigator: Navigator,
}

impl Shell {
    fn open(config: &ClientConfig, session_path: PathBuf) -> Result<Self> {
        let transport =
            Arc::new(HttpTransport::new(config).context("building the HTTP client")?);
        load_session(&session_path, &transport)?;

        let notifier = RecordingNotifier::new();
        let api = CalometerApi::new(transport.clone());
        let ctx = ScreenContext::new(api, Arc::new(notifier.clone()), config.session_rule);
        info!(api_url = %transport.base_url(), rule = %config.session_rule, "client ready");

        Ok(Self {
            ctx,
            notifier,
            transport,
            session_path,
            navigator: Navigator::new(Route::Login),
        })
    }

    fn save_session(&self) -> Result<()> {
        save_session(&self.session_path, &self.transport)
    }

    fn flush(&self) {
        for notice in self.notifier.drain() {
            match notice.level {
                NoticeLevel::Success => println!("{}", notice.message),
                NoticeLevel::Error => eprintln!("error: {}", notice.message),
            }
        }
    }

    async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Signup {
                name,
                username,
                password,
                confirm,
            } => {
                let mut screen = SignupScreen::new();
                screen.set_field(SignupField::FullName, name);
                screen.set_field(SignupField::Username, username);
                screen.set_field(SignupField::Password, password);
                screen.set_field(SignupField::ConfirmPassword, confirm);
                let outcome = screen.submit(&self.ctx).await;
                self.settle(outcome, field_errors(screen.form())).await
            }
            Commands::Login { username, password } => {
                let mut screen = LoginScreen::new(&self.ctx);
                match screen.mount(&self.ctx, None).await {
                    GateDecision::Render => {}
                    GateDecision::Redirect(intent) => {
                        println!("Already logged in.");
                        return self.follow(intent).await;
                    }
                    GateDecision::Hold => bail!("could not check the current session"),
                }
                screen.set_field(LoginField::Username, username);
                screen.set_field(LoginField::Password, password);
                let outcome = screen.submit(&self.ctx).await;
                self.settle(outcome, field_errors(screen.form())).await
            }
            Commands::Logout => {
                let mut screen = DashboardScreen::new(&self.ctx);
                let outcome = screen.logout(&self.ctx).await;
                self.settle(outcome, Vec::new()).await
            }
            Commands::Onboard {
                age,
                weight,
                height,
                gender,
                goal,
            } => {
                let mut screen = BodyDetailsScreen::new(&self.ctx);
                match screen.mount(&self.ctx, self.navigator.arrive()).await {
                    GateDecision::Render => {}
                    GateDecision::Redirect(intent) => return self.follow(intent).await,
                    GateDecision::Hold => bail!("could not check the current session"),
                }
                screen.set_field(BodyDetailsField::Age, age);
                screen.set_field(BodyDetailsField::Weight, weight);
                screen.set_field(BodyDetailsField::Height, height);
                screen.set_field(BodyDetailsField::Gender, gender);
                screen.set_field(BodyDetailsField::Goal, goal);
                let outcome = screen.submit(&self.ctx).await;
                self.settle(outcome, field_errors(screen.form())).await
            }
            Commands::Dashboard => {
                if let Some(screen) = self.open_dashboard().await? {
                    print!("{}", screen.render());
                }
                Ok(())
            }
            Commands::Month { label } => {
                let Some(screen) = self.open_dashboard().await? else {
                    return Ok(());
                };
                match screen.month(&label) {
                    Some(month) => print_month(&month),
                    None => println!("No logs for {label}"),
                }
                Ok(())
            }
            Commands::Log(command) => self.log(command).await,
            Commands::Goal { goal } => {
                let Some(mut screen) = self.open_dashboard().await? else {
                    return Ok(());
                };
                let outcome = screen.set_weight_goal(&self.ctx, goal).await;
                self.settle(outcome, Vec::new()).await
            }
        }
    }

    async fn log(&mut self, command: LogCommand) -> Result<()> {
        let Some(mut dashboard) = self.open_dashboard().await? else {
            return Ok(());
        };
        match command {
            LogCommand::Create { date } => {
                let dialog = dashboard.open_create_log(Local::now().date_naive());
                if let Some(date) = date {
                    dialog.set_date(date);
                }
                let outcome = dashboard.submit_create_log(&self.ctx).await;
                let errors = dashboard
                    .create_log()
                    .map(|dialog| field_errors(dialog.form()))
                    .unwrap_or_default();
                self.settle(outcome, errors).await
            }
            LogCommand::Update {
                date,
                consumed,
                burnt,
            } => {
                let mut month = month_for(&dashboard, date);
                month.set_field(CalorieField::Consumed, consumed);
                month.set_field(CalorieField::Burnt, burnt);
                let outcome = month.update(&self.ctx, date).await;
                let errors = field_errors(month.form());
                self.settle(outcome, errors).await
            }
            LogCommand::Status { date, status } => {
                let mut month = month_for(&dashboard, date);
                let outcome = month.mark_status(&self.ctx, date, status).await;
                self.settle(outcome, Vec::new()).await
            }
            LogCommand::Delete { date } => {
                let mut month = month_for(&dashboard, date);
                let outcome = month.delete(&self.ctx, date).await;
                self.settle(outcome, Vec::new()).await
            }
        }
    }

    /// Mount the dashboard. `None` when the gate sent the user elsewhere.
    async fn open_dashboard(&mut self) -> Result<Option<DashboardScreen>> {
        let mut screen = DashboardScreen::new(&self.ctx);
        match screen.mount(&self.ctx, self.navigator.arrive()).await {
            GateDecision::Render => Ok(Some(screen)),
            GateDecision::Redirect(intent) => {
                self.follow(intent).await?;
                Ok(None)
            }
            GateDecision::Hold => bail!("could not check the current session"),
        }
    }

    async fn settle(&mut self, outcome: SubmitOutcome, errors: Vec<String>) -> Result<()> {
        debug!(outcome = ?outcome, "action finished");
        match outcome {
            SubmitOutcome::Navigate(intent) => self.follow(intent).await,
            SubmitOutcome::Completed | SubmitOutcome::Hold => Ok(()),
            SubmitOutcome::Invalid | SubmitOutcome::Conflict(_) => {
                for line in errors {
                    eprintln!("{line}");
                }
                bail!("input was not accepted")
            }
            SubmitOutcome::Rejected { .. } | SubmitOutcome::TransportFailed => {
                bail!("request failed")
            }
        }
    }

    /// Move to `intent` and keep mounting destinations until one renders or holds.
    async fn follow(&mut self, intent: NavigationIntent) -> Result<()> {
        let mut next = Some(intent);
        let mut hops = 0;
        while let Some(intent) = next.take() {
            hops += 1;
            if hops > MAX_HOPS {
                bail!("navigation did not settle after {MAX_HOPS} redirects");
            }
            self.flush();
            self.navigator.navigate(intent);
            let reason = self.navigator.arrive();
            println!("-> {}", intent.target.path());

            next = match intent.target {
                Route::Dashboard => {
                    let mut screen = DashboardScreen::new(&self.ctx);
                    match screen.mount(&self.ctx, reason).await {
                        GateDecision::Render => {
                            print!("{}", screen.render());
                            None
                        }
                        GateDecision::Redirect(next) => Some(next),
                        GateDecision::Hold => None,
                    }
                }
                Route::AddBodyDetails => {
                    let mut screen = BodyDetailsScreen::new(&self.ctx);
                    match screen.mount(&self.ctx, reason).await {
                        GateDecision::Render => {
                            println!("Body details are missing; run `calometer onboard`.");
                            None
                        }
                        GateDecision::Redirect(next) => Some(next),
                        GateDecision::Hold => None,
                    }
                }
                Route::Login => {
                    println!("Log in with `calometer login`.");
                    None
                }
                Route::Signup => None,
            };
        }
        self.flush();
        Ok(())
    }
}

fn field_errors<K: FormField>(form: &FormState<K>) -> Vec<String> {
    form.errors()
        .iter()
        .map(|(field, message)| format!("{field:?}: {message}"))
        .collect()
}

fn month_for(dashboard: &DashboardScreen, date: NaiveDate) -> LogListScreen {
    let label = month_label(date);
    dashboard
        .month(&label)
        .unwrap_or_else(|| LogListScreen::new(label, Vec::new()))
}

fn print_month(month: &LogListScreen) {
    println!("{}", month.label());
    for entry in month.entries() {
        let day = entry
            .date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| entry.log_date.clone());
        println!(
            "  {day}  consumed={} burnt={} tdee={} {}",
            entry.calories_consumed,
            entry.calories_burnt,
            entry.tdee,
            if entry.is_done() { "done" } else { "in progress" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_transport() -> HttpTransport {
        HttpTransport::new(&ClientConfig::with_api_url("http://127.0.0.1:9")).unwrap()
    }

    #[test]
    fn session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");

        let first = offline_transport();
        first.restore_cookies("session=abc123");
        save_session(&path, &first).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("session=abc123"));

        let second = offline_transport();
        load_session(&path, &second).unwrap();
        assert_eq!(second.cookie_header().as_deref(), Some("session=abc123"));
    }

    #[test]
    fn empty_jar_removes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "session=stale").unwrap();

        save_session(&path, &offline_transport()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("calometer.toml");
        std::fs::write(
            &config_path,
            "api_url = \"http://backend.internal:8080\"\nsession_rule = \"not-ok\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "calometer",
            "--config",
            config_path.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:3000",
            "dashboard",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:3000");
        assert_eq!(config.session_rule, SessionRule::NotOk);
    }

    #[test]
    fn log_subcommands_parse() {
        let cli = Cli::try_parse_from(["calometer", "log", "status", "2024-10-01", "D"]).unwrap();
        match cli.command {
            Commands::Log(LogCommand::Status { date, status }) => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
                assert_eq!(status, LogStatus::Done);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
