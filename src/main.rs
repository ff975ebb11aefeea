//! rcon - an interactive console for RCON game servers
//!
//! Connects to a server's remote console, authenticates once, then relays
//! every line typed at the `rcon>` prompt and prints the response.
//!
//! # Features
//!
//! - **Color output**: `§` format markers rendered as terminal colors
//! - **Readable help**: `help` listings split one command per line in plain mode
//! - **Line editing**: arrow-key history persisted across sessions
//! - **Configuration**: `~/.rcon-console/config.toml`, overridden by flags
//!
//! # Quick Start
//!
//! ```text
//! rcon                                  # 127.0.0.1:25575, password prompt
//! rcon --host mc.example.net --port 25580
//! rcon --render plain                   # leave markers alone
//! ```
//!
//! Type `quit` or `q` (or press Ctrl+C / Ctrl+D) to leave.

mod config;
mod core;
mod history;
#[cfg(test)]
mod testing;
mod ui;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use clap::Parser;
use dialoguer::Password;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Config, HistoryConfig, Palette, RenderMode};
use crate::core::{Connector, RconError, RemoteConsole, Timeouts};
use crate::history::CommandHistory;
use crate::ui::shell;
use crate::ui::{LineReader, LoopExit, Renderer, ShellError, TerminalInput};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter
const LOG_ENV: &str = "RCON_LOG";

/// Command-line options
#[derive(Parser, Debug)]
#[command(name = "rcon", version, about = "Connect to a Minecraft RCON server")]
struct Cli {
    /// Server host [default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,
    /// Server RCON port [default: 25575]
    #[arg(long)]
    port: Option<u16>,
    /// RCON password; prompted for when omitted
    #[arg(long)]
    password: Option<String>,
    /// How responses are rendered [default: auto]
    ///
    /// `auto` colors output on a terminal and stays plain when piped. Only
    /// `plain` puts each command of a `help` listing on its own line.
    #[arg(long, value_enum)]
    render: Option<RenderMode>,
    /// Palette for color rendering: ansi, truecolor
    #[arg(long)]
    palette: Option<String>,
    /// Configuration file [default: ~/.rcon-console/config.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Neither load nor save command history
    #[arg(long)]
    no_history: bool,
}

/// Effective settings after layering flags over the config file
#[derive(Debug)]
struct Settings {
    host: String,
    port: u16,
    password: Option<String>,
    render_mode: RenderMode,
    palette: Palette,
    timeouts: Timeouts,
    /// `None` when history is disabled
    history: Option<HistoryConfig>,
}

impl Settings {
    fn resolve(cli: Cli, config: Config) -> Self {
        let timeouts = config.timeouts();
        let history = (config.history.enabled && !cli.no_history).then(|| config.history.clone());
        let palette = match cli.palette.as_deref() {
            Some(name) => Palette::by_name(name),
            None => config.get_palette(),
        };

        Self {
            host: cli.host.unwrap_or(config.host),
            port: cli.port.unwrap_or(config.port),
            password: cli.password.or(config.password),
            render_mode: cli.render.unwrap_or(config.render_mode),
            palette,
            timeouts,
            history,
        }
    }
}

/// How a session ended, as far as the operator and the exit status care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOutcome {
    Quit,
    EndOfInput,
    Interrupted,
    ConnectionFailed,
    AuthenticationFailed,
    ConsoleFailed,
}

impl SessionOutcome {
    fn from_rcon(error: &RconError) -> Self {
        match error {
            RconError::Authentication => Self::AuthenticationFailed,
            _ => Self::ConnectionFailed,
        }
    }

    fn from_shell(error: &ShellError) -> Self {
        match error {
            ShellError::Rcon(e) => Self::from_rcon(e),
            ShellError::Input(_) | ShellError::Output(_) => Self::ConsoleFailed,
        }
    }

    /// The one line shown for this outcome. Interrupts get a blank line so
    /// the shutdown message does not share the prompt's line.
    fn status_line(self) -> Option<&'static str> {
        match self {
            Self::Quit => None,
            Self::EndOfInput | Self::Interrupted => Some(""),
            Self::ConnectionFailed => Some("Connection failed."),
            Self::AuthenticationFailed => Some("Authentication failed."),
            Self::ConsoleFailed => Some("Console I/O failed."),
        }
    }

    fn exit_code(self) -> u8 {
        match self {
            Self::Quit | Self::EndOfInput | Self::Interrupted => 0,
            Self::ConnectionFailed | Self::AuthenticationFailed | Self::ConsoleFailed => 1,
        }
    }
}

impl From<LoopExit> for SessionOutcome {
    fn from(exit: LoopExit) -> Self {
        match exit {
            LoopExit::Quit => Self::Quit,
            LoopExit::EndOfInput => Self::EndOfInput,
            LoopExit::Interrupted => Self::Interrupted,
        }
    }
}

/// Owns the live session and disconnects it exactly once when dropped,
/// whether the loop returned, failed or panicked
struct SessionGuard<C: Connector> {
    session: C,
}

impl<C: Connector> SessionGuard<C> {
    fn new(session: C) -> Self {
        Self { session }
    }

    fn session(&mut self) -> &mut C {
        &mut self.session
    }
}

impl<C: Connector> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        self.session.disconnect();
    }
}

/// Connect, run the command loop, release the session
///
/// Every path prints at most one status line followed by `Disconnected.`.
fn run_session<C, F, R, W>(
    connect: F,
    input: &mut R,
    renderer: &Renderer,
    out: &mut W,
) -> SessionOutcome
where
    C: Connector,
    F: FnOnce() -> crate::core::Result<C>,
    R: LineReader + ?Sized,
    W: Write + ?Sized,
{
    let outcome = match connect() {
        Ok(session) => {
            let mut guard = SessionGuard::new(session);
            let outcome = match shell::run(guard.session(), input, renderer, out) {
                Ok(exit) => SessionOutcome::from(exit),
                Err(e) => {
                    error!("Session ended with error: {}", e);
                    SessionOutcome::from_shell(&e)
                }
            };
            report(out, outcome);
            outcome
        }
        Err(e) => {
            error!("Failed to open session: {}", e);
            let outcome = SessionOutcome::from_rcon(&e);
            report(out, outcome);
            outcome
        }
    };

    let _ = writeln!(out, "Disconnected.");
    let _ = out.flush();
    outcome
}

fn report<W: Write + ?Sized>(out: &mut W, outcome: SessionOutcome) {
    if let Some(line) = outcome.status_line() {
        let _ = writeln!(out, "{}", line);
    }
}

/// Log to `~/.rcon-console/rcon-console.log` so nothing interleaves with the prompt
fn init_logging() {
    let Some(dir) = Config::data_dir() else {
        return;
    };
    let log_path = dir.join("rcon-console.log");

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn launch(cli: Cli) -> anyhow::Result<SessionOutcome> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let settings = Settings::resolve(cli, config);
    info!(
        "Target {}:{}, render {:?}, palette {}",
        settings.host, settings.port, settings.render_mode, settings.palette.name
    );

    let mut stdout = io::stdout();
    writeln!(stdout, "Connecting to {}:{}...", settings.host, settings.port)?;
    stdout.flush()?;

    let password = match settings.password.clone() {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()
            .context("Failed to read password")?,
    };

    let renderer = Renderer::new(settings.render_mode, &settings.palette, stdout.is_terminal());
    info!("Color rendering: {}", renderer.is_color());
    let history = settings.history.as_ref().map(|history| {
        let path = Config::data_dir().map(|dir| dir.join("history"));
        CommandHistory::new(path, history.limit)
    });
    let mut input = TerminalInput::new(history)
        .map_err(|e| anyhow!("Failed to initialise line editor: {}", e))?;

    let outcome = run_session(
        || RemoteConsole::connect(&settings.host, settings.port, &password, settings.timeouts),
        &mut input,
        &renderer,
        &mut stdout,
    );
    info!("Session finished: {:?}", outcome);
    Ok(outcome)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    info!("rcon-console {} starting", VERSION);

    match launch(cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
