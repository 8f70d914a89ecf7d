mod config;
mod engine;
mod error;
mod exchange;
mod indicators;
mod ml;
mod notifications;
mod panels;
mod storage;
mod strategies;
mod types;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::Settings;
use engine::GameSession;
use exchange::{GameServer, SimulatedServer};
use ml::training_rng;
use storage::{KeyValueStore, SledStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "color-prediction")]
#[command(version)]
#[command(about = "Big/small prediction game with a heuristic and a trained classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "color_prediction.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: read commands from stdin, keeping the pending prediction alive
    Play,
    /// Write the default configuration to a TOML file
    InitConfig {
        #[arg(short, long, default_value = "color_prediction.toml")]
        output: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    #[command(flatten)]
    Game(GameCommand),
}

/// Commands available both on the command line and inside `play`
#[derive(Subcommand, Debug, Clone)]
enum GameCommand {
    /// Summary of results, accuracy and model state
    Home,
    /// Heuristic prediction from the last 3 digits of the period
    Predict {
        /// Exactly three digits, e.g. 123
        digits: String,
    },
    /// Record a new result
    Add {
        period: String,
        /// Single digit 0-9
        result: String,
    },
    /// Train the classifier on the full history
    Train,
    /// Predict with the trained classifier
    ModelPredict {
        /// Optional 3-digit code used for the color suggestion
        #[arg(long)]
        code: Option<String>,
    },
    /// Drop the pending prediction
    Clear,
    /// Accuracy and recent trends
    Stats,
    /// Stored results, newest first
    History {
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// The last ten results
    Last,
    /// Trend label for every result
    Trends,
    /// Show the trained model
    Model,
    /// Recent activity log entries
    Log {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Export results as pretty JSON (stdout when no file is given)
    Export {
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Replace all results with a JSON array from a file
    Import { input: String },
    /// Wipe results, stats and model
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Connect to the game server (simulated)
    Connect,
}

/// One line typed inside `play`
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct PlayLine {
    #[command(subcommand)]
    command: PlayCommand,
}

#[derive(Subcommand)]
enum PlayCommand {
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
    #[command(flatten)]
    Game(GameCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(cli.verbose, cli.json)?;

    match cli.command {
        Commands::InitConfig { output, force } => {
            write_default_config(&output, force)?;
        }
        Commands::Play => {
            let settings = Settings::load(&cli.config)?;
            let mut session = open_session(&settings)?;
            play(&mut session, &settings).await?;
        }
        Commands::Game(command) => {
            let settings = Settings::load(&cli.config)?;
            let mut session = open_session(&settings)?;
            execute(&mut session, &settings, command).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn open_session(settings: &Settings) -> Result<GameSession<SledStore>> {
    let store = SledStore::open(&settings.storage.path)
        .with_context(|| format!("Failed to open storage at {}", settings.storage.path))?;
    let mut session = GameSession::open(store, settings)?;
    session
        .log_mut()
        .info(format!("Initializing Color Prediction Game v{}...", VERSION));
    Ok(session)
}

fn write_default_config(output: &str, force: bool) -> Result<()> {
    if Path::new(output).exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output);
    }
    std::fs::write(output, Settings::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", output))?;
    info!("Wrote default configuration to {}", output);
    Ok(())
}

async fn play(session: &mut GameSession<SledStore>, settings: &Settings) -> Result<()> {
    print!("{}", panels::home(session));
    println!("Type `help` for commands, `quit` to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let parsed = match PlayLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Also covers `help`
                print!("{}", e);
                continue;
            }
        };

        match parsed.command {
            PlayCommand::Quit => break,
            PlayCommand::Game(command) => {
                debug!("play: {:?}", command);
                if let Err(e) = execute(session, settings, command).await {
                    session.log_mut().error(e.to_string());
                    println!("Error: {}", e);
                }
            }
        }
    }

    info!("Session ended");
    Ok(())
}

async fn execute<S: KeyValueStore>(
    session: &mut GameSession<S>,
    settings: &Settings,
    command: GameCommand,
) -> Result<()> {
    match command {
        GameCommand::Home => print!("{}", panels::home(session)),
        GameCommand::Predict { digits } => {
            let prediction = session.predict_heuristic(digits.trim())?;
            print!("{}", panels::prediction(&prediction));
        }
        GameCommand::Add { period, result } => {
            let added = session.add_outcome(&period, &result)?;
            match added.scored {
                Some(true) => println!("Last prediction was correct!"),
                Some(false) => println!("Last prediction was incorrect."),
                None => {}
            }
            println!("Saved period {} result {}", added.outcome.period(), added.outcome.value());
        }
        GameCommand::Train => {
            let mut rng = training_rng(&settings.training);
            let report = session.train_model(&mut rng)?;
            print!("{}", panels::training(&report));
        }
        GameCommand::ModelPredict { code } => {
            let prediction = session.predict_with_model(code.as_deref())?;
            print!("{}", panels::model_prediction(&prediction));
        }
        GameCommand::Clear => {
            session.clear_prediction();
            println!("Prediction cleared.");
        }
        GameCommand::Stats => print!("{}", panels::stats(session)),
        GameCommand::History { limit } => print!("{}", panels::history(session.outcomes(), limit)),
        GameCommand::Last => print!("{}", panels::last_ten(session.last(10))),
        GameCommand::Trends => {
            let trends = session.trends();
            print!("{}", panels::recent_trends(&trends, trends.len()));
        }
        GameCommand::Model => match session.model() {
            Some(model) => print!("{}", panels::model(model)),
            None => return Err(error::GameError::NoModel.into()),
        },
        GameCommand::Log { limit } => print!("{}", panels::activity(session, limit)),
        GameCommand::Export { output } => {
            let json = session.export_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path))?;
                    println!("Exported {} results to {}", session.outcomes().len(), path);
                }
                None => println!("{}", json),
            }
        }
        GameCommand::Import { input } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input))?;
            let count = session.import_json(&text)?;
            println!("Imported {} results", count);
        }
        GameCommand::Reset { yes } => {
            if !yes {
                return Err(anyhow!("Reset all stored game data? This cannot be undone. Re-run with --yes"));
            }
            session.reset()?;
            print!("{}", panels::home(session));
        }
        GameCommand::Connect => {
            let server = SimulatedServer::new(settings.server.clone());
            server.connect(session.log_mut()).await?;
            print!("{}", panels::activity(session, 4));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_game_commands() {
        let cli = Cli::try_parse_from(["color-prediction", "add", "105", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Game(GameCommand::Add { ref period, ref result }) if period == "105" && result == "7"
        ));

        let cli = Cli::try_parse_from(["color-prediction", "model-predict", "--code", "123"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Game(GameCommand::ModelPredict { code: Some(ref c) }) if c == "123"
        ));
    }

    #[test]
    fn test_play_line_parsing() {
        let line = PlayLine::try_parse_from(["predict", "124"]).unwrap();
        assert!(matches!(
            line.command,
            PlayCommand::Game(GameCommand::Predict { ref digits }) if digits == "124"
        ));
        assert!(matches!(
            PlayLine::try_parse_from(["exit"]).unwrap().command,
            PlayCommand::Quit
        ));
        assert!(PlayLine::try_parse_from(["fly"]).is_err());
    }

    #[tokio::test]
    async fn test_failed_command_leaves_reporting_to_caller() {
        let settings = Settings::default();
        let store = storage::MemoryStore::new().with_entry(&settings.storage.data_key, "[]");
        let mut session = GameSession::open(store, &settings).unwrap();

        let err = execute(&mut session, &settings, GameCommand::Predict { digits: "12".into() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("3 digits"), "{}", err);
        assert!(session
            .log()
            .recent(usize::MAX)
            .iter()
            .all(|entry| entry.severity != notifications::Severity::Error));
    }
}
