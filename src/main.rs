#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use hyprrice::catalog::ParamCatalog;
use hyprrice::classifier::classify_text;
use hyprrice::config::{recommendations, FileGateway};
use hyprrice::constants::scope::GLOBAL;
use hyprrice::engine::{EditingSession, Scope, SessionContext, SystemClock};
use hyprrice::events::EventBus;
use hyprrice::hyprctl::Hyprctl;

#[derive(Parser)]
#[command(name = "hyprrice")]
#[command(about = "Override engine for Hyprland rices")]
#[command(version)]
struct Cli {
    /// Base config directory (default: XDG config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Base data directory (default: XDG data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the keybindings and features of a compositor config
    Classify {
        file: PathBuf,
    },

    /// Print the effective value of a parameter
    Get {
        rice: String,
        path: String,
    },

    /// Override a parameter for one rice (empty value clears it)
    Set {
        rice: String,
        path: String,
        value: String,
    },

    /// Drop every override of a rice
    Clear {
        rice: String,
    },

    /// Promote a rice's value to every rice
    Promote {
        rice: String,
        path: String,
    },

    /// Drop a rice's override in favour of the global value
    UseGlobal {
        rice: String,
        path: String,
    },

    /// Print or set a global override
    Global {
        path: String,
        value: Option<String>,
    },

    /// Seed monitor and keyboard values from the running system
    Detect {
        rice: String,
    },

    /// Turn realtime apply on or off; turning it on replays the overrides
    /// of `rice` (global overrides only when omitted)
    Realtime {
        #[arg(value_enum)]
        state: Toggle,
        rice: Option<String>,
    },

    /// Seed system values whenever a rice is opened
    Autodetect {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Push every resolved override of a rice to the compositor
    Apply {
        rice: String,
    },

    /// Enable or disable a built-in recommendation
    Recommend {
        id: String,
        #[arg(value_enum)]
        state: Toggle,
    },

    /// List built-in recommendations
    Recommendations,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(t: Toggle) -> Self {
        matches!(t, Toggle::On)
    }
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let gateway = match (cli.config_dir, cli.data_dir) {
        (None, None) => FileGateway::from_env(),
        (config, data) => {
            let config = config
                .or_else(dirs::config_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            let data = data.or_else(dirs::data_dir).unwrap_or_else(|| config.clone());
            FileGateway::new(config, data)
        }
    };

    let ctx = SessionContext {
        storage: Rc::new(gateway),
        applier: Rc::new(Hyprctl),
        clock: Rc::new(SystemClock),
        catalog: Rc::new(ParamCatalog::builtin()),
        bus: EventBus::new(),
    };
    let open = |name: &str| {
        let mut session = EditingSession::open(Scope::parse(name), ctx.clone());
        session.run_deferred_auto_detect(&Hyprctl);
        session
    };

    match cli.command {
        Commands::Classify { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let classification = classify_text(&text);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Commands::Get { rice, path } => {
            let session = open(&rice);
            match session.get(&path) {
                Some(value) => println!("{value}"),
                None => println!("<{}>", session.placeholder_for(&path)),
            }
        }
        Commands::Set { rice, path, value } => {
            let mut session = open(&rice);
            if !session.set(&path, &value) {
                info!(path = %path, "value unchanged");
            }
            session.flush_realtime();
        }
        Commands::Clear { rice } => {
            let mut session = open(&rice);
            let cleared = session.clear_all();
            session.flush_realtime();
            println!("cleared {cleared} overrides");
        }
        Commands::Promote { rice, path } => {
            let mut session = open(&rice);
            if !session.can_promote(&path) {
                bail!("{path} has nothing to promote in {rice}");
            }
            match session.promote(&path) {
                Some(value) => println!("{path} = {value} (global)"),
                None => println!("{path} unchanged"),
            }
            session.commit();
            session.flush_realtime();
        }
        Commands::UseGlobal { rice, path } => {
            let mut session = open(&rice);
            let effective = session.use_global(&path);
            session.flush_realtime();
            println!("{path} = {}", effective.unwrap_or_default());
        }
        Commands::Global { path, value } => {
            let mut session = open(GLOBAL);
            match value {
                Some(value) => {
                    session.set_global(&path, &value);
                    session.flush_realtime();
                }
                None => println!("{}", session.get(&path).unwrap_or_default()),
            }
        }
        Commands::Detect { rice } => {
            let mut session = EditingSession::open(Scope::parse(&rice), ctx.clone());
            session.cancel_auto_detect();
            let seeded = session.run_auto_detect(&Hyprctl);
            session.flush_realtime();
            println!("seeded {seeded} values");
        }
        Commands::Realtime { state, rice } => {
            let enabled: bool = state.into();
            let mut session = open(rice.as_deref().unwrap_or(GLOBAL));
            let replayed = session.set_realtime_enabled(enabled);
            println!("realtime apply {}, {replayed} keywords pushed", if enabled { "on" } else { "off" });
        }
        Commands::Autodetect { state } => {
            let enabled: bool = state.into();
            let session = open(GLOBAL);
            if !session.set_auto_detect_enabled(enabled) {
                bail!("failed to save the auto-detect setting");
            }
            println!("auto-detect {}", if enabled { "on" } else { "off" });
        }
        Commands::Apply { rice } => {
            let session = open(&rice);
            let applied = session.apply_now();
            println!("applied {applied} keywords");
        }
        Commands::Recommend { id, state } => {
            let Some(recommendation) = recommendations::builtin().into_iter().find(|r| r.id() == id) else {
                bail!("unknown recommendation {id}");
            };
            let mut session = open(GLOBAL);
            session.set_recommendation(&recommendation, state.into());
            session.flush_realtime();
        }
        Commands::Recommendations => {
            let session = open(GLOBAL);
            for recommendation in recommendations::builtin() {
                let mark = if session.is_recommendation_enabled(&recommendation) { "x" } else { " " };
                println!("[{mark}] {:<45} {}", recommendation.id(), recommendation.title);
            }
        }
    }

    Ok(())
}
