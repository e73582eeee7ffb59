use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use keyfit_core::config::Config;
use keyfit_core::geometry::{LayoutDefinition, LayoutLoader};
use keyfit_core::keycodes::KeyNameRegistry;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info, warn};

mod cmd;
mod gateway;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the monitoring service.
    #[arg(global = true, short, long, default_value = "http://127.0.0.1:4750")]
    backend: String,

    /// JSON file with geometry/query settings. Flags still win.
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[arg(global = true, long, default_value = "keyfit-settings.json")]
    prefs: PathBuf,

    /// JSON list of `{code, label}` display-name overrides.
    #[arg(global = true, long)]
    key_names: Option<PathBuf>,

    /// Custom layout (native JSON or a Keyboard Layout Editor export).
    #[arg(global = true, long)]
    layout_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = 2000)]
    poll_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Key ranking for the selected scope.
    Ranking(cmd::ranking::RankingArgs),
    /// Keyboard heatmap for the selected scope.
    Heatmap(cmd::heatmap::HeatmapArgs),
    /// Recorded applications and their lifetime totals.
    Apps,
    /// Whether the monitor is currently recording.
    Status,
    /// Starts or stops recording.
    Toggle,
    /// Shows or changes the stored keyboard layout.
    Layout(cmd::layout::LayoutArgs),
    /// Follows the monitoring status until interrupted.
    Watch(cmd::monitor::WatchArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // `layout` only touches the preference file.
    if let Commands::Layout(args) = &cli.command {
        exit_on_error(cmd::layout::run(args, &cli.prefs));
        return;
    }

    let mut config = match &cli.config {
        Some(path) => {
            info!("📂 Loading Config: {}", path.display());
            Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };

    let sub = matches.subcommand();
    match (&cli.command, sub) {
        (Commands::Ranking(args), Some((_, sub_matches))) => {
            config.merge_from_cli(&args.view.config, sub_matches)
        }
        (Commands::Heatmap(args), Some((_, sub_matches))) => {
            config.merge_from_cli(&args.view.config, sub_matches)
        }
        _ => {}
    }

    let key_names = match &cli.key_names {
        Some(path) => KeyNameRegistry::load_from_file(path).unwrap_or_else(|e| {
            warn!("Failed to load key names: {}. Using defaults.", e);
            KeyNameRegistry::new_with_defaults()
        }),
        None => KeyNameRegistry::new_with_defaults(),
    };

    let custom_layout = cli.layout_file.as_ref().map(|path| {
        info!("⌨️  Loading Layout: {}", path.display());
        LayoutDefinition::load_from_file(path, &key_names).unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        })
    });

    let session = cmd::Session {
        backend: cli.backend.clone(),
        poll_interval: Duration::from_millis(cli.poll_ms.max(1)),
        prefs: cli.prefs.clone(),
        config,
        key_names,
        custom_layout,
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        error!("Failed to start runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async move {
        match cli.command {
            Commands::Ranking(args) => cmd::ranking::run(args, session).await,
            Commands::Heatmap(args) => cmd::heatmap::run(args, session).await,
            Commands::Apps => cmd::monitor::apps(session).await,
            Commands::Status => cmd::monitor::status(session).await,
            Commands::Toggle => cmd::monitor::toggle(session).await,
            Commands::Watch(args) => cmd::monitor::watch(args, session).await,
            Commands::Layout(_) => Ok(()),
        }
    });
    exit_on_error(result);
}

fn exit_on_error(result: Result<(), cmd::CmdError>) {
    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
