mod api;
mod app;
mod commands;
mod commentary;
mod config;
mod errors;
mod imaging;
mod logging;
mod output;
mod parse;
mod prompts;
mod script;
mod sequence;
mod services;
mod tui;

use clap::{Parser, Subcommand};

use crate::app::Runtime;
use crate::commands::commentary::CommentaryArgs;
use crate::commands::config::ConfigCommand;
use crate::commands::images::ImagesArgs;
use crate::commands::tui::TuiArgs;
use crate::errors::CliError;
use crate::output::{OutputMode, print_error};

#[derive(Debug, Parser)]
#[command(
    name = "scriptreview",
    version,
    about = "Critique a movie script's cinematography and render stills for its beginning, middle and end."
)]
struct Cli {
    #[arg(long, global = true)]
    profile: Option<String>,
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    quiet: bool,
    /// Request timeout in milliseconds; image generation is slow
    #[arg(long, global = true, default_value_t = 120_000)]
    timeout: u64,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Cinematography commentary for a script
    Commentary(CommentaryArgs),
    /// Three stills for the script's beginning, middle and end
    Images(ImagesArgs),
    /// Interactive editor with commentary and still panes
    Tui(TuiArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    if let Err(err) = init_logging(&cli.command, &output) {
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }

    let result = run(cli, output.clone()).await;
    if let Err(err) = result {
        tracing::debug!(error = ?err, "command failed");
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }
}

fn init_logging(command: &Commands, output: &OutputMode) -> Result<(), CliError> {
    match command {
        Commands::Tui(_) => logging::init_file(output, &config::tui_log_path()?),
        _ => {
            logging::init_stderr(output);
            Ok(())
        }
    }
}

async fn run(cli: Cli, output: OutputMode) -> Result<(), CliError> {
    let config = config::load_config()?;
    let config_path = config::config_path()?;

    let mut runtime = Runtime {
        output,
        config,
        config_path,
        profile_override: cli.profile,
        api_url_override: cli.api_url,
        timeout_ms: cli.timeout,
    };
    tracing::debug!(
        config = %runtime.config_path.display(),
        profile = %runtime.active_profile(),
        "loaded config"
    );

    match cli.command {
        Commands::Config { command } => commands::config::handle(&mut runtime, command).await,
        Commands::Commentary(args) => commands::commentary::handle(&runtime, args).await,
        Commands::Images(args) => commands::images::handle(&runtime, args).await,
        Commands::Tui(args) => commands::tui::handle(&runtime, args).await,
    }
}
