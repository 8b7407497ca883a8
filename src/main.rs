// Entrypoint for the CLI application.
// - Keeps `main` small: resolve the config, build the workflow and hand the
//   result to the UI layer.
// - Exit codes: 0 published or nothing to do, 1 aborted run, 2 published
//   but the used-set could not be updated.

use anyhow::Context;
use clap::{Parser, Subcommand};
use daily_memes::api::ImgurClient;
use daily_memes::config::{resolve_config_path, Config};
use daily_memes::ui;
use daily_memes::used::UsedStore;
use daily_memes::workflow::{RunOutcome, RunSettings, Workflow};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "daily-memes")]
#[command(version)]
#[command(about = "Post a random batch of unused memes as a public Imgur album", long_about = None)]
struct Cli {
    /// Config file (defaults to $DAILY_MEMES_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload one batch and record it as used (default)
    Run,
    /// Obtain account tokens interactively and save them to the config
    Authorize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config_path),
        Commands::Authorize => ui::authorize(&config_path).map(|_| ExitCode::SUCCESS),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &std::path::Path) -> anyhow::Result<ExitCode> {
    let config = Config::load(config_path)
        .with_context(|| format!("Loading {}", config_path.display()))?;
    let store = UsedStore::new(config.used_path());
    let workflow = Workflow::new(RunSettings::from(&config), store);
    let progress = ui::upload_progress();
    let outcome = workflow.run(
        || {
            let client = ImgurClient::from_env(config.credentials())?.authenticate()?;
            let mut updated = config.clone();
            if updated.adopt_tokens(client.credentials()) {
                match updated.save(config_path) {
                    Ok(()) => log::info!("Saved rotated tokens to {}", config_path.display()),
                    Err(e) => log::warn!("Could not save rotated tokens: {}", e),
                }
            }
            Ok(client)
        },
        &mut rand::rng(),
        chrono::Local::now().date_naive(),
        &progress,
    )?;

    ui::report(&outcome);
    let code = match outcome {
        RunOutcome::Published(album) if album.commit_error.is_some() => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    };
    Ok(code)
}
