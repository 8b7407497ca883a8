// UI layer: everything the operator sees. Run results go to stdout, the
// upload progress bar to stderr, and `authorize` is a short dialoguer flow.

use crate::api::{self, parse_authorization_redirect};
use crate::config::Config;
use crate::workflow::{PublishedAlbum, RunOutcome};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Printed when the limit is zero.
pub const NOTHING_TO_DO: &str = "No more memes to upload";

/// Progress bar shown while memes upload. Length is set once the batch is known.
pub fn upload_progress() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// The line printed for a finished run.
pub fn outcome_line(outcome: &RunOutcome) -> &str {
    match outcome {
        RunOutcome::NothingToDo => NOTHING_TO_DO,
        RunOutcome::Published(PublishedAlbum { url, .. }) => url.as_str(),
    }
}

/// Print the run result as a single stdout line a scheduler can capture. A
/// failed used-set commit is already logged by the workflow.
pub fn report(outcome: &RunOutcome) {
    println!("{}", outcome_line(outcome));
}

/// Walk the operator through granting account access and store the tokens
/// in the config file at `config_path`.
pub fn authorize(config_path: &Path) -> Result<()> {
    let mut config = Config::read(config_path)
        .with_context(|| format!("Loading {}", config_path.display()))?;
    let base_url =
        std::env::var(api::API_URL_ENV_VAR).unwrap_or_else(|_| api::DEFAULT_API_URL.into());
    let url = api::authorize_url(&base_url, &config.imgur_client_id)?;

    println!("Open this URL in a browser and allow access:\n\n  {}\n", url);
    let redirect: String = Input::new()
        .with_prompt("Paste the URL you were redirected to")
        .interact_text()?;
    let (access, refresh) = parse_authorization_redirect(&redirect)?;

    let save = Confirm::new()
        .with_prompt(format!("Save tokens to {}?", config_path.display()))
        .default(true)
        .interact()?;
    if !save {
        println!("imgur_access_token = {}", access);
        println!("imgur_refresh_token = {}", refresh);
        return Ok(());
    }
    config.imgur_access_token = access;
    config.imgur_refresh_token = refresh;
    config.save(config_path)?;
    log::info!("Stored new tokens in {}", config_path.display());
    println!("Tokens saved.");
    Ok(())
}
