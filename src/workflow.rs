// One run from start to finish: authenticate, select, publish, then commit the
// used-set. The used-set is only ever touched after an album id came back.

use crate::api::ImageHost;
use crate::config::Config;
use crate::errors::MemeError;
use crate::publisher::{publish_batch, AlbumTemplate};
use crate::selector;
use crate::used::UsedStore;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Progress of a run. `Committed` is the successful terminal state; a
/// `WorkflowError` carries the state a run was aborted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Authenticated,
    Selected,
    Published,
    Committed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Authenticated => "authenticated",
            Stage::Selected => "selected",
            Stage::Published => "published",
            Stage::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// A fatal error and the state the run was in when it happened.
#[derive(Debug, Error)]
#[error("run aborted in state '{stage}': {source}")]
pub struct WorkflowError {
    pub stage: Stage,
    #[source]
    pub source: MemeError,
}

/// What a run produced when it did not abort.
#[derive(Debug)]
pub enum RunOutcome {
    /// Limit was zero; nothing was contacted or written.
    NothingToDo,
    Published(PublishedAlbum),
}

#[derive(Debug)]
pub struct PublishedAlbum {
    pub album_id: String,
    pub url: String,
    pub items: Vec<String>,
    /// Set when the album went up but the used-set append failed. The
    /// items may be picked again next run.
    pub commit_error: Option<MemeError>,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_dir: PathBuf,
    pub limit: usize,
    pub album: AlbumTemplate,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        RunSettings {
            source_dir: config.memes.clone(),
            limit: config.limit,
            album: AlbumTemplate {
                title_prefix: config.imgur_album_title_prefix.clone(),
                description: config.imgur_album_desc.clone(),
            },
        }
    }
}

pub struct Workflow {
    settings: RunSettings,
    store: UsedStore,
}

impl Workflow {
    pub fn new(settings: RunSettings, store: UsedStore) -> Self {
        Self { settings, store }
    }

    /// Execute one run. `connect` establishes the authenticated session and
    /// is not called at all when the limit is zero.
    pub fn run<H, F, R>(
        &self,
        connect: F,
        rng: &mut R,
        date: NaiveDate,
        progress: &ProgressBar,
    ) -> Result<RunOutcome, WorkflowError>
    where
        H: ImageHost,
        F: FnOnce() -> Result<H, MemeError>,
        R: Rng + ?Sized,
    {
        if self.settings.limit == 0 {
            log::info!("Limit is 0, nothing to do");
            return Ok(RunOutcome::NothingToDo);
        }

        let mut stage = Stage::Init;
        let abort = |stage: Stage| move |source: MemeError| WorkflowError { stage, source };

        let host = connect().map_err(abort(stage))?;
        stage = Stage::Authenticated;
        log::info!("State: {}", stage);

        let used = self.store.load().map_err(abort(stage))?;
        log::info!("Loaded {} used meme(s) from {}", used.len(), self.store.path().display());
        let eligible =
            selector::list_eligible(&self.settings.source_dir, &used).map_err(abort(stage))?;
        let batch = selector::sample(&eligible, self.settings.limit, rng).map_err(abort(stage))?;
        stage = Stage::Selected;
        log::info!(
            "State: {} ({} of {} eligible meme(s))",
            stage,
            batch.len(),
            eligible.len()
        );

        progress.set_length(batch.len() as u64);
        let published = publish_batch(
            &host,
            &self.settings.source_dir,
            &batch,
            &self.settings.album,
            date,
            progress,
        );
        progress.finish_and_clear();
        let album_id = published.map_err(abort(stage))?;
        stage = Stage::Published;
        log::info!("State: {} (album {})", stage, album_id);

        let url = host.album_url(&album_id);
        let commit_error = match self.store.commit(&batch) {
            Ok(()) => {
                log::info!("State: {}", Stage::Committed);
                None
            }
            Err(e) => {
                log::error!("Album {} is live but the used-set was not updated: {}", url, e);
                Some(e)
            }
        };

        Ok(RunOutcome::Published(PublishedAlbum {
            album_id,
            url,
            items: batch,
            commit_error,
        }))
    }
}
