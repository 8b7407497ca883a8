// Publisher: pushes one batch to the hosting service and wraps the uploads in
// a dated album.

use crate::api::{ImageHost, NewAlbum, Privacy};
use crate::errors::MemeResult;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use std::path::Path;

/// Fixed parts of every album; the title gets the run date appended.
#[derive(Debug, Clone)]
pub struct AlbumTemplate {
    pub title_prefix: String,
    pub description: String,
}

impl AlbumTemplate {
    /// `"{prefix} YYYY-MM-DD"`.
    pub fn title_for(&self, date: NaiveDate) -> String {
        format!("{} {}", self.title_prefix, date.format("%Y-%m-%d"))
    }
}

/// Upload `batch` from `dir` one file at a time, in order, then bundle the
/// results into a single public album and return its id.
///
/// The first failed upload aborts the whole batch. Images uploaded before it
/// stay on the service; nothing is cleaned up remotely.
pub fn publish_batch<H: ImageHost + ?Sized>(
    host: &H,
    dir: &Path,
    batch: &[String],
    template: &AlbumTemplate,
    date: NaiveDate,
    progress: &ProgressBar,
) -> MemeResult<String> {
    let mut image_ids = Vec::with_capacity(batch.len());
    for item in batch {
        progress.set_message(item.clone());
        let remote_id = host.upload_image(&dir.join(item))?;
        log::debug!("Uploaded {} as {}", item, remote_id);
        image_ids.push(remote_id);
        progress.inc(1);
    }

    let album = NewAlbum {
        title: template.title_for(date),
        description: template.description.clone(),
        image_ids,
        privacy: Privacy::Public,
    };
    progress.set_message("creating album");
    let album_id = host.create_album(&album)?;
    log::info!("Created album {} with {} image(s)", album_id, album.image_ids.len());
    Ok(album_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MemeError;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        uploads: RefCell<Vec<PathBuf>>,
        albums: RefCell<Vec<NewAlbum>>,
        fail_on: Option<&'static str>,
    }

    impl ImageHost for Recorder {
        fn upload_image(&self, path: &Path) -> MemeResult<String> {
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            if self.fail_on == Some(name.as_str()) {
                return Err(MemeError::Upload {
                    item: name,
                    reason: "network down".into(),
                });
            }
            self.uploads.borrow_mut().push(path.to_path_buf());
            Ok(format!("id-{}", name))
        }

        fn create_album(&self, album: &NewAlbum) -> MemeResult<String> {
            self.albums.borrow_mut().push(album.clone());
            Ok("album1".into())
        }
    }

    fn template() -> AlbumTemplate {
        AlbumTemplate {
            title_prefix: "Daily memes".into(),
            description: "Fresh".into(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn title_uses_iso_date() {
        assert_eq!(template().title_for(date()), "Daily memes 2024-03-09");
    }

    #[test]
    fn uploads_in_order_then_creates_one_public_album() {
        let host = Recorder::default();
        let batch = vec!["b.jpg".to_string(), "a.jpg".to_string()];
        let progress = ProgressBar::hidden();

        let album = publish_batch(&host, Path::new("/memes"), &batch, &template(), date(), &progress)
            .unwrap();

        assert_eq!(album, "album1");
        assert_eq!(
            *host.uploads.borrow(),
            vec![PathBuf::from("/memes/b.jpg"), PathBuf::from("/memes/a.jpg")]
        );
        let albums = host.albums.borrow();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "Daily memes 2024-03-09");
        assert_eq!(albums[0].description, "Fresh");
        assert_eq!(albums[0].image_ids, vec!["id-b.jpg", "id-a.jpg"]);
        assert_eq!(albums[0].privacy, Privacy::Public);
        assert_eq!(progress.position(), 2);
    }

    #[test]
    fn failed_upload_aborts_before_album() {
        let host = Recorder {
            fail_on: Some("b.jpg"),
            ..Recorder::default()
        };
        let batch: Vec<String> = ["a.jpg", "b.jpg", "c.jpg"].iter().map(|s| s.to_string()).collect();

        let err = publish_batch(
            &host,
            Path::new("/memes"),
            &batch,
            &template(),
            date(),
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, MemeError::Upload { ref item, .. } if item == "b.jpg"));
        assert_eq!(host.uploads.borrow().len(), 1);
        assert!(host.albums.borrow().is_empty());
    }
}
