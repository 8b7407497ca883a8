// Hosting-service client: a small blocking HTTP client for the Imgur v3 API.
// Everything network-facing lives here; the rest of the crate talks to the
// `ImageHost` trait so the workflow can run against a fake in tests.

use crate::errors::{MemeError, MemeResult};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV_VAR: &str = "IMGUR_API_URL";
pub const DEFAULT_API_URL: &str = "https://api.imgur.com";
/// Public albums are served from here, not from the API host.
pub const ALBUM_URL_BASE: &str = "https://imgur.com/a/";

/// Operations the publisher needs from a hosting service.
pub trait ImageHost {
    /// Upload one local file and return the service-assigned id.
    fn upload_image(&self, path: &Path) -> MemeResult<String>;
    /// Group already uploaded images into one album and return its id.
    fn create_album(&self, album: &NewAlbum) -> MemeResult<String>;
    /// Human-facing URL of an album.
    fn album_url(&self, album_id: &str) -> String {
        format!("{}{}", ALBUM_URL_BASE, album_id)
    }
}

/// Album visibility as the API spells it. Albums are always posted public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privacy {
    #[default]
    Public,
}

impl Privacy {
    pub fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
        }
    }
}

/// Album creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub description: String,
    pub image_ids: Vec<String>,
    pub privacy: Privacy,
}

/// Long-lived account credentials, treated as opaque strings.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Every v3 response is wrapped as `{ data, success, status }`.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct IdData {
    id: String,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Blocking Imgur client authenticated as a user account (never anonymous).
pub struct ImgurClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl ImgurClient {
    /// Build a client against `IMGUR_API_URL`, or the public API when unset.
    pub fn from_env(credentials: Credentials) -> MemeResult<Self> {
        let base_url =
            std::env::var(API_URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::with_base_url(credentials, base_url)
    }

    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> MemeResult<Self> {
        let client = Client::builder().build().map_err(|e| {
            MemeError::Authentication(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(ImgurClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Exchange the refresh token for a fresh access token. The returned
    /// client uses it for every later call.
    pub fn authenticate(mut self) -> MemeResult<Self> {
        let url = format!("{}/oauth2/token", self.base_url);
        let params = [
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let res = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .map_err(|e| MemeError::Authentication(format!("token request failed: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            return Err(MemeError::Authentication(format!("{} - {}", status, txt)));
        }
        let token: TokenResponse = res
            .json()
            .map_err(|e| MemeError::Authentication(format!("unreadable token response: {}", e)))?;
        self.credentials.access_token = token.access_token;
        if let Some(refresh) = token.refresh_token {
            if refresh != self.credentials.refresh_token {
                log::info!("Refresh token was rotated by the service");
                self.credentials.refresh_token = refresh;
            }
        }
        log::info!("Authenticated against {}", self.base_url);
        Ok(self)
    }

    /// Credentials in use, including any tokens refreshed by `authenticate`.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn auth_headers(&self) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", self.credentials.access_token);
        let val = HeaderValue::from_str(&val).map_err(|e| format!("invalid access token: {}", e))?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }
}

impl ImageHost for ImgurClient {
    fn upload_image(&self, path: &Path) -> MemeResult<String> {
        let item = path.display().to_string();
        let fail = |reason: String| MemeError::Upload {
            item: item.clone(),
            reason,
        };
        let url = format!("{}/3/image", self.base_url);

        let file = File::open(path).map_err(|e| fail(format!("cannot open file: {}", e)))?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let part = multipart::Part::reader(file)
            .file_name(file_name.clone())
            .mime_str(mime_for(path))
            .map_err(|e| fail(e.to_string()))?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("type", "file")
            .text("name", file_name);

        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers().map_err(fail)?)
            .multipart(form)
            .send()
            .map_err(|e| fail(format!("request failed: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            return Err(fail(format!("{} - {}", status, txt)));
        }
        let body: Envelope<IdData> = res
            .json()
            .map_err(|e| fail(format!("unreadable upload response: {}", e)))?;
        Ok(body.data.id)
    }

    fn create_album(&self, album: &NewAlbum) -> MemeResult<String> {
        let url = format!("{}/3/album", self.base_url);
        let headers = self.auth_headers().map_err(MemeError::AlbumCreation)?;
        let res = self
            .client
            .post(&url)
            .headers(headers)
            .form(&album_form(album))
            .send()
            .map_err(|e| MemeError::AlbumCreation(format!("request failed: {}", e)))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            return Err(MemeError::AlbumCreation(format!("{} - {}", status, txt)));
        }
        let body: Envelope<IdData> = res
            .json()
            .map_err(|e| MemeError::AlbumCreation(format!("unreadable album response: {}", e)))?;
        Ok(body.data.id)
    }
}

/// Form fields for `POST /3/album`; image ids go in repeated `ids[]` entries.
fn album_form(album: &NewAlbum) -> Vec<(&'static str, &str)> {
    let mut form = vec![
        ("title", album.title.as_str()),
        ("description", album.description.as_str()),
        ("privacy", album.privacy.as_str()),
    ];
    form.extend(album.image_ids.iter().map(|id| ("ids[]", id.as_str())));
    form
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// URL the operator opens to grant this client access to their account.
pub fn authorize_url(base_url: &str, client_id: &str) -> MemeResult<Url> {
    let endpoint = format!("{}/oauth2/authorize", base_url.trim_end_matches('/'));
    Url::parse_with_params(
        &endpoint,
        &[("client_id", client_id), ("response_type", "token")],
    )
    .map_err(|e| MemeError::Config(format!("invalid authorize URL: {}", e)))
}

/// Pull `(access_token, refresh_token)` out of the URL Imgur redirected to.
/// Tokens arrive in the fragment; a query string is accepted as well.
pub fn parse_authorization_redirect(redirect: &str) -> MemeResult<(String, String)> {
    let url = Url::parse(redirect.trim())
        .map_err(|e| MemeError::Config(format!("not a URL: {}", e)))?;
    let params = match url.fragment() {
        Some(fragment) => {
            let mut carrier = url.clone();
            carrier.set_query(Some(fragment));
            carrier
        }
        None => url,
    };
    let mut access = None;
    let mut refresh = None;
    for (key, value) in params.query_pairs() {
        match key.as_ref() {
            "access_token" => access = Some(value.into_owned()),
            "refresh_token" => refresh = Some(value.into_owned()),
            _ => {}
        }
    }
    match (access, refresh) {
        (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => Ok((a, r)),
        _ => Err(MemeError::Config(
            "redirect URL carries no access_token/refresh_token pair".into(),
        )),
    }
}
