use reqwest::blocking::Client as HttpClient;
use serde::de::DeserializeOwned;
use url::Url;

use drivedex_types::{FileId, PageToken};

use crate::error::{Error, Result};
use crate::wire::{ChangeList, FileFields, FileList, RevisionList, StartPageTokenResponse};

/// Read-only Drive metadata operations the pipeline depends on.
///
/// The trait is the seam between the sync logic and the network: production
/// code talks to [`HttpDriveClient`], tests substitute an in-memory fake.
pub trait DriveApi {
    /// Current head-of-feed token for a fresh sync
    fn start_page_token(&self) -> Result<PageToken>;

    /// One page of the change feed at `page_token`
    fn list_changes(&self, page_token: &PageToken) -> Result<ChangeList>;

    /// One page of the file listing; `None` starts from the beginning
    fn list_files(&self, page_token: Option<&PageToken>) -> Result<FileList>;

    /// All revisions of a single file (the API does not batch this)
    fn list_revisions(&self, file_id: &FileId) -> Result<RevisionList>;

    /// Name and parent ids of a single file, for path reconstruction
    fn file_fields(&self, file_id: &FileId) -> Result<FileFields>;
}

/// Blocking HTTP implementation against the live Drive v3 endpoint
#[derive(Debug, Clone)]
pub struct HttpDriveClient {
    http: HttpClient,
    base_url: Url,
    bearer_token: String,
}

impl HttpDriveClient {
    pub fn new(base_url: Url, bearer_token: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .user_agent(concat!("drivedex/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default TLS backend available");

        Self {
            http,
            base_url,
            bearer_token: bearer_token.into(),
        }
    }

    pub fn from_url(base_url: &str, bearer_token: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::new(base_url, bearer_token))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn get_json<T: DeserializeOwned>(&self, mut url: Url, query: &[(&str, &str)]) -> Result<T> {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }

        tracing::debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }
}

impl DriveApi for HttpDriveClient {
    fn start_page_token(&self) -> Result<PageToken> {
        let url = self.endpoint("changes/startPageToken")?;
        let response: StartPageTokenResponse = self.get_json(url, &[])?;
        Ok(PageToken::from(response.start_page_token))
    }

    fn list_changes(&self, page_token: &PageToken) -> Result<ChangeList> {
        let url = self.endpoint("changes")?;
        self.get_json(url, &[("pageToken", page_token.as_str()), ("spaces", "drive")])
    }

    fn list_files(&self, page_token: Option<&PageToken>) -> Result<FileList> {
        let url = self.endpoint("files")?;
        match page_token {
            Some(token) => {
                self.get_json(url, &[("pageToken", token.as_str()), ("spaces", "drive")])
            }
            None => self.get_json(url, &[("spaces", "drive")]),
        }
    }

    fn list_revisions(&self, file_id: &FileId) -> Result<RevisionList> {
        let url = self.endpoint(&format!("files/{}/revisions", file_id))?;
        self.get_json(url, &[])
    }

    fn file_fields(&self, file_id: &FileId) -> Result<FileFields> {
        let url = self.endpoint(&format!("files/{}", file_id))?;
        self.get_json(url, &[("fields", "name,parents")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_relative_paths() {
        let client =
            HttpDriveClient::from_url("https://www.googleapis.com/drive/v3/", "token").unwrap();

        let url = client.endpoint("changes/startPageToken").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/drive/v3/changes/startPageToken"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(HttpDriveClient::from_url("not a url", "token").is_err());
    }
}
