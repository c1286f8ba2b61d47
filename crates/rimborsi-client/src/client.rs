//! Rimborsi HTTP client implementation.

use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use rimborsi_core::{Entry, EntryId, NewEntry, Person, Year};

use crate::error::ClientError;
use crate::types::{
    ApiEnvelope, ApiErrorResponse, ArchiveChunk, ArchiveDownload, Attachment, CreateEntryRequest,
    DeleteEntryRequest, ReplacePeopleRequest,
};

/// Rimborsi API client.
///
/// Every call carries the shared bearer token.
#[derive(Debug, Clone)]
pub struct RimborsiClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl RimborsiClient {
    /// Create a new rimborsi client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the rimborsi service (e.g., `"http://rimborsi:8080"`)
    /// * `token` - Shared bearer token
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, token, ClientOptions::default())
    }

    /// Create a new rimborsi client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn with_options(
        base_url: &str,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Check whether the service is up. Does not send the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let response = self.client.get(self.endpoint(&[])?).send().await?;
        Ok(response.status().is_success())
    }

    /// List the people roster.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotReady` if the roster was never initialized.
    pub async fn list_people(&self) -> Result<Vec<Person>, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["people"])?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_json(response).await
    }

    /// Replace the whole roster.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` if either token is wrong, or an API
    /// error if the roster is invalid.
    pub async fn replace_people(
        &self,
        people: Vec<Person>,
        admin_token: impl Into<String>,
    ) -> Result<Vec<Person>, ClientError> {
        let request = ReplacePeopleRequest {
            people,
            admin_token: admin_token.into(),
        };

        let response = self
            .client
            .post(self.endpoint(&["people"])?)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        self.handle_json(response).await
    }

    /// Create an entry for `user` in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the entry is rejected.
    pub async fn create_entry(
        &self,
        user: &str,
        year: Year,
        fields: NewEntry,
    ) -> Result<Entry, ClientError> {
        let request = CreateEntryRequest {
            user: user.to_string(),
            year,
            fields,
        };

        let response = self
            .client
            .post(self.endpoint(&["entry"])?)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        self.handle_json(response).await
    }

    /// Delete an entry, returning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the entry does not exist.
    pub async fn delete_entry(
        &self,
        user: &str,
        year: Year,
        id: &EntryId,
    ) -> Result<Entry, ClientError> {
        let request = DeleteEntryRequest {
            user: user.to_string(),
            year,
            id: id.clone(),
        };

        let response = self
            .client
            .delete(self.endpoint(&["entry"])?)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        self.handle_json(response).await
    }

    /// List `user`'s entries for `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the person is unknown.
    pub async fn list_entries(&self, user: &str, year: Year) -> Result<Vec<Entry>, ClientError> {
        let year = year.to_string();
        let response = self
            .client
            .get(self.endpoint(&["entries", user, &year])?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_json(response).await
    }

    /// Download one entry's attachment.
    ///
    /// # Errors
    ///
    /// Returns an API error with status 404 if the entry or its attachment is
    /// missing.
    pub async fn download_attachment(
        &self,
        user: &str,
        year: Year,
        id: &EntryId,
    ) -> Result<Attachment, ClientError> {
        let year = year.to_string();
        let response = self
            .client
            .get(self.endpoint(&["entries", user, &year, "download", id.as_str()])?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();

        Ok(Attachment {
            bytes,
            content_type: header_str(&headers, CONTENT_TYPE.as_str()).map(String::from),
            file_name: header_str(&headers, CONTENT_DISPOSITION.as_str())
                .and_then(disposition_file_name),
        })
    }

    /// Download one zip slice starting at bucket index `first`.
    ///
    /// Returns `None` when `first` is at or past the end of the bucket.
    ///
    /// # Errors
    ///
    /// Returns an API error with code `payload_too_large` if the attachment at
    /// `first` cannot fit any archive (see [`ClientError::is_payload_too_large`]).
    pub async fn download_archive(
        &self,
        user: &str,
        year: Year,
        first: usize,
    ) -> Result<Option<ArchiveChunk>, ClientError> {
        let year = year.to_string();
        let mut url = self.endpoint(&["entries", user, &year, "download"])?;
        url.query_pairs_mut().append_pair("first", &first.to_string());

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = Self::check_status(response).await?;
        let headers = response.headers().clone();
        let bytes = response.bytes().await?.to_vec();

        Ok(Some(ArchiveChunk {
            bytes,
            from: header_number(&headers, "x-download-from")?,
            to: header_number(&headers, "x-download-to")?,
            total: header_number(&headers, "x-download-max")?,
            packed_bytes: header_str(&headers, "x-download-bytes").and_then(|v| v.parse().ok()),
        }))
    }

    /// Download the whole bucket as a sequence of zip slices, following
    /// resume offsets until the server reports no more data.
    ///
    /// Stops early, without error, at an attachment too large for any
    /// archive; see [`ArchiveDownload::stalled`].
    ///
    /// # Errors
    ///
    /// Returns any other error from [`RimborsiClient::download_archive`], or
    /// `ClientError::InvalidResponse` if the server does not advance.
    pub async fn download_all_archives(
        &self,
        user: &str,
        year: Year,
    ) -> Result<ArchiveDownload, ClientError> {
        let mut download = ArchiveDownload::default();
        let mut first = 0;

        loop {
            let chunk = match self.download_archive(user, year, first).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(ClientError::Api { code, message, .. }) if code == "payload_too_large" => {
                    tracing::warn!(
                        user = %user,
                        year = %year,
                        first,
                        message = %message,
                        "Archive download stalled"
                    );
                    download.stalled = Some((first, message));
                    break;
                }
                Err(e) => return Err(e),
            };

            if chunk.to <= first {
                return Err(ClientError::InvalidResponse(format!(
                    "archive slice from {first} did not advance"
                )));
            }

            tracing::debug!(
                user = %user,
                year = %year,
                from = chunk.from,
                to = chunk.to,
                total = chunk.total,
                "Archive slice downloaded"
            );
            first = chunk.to;
            download.chunks.push(chunk);
        }

        Ok(download)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Configuration(format!(
                    "base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Decode a success envelope, or convert an error response.
    async fn handle_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Pass successful responses through and convert error responses.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::FORBIDDEN => return Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(ClientError::RateLimited),
            StatusCode::SERVICE_UNAVAILABLE => return Err(ClientError::NotReady),
            _ => {}
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => Err(ClientError::Api {
                code: api_error.error.code,
                message: api_error.error.message,
                status: status.as_u16(),
            }),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_number(headers: &HeaderMap, name: &str) -> Result<usize, ClientError> {
    header_str(headers, name)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ClientError::InvalidResponse(format!("missing or malformed {name} header")))
}

/// Extract `filename="..."` from a `Content-Disposition` value.
fn disposition_file_name(value: &str) -> Option<String> {
    let (_, rest) = value.split_once("filename=\"")?;
    let mut name = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?),
            '"' => return Some(name),
            c => name.push(c),
        }
    }
    None
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 60).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_and_encodes_segments() {
        let client = RimborsiClient::new("http://localhost:8080/", "t").unwrap();
        let url = client.endpoint(&["entries", "Anna Maria", "2024"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/entries/Anna%20Maria/2024");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = RimborsiClient::new("http://localhost:8080/api/", "t").unwrap();
        let url = client.endpoint(&["people"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/people");
    }

    #[test]
    fn invalid_base_url_is_configuration_error() {
        assert!(matches!(
            RimborsiClient::new("not a url", "t"),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            RimborsiClient::new("mailto:someone@example.com", "t"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn parses_disposition_file_name() {
        assert_eq!(
            disposition_file_name(r#"attachment; filename="say \"hi\".pdf""#).as_deref(),
            Some(r#"say "hi".pdf"#)
        );
        assert_eq!(disposition_file_name("attachment"), None);
    }
}
