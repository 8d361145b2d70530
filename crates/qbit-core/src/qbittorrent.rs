//! qBittorrent Web API client.
//!
//! Uses the v2 API with a cookie session: `auth/login` once at startup, then
//! `torrents/info` on every refresh. An expired session (HTTP 403) triggers a
//! single re-login before the request is retried.

use std::time::Duration;

use async_trait::async_trait;
use qbit_models::QbitTorrent;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::QbitConfig;
use crate::error::{FetchError, FetchResult};
use crate::fetcher::TorrentSource;

/// Per-request timeout so a hung client stalls at most one refresh.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const LOGIN_PATH: &str = "api/v2/auth/login";
const TORRENTS_INFO_PATH: &str = "api/v2/torrents/info";
const APP_VERSION_PATH: &str = "api/v2/app/version";

/// HTTP client bound to one qBittorrent instance.
pub struct QbitClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl QbitClient {
    /// Create a client without logging in.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &QbitConfig) -> FetchResult<Self> {
        let mut base = config.base_url()?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Create a client and log in.
    ///
    /// # Errors
    /// Returns an error if the client is unreachable or rejects the credentials.
    pub async fn connect(config: &QbitConfig) -> FetchResult<Self> {
        let client = Self::new(config)?;
        client.login().await?;
        Ok(client)
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> FetchResult<Url> {
        self.base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    /// Log in and store the session cookie.
    ///
    /// # Errors
    /// Returns [`FetchError::LoginRejected`] if qBittorrent refuses the
    /// credentials, or a transport error.
    pub async fn login(&self) -> FetchResult<()> {
        let response = self
            .http
            .post(self.endpoint(LOGIN_PATH)?)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::LoginRejected(
                "too many failed attempts, IP is banned".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: LOGIN_PATH,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if !body.trim().eq_ignore_ascii_case("ok.") {
            return Err(FetchError::LoginRejected("invalid username or password".to_string()));
        }

        info!(url = %self.base, user = %self.username, "Logged in to qBittorrent");
        Ok(())
    }

    /// Fetch the client's version string.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn app_version(&self) -> FetchResult<String> {
        let response = self.http.get(self.endpoint(APP_VERSION_PATH)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: APP_VERSION_PATH,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?.trim().to_string())
    }

    async fn request_torrents(&self) -> FetchResult<reqwest::Response> {
        Ok(self.http.get(self.endpoint(TORRENTS_INFO_PATH)?).send().await?)
    }

    /// List every job known to the client.
    ///
    /// # Errors
    /// Returns an error if the request fails or the payload cannot be decoded.
    pub async fn torrents_info(&self) -> FetchResult<Vec<QbitTorrent>> {
        let mut response = self.request_torrents().await?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, logging in again");
            self.login().await?;
            response = self.request_torrents().await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: TORRENTS_INFO_PATH,
                status: status.as_u16(),
            });
        }

        let torrents = parse_torrents(&response.text().await?)?;
        debug!(count = torrents.len(), "Fetched torrent list");
        Ok(torrents)
    }
}

/// Decode a `torrents/info` payload.
fn parse_torrents(body: &str) -> FetchResult<Vec<QbitTorrent>> {
    serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))
}

#[async_trait]
impl TorrentSource for QbitClient {
    async fn list_jobs(&self) -> FetchResult<Vec<QbitTorrent>> {
        self.torrents_info().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> QbitConfig {
        QbitConfig {
            host: host.to_string(),
            port: None,
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
        }
    }

    #[test]
    fn test_parse_torrents_payload() {
        let body = r#"[
            {"name": "Show.S01E01", "category": "tv-sonarr", "progress": 0.5,
             "state": "downloading", "eta": 120, "size": 1048576, "dlspeed": 2048,
             "hash": "abc", "num_seeds": 4}
        ]"#;
        let torrents = parse_torrents(body).unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].name, "Show.S01E01");
        assert_eq!(torrents[0].state, "downloading");
        assert_eq!(torrents[0].dlspeed, 2048);
    }

    #[test]
    fn test_parse_torrents_rejects_garbage() {
        let err = parse_torrents("Forbidden").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_endpoints_join_base() {
        let client = QbitClient::new(&config("localhost")).unwrap();
        assert_eq!(
            client.endpoint(TORRENTS_INFO_PATH).unwrap().as_str(),
            "http://localhost:8080/api/v2/torrents/info"
        );
    }

    #[test]
    fn test_base_path_preserved() {
        let client = QbitClient::new(&config("https://seedbox.example/qbt")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://seedbox.example/qbt/");
        assert_eq!(
            client.endpoint(LOGIN_PATH).unwrap().as_str(),
            "https://seedbox.example/qbt/api/v2/auth/login"
        );
    }

    #[test]
    fn test_invalid_host() {
        let result = QbitClient::new(&config("http://[::1"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_client_is_http_error() {
        let mut cfg = config("127.0.0.1");
        cfg.port = Some(1);
        let client = QbitClient::new(&cfg).unwrap();

        let result = client.torrents_info().await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
