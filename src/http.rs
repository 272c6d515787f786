//! Fetch documents from an HTTP API

use std::fmt;
use std::time::Duration;

use derive_more::From;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

#[derive(Debug, From)]
pub enum HttpError {
    /// Connection, TLS, timeout or body decoding errors
    Http(reqwest::Error),
    /// The body wasn't the JSON we expected
    Json(serde_json::Error),
    /// The server answered, but not with a 2xx
    #[from(ignore)]
    Status { url: String, status: StatusCode },
}

impl HttpError {
    pub fn short_display(&self) -> String {
        match *self {
            HttpError::Http(ref e) if e.is_timeout() => "request timed out".to_owned(),
            HttpError::Http(_) => "request failed".to_owned(),
            HttpError::Json(_) => "invalid JSON in response".to_owned(),
            HttpError::Status { status, .. } => format!("server returned {}", status),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HttpError::Http(ref e) => write!(f, "{}", e),
            HttpError::Json(ref e) => write!(f, "{}", e),
            HttpError::Status { ref url, status } => write!(f, "{} returned {}", url, status),
        }
    }
}

impl std::error::Error for HttpError {}

/// Anything that can GET a path relative to some base url
pub trait Fetch {
    /// The full url that `path` resolves to, for messages
    fn url_for(&self, path: &str) -> String;

    fn get_text(&self, path: &str) -> Result<String, HttpError>;
}

/// GET `path` and deserialize the body
pub fn get_json<F, T>(fetch: &F, path: &str) -> Result<T, HttpError>
where
    F: Fetch + ?Sized,
    T: DeserializeOwned,
{
    let body = fetch.get_text(path)?;
    Ok(serde_json::from_str(&body)?)
}

/// A server reachable at `scheme://host:port`, optionally behind basic auth
pub struct HttpEndpoint {
    client: Client,
    base: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpEndpoint {
    /// `insecure` turns off certificate and hostname verification
    pub fn new(
        scheme: &str,
        host: &str,
        port: u16,
        timeout: Duration,
        insecure: bool,
    ) -> Result<HttpEndpoint, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()?;
        Ok(HttpEndpoint {
            client,
            base: format!("{}://{}:{}", scheme, host, port),
            username: None,
            password: None,
        })
    }

    pub fn basic_auth(mut self, username: &str, password: Option<&str>) -> HttpEndpoint {
        self.username = Some(username.to_owned());
        self.password = password.map(str::to_owned);
        self
    }
}

impl Fetch for HttpEndpoint {
    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn get_text(&self, path: &str) -> Result<String, HttpError> {
        let url = self.url_for(path);
        debug!("GET {}", url);
        let mut request = self.client.get(&url);
        if let Some(ref username) = self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status { url, status });
        }
        Ok(response.text()?)
    }
}
