use std::time::Duration;

use futures_util::StreamExt;
use harvest_core::{ConnectionIdentity, RawContact};
use harvest_logging::{harvest_debug, harvest_trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE};
use url::Url;

use crate::payload::{connection_identities, contact_from_entities, parse_included};
use crate::{FailureKind, LookupError};

const NORMALIZED_JSON: &str = "application/vnd.linkedin.normalized+json+2.1";
const LI_TRACK: &str = r#"{"clientVersion":"1.2.3179","osName":"web","timezoneOffset":-7,"deviceFormFactor":"DESKTOP","mpName":"voyager-web"}"#;

/// Network settings for the session-backed API client.
///
/// `csrf_token` and `cookie` come from the browser session; acquiring them is
/// outside this crate.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub csrf_token: String,
    pub cookie: String,
    pub connect_timeout: Duration,
    /// No per-call deadline when `None`: a hung call blocks its step.
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com".to_string(),
            csrf_token: String::new(),
            cookie: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Enumerates the session's connections.
#[async_trait::async_trait]
pub trait ConnectionDirectory: Send + Sync {
    async fn list_connections(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<ConnectionIdentity>, LookupError>;
}

/// Fetches contact details for one connection.
#[async_trait::async_trait]
pub trait ContactLookup: Send + Sync {
    async fn contact_info(&self, identity: &ConnectionIdentity) -> Result<RawContact, LookupError>;
}

#[derive(Debug, Clone)]
pub struct VoyagerClient {
    client: reqwest::Client,
    base_url: Url,
    max_bytes: u64,
}

impl VoyagerClient {
    pub fn new(settings: ApiSettings) -> Result<Self, LookupError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| LookupError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be a base url"),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .default_headers(session_headers(&settings)?);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| LookupError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            max_bytes: settings.max_bytes,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_body(&self, url: Url) -> Result<Vec<u8>, LookupError> {
        harvest_debug!("GET {}", url.path());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        harvest_trace!("Read {} bytes", bytes.len());
        Ok(bytes)
    }

    fn too_large(&self, actual: Option<u64>) -> LookupError {
        LookupError::new(
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl ConnectionDirectory for VoyagerClient {
    async fn list_connections(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<ConnectionIdentity>, LookupError> {
        let mut url = self.endpoint(&["voyager", "api", "relationships", "connections"])?;
        url.query_pairs_mut()
            .append_pair("count", &count.to_string())
            .append_pair("start", &start.to_string());

        let body = self.get_body(url).await?;
        let entities = parse_included(&body)?;
        Ok(connection_identities(&entities))
    }
}

#[async_trait::async_trait]
impl ContactLookup for VoyagerClient {
    async fn contact_info(&self, identity: &ConnectionIdentity) -> Result<RawContact, LookupError> {
        let url = self.endpoint(&[
            "voyager",
            "api",
            "identity",
            "profiles",
            identity.as_str(),
            "profileContactInfo",
        ])?;

        let body = self.get_body(url).await?;
        let entities = parse_included(&body)?;
        contact_from_entities(identity, entities)
    }
}

fn session_headers(settings: &ApiSettings) -> Result<HeaderMap, LookupError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(NORMALIZED_JSON));
    headers.insert(
        HeaderName::from_static("x-li-lang"),
        HeaderValue::from_static("en_US"),
    );
    headers.insert(
        HeaderName::from_static("x-li-track"),
        HeaderValue::from_static(LI_TRACK),
    );
    headers.insert(
        HeaderName::from_static("x-restli-protocol-version"),
        HeaderValue::from_static("2.0.0"),
    );
    if !settings.csrf_token.is_empty() {
        headers.insert(
            HeaderName::from_static("csrf-token"),
            sensitive_value(&settings.csrf_token, "csrf token")?,
        );
    }
    if !settings.cookie.is_empty() {
        headers.insert(COOKIE, sensitive_value(&settings.cookie, "cookie")?);
    }
    Ok(headers)
}

fn sensitive_value(raw: &str, what: &str) -> Result<HeaderValue, LookupError> {
    let mut value = HeaderValue::from_str(raw).map_err(|_| {
        LookupError::new(
            FailureKind::InvalidSettings,
            format!("{what} is not a valid header value"),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn map_reqwest_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        return LookupError::new(FailureKind::Timeout, err.to_string());
    }
    LookupError::new(FailureKind::Network, err.to_string())
}
