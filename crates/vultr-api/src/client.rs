// Shared HTTP client for the Vultr v2 API.
//
// Owns the base URL, bearer authentication and JSON plumbing. Resource
// handlers (currently load balancers) build requests through it and hand
// them back to `execute` / `execute_empty`, which decode the body and turn
// non-2xx statuses into `Error::Api`.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Request, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::load_balancer::LoadBalancerHandler;
use crate::response::{ApiResponse, ListOptions, RawResponse};
use crate::transport::TransportConfig;

/// Production endpoint of the Vultr API.
pub const DEFAULT_BASE_URL: &str = "https://api.vultr.com/";

// ── Error response shape from the Vultr API ──────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Vultr v2 API.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted and the
/// client carries no per-call state, so one instance can serve many tasks.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Client for the production API at [`DEFAULT_BASE_URL`].
    pub fn new(api_key: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, transport)
    }

    /// Client for an alternative endpoint (staging, proxy, local mock).
    ///
    /// Injects `Authorization: Bearer <key>` as a default header on every
    /// request.
    pub fn with_base_url(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::InvalidApiKey {
                message: format!("invalid header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Parse the base URL and make sure its path ends with `/` so relative
    /// joins keep any path prefix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Load balancer endpoints.
    pub fn load_balancers(&self) -> LoadBalancerHandler {
        LoadBalancerHandler::new(self.clone())
    }

    // ── Request builders ─────────────────────────────────────────────

    /// Resolve an API path (e.g. `/v2/load-balancers`) against the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build a request without a body.
    pub fn new_request(&self, method: Method, path: &str) -> Result<Request, Error> {
        let url = self.url(path)?;
        build(
            self.http
                .request(method, url)
                .header(ACCEPT, "application/json"),
        )
    }

    /// Build a request carrying `body` as JSON.
    pub fn new_json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Request, Error> {
        let payload = serde_json::to_vec(body).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        let url = self.url(path)?;
        build(
            self.http
                .request(method, url)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .body(payload),
        )
    }

    /// Build a `GET` for a list endpoint, encoding only the options that are set.
    pub fn new_list_request(
        &self,
        path: &str,
        options: Option<&ListOptions>,
    ) -> Result<Request, Error> {
        let url = self.url(path)?;
        let mut builder = self
            .http
            .get(url)
            .header(ACCEPT, "application/json");
        if let Some(options) = options {
            builder = builder.query(options);
        }
        build(builder)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Send `request` and decode a JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<ApiResponse<T>, Error> {
        let raw = self.send(request).await?;
        let data = serde_json::from_str(&raw.body).map_err(|e| {
            let preview: String = raw.body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: raw.body.clone(),
            }
        })?;
        Ok(ApiResponse {
            data,
            response: raw,
        })
    }

    /// Send `request`, ignoring the body of a successful response.
    pub async fn execute_empty(&self, request: Request) -> Result<RawResponse, Error> {
        self.send(request).await
    }

    async fn send(&self, request: Request) -> Result<RawResponse, Error> {
        debug!("{} {}", request.method(), request.url());

        let resp = self.http.execute(request).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let raw = RawResponse {
            body: resp.text().await?,
            status,
            headers,
            url,
        };

        if raw.status.is_success() {
            Ok(raw)
        } else {
            debug!("{} responded with {}", raw.url, raw.status);
            Err(parse_error(raw))
        }
    }
}

/// Finish a request locally. A failure here (bad header, unencodable query)
/// happens before anything is sent, so it is a construction error rather
/// than a transport one.
fn build(builder: RequestBuilder) -> Result<Request, Error> {
    builder.build().map_err(|e| Error::Serialization {
        message: format!("failed to build request: {e}"),
    })
}

/// Turn a non-2xx response into `Error::Api`, preferring the API's own
/// `{"error": "..."}` message over the raw body.
fn parse_error(raw: RawResponse) -> Error {
    let status = raw.status.as_u16();
    let message = serde_json::from_str::<ErrorResponse>(&raw.body)
        .ok()
        .and_then(|e| e.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if raw.body.trim().is_empty() {
                raw.status.to_string()
            } else {
                raw.body.clone()
            }
        });

    Error::Api {
        status,
        message,
        response: Box::new(raw),
    }
}
