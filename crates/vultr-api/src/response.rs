//! Response wrappers and pagination types shared by every Vultr resource.
//!
//! Each successful call yields an [`ApiResponse`] pairing the decoded value
//! with the [`RawResponse`] it came from. List endpoints decode into a
//! [`Page`], whose [`Meta`] carries the cursor for the next request.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

// ── Raw HTTP exchange ────────────────────────────────────────────────

/// The HTTP response behind a decoded value, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Url,
    /// Body text as received. Empty for `204 No Content`.
    pub body: String,
}

impl RawResponse {
    /// Look up a response header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A decoded value together with the raw response it was decoded from.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub response: RawResponse,
}

impl<T> ApiResponse<T> {
    /// Drop the raw response and keep the decoded value.
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Transform the decoded value, keeping the raw response.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            response: self.response,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────

/// Query options accepted by list endpoints.
///
/// Unset fields are not encoded, so `ListOptions::default()` produces no
/// query string at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ListOptions {
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Pagination metadata returned next to every list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub links: Option<Links>,
}

/// Cursors for the neighbouring pages. Empty strings mean "no page".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub prev: String,
}

impl Meta {
    pub fn next_cursor(&self) -> Option<&str> {
        self.links
            .as_ref()
            .map(|l| l.next.as_str())
            .filter(|c| !c.is_empty())
    }

    pub fn prev_cursor(&self) -> Option<&str> {
        self.links
            .as_ref()
            .map(|l| l.prev.as_str())
            .filter(|c| !c.is_empty())
    }
}

/// One page of a list endpoint, with its envelope stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Option<Meta>,
}

impl<T> Page<T> {
    pub fn next_cursor(&self) -> Option<&str> {
        self.meta.as_ref().and_then(Meta::next_cursor)
    }

    /// Options for fetching the following page, or `None` on the last page.
    ///
    /// Filters and page size are carried over from `current`.
    pub fn next_options(&self, current: &ListOptions) -> Option<ListOptions> {
        let cursor = self.next_cursor()?;
        Some(current.clone().with_cursor(cursor))
    }
}
