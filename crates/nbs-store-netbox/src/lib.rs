// # NetBox Record Store
//
// This crate provides a NetBox IPAM implementation of `RecordStore` for the
// nbs reconciler.
//
// ## Behavior
//
// - One HTTP request per store call (pagination aside)
// - Full error propagation to the reconciler; no retries, no backoff
// - HTTP timeout configured (30 seconds)
// - Specific error mapping for HTTP status codes (401/403, 404, 429, 5xx)
// - Tags accepted both as nested objects (NetBox ≥ 2.10) and plain strings
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Store construction fails fast if the token is empty
//
// ## API Reference
//
// - Status:      GET    `/api/status/`
// - Lookup:      GET    `/api/ipam/ip-addresses/?address=10.0.0.1`
// - Tag listing: GET    `/api/ipam/ip-addresses/?tag=<slug>&limit=N` (follows `next`)
// - Create:      POST   `/api/ipam/ip-addresses/`
// - Update:      PATCH  `/api/ipam/ip-addresses/:id/`
// - Delete:      DELETE `/api/ipam/ip-addresses/:id/`

use async_trait::async_trait;
use nbs_core::address;
use nbs_core::config::StoreConfig;
use nbs_core::traits::{Lookup, RecordStore, RecordStoreFactory, RemoteRecord};
use nbs_core::{Error, Result, StoreRegistry};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Path of the IP address endpoint, relative to the base URL
const IP_ADDRESSES_PATH: &str = "/api/ipam/ip-addresses/";

/// Path of the status endpoint, relative to the base URL
const STATUS_PATH: &str = "/api/status/";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested when listing records
const PAGE_LIMIT: usize = 1000;

/// NetBox IPAM record store
///
/// Stateless between calls: every lookup goes to the API.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct NetboxStore {
    /// Base URL without trailing slash (e.g. "https://netbox.example.com")
    base_url: String,

    /// API token
    /// ⚠️ NEVER log this value
    token: String,

    /// Whether the server certificate is verified
    tls_verify: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for NetboxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetboxStore")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}

/// One page of a NetBox list response
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    next: Option<String>,
    results: Vec<T>,
}

/// IP address object as returned by NetBox
#[derive(Debug, Deserialize)]
struct IpAddressDto {
    id: u64,
    address: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<TagDto>,
}

/// Tag representation: nested object on current NetBox, plain slug on 2.x
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagDto {
    Nested { slug: String },
    Plain(String),
}

impl TagDto {
    fn into_slug(self) -> String {
        match self {
            TagDto::Nested { slug } => slug,
            TagDto::Plain(slug) => slug,
        }
    }
}

impl From<IpAddressDto> for RemoteRecord {
    fn from(dto: IpAddressDto) -> Self {
        RemoteRecord {
            id: dto.id,
            address: dto.address,
            description: dto.description,
            tags: dto.tags.into_iter().map(TagDto::into_slug).collect(),
        }
    }
}

impl NetboxStore {
    /// Create a new NetBox store
    ///
    /// # Parameters
    ///
    /// - `base_url`: NetBox base URL, with or without trailing slash
    /// - `token`: API token with read/write access to IPAM IP addresses
    /// - `tls_verify`: Verify the server certificate
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, tls_verify: bool) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("NetBox API token cannot be empty"));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::config("NetBox URL cannot be empty"));
        }

        if !tls_verify {
            tracing::warn!("TLS certificate verification disabled for {}", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(!tls_verify)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            tls_verify,
            client,
        })
    }

    /// Base URL the store talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn record_url(&self, id: u64) -> String {
        format!("{}{}{}/", self.base_url, IP_ADDRESSES_PATH, id)
    }

    /// Attach credentials, send, and map non-2xx statuses to errors
    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<reqwest::Response> {
        let response = request
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("netbox", format!("HTTP request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(status_error(status, &error_text, context))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::provider("netbox", format!("Failed to parse response: {}", e)))
    }
}

/// Map an unsuccessful HTTP status to an error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Status: {}",
            context, status
        )),
        500..=599 => Error::provider(
            "netbox",
            format!("{}: NetBox server error (transient): {} - {}", context, status, body),
        ),
        _ => Error::provider("netbox", format!("{}: {} - {}", context, status, body)),
    }
}

#[async_trait]
impl RecordStore for NetboxStore {
    /// ```http
    /// GET /api/status/
    /// Authorization: Token <token>
    /// ```
    async fn ping(&self) -> Result<()> {
        let request = self.client.get(self.url(STATUS_PATH));
        self.send(request, "Status check").await?;
        tracing::debug!("NetBox at {} is reachable", self.base_url);
        Ok(())
    }

    /// ```http
    /// GET /api/ipam/ip-addresses/?address=10.0.0.1
    /// ```
    async fn find_by_address(&self, address: &str) -> Result<Lookup> {
        let host = address::normalize(address);
        tracing::debug!("Looking up IP address: {}", host);

        let request = self
            .client
            .get(self.url(IP_ADDRESSES_PATH))
            .query(&[("address", host)]);
        let response = self.send(request, "Address lookup").await?;
        let page: Page<IpAddressDto> = Self::parse(response).await?;

        let count = page.count.unwrap_or(page.results.len());
        if count > 1 {
            return Ok(Lookup::Ambiguous(count));
        }

        Ok(match page.results.into_iter().next() {
            Some(dto) => Lookup::Found(dto.into()),
            None => Lookup::NotFound,
        })
    }

    /// ```http
    /// GET /api/ipam/ip-addresses/?tag=<slug>&limit=1000
    /// GET <next> ...
    /// ```
    async fn filter_by_tag(&self, tag: &str) -> Result<Vec<RemoteRecord>> {
        let limit = PAGE_LIMIT.to_string();
        let mut request = self
            .client
            .get(self.url(IP_ADDRESSES_PATH))
            .query(&[("tag", tag), ("limit", limit.as_str())]);
        let mut records = Vec::new();

        loop {
            let response = self.send(request, "Tag listing").await?;
            let page: Page<IpAddressDto> = Self::parse(response).await?;
            records.extend(page.results.into_iter().map(RemoteRecord::from));

            match page.next {
                Some(next) => request = self.client.get(next),
                None => break,
            }
        }

        tracing::debug!("Found {} record(s) tagged '{}'", records.len(), tag);
        Ok(records)
    }

    /// ```http
    /// POST /api/ipam/ip-addresses/
    /// { "address": "10.0.0.1/32", "description": "...", "tags": [{ "slug": "nbs" }] }
    /// ```
    async fn create(&self, address: &str, tags: &[String], description: &str) -> Result<RemoteRecord> {
        let payload = serde_json::json!({
            "address": address::to_host_cidr(address),
            "description": description,
            "tags": tags
                .iter()
                .map(|slug| serde_json::json!({ "slug": slug }))
                .collect::<Vec<_>>(),
        });

        let request = self.client.post(self.url(IP_ADDRESSES_PATH)).json(&payload);
        let response = self.send(request, "Create").await?;
        let dto: IpAddressDto = Self::parse(response).await?;
        Ok(dto.into())
    }

    /// ```http
    /// PATCH /api/ipam/ip-addresses/:id/
    /// { "description": "..." }
    /// ```
    async fn update_description(&self, record: &RemoteRecord, description: &str) -> Result<()> {
        let payload = serde_json::json!({ "description": description });
        let request = self.client.patch(self.record_url(record.id)).json(&payload);
        self.send(request, "Update").await?;
        Ok(())
    }

    /// ```http
    /// DELETE /api/ipam/ip-addresses/:id/
    /// ```
    async fn delete(&self, record: &RemoteRecord) -> Result<()> {
        let request = self.client.delete(self.record_url(record.id));
        self.send(request, "Delete").await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "netbox"
    }
}

/// Factory for creating NetBox stores
pub struct NetboxFactory;

impl RecordStoreFactory for NetboxFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        match config {
            StoreConfig::Netbox {
                url,
                token,
                tls_verify,
            } => Ok(Box::new(NetboxStore::new(url.clone(), token.clone(), *tls_verify)?)),
            _ => Err(Error::config("Invalid config for NetBox store")),
        }
    }
}

/// Register the NetBox store with a registry
///
/// # Example
///
/// ```rust
/// use nbs_core::StoreRegistry;
///
/// let registry = StoreRegistry::new();
/// nbs_store_netbox::register(&registry);
/// assert!(registry.has_store("netbox"));
/// ```
pub fn register(registry: &StoreRegistry) {
    registry.register_store("netbox", Box::new(NetboxFactory));
}
