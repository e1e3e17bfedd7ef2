//! REST access to the open catalog service.
//!
//! [`CatalogClient`] is the transport seam used by the interpreter. The route
//! table mapping each [`CatalogRequest`] to a verb and path lives here as
//! well, so the interpreter never builds URLs itself.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::request::CatalogRequest;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid catalog URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Transport to the catalog service.
///
/// Paths are relative to the service base URL and start with `/`. Every call
/// returns the decoded JSON body; an empty body decodes to `null`.
/// Authentication is the implementation's concern.
#[async_trait]
pub trait CatalogClient: fmt::Debug + Send + Sync {
    async fn get(&self, path: &str) -> ClientResult<Value>;
    async fn post(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn put(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn delete(&self, path: &str) -> ClientResult<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// The endpoint a request is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            path: format!("/{}", segments.join("/")),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl CatalogRequest {
    pub fn route(&self) -> Route {
        use CatalogRequest::*;
        use Method::*;

        match self {
            CreateUdo { request, .. } => {
                Route::new(Post, &["objects", &request.udo.object_type])
            }
            CreateBatch { object_type, .. } => Route::new(Post, &["objects", object_type, "batch"]),
            Show { object_type } => Route::new(Get, &["objects", object_type]),
            ShowTypes => Route::new(Get, &["objects"]),
            ShowMappingForPlatformAndType {
                object_type,
                platform,
            } => Route::new(Get, &["objects", object_type, "platforms", platform]),
            ShowPlatformsForType { object_type } => {
                Route::new(Get, &["objects", object_type, "platforms"])
            }
            ShowAllPlatforms => Route::new(Get, &["platforms"]),
            ShowMappingsForPlatform { platform } => Route::new(Get, &["platforms", platform]),
            Sync {
                object_type,
                platform,
            } => Route::new(
                Get,
                &["objects", object_type, "platforms", platform, "pull"],
            ),
            SyncAll { platform } => Route::new(Get, &["platforms", platform, "pull"]),
            Define(_) => Route::new(Post, &["objects"]),
            Alter(request) => Route::new(
                Put,
                &["objects", &request.udo.object_type, &request.udo.name],
            ),
            Drop { object_type } => Route::new(Delete, &["objects", object_type]),
            DropMapping { platform } => Route::new(Delete, &["platforms", platform]),
            AddMapping(request) => Route::new(
                Post,
                &[
                    "objects",
                    &request.platform_mapping.type_name,
                    "platforms",
                    &request.platform_mapping.platform_name,
                ],
            ),
        }
    }

    /// JSON body for requests that carry one.
    pub fn body(&self) -> serde_json::Result<Option<Value>> {
        use CatalogRequest::*;

        match self {
            CreateUdo { request, .. } | Alter(request) => serde_json::to_value(request).map(Some),
            CreateBatch { objects, .. } => serde_json::to_value(objects).map(Some),
            Define(request) => serde_json::to_value(request).map(Some),
            AddMapping(request) => serde_json::to_value(request).map(Some),
            _ => Ok(None),
        }
    }
}

/// Route of the read issued after `CREATE OPEN` to fetch the object's
/// platform statements.
pub fn sync_route(object_type: &str) -> Route {
    Route::new(Method::Get, &["objects", object_type, "sync"])
}

/// Issue exactly one call for `route`.
pub async fn invoke(
    client: &dyn CatalogClient,
    route: &Route,
    body: Option<Value>,
) -> ClientResult<Value> {
    debug!("Invoking catalog endpoint: {route}");
    let body = body.unwrap_or(Value::Null);
    match route.method {
        Method::Get => client.get(&route.path).await,
        Method::Post => client.post(&route.path, body).await,
        Method::Put => client.put(&route.path, body).await,
        Method::Delete => client.delete(&route.path).await,
    }
}

/// Where [`RestCatalogClient`] sends requests and how it authenticates.
///
/// Request paths such as `/objects/function` are appended to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestCatalogConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub bearer_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RestCatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout_secs: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// [`CatalogClient`] over HTTP.
#[derive(Debug)]
pub struct RestCatalogClient {
    config: RestCatalogConfig,
    client: Client,
}

impl RestCatalogClient {
    pub fn try_new(config: RestCatalogConfig) -> ClientResult<Self> {
        Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestCatalogConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let mut req = self.client.request(method.into(), &url);
        if let Some(ref token) = self.config.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ClientResult<Value> {
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CatalogClient for RestCatalogClient {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(self.request(Method::Get, path)).await
    }

    async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.send(self.request(Method::Post, path).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.send(self.request(Method::Put, path).json(&body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(self.request(Method::Delete, path)).await
    }
}
