//! Taiga API client.
//!
//! Low-level HTTP dispatcher that handles authentication, pagination
//! headers, error classification and the response cache. Resource-level
//! operations are built on top of it by [`Collection`](crate::Collection)
//! and [`Resource`](crate::Resource).

use std::env;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::cache::{CacheMiss, ResponseCache, DEFAULT_CACHE_VALID_TIME};
use crate::error::{Result, TaigaError};
use crate::request::{RawResponse, Request};

const DEFAULT_HOST: &str = "https://api.taiga.io";
const DEFAULT_API_PATH: &str = "/api/v1";
const DEFAULT_AUTH_TYPE: &str = "normal";
const USER_AGENT: &str = concat!("taigapi/", env!("CARGO_PKG_VERSION"));

const LAZY_PAGINATION: &str = "x-lazy-pagination";
const DISABLE_PAGINATION: &str = "x-disable-pagination";

/// Scheme used in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenType {
    /// User token obtained through [`TaigaClient::auth`].
    #[default]
    Bearer,
    /// Application token.
    Application,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => f.write_str("Bearer"),
            Self::Application => f.write_str("Application"),
        }
    }
}

impl std::str::FromStr for TokenType {
    type Err = TaigaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Bearer" | "bearer" => Ok(Self::Bearer),
            "Application" | "application" => Ok(Self::Application),
            other => Err(TaigaError::ConfigMissing(format!(
                "unknown token type '{other}'"
            ))),
        }
    }
}

/// Credentials shared by every handle created from one client.
#[derive(Default)]
struct Session {
    token: Option<String>,
    token_type: TokenType,
    refresh: Option<String>,
}

/// Token pair returned by the auth endpoints.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    auth_token: String,
    #[serde(default)]
    refresh: Option<String>,
}

struct ClientInner {
    http: Client,
    host: String,
    api_path: String,
    auth_type: String,
    pagination: bool,
    tls_verify: bool,
    max_pages: Option<u32>,
    session: RwLock<Session>,
    cache: Mutex<ResponseCache>,
}

/// Low-level Taiga API client.
///
/// Every [`Collection`](crate::Collection) and [`Resource`](crate::Resource)
/// keeps a clone of the client it came from. Clones share the same session
/// and response cache, so re-authenticating through any clone is observed by
/// all of them.
///
/// The client issues one request at a time per logical operation; it is
/// safe to move between tasks but is meant to be driven sequentially.
///
/// # Example
///
/// ```no_run
/// use taigapi::TaigaClient;
///
/// # async fn example() -> taigapi::Result<()> {
/// let client = TaigaClient::new("https://api.taiga.io")?;
/// client.auth("admin", "123123").await?;
///
/// let me = client.me().await?;
/// println!("Logged in as {me}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TaigaClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for TaigaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaigaClient")
            .field("host", &self.inner.host)
            .field("api_path", &self.inner.api_path)
            .field("pagination", &self.inner.pagination)
            .field("tls_verify", &self.inner.tls_verify)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TaigaClient`].
#[derive(Clone)]
pub struct ClientBuilder {
    host: String,
    api_path: String,
    token: Option<String>,
    token_type: TokenType,
    auth_type: String,
    tls_verify: bool,
    pagination: bool,
    cache_valid_time: Duration,
    max_pages: Option<u32>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("host", &self.host)
            .field("api_path", &self.api_path)
            .field("has_token", &self.token.is_some())
            .field("token_type", &self.token_type)
            .field("tls_verify", &self.tls_verify)
            .field("pagination", &self.pagination)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            token: None,
            token_type: TokenType::Bearer,
            auth_type: DEFAULT_AUTH_TYPE.to_string(),
            tls_verify: true,
            pagination: true,
            cache_valid_time: DEFAULT_CACHE_VALID_TIME,
            max_pages: None,
        }
    }
}

impl ClientBuilder {
    /// Base URL of the Taiga instance, e.g. `https://api.taiga.io`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// API path prefix (defaults to `/api/v1`).
    pub fn api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Use an existing token instead of calling [`TaigaClient::auth`].
    pub fn token(mut self, token: impl Into<String>, token_type: TokenType) -> Self {
        self.token = Some(token.into());
        self.token_type = token_type;
        self
    }

    /// The `type` sent to the auth endpoint (defaults to `normal`).
    pub fn auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = auth_type.into();
        self
    }

    /// Verify the server's TLS certificate (defaults to true).
    pub fn tls_verify(mut self, tls_verify: bool) -> Self {
        self.tls_verify = tls_verify;
        self
    }

    /// Allow lazy server pagination on list calls (defaults to true).
    pub fn pagination(mut self, pagination: bool) -> Self {
        self.pagination = pagination;
        self
    }

    /// How long a cached GET response stays valid (defaults to 60 seconds).
    pub fn cache_valid_time(mut self, valid_time: Duration) -> Self {
        self.cache_valid_time = valid_time;
        self
    }

    /// Stop auto-pagination after this many pages. Unbounded by default.
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<TaigaClient> {
        Url::parse(&self.host)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .danger_accept_invalid_certs(!self.tls_verify)
            .build()
            .map_err(TaigaError::HttpError)?;

        let session = Session {
            token: self.token,
            token_type: self.token_type,
            refresh: None,
        };

        Ok(TaigaClient {
            inner: Arc::new(ClientInner {
                http,
                host: self.host,
                api_path: self.api_path,
                auth_type: self.auth_type,
                pagination: self.pagination,
                tls_verify: self.tls_verify,
                max_pages: self.max_pages,
                session: RwLock::new(session),
                cache: Mutex::new(ResponseCache::new(self.cache_valid_time)),
            }),
        })
    }
}

impl TaigaClient {
    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create an unauthenticated client for `host`.
    ///
    /// Call [`auth`](Self::auth) before issuing resource requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL.
    pub fn new(host: &str) -> Result<Self> {
        Self::builder().host(host).build()
    }

    /// Create a client for `host` that already holds a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL.
    pub fn with_token(host: &str, token: &str) -> Result<Self> {
        Self::builder()
            .host(host)
            .token(token, TokenType::Bearer)
            .build()
    }

    /// Create a client from environment variables.
    ///
    /// - `TAIGA_HOST` (optional) - defaults to `https://api.taiga.io`
    /// - `TAIGA_TOKEN` (optional) - token to use without calling `auth`
    /// - `TAIGA_TOKEN_TYPE` (optional) - `Bearer` (default) or `Application`
    /// - `TAIGA_TLS_VERIFY` (optional) - `false`/`0` disables verification
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(host) = env::var("TAIGA_HOST") {
            builder = builder.host(host);
        }

        if let Ok(token) = env::var("TAIGA_TOKEN") {
            let token_type = match env::var("TAIGA_TOKEN_TYPE") {
                Ok(t) => t.parse()?,
                Err(_) => TokenType::Bearer,
            };
            builder = builder.token(token, token_type);
        }

        if let Ok(verify) = env::var("TAIGA_TLS_VERIFY") {
            builder = builder.tls_verify(!matches!(
                verify.to_ascii_lowercase().as_str(),
                "false" | "0" | "no"
            ));
        }

        builder.build()
    }

    /// Base URL of the Taiga instance.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Whether list calls may use lazy server pagination.
    pub fn pagination_enabled(&self) -> bool {
        self.inner.pagination
    }

    pub(crate) fn max_pages(&self) -> Option<u32> {
        self.inner.max_pages
    }

    /// Returns true once a token is available.
    pub fn is_authenticated(&self) -> bool {
        self.session().token.is_some()
    }

    /// The refresh token from the last successful `auth` or refresh.
    pub fn refresh_token_value(&self) -> Option<String> {
        self.session().refresh.clone()
    }

    /// Replace the session credentials.
    ///
    /// Every clone of this client, and every resource obtained through it,
    /// uses the new token from the next request on.
    pub fn set_token(&self, token: impl Into<String>, token_type: TokenType) {
        let mut session = self.session_mut();
        *session = Session {
            token: Some(token.into()),
            token_type,
            refresh: None,
        };
    }

    /// Authenticate with a username and password.
    ///
    /// # Errors
    ///
    /// Returns a REST error if the server does not answer 200.
    #[tracing::instrument(skip(self, password))]
    pub async fn auth(&self, username: &str, password: &str) -> Result<()> {
        let payload = json!({
            "type": self.inner.auth_type,
            "username": username,
            "password": password,
        });
        let tokens = self.request_tokens("auth", &payload).await?;
        self.install_tokens(tokens);
        Ok(())
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// Uses `token_refresh` when given, otherwise the refresh token stored by
    /// the last [`auth`](Self::auth).
    ///
    /// # Errors
    ///
    /// Returns a usage error when no refresh token is available, or a REST
    /// error if the server does not answer 200.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self, token_refresh: Option<&str>) -> Result<()> {
        let refresh = match token_refresh.filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => self
                .refresh_token_value()
                .ok_or_else(|| TaigaError::Usage("Refresh token not set".to_string()))?,
        };
        let tokens = self
            .request_tokens("auth/refresh", &json!({ "refresh": refresh }))
            .await?;
        self.install_tokens(tokens);
        Ok(())
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self, request), fields(template = %request.template()))]
    pub async fn get(&self, request: Request) -> Result<RawResponse> {
        self.dispatch(Method::GET, &request).await
    }

    /// Make a POST request.
    #[tracing::instrument(skip(self, request), fields(template = %request.template()))]
    pub async fn post(&self, request: Request) -> Result<RawResponse> {
        self.dispatch(Method::POST, &request).await
    }

    /// Make a PUT request.
    #[tracing::instrument(skip(self, request), fields(template = %request.template()))]
    pub async fn put(&self, request: Request) -> Result<RawResponse> {
        self.dispatch(Method::PUT, &request).await
    }

    /// Make a PATCH request.
    #[tracing::instrument(skip(self, request), fields(template = %request.template()))]
    pub async fn patch(&self, request: Request) -> Result<RawResponse> {
        self.dispatch(Method::PATCH, &request).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self, request), fields(template = %request.template()))]
    pub async fn delete(&self, request: Request) -> Result<RawResponse> {
        self.dispatch(Method::DELETE, &request).await
    }

    async fn dispatch(&self, method: Method, request: &Request) -> Result<RawResponse> {
        let url = self.resolve(&request.path()?, request.query_params().pairs())?;
        let multipart = !request.files().is_empty();
        let cacheable = method == Method::GET && request.wants_cache() && !multipart;

        if cacheable {
            let cached = self.cache().get(url.as_str());
            match cached {
                Ok(response) => {
                    tracing::debug!(url = %url, "cache hit");
                    return Ok(response);
                }
                Err(CacheMiss::Expired) => {
                    tracing::debug!(url = %url, "cache entry expired");
                    self.cache().remove(url.as_str());
                }
                Err(CacheMiss::Missing) => tracing::debug!(url = %url, "cache miss"),
            }
        }

        let paginate = method == Method::GET && request.wants_pagination();
        let headers = self.headers(paginate, multipart)?;

        let mut builder = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .headers(headers);

        if multipart {
            builder = builder.multipart(multipart_form(request));
        } else if let Some(body) = request.body() {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = self
            .execute(builder, &url, &method, is_bad_response)
            .await?;

        if cacheable {
            self.cache().put(url.as_str(), response.clone());
        }

        Ok(response)
    }

    /// POST to an auth endpoint, which only counts 200 as success.
    async fn request_tokens(&self, path: &str, payload: &Value) -> Result<AuthResponse> {
        let url = self.resolve(path, &[])?;
        let builder = self
            .inner
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(payload)?);

        let response = self
            .execute(builder, &url, &Method::POST, |status| status != 200)
            .await?;
        response.json()
    }

    fn install_tokens(&self, tokens: AuthResponse) {
        let mut session = self.session_mut();
        *session = Session {
            token: Some(tokens.auth_token),
            token_type: TokenType::Bearer,
            refresh: tokens.refresh,
        };
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        url: &Url,
        method: &Method,
        is_failure: impl Fn(u16) -> bool,
    ) -> Result<RawResponse> {
        let uri = url.as_str();

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%method, uri, error = %e, "request failed before a response");
                return Err(TaigaError::network(uri, method.clone()));
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(%method, uri, error = %e, "failed to read response body");
                return Err(TaigaError::network(uri, method.clone()));
            }
        };

        if is_failure(status) {
            tracing::warn!(%method, uri, status, "request rejected");
            return Err(TaigaError::rest(uri, status, body, method.clone()));
        }

        Ok(RawResponse::new(uri.to_string(), status, headers, body))
    }

    /// Join host, API path and resource path, then attach the query.
    fn resolve(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let joined = [
            self.inner.host.as_str(),
            self.inner.api_path.as_str(),
            path,
        ]
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

        let mut url = Url::parse(&joined)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn headers(&self, paginate: bool, multipart: bool) -> Result<HeaderMap> {
        let session = self.session();
        let token = session.token.as_deref().ok_or_else(|| {
            TaigaError::Usage("Not authenticated: call auth() or provide a token".to_string())
        })?;

        let mut headers = HeaderMap::new();
        if !multipart {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let auth = HeaderValue::from_str(&format!("{} {}", session.token_type, token))
            .map_err(|_| TaigaError::Usage("Token contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let pagination_header = if self.inner.pagination && paginate {
            LAZY_PAGINATION
        } else {
            DISABLE_PAGINATION
        };
        headers.insert(pagination_header, HeaderValue::from_static("true"));

        Ok(headers)
    }

    fn session(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn session_mut(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Status codes from 400 through 500 inclusive are failures.
fn is_bad_response(status: u16) -> bool {
    (400..=500).contains(&status)
}

fn multipart_form(request: &Request) -> Form {
    let mut form = Form::new();

    if let Some(Value::Object(fields)) = request.body() {
        for (key, value) in fields {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }
    }

    for file in request.files() {
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        form = form.part(file.field_name.clone(), part);
    }

    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug_hides_token() {
        let client = TaigaClient::with_token("https://api.taiga.io", "secret-token").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("TaigaClient"));
        assert!(debug.contains("host"));
        assert!(!debug.contains("secret-token"));

        let builder = TaigaClient::builder().token("secret-token", TokenType::Application);
        assert!(!format!("{builder:?}").contains("secret-token"));
    }

    #[test]
    fn test_resolve_joins_parts() {
        let client = TaigaClient::builder()
            .host("http://host/")
            .api_path("/v1/")
            .build()
            .unwrap();
        let url = client.resolve("nowhere", &[]).unwrap();
        assert_eq!(url.as_str(), "http://host/v1/nowhere");

        let url = client.resolve("/projects/1", &[]).unwrap();
        assert_eq!(url.as_str(), "http://host/v1/projects/1");
    }

    #[test]
    fn test_resolve_appends_query() {
        let client = TaigaClient::new("http://host").unwrap();
        let query = vec![("project".to_string(), "1".to_string())];
        let url = client.resolve("userstories", &query).unwrap();
        assert_eq!(url.as_str(), "http://host/api/v1/userstories?project=1");
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(matches!(
            TaigaClient::new("not a url"),
            Err(TaigaError::UrlError(_))
        ));
    }

    #[test]
    fn test_bad_response_range() {
        assert!(!is_bad_response(200));
        assert!(!is_bad_response(399));
        assert!(is_bad_response(400));
        assert!(is_bad_response(404));
        assert!(is_bad_response(500));
        assert!(!is_bad_response(502));
    }

    #[test]
    fn test_headers_require_token() {
        let client = TaigaClient::new("http://host").unwrap();
        assert!(matches!(
            client.headers(false, false),
            Err(TaigaError::Usage(_))
        ));
    }

    #[test]
    fn test_headers_pagination_choice() {
        let client = TaigaClient::with_token("http://host", "f4k3").unwrap();

        let headers = client.headers(true, false).unwrap();
        assert_eq!(headers.get(LAZY_PAGINATION).unwrap(), "true");
        assert!(headers.get(DISABLE_PAGINATION).is_none());
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer f4k3");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");

        let headers = client.headers(false, true).unwrap();
        assert_eq!(headers.get(DISABLE_PAGINATION).unwrap(), "true");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_pagination_disabled_client_never_lazy() {
        let client = TaigaClient::builder()
            .host("http://host")
            .token("f4k3", TokenType::Application)
            .pagination(false)
            .build()
            .unwrap();

        let headers = client.headers(true, false).unwrap();
        assert!(headers.get(LAZY_PAGINATION).is_none());
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Application f4k3");
    }

    #[test]
    fn test_set_token_visible_to_clones() {
        let client = TaigaClient::new("http://host").unwrap();
        let clone = client.clone();
        assert!(!clone.is_authenticated());

        client.set_token("new", TokenType::Bearer);
        assert!(clone.is_authenticated());
        let headers = clone.headers(false, false).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer new");
    }

    #[test]
    fn test_token_type_parse() {
        assert_eq!("Application".parse::<TokenType>().unwrap(), TokenType::Application);
        assert_eq!("bearer".parse::<TokenType>().unwrap(), TokenType::Bearer);
        assert!("Basic".parse::<TokenType>().is_err());
    }
}
