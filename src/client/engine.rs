use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode, Url};
use serde_json::{Map, Value};

use super::backoff::Backoff;
use super::config::ClientConfig;
use super::error::{ClientError, ClientResult};
use super::manager::SessionManager;
use super::surface::{LogOnlySurface, LoginSurface};

/// Per-call options. Query entries that are null or empty strings are skipped.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Map<String, Value>,
    pub body: Option<Value>,
    /// Extra headers; an `Authorization` here disables automatic token attachment
    pub headers: HeaderMap,
    /// Overrides the configured request timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Who put the `Authorization` header on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    None,
    Caller,
    Static,
    Session,
}

/// One logical API call with timeout, transport retries and 401 recovery layered around it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    sessions: Option<SessionManager>,
    surface: Arc<dyn LoginSurface>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder().gzip(true).build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
            sessions: None,
            surface: Arc::new(LogOnlySurface),
        })
    }

    pub fn with_sessions(mut self, sessions: SessionManager) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn with_login_surface(mut self, surface: Arc<dyn LoginSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sessions(&self) -> Option<&SessionManager> {
        self.sessions.as_ref()
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.request(Method::GET, path, options).await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.request(Method::POST, path, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.request(Method::PUT, path, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.request(Method::DELETE, path, options).await
    }

    /// Issue `method path` against the configured base URL.
    ///
    /// Transport failures and timeouts are retried with backoff. A 401 triggers
    /// one shared session refresh and exactly one more attempt; if that does not
    /// succeed the session is signed out and the login surface is shown. Other
    /// non-2xx answers are returned as [`ClientError::Status`] without retrying.
    pub async fn request(&self, method: Method, path: &str, options: RequestOptions) -> ClientResult<Value> {
        let url = self.build_url(path, &options.query)?;
        let (headers, source) = self.build_headers(&options.headers).await?;
        let body = match &options.body {
            Some(body) => Some(serde_json::to_vec(body).map_err(|_| ClientError::InvalidJson)?),
            None => None,
        };
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);

        let response = self.send_with_retry(&method, &url, &headers, body.as_deref(), timeout).await?;
        if response.status().is_success() {
            return parse_body(response).await;
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(sessions) = &self.sessions {
                return self
                    .recover_unauthorized(sessions, response, &method, &url, headers, source, body.as_deref(), timeout)
                    .await;
            }
        }
        Err(status_error(&method, &url, response).await)
    }

    #[allow(clippy::too_many_arguments)]
    async fn recover_unauthorized(
        &self,
        sessions: &SessionManager,
        response: Response,
        method: &Method,
        url: &Url,
        mut headers: HeaderMap,
        source: TokenSource,
        body: Option<&[u8]>,
        timeout: Duration,
    ) -> ClientResult<Value> {
        let mut failure = status_error(method, url, response).await;

        if let Some(session) = sessions.refresh().await {
            // Only a token we attached ourselves is swapped for the fresh one
            if matches!(source, TokenSource::Session | TokenSource::None) {
                headers.insert(AUTHORIZATION, bearer(&session.access_token)?);
            }
            match self.send_with_retry(method, url, &headers, body, timeout).await {
                Ok(retry) if retry.status().is_success() => return parse_body(retry).await,
                Ok(retry) => failure = status_error(method, url, retry).await,
                Err(e) => failure = e,
            }
        }

        tracing::warn!("{} {} still unauthorized after refresh; signing out", method, url.path());
        // Only the caller that cleared the session sends the user to login
        if sessions.sign_out().await && !self.surface.is_active() {
            self.surface.redirect();
        }
        Err(failure)
    }

    fn build_url(&self, path: &str, query: &Map<String, Value>) -> ClientResult<Url> {
        let raw = format!("{}{}", self.config.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ClientError::Config(format!("{}: {}", raw, e)))?;
        let pairs: Vec<(&String, String)> = query
            .iter()
            .filter_map(|(key, value)| query_value(value).map(|v| (key, v)))
            .collect();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in pairs {
                serializer.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    async fn build_headers(&self, extra: &HeaderMap) -> ClientResult<(HeaderMap, TokenSource)> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        if let Some((name, value)) = &self.config.auth_header {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid value for header {}", name)))?;
            headers.insert(name, value);
        }
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }

        if headers.contains_key(AUTHORIZATION) {
            return Ok((headers, TokenSource::Caller));
        }
        if let Some(token) = &self.config.static_token {
            headers.insert(AUTHORIZATION, bearer(token)?);
            return Ok((headers, TokenSource::Static));
        }
        if let Some(sessions) = &self.sessions {
            if let Some(token) = sessions.access_token().await {
                headers.insert(AUTHORIZATION, bearer(&token)?);
                return Ok((headers, TokenSource::Session));
            }
        }
        Ok((headers, TokenSource::None))
    }

    async fn send_with_retry(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        timeout: Duration,
    ) -> ClientResult<Response> {
        let mut backoff = Backoff::new(&self.config.retry);
        loop {
            match self.send_once(method, url, headers, body, timeout).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => backoff.retry(e).await?,
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        timeout: Duration,
    ) -> ClientResult<Response> {
        let mut builder = self.http.request(method.clone(), url.clone()).headers(headers.clone());
        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }
        match tokio::time::timeout(timeout, builder.send()).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::debug!("{} {} timed out after {:?}", method, url.path(), timeout);
                Err(ClientError::RequestTimeout)
            }
        }
    }
}

fn bearer(token: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::Config("token is not a valid header value".to_string()))
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

async fn status_error(method: &Method, url: &Url, response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ClientError::Status {
        method: method.to_string(),
        path: url.path().to_string(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        body,
    }
}

/// JSON bodies are accepted even when the content type says otherwise.
async fn parse_body(response: Response) -> ClientResult<Value> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.contains("application/json"));
    let bytes = response.bytes().await?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(_) if is_json => Err(ClientError::InvalidJson),
        Err(_) => Err(ClientError::InvalidContentType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ApiClient {
        ApiClient::new(ClientConfig::new("http://localhost:3000/api")).unwrap()
    }

    #[test]
    fn query_skips_null_and_empty_values() {
        let query = json!({ "status": "open", "customer_id": null, "plate": "", "total": 10 });
        let url = client().build_url("/quotes", query.as_object().unwrap()).unwrap();
        assert_eq!(url.path(), "/api/quotes");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("status".to_string(), "open".to_string()), ("total".to_string(), "10".to_string())]
        );
    }

    #[tokio::test]
    async fn default_headers() {
        let (headers, source) = client().build_headers(&HeaderMap::new()).await.unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert!(!headers.contains_key(AUTHORIZATION));
        assert_eq!(source, TokenSource::None);
    }

    #[tokio::test]
    async fn caller_authorization_wins_over_static_token() {
        let mut config = ClientConfig::new("http://localhost:3000/api");
        config.static_token = Some("static".into());
        config.auth_header = Some(("X-Api-Key".into(), "k".into()));
        let client = ApiClient::new(config).unwrap();

        let (headers, source) = client.build_headers(&HeaderMap::new()).await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer static");
        assert_eq!(headers["x-api-key"], "k");
        assert_eq!(source, TokenSource::Static);

        let mut extra = HeaderMap::new();
        extra.insert(AUTHORIZATION, HeaderValue::from_static("Bearer mine"));
        let (headers, source) = client.build_headers(&extra).await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer mine");
        assert_eq!(source, TokenSource::Caller);
    }
}
