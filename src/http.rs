use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

pub const APP_TOKEN_HEADER: &str = "x-app-token";

/// Thin wrapper around one reqwest client: every call carries the app token,
/// authenticated calls also carry the session's bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        let app_token = HeaderValue::from_str(&config.app_token)
            .map_err(|e| ApiError::Config(format!("app token is not a valid header: {e}")))?;
        headers.insert(APP_TOKEN_HEADER, app_token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = format!("moviedeck/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    pub async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.execute(method, path, query, body).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Like [`send`](Self::send) but ignores the response body.
    pub async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute(method, path, &[], body).await.map(|_| ())
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Request: {} {}", method, path);

        let mut req = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        // Read the token per request so a 401 elsewhere is seen immediately.
        if let Some(token) = self.session.token() {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(|e| {
            error!("Network error - no response from server ({} {}): {}", method, path, e);
            ApiError::from_reqwest(e)
        })?;
        let status = res.status();
        let text = res.text().await.map_err(ApiError::from_reqwest)?;
        debug!("Response: {} {}", status.as_u16(), path);

        if status.is_success() {
            return Ok(text);
        }
        Err(self.handle_failure(status, path, &text))
    }

    fn handle_failure(&self, status: StatusCode, path: &str, body: &str) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("Unauthorized - please login ({})", path);
                self.session.invalidate();
                ApiError::Unauthorized
            }
            StatusCode::FORBIDDEN => {
                warn!("Forbidden - insufficient permissions ({})", path);
                ApiError::from_status(status, body)
            }
            StatusCode::NOT_FOUND => {
                warn!("Resource not found ({})", path);
                ApiError::from_status(status, body)
            }
            s if s.is_server_error() => {
                error!("Server error {} ({}): {}", s.as_u16(), path, body);
                ApiError::from_status(status, body)
            }
            s => {
                warn!("Error {} ({}): {}", s.as_u16(), path, body);
                ApiError::from_status(status, body)
            }
        }
    }
}

/// Percent-encodes one path segment (ids come from user input and links).
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
