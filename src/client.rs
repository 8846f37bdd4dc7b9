//! Authenticated JSON client for the academic records backend.

use crate::config::ClientConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::record::{records_from_json, Record};
use crate::session::{Credentials, Session};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const LOGIN_PATH: &str = "/auth/iniciar-sesion";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> ConsoleResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(ApiClient {
            http,
            base_url: config.base().to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn parse_url(&self, path: &str) -> ConsoleResult<Url> {
        let raw = self.url(path);
        Url::parse(&raw).map_err(|e| ConsoleError::Validation(format!("invalid URL {}: {}", raw, e)))
    }

    /// `{collection}/{id}` with `id` percent-encoded as one path segment.
    pub fn item_url(&self, collection: &str, id: &str) -> ConsoleResult<Url> {
        let mut url = self.parse_url(collection)?;
        let base = url.to_string();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Validation(format!("cannot append a path to {}", base)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Send one request with the session's bearer token (if any) and return
    /// the raw body of a 2xx response. A 401 also ends the session.
    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> ConsoleResult<String> {
        debug!(method = %method, url = %url, "request");
        let mut req = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(creds) = self.session.credentials().await {
            req = req.bearer_auth(&creds.access_token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "request failed");
            ConsoleError::Transport(e)
        })?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let err = ConsoleError::from_response(status.as_u16(), &text);
            warn!(method = %method, url = %url, status = status.as_u16(), error = %err, "request rejected");
            if matches!(err, ConsoleError::Unauthorized(_)) {
                if let Err(e) = self.session.logout().await {
                    warn!(error = %e, "could not clear session after 401");
                }
            }
            return Err(err);
        }
        Ok(text)
    }

    async fn fetch(&self, url: Url, query: &[(&str, &str)]) -> ConsoleResult<Value> {
        let text = self.send(Method::GET, url, query, None).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// GET and decode JSON. Empty bodies decode as `null`.
    pub async fn get_json(&self, path: &str) -> ConsoleResult<Value> {
        self.fetch(self.parse_url(path)?, &[]).await
    }

    /// GET `{collection}/{id}`.
    pub async fn get_item(&self, collection: &str, id: &str) -> ConsoleResult<Value> {
        self.fetch(self.item_url(collection, id)?, &[]).await
    }

    /// GET a collection. Anything but a JSON array counts as empty.
    pub async fn get_records(&self, path: &str) -> ConsoleResult<Vec<Record>> {
        self.get_records_where(path, &[]).await
    }

    /// GET a collection filtered by encoded query pairs.
    pub async fn get_records_where(&self, path: &str, query: &[(&str, &str)]) -> ConsoleResult<Vec<Record>> {
        Ok(records_from_json(self.fetch(self.parse_url(path)?, query).await?))
    }

    // A write the server accepted stands even if its reply is not JSON.
    async fn write(&self, method: Method, url: Url, body: &Value) -> ConsoleResult<Value> {
        let text = self.send(method.clone(), url.clone(), &[], Some(body)).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str::<Value>(&text).unwrap_or_else(|e| {
            debug!(method = %method, url = %url, error = %e, "non-JSON success body ignored");
            Value::Null
        }))
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> ConsoleResult<Value> {
        self.write(Method::POST, self.parse_url(path)?, body).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> ConsoleResult<Value> {
        self.write(Method::PUT, self.parse_url(path)?, body).await
    }

    /// PUT to `{collection}/{id}`.
    pub async fn put_item(&self, collection: &str, id: &str, body: &Value) -> ConsoleResult<Value> {
        self.write(Method::PUT, self.item_url(collection, id)?, body).await
    }

    /// Any 2xx counts as deleted; the body is not read as JSON.
    pub async fn delete(&self, path: &str) -> ConsoleResult<()> {
        self.send(Method::DELETE, self.parse_url(path)?, &[], None).await.map(|_| ())
    }

    pub async fn delete_item(&self, collection: &str, id: &str) -> ConsoleResult<()> {
        self.send(Method::DELETE, self.item_url(collection, id)?, &[], None)
            .await
            .map(|_| ())
    }

    /// Exchange username/password for a token and start the session.
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<Credentials> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, "login");
        let resp = self
            .http
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ConsoleError::from_response(status.as_u16(), &text));
        }
        let token: TokenResponse = serde_json::from_str(&text)?;
        let creds = Credentials {
            access_token: token.access_token,
            token_type: token.token_type.unwrap_or_else(|| "bearer".into()),
        };
        self.session.login(creds.clone()).await?;
        info!(username = %username, "logged in");
        Ok(creds)
    }

    pub async fn logout(&self) -> ConsoleResult<()> {
        self.session.logout().await
    }
}
