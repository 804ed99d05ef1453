use crate::config::ProteusConfig;
use crate::error::{ProteusError, Result};
use crate::proteus::types::{ApiEntity, EntityId};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const API_PREFIX: &str = "Services/REST/v1";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters of a single call, in the order they are sent.
pub type Params<'a> = [(&'a str, String)];

/// Unauthenticated connection settings. `login` turns it into a [`Session`].
#[derive(Clone)]
pub struct ProteusClient {
    http: Client,
    base_url: String, // e.g. "https://proteus.example.com"
    user: String,
    password: String,
    replacements: Vec<(String, String)>,
}

impl ProteusClient {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        replacements: Vec<(String, String)>,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http(REQUEST_TIMEOUT)?,
            base_url: base_url.into(),
            user: user.into(),
            password: password.into(),
            replacements,
        })
    }

    /// Resolves the credential once, here, and never again.
    pub async fn from_config(config: &ProteusConfig) -> Result<Self> {
        let password = config.credential()?.resolve().await?;
        Self::new(
            &config.url,
            &config.user,
            password,
            config.replacements().to_vec(),
        )
    }

    /// Replace the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http(timeout)?;
        Ok(self)
    }

    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            API_PREFIX,
            path.trim_start_matches('/')
        )
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
        auth: Option<&str>,
    ) -> Result<Value> {
        debug!(%method, path, "Proteus request");
        let mut req = self
            .http
            .request(method, self.url(path))
            .query(params)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = auth {
            req = req.header(AUTHORIZATION, token);
        }

        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(ProteusError::Remote { status, body });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ProteusError::decode(path, e))
    }

    pub async fn login(self) -> Result<Session> {
        let params = [
            ("username", self.user.clone()),
            ("password", self.password.clone()),
        ];
        let body = match self.request(Method::GET, "login", &params, None).await {
            Ok(body) => body,
            Err(ProteusError::Remote { status, body }) => {
                return Err(ProteusError::Auth(format!("{status}: {body}")));
            }
            Err(err) => return Err(err),
        };

        let token = auth_token(&body)?;
        info!(user = %self.user, "logged in to Proteus");
        Ok(Session {
            client: self,
            token,
        })
    }
}

/// Login answers with "Session Token-> BAMAuthToken: <token> <- for User : <user>".
fn auth_token(body: &Value) -> Result<String> {
    let text = body
        .as_str()
        .ok_or_else(|| ProteusError::Auth(format!("unexpected login response: {body}")))?;
    match text.split_whitespace().collect::<Vec<_>>().as_slice() {
        [_, _, scheme, token, ..] => Ok(format!("{scheme} {token}")),
        _ => Err(ProteusError::Auth(format!(
            "unexpected login response: {text}"
        ))),
    }
}

fn build_http(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProteusError::Http)
}

/// Decode a response body into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| ProteusError::decode(path, e))
}

/// Authenticated connection. Every API operation hangs off this type.
pub struct Session {
    client: ProteusClient,
    token: String,
}

impl Session {
    pub fn client(&self) -> &ProteusClient {
        &self.client
    }

    /// Value of the `Authorization` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn get(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        self.client
            .request(Method::GET, path, params, Some(&self.token))
            .await
    }

    pub async fn post(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        self.client
            .request(Method::POST, path, params, Some(&self.token))
            .await
    }

    pub async fn delete(&self, path: &str, params: &Params<'_>) -> Result<Value> {
        self.client
            .request(Method::DELETE, path, params, Some(&self.token))
            .await
    }

    pub async fn get_entities_by_name(
        &self,
        name: &str,
        parent: EntityId,
        object_type: &str,
    ) -> Result<Vec<ApiEntity>> {
        let params = [
            ("count", "10".to_string()),
            ("name", name.to_string()),
            ("parentId", parent.to_string()),
            ("start", "0".to_string()),
            ("type", object_type.to_string()),
        ];
        let body = self.get("getEntitiesByName", &params).await?;
        decode_list("getEntitiesByName", body)
    }

    pub async fn get_entities(&self, parent: EntityId, object_type: &str) -> Result<Vec<ApiEntity>> {
        let params = [
            ("count", "50".to_string()),
            ("parentId", parent.to_string()),
            ("start", "0".to_string()),
            ("type", object_type.to_string()),
        ];
        let body = self.get("getEntities", &params).await?;
        decode_list("getEntities", body)
    }

    /// Generic removal of any object by id.
    pub async fn delete_entity(&self, id: EntityId) -> Result<()> {
        self.delete("delete", &[("objectId", id.to_string())]).await?;
        info!(id, "deleted Proteus object");
        Ok(())
    }

    /// Invalidate the token. Consumes the session; the client can log in again.
    pub async fn logout(self) -> Result<ProteusClient> {
        self.get("logout", &[]).await?;
        debug!("logged out of Proteus");
        Ok(self.client)
    }

    /// End a scoped session: logout is always attempted, `outcome` is returned untouched.
    pub async fn finish<T, E>(self, outcome: std::result::Result<T, E>) -> std::result::Result<T, E> {
        if let Err(err) = self.logout().await {
            warn!(error = %err, "logout from Proteus failed");
        }
        outcome
    }
}

fn decode_list(path: &str, body: Value) -> Result<Vec<ApiEntity>> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    decode(path, body)
}
