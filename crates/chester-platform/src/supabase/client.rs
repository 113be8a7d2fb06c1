use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use chester_types::{ChesterError, Result, config::BackendConfig, user::UserIdentity};

/// A signed-in GoTrue session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserIdentity,
}

/// HTTP plumbing shared by the table gateway and the auth adapter.
/// Clone-cheap; clones share the signed-in session.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    session: Rc<RefCell<Option<AuthSession>>>,
}

impl SupabaseClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: Rc::new(RefCell::new(None)),
        }
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    pub(crate) fn set_session(&self, session: Option<AuthSession>) {
        *self.session.borrow_mut() = session;
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The user's access token once signed in, the anon key before.
    pub(crate) fn bearer(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        RequestBuilder::new(&self.url(path))
            .method(method)
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.bearer()))
    }

    /// Send a request and decode its JSON body. An empty body decodes to `null`.
    pub(crate) async fn send(&self, builder: RequestBuilder, body: Option<&Value>) -> Result<Value> {
        let request = match body {
            Some(body) => builder.json(body),
            None => builder.build(),
        }
        .map_err(|e| ChesterError::Network(e.to_string()))?;

        let response = request
            .send()
            .await
            .map_err(|e| ChesterError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChesterError::Network(e.to_string()))?;

        if !response.ok() {
            return Err(status_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Map a failed response onto the error taxonomy.
pub(crate) fn status_error(status: u16, body: &str) -> ChesterError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v[*key].as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 => ChesterError::Unauthenticated,
        404 => ChesterError::NotFound(message),
        _ => ChesterError::Gateway(format!("HTTP {}: {}", status, message)),
    }
}
