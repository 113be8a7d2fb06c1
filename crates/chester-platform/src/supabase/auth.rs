use async_trait::async_trait;
use gloo_net::http::Method;
use serde_json::{json, Value};

use chester_core::ports::AuthPort;
use chester_types::{ChesterError, Result, user::UserIdentity};
use super::client::{AuthSession, SupabaseClient};

/// Email/password auth through GoTrue. The session lives in memory only.
pub struct SupabaseAuth {
    client: SupabaseClient,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn password_call(&self, path: &str, email: &str, password: &str) -> Result<Value> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ChesterError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let body = json!({ "email": email, "password": password });
        let builder = self.client.request(Method::POST, path);
        self.client.send(builder, Some(&body)).await
    }
}

/// Accepts a token response (`access_token` + `user`) or, when sign-up
/// still awaits email confirmation, a bare user object.
pub(crate) fn parse_auth_response(value: Value) -> Result<(UserIdentity, Option<AuthSession>)> {
    if value.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(value)?;
        return Ok((session.user.clone(), Some(session)));
    }
    let user: UserIdentity = serde_json::from_value(value)?;
    if user.id.is_empty() {
        return Err(ChesterError::Gateway("auth response has no user id".to_string()));
    }
    Ok((user, None))
}

#[async_trait(?Send)]
impl AuthPort for SupabaseAuth {
    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.client.session().map(|s| s.user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let value = self
            .password_call("/auth/v1/token?grant_type=password", email, password)
            .await?;
        let (user, session) = parse_auth_response(value)?;
        let session = session.ok_or_else(|| {
            ChesterError::Gateway("sign-in returned no session".to_string())
        })?;
        self.client.set_session(Some(session));
        log::info!("Signed in as {}", user.id);
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let value = self.password_call("/auth/v1/signup", email, password).await?;
        let (user, session) = parse_auth_response(value)?;
        match session {
            Some(session) => {
                self.client.set_session(Some(session));
                log::info!("Signed up and signed in as {}", user.id);
            }
            None => log::info!("Signed up {}; email confirmation pending", user.id),
        }
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.client.session().is_none() {
            return Ok(());
        }
        let builder = self.client.request(Method::POST, "/auth/v1/logout");
        // The local session goes regardless; a failed revoke only expires server-side
        self.client.set_session(None);
        if let Err(e) = self.client.send(builder, None).await {
            log::warn!("Sign-out request failed: {}", e);
        }
        Ok(())
    }
}
