//! Acting-identity resolution.
//!
//! The composition root resolves the user once per action through the
//! auth port and passes it explicitly into every core operation.

use chester_types::{ChesterError, Result, user::UserIdentity};
use crate::ports::AuthPort;

/// The signed-in user, or `Unauthenticated` before any data call is made.
pub async fn require_user(auth: &dyn AuthPort) -> Result<UserIdentity> {
    match auth.current_user().await? {
        Some(user) if !user.id.is_empty() => Ok(user),
        _ => {
            log::warn!("Operation attempted without a signed-in user");
            Err(ChesterError::Unauthenticated)
        }
    }
}
