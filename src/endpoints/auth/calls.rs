use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use super::{validate_login, validate_registration, AuthResponse, LoginCredentials, RegisterCredentials, User};

/// Log in and keep the session cookie for later invocations.
pub async fn login(client: &ApiClient, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
    validate_login(credentials)?;

    let response: AuthResponse = client.post_json("/auth/login", credentials).await?;
    client.persist_session()?;

    info!(username = %response.user.username, role = %response.user.role, "logged in");
    Ok(response)
}

pub async fn register(
    client: &ApiClient,
    credentials: &RegisterCredentials,
    confirm: &str,
) -> Result<User, ApiError> {
    validate_registration(credentials, confirm)?;

    let user: User = client.post_json("/auth/register", credentials).await?;
    info!(username = %user.username, "registered");
    Ok(user)
}

/// The local session is dropped even when the server call fails.
pub async fn logout(client: &ApiClient) -> Result<(), ApiError> {
    let result = client.post_empty::<()>("/auth/logout", None).await;
    client.clear_session()?;

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.requires_login() => Ok(()),
        Err(e) => {
            warn!(error = %e, "logout request failed, local session cleared anyway");
            Err(e)
        }
    }
}

pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    client.get_json("/auth/me").await
}
