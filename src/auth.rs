//! Sign-in and sign-out

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use qhse_session::{DashboardStats, Session, UserProfile};

use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::gateway::AuthorizedClient;
use crate::navigation::{Navigation, Route};

/// Inline message for any failed sign-in
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of a successful `POST login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Signs in with email and password.
///
/// Any failure on the way to a usable token, including a non-200 answer or an
/// unexpected body, is reported as [`Error::InvalidCredentials`] and leaves
/// the session untouched. Once the token is stored the login stands; the
/// follow-up dashboard fetch can only add to it.
pub async fn login(
    gateway: &AuthorizedClient,
    navigation: &dyn Navigation,
    email: &str,
    password: &str,
) -> Result<Session> {
    let response = request_token(gateway, email, password).await.map_err(|e| {
        warn!(error = %e, "login rejected");
        Error::InvalidCredentials
    })?;

    gateway
        .credentials()
        .save(&response.user, &response.token)
        .await
        .map_err(|e| {
            warn!(error = %e, "could not persist credentials");
            Error::InvalidCredentials
        })?;
    let session = gateway
        .session()
        .login(response.user.clone(), response.token.clone());
    info!(user_id = response.user.id, "signed in");

    match fetch_stats(gateway, &response.token).await {
        Ok(stats) => {
            gateway.session().set_dashboard_stats(stats);
            navigation.navigate(Route::Dashboard);
            Ok(gateway.session().snapshot())
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch dashboard stats after login");
            Ok(session)
        }
    }
}

/// Drops stored credentials and signs the session out
pub async fn logout(gateway: &AuthorizedClient) -> Result<Session> {
    let cleared = gateway.credentials().clear().await;
    let session = gateway.session().logout();
    info!("signed out");
    cleared.map(|_| session)
}

async fn request_token(gateway: &AuthorizedClient, email: &str, password: &str) -> Result<LoginResponse> {
    let url = gateway.api_url("login")?;
    let response = Fetch::post(gateway.http(), url)
        .json(&LoginRequest { email, password })?
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(Error::api(response.status().as_u16(), INVALID_CREDENTIALS));
    }
    let body: LoginResponse = response.json().await?;
    if body.token.trim().is_empty() {
        return Err(Error::general("login response carried an empty token"));
    }
    Ok(body)
}

/// Stats are fetched with the fresh token directly; a failure here is not a
/// reason to end the new session.
async fn fetch_stats(gateway: &AuthorizedClient, token: &str) -> Result<DashboardStats> {
    let url = gateway.api_url("dashboard-stats")?;
    let response = Fetch::get(gateway.http(), url).bearer_auth(token).send().await?;
    if !response.status().is_success() {
        return Err(Error::api(response.status().as_u16(), "dashboard stats unavailable"));
    }
    Ok(response.json().await?)
}
