//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument};

use wavecrest_core::Email;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::identity::{AuthError, Identity};
use crate::middleware::auth::{clear_current_identity, set_current_identity};
use crate::models::UserProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: String,
    pub email: String,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.as_str().to_owned(),
            email: identity.email.clone(),
        }
    }
}

/// Create a new account, write its profile document, and sign it in.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = Email::parse(&request.email).map_err(AuthError::InvalidEmail)?;

    let identity = state.identity().sign_up(&email, &request.password).await?;

    // Profile first, so the first checkout can prefill. A failed write is
    // surfaced; the account already exists, and login still works.
    let profile = UserProfile {
        name: request.name,
        email: email.as_str().to_owned(),
        address: request.address,
        city: request.city,
        zip: request.zip,
        phone: request.phone,
    };
    state.docstore().write_profile(&identity.id, &profile).await?;

    sign_in_session(&state, &session, &identity).await?;
    info!(identity = %identity.id, "Account created");

    Ok((StatusCode::CREATED, Json(IdentityResponse::from(&identity))))
}

/// Sign in and bind the identity's cart.
#[instrument(skip(state, session, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = Email::parse(&request.email).map_err(AuthError::InvalidEmail)?;

    let identity = state.identity().sign_in(&email, &request.password).await?;

    sign_in_session(&state, &session, &identity).await?;
    info!(identity = %identity.id, "Signed in");

    Ok(Json(IdentityResponse::from(&identity)))
}

/// Sign out: clear the session and drop the live cart. The persisted cart
/// copy stays, so the next sign-in restores it.
#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let identity: Option<Identity> = session
        .get(crate::models::session_keys::CURRENT_IDENTITY)
        .await
        .ok()
        .flatten();

    clear_current_identity(&session).await?;
    session.flush().await.map_err(AppError::Session)?;

    if let Some(identity) = identity {
        state.events().signed_out(identity.id.clone());
        info!(identity = %identity.id, "Signed out");
    }
    clear_sentry_user();

    Ok(Json(json!({ "signed_out": true })))
}

async fn sign_in_session(
    state: &AppState,
    session: &Session,
    identity: &Identity,
) -> Result<(), AppError> {
    // Fresh session ID on privilege change.
    session.cycle_id().await.map_err(AppError::Session)?;
    set_current_identity(session, identity).await?;

    state.events().signed_in(identity.clone());
    set_sentry_user(&identity.id, Some(&identity.email));
    Ok(())
}
