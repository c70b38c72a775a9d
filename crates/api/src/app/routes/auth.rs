use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use stockwatch_auth::{AdminProfile, NewAdmin, ProfileUpdate};

use crate::app::dto::{
    LoginRequest, ProfileResponse, ProfileUpdateResponse, RegisterRequest, SessionResponse,
};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AdminContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let session = services
        .accounts
        .register(NewAdmin {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(&session.account, session.token)),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let session = services.accounts.login(&body.email, &body.password).await?;
    Ok(Json(SessionResponse::new(&session.account, session.token)))
}

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AdminContext>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = services.accounts.profile(ctx.admin_id()).await?;
    Ok(Json(ProfileResponse::from(&account)))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AdminContext>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let Json(update) = payload?;
    let updated = services
        .accounts
        .update_profile(ctx.actor(), update)
        .await?;
    Ok(Json(ProfileUpdateResponse::new(
        &updated.account,
        updated.token,
    )))
}

pub async fn list_admins(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<AdminProfile>>, ApiError> {
    Ok(Json(services.accounts.list_active().await?))
}
