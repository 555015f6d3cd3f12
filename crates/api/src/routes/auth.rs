//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tracing::info;

use crate::{AppState, error::{ApiError, db_err}};
use projextpal_core::auth::{hash_password, verify_password};
use projextpal_db::UserRepository;
use projextpal_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use projextpal_shared::{AppError, Role};

const MIN_PASSWORD_LEN: usize = 8;

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// POST /auth/register - Create a company with its first admin user.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !payload.email.contains('@') {
        return Err(AppError::Validation("email is not valid".into()).into());
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }
    if payload.company_name.trim().is_empty() || payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("company name and full name are required".into()).into());
    }

    let repo = UserRepository::new((*state.db).clone());

    if repo.email_exists(&payload.email).await.map_err(db_err)? {
        return Err(AppError::Conflict("email is already registered".into()).into());
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    let (company, user) = repo
        .register_company_admin(
            &payload.company_name,
            &payload.email,
            &password_hash,
            &payload.full_name,
        )
        .await
        .map_err(db_err)?;

    info!(user_id = user.id, company_id = company.id, "registered new company");

    let role: Role = user.role.clone().into();
    let access_token = state
        .jwt
        .generate_access_token(user.id, Some(company.id), role)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            user: UserInfo {
                id: user.id,
                email: user.email,
                full_name: user.name,
                company_id: Some(company.id),
                role,
            },
            access_token,
            expires_in: state.jwt.access_token_expires_in(),
        }),
    ))
}

/// POST /auth/login - Authenticate a user and return a token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let repo = UserRepository::new((*state.db).clone());

    let user = repo
        .find_by_email(&payload.email)
        .await
        .map_err(db_err)?
        .ok_or_else(|| {
            info!(email = %payload.email, "login attempt for unknown email");
            AppError::Unauthenticated("invalid email or password".into())
        })?;

    if !user.is_active {
        return Err(AppError::Unauthenticated("this account has been disabled".into()).into());
    }

    let valid = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;
    if !valid {
        info!(user_id = user.id, "failed login attempt");
        return Err(AppError::Unauthenticated("invalid email or password".into()).into());
    }

    let role: Role = user.role.clone().into();
    // Superadmins operate cross-tenant; their tokens carry no company.
    let company_id = if role.is_superadmin() {
        None
    } else {
        Some(user.company_id)
    };

    let access_token = state
        .jwt
        .generate_access_token(user.id, company_id, role)
        .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

    Ok(Json(LoginResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.name,
            company_id,
            role,
        },
        access_token,
        expires_in: state.jwt.access_token_expires_in(),
    }))
}
