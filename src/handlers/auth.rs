use axum::{
    extract::State,
    response::Json,
    Extension,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use tracing::info;
use validator::Validate;

use crate::dtos::auth_dtos::{LoginRequest, RegisterRequest};
use crate::errors::{AppError, Result};
use crate::models::user::{
    normalize_username, AuthResponse, Claims, Role, User, UserResponse,
};
use crate::services::impact_service;
use crate::state::AppState;

fn issue_token(state: &AppState, user_id: &ObjectId, username: &str, role: Role) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_hex(),
        username: username.to_string(),
        role,
        exp: (Utc::now().timestamp() + 86400) as usize, // 24 hours
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_ref()),
    )
    .map_err(|_| AppError::AuthError)
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let username = normalize_username(&payload.username)?;

    let collection: Collection<User> = state.db.collection("users");

    // Check if user exists by username or email
    let filter = doc! {
        "$or": [
            { "username": &username },
            { "email": &payload.email }
        ]
    };
    if collection.find_one(filter).await?.is_some() {
        return Err(AppError::invalid_data("Username or email already registered"));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::invalid_data("Could not hash password"))?;

    let now = Utc::now();
    let user = User {
        id: Some(ObjectId::new()),
        username: username.clone(),
        email: payload.email.clone(),
        phone: payload.phone.clone(),
        address: payload.address.clone(),
        password_hash,
        role: payload.role,
        created_at: now,
        updated_at: now,
    };

    collection.insert_one(&user).await?;
    let user_id = user.id.ok_or(AppError::DocumentNotFound)?;

    // Customers get an empty impact record up front so the dashboard
    // always has something to show.
    if payload.role == Role::Customer {
        impact_service::ensure_impact_record(&state.db, &user_id.to_hex()).await?;
    }

    let token = issue_token(&state, &user_id, &username, payload.role)?;

    info!("👤 Registered {} ({})", username, payload.role.as_str());

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    payload.validate()?;

    let collection: Collection<User> = state.db.collection("users");

    let user = collection
        .find_one(doc! { "username": &payload.username })
        .await?
        .ok_or(AppError::AuthError)?;

    let valid = verify(&payload.password, &user.password_hash)
        .map_err(|_| AppError::AuthError)?;
    if !valid {
        return Err(AppError::AuthError);
    }

    let user_id = user.id.ok_or(AppError::AuthError)?;
    let token = issue_token(&state, &user_id, &user.username, user.role)?;

    info!("🔑 Login: {}", user.username);

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let collection: Collection<User> = state.db.collection("users");

    let user = collection
        .find_one(doc! { "_id": ObjectId::parse_str(&claims.sub)? })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(Json(UserResponse::from(user)))
}
