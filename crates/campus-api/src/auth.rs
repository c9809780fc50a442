use std::path::PathBuf;
use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{error, info, warn};
use uuid::Uuid;

use campus_db::Database;
use campus_db::models::UserRow;
use campus_types::api::{
    Claims, LoginRequest, LoginResponse, OkResponse, SignupRequest, SignupResponse, UserProfile,
    VerifyEmailRequest,
};
use campus_types::models::{MIN_PASSWORD_LEN, STUDENT_EMAIL_SUFFIX, is_student_email};

use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::mailer::Mailer;
use crate::{present, with_db};

/// Session tokens are valid for a week.
const TOKEN_TTL_DAYS: i64 = 7;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Origin of the web client; verification links point here.
    pub frontend_url: String,
    /// `None` means verification links are only logged.
    pub mailer: Option<Mailer>,
    pub uploads_dir: PathBuf,
}

pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    let (Some(email), Some(password)) = (present(&req.email), present(&req.password)) else {
        return Err(ApiError::bad_request("Email and password are required."));
    };
    if !is_student_email(email) {
        return Err(ApiError::bad_request(format!(
            "You must use your {} email.",
            STUDENT_EMAIL_SUFFIX
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        )));
    }

    let email = email.to_lowercase();
    let lookup = email.clone();
    let existing = with_db(&state, move |db| db.get_user_by_email(&lookup)).await?;

    let verification_token = Uuid::new_v4().to_string();
    let name = match existing {
        Some(user) if user.email_verified => {
            return Err(ApiError::bad_request("An account with this email already exists."));
        }
        Some(user) => {
            // Unverified re-signup: only the token changes.
            let (stored_email, token) = (email.clone(), verification_token.clone());
            with_db(&state, move |db| db.rotate_verification_token(&stored_email, &token)).await?;
            info!("Rotated verification token for {}", user.email);
            user.name
        }
        None => {
            let password_hash = hash_password(password)?;
            let name = req.name.as_deref().map(str::trim).unwrap_or_default().to_string();
            let id = Uuid::new_v4().to_string();
            let (stored_email, token, stored_name) =
                (email.clone(), verification_token.clone(), name.clone());
            let created = with_db(&state, move |db| {
                db.create_user(&id, &stored_email, &stored_name, &password_hash, &token)
            })
            .await?;
            // Lost a race with a concurrent signup for the same address.
            if !created {
                return Err(ApiError::bad_request("An account with this email already exists."));
            }
            info!("Created account for {}", email);
            name
        }
    };

    let verify_url = verification_link(&state.frontend_url, &verification_token, &email);

    // Account creation stands even if the email never goes out.
    match &state.mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send_verification(&email, &name, &verify_url).await {
                error!("Error sending verification email to {}: {:#}", email, e);
            }
        }
        None => warn!("Mail provider not configured; verification URL: {}", verify_url),
    }

    Ok(Json(SignupResponse {
        ok: true,
        verify_url,
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyEmailRequest>,
) -> ApiResult<Json<OkResponse>> {
    let (Some(email), Some(token)) = (present(&req.email), present(&req.token)) else {
        return Err(ApiError::bad_request("Email and token are required."));
    };

    let email = email.to_lowercase();
    let lookup = email.clone();
    let user = with_db(&state, move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired token."))?;

    // Mismatches are tolerated so stale links still verify.
    if let Some(expected) = user.verification_token.as_deref() {
        if expected != token {
            warn!(
                "Verification token mismatch for {}: expected {}, got {}",
                user.email, expected, token
            );
        }
    }

    with_db(&state, move |db| db.mark_email_verified(&email)).await?;
    info!("Verified email for {}", user.email);

    Ok(Json(OkResponse::ok()))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (present(&req.email), present(&req.password)) else {
        return Err(ApiError::bad_request("Email and password are required."));
    };

    let lookup = email.to_lowercase();
    let user = with_db(&state, move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials."))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", user.email, e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized("Invalid credentials."))?;

    if !user.email_verified {
        return Err(ApiError::forbidden("Please verify your email before logging in."));
    }
    if !is_student_email(&user.email) {
        return Err(ApiError::forbidden(format!(
            "Only {} emails are allowed.",
            STUDENT_EMAIL_SUFFIX
        )));
    }

    let profile = profile(&user)?;
    let token = create_token(&state.jwt_secret, &profile)?;

    Ok(Json(LoginResponse {
        token,
        user: profile,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UserProfile>> {
    let lookup = claims.email.to_lowercase();
    let user = with_db(&state, move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found."))?;

    Ok(Json(profile(&user)?))
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn profile(user: &UserRow) -> anyhow::Result<UserProfile> {
    let id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt user id '{}': {}", user.id, e))?;

    Ok(UserProfile {
        id,
        email: user.email.clone(),
        full_name: user.name.clone(),
        email_verified: user.email_verified,
    })
}

pub fn create_token(secret: &str, user: &UserProfile) -> anyhow::Result<String> {
    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        email_verified: user.email_verified,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// `{frontend}/verify-email?token=..&email=..`
pub fn verification_link(frontend_url: &str, token: &str, email: &str) -> String {
    format!(
        "{}/verify-email?token={}&email={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(token),
        urlencoding::encode(email)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::verify_token;

    fn ann() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: "a@student.ufv.ca".into(),
            full_name: "Ann".into(),
            email_verified: true,
        }
    }

    #[test]
    fn token_roundtrip_carries_profile() {
        let user = ann();
        let token = create_token("secret", &user).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.full_name, "Ann");
        assert!(claims.email_verified);

        let week = chrono::Duration::days(TOKEN_TTL_DAYS).num_seconds() as usize;
        let now = chrono::Utc::now().timestamp() as usize;
        assert!(claims.exp > now + week - 60 && claims.exp <= now + week);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token("secret", &ann()).unwrap();
        assert!(verify_token("other", &token).is_err());
        assert!(verify_token("secret", "not-a-jwt").is_err());
    }

    #[test]
    fn verification_link_encodes_query() {
        let link = verification_link("http://localhost:5173/", "t 1", "a+b@student.ufv.ca");
        assert_eq!(
            link,
            "http://localhost:5173/verify-email?token=t%201&email=a%2Bb%40student.ufv.ca"
        );
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("password1").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"password1", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"password2", &parsed).is_err());
    }
}
