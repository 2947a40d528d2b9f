use crate::{
    AppState,
    db::UserExt,
    dtos::{SignupDto, TokenRequestDto, TokenResponseDto, check_username},
    error::{ErrorMessage, HttpError},
    mail::mails::send_confirmation_email,
    models::UserRole,
    utils::{confirmation, token},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use tracing::instrument;
use validator::Validate;

/// Router for the registration/token endpoints. Both are anonymous.
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(get_token))
}

/// Register a user and email a confirmation code.
///
/// Get-or-create keyed on the exact (username, email) pair: re-signup with
/// the same pair is an idempotent success and re-issues the code; a username
/// or email already bound to a different counterpart is a validation error.
/// The code is derived from user state, never stored.
#[instrument(skip(app_state, body), fields(username = %body.username, email = %body.email))]
pub async fn signup(
    State(app_state): State<AppState>,
    Json(body): Json<SignupDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid signup input: {}", e);
        HttpError::validation(e)
    })?;
    check_username(&body.username)?;

    let by_username = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = match by_username {
        Some(user) if user.email == body.email => user,
        Some(_) => {
            tracing::error!("Signup username taken under a different email");
            return Err(HttpError::bad_request(
                "A user with that username already exists",
            ));
        }
        None => {
            let by_email = app_state
                .db_client
                .get_user(None, None, Some(&body.email))
                .await
                .map_err(|e| {
                    tracing::error!("DB error, getting user: {}", e);
                    HttpError::server_error(ErrorMessage::ServerError.to_string())
                })?;

            if by_email.is_some() {
                tracing::error!("Signup email taken under a different username");
                return Err(HttpError::bad_request(
                    "A user with that email already exists",
                ));
            }

            match app_state
                .db_client
                .save_user(&body.username, &body.email, None, None, None, UserRole::User)
                .await
            {
                Ok(user) => user,
                // Concurrent signup can still hit the unique constraint; the
                // store decides, this request just loses.
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tracing::error!("DB error, saving user, unique violation: {}", db_err);
                    return Err(HttpError::bad_request(
                        "A user with that username or email already exists",
                    ));
                }
                Err(e) => {
                    tracing::error!("DB error, saving user: {}", e);
                    return Err(HttpError::server_error(
                        ErrorMessage::ServerError.to_string(),
                    ));
                }
            }
        }
    };

    let code = confirmation::make_code(&user, app_state.env.secret_key.as_bytes());

    // Best effort: a failed email never fails the signup or duplicates the
    // row; the client can simply sign up again.
    if let Err(e) = send_confirmation_email(&app_state.env, &user.email, &user.username, &code).await
    {
        tracing::error!("Failed to send confirmation email: {}", e);
    }

    tracing::info!(username = %user.username, "Signup successful");
    Ok((
        StatusCode::OK,
        Json(SignupDto {
            username: user.username,
            email: user.email,
        }),
    ))
}

/// Exchange (username, confirmation code) for a bearer access token.
///
/// 404 for an unknown username, 400 for a code that does not match the
/// user's current state. Tokens are stateless; previously issued ones stay
/// valid until their own expiry.
#[instrument(skip(app_state, body), fields(username = %body.username))]
pub async fn get_token(
    State(app_state): State<AppState>,
    Json(body): Json<TokenRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid token input: {}", e);
        HttpError::validation(e)
    })?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::error!("Token requested for unknown username");
            HttpError::not_found("User not found")
        })?;

    if !confirmation::check_code(
        &user,
        app_state.env.secret_key.as_bytes(),
        &body.confirmation_code,
    ) {
        tracing::error!(user_id = %user.id, "Confirmation code mismatch");
        return Err(HttpError::bad_request(
            ErrorMessage::InvalidConfirmationCode.to_string(),
        ));
    }

    let access = token::create_token(
        &user.id.to_string(),
        app_state.env.secret_key.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!(user_id = %user.id, "Token issued");
    Ok(Json(TokenResponseDto { access }))
}
