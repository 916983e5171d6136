//! Registration, login and profile handlers.

use axum::http::StatusCode;
use serde_json::json;
use tracing::info;

use crate::api::validate::{self, Rejection};
use crate::api::{bad_request, conflict, not_found, AppState};
use crate::error::HandlerError;
use crate::http::request::{ParsedRequest, RequestBody};
use crate::http::response::ResponseBuilder;
use crate::routing::HandlerResult;
use crate::security::password;
use crate::store::{NewUser, ProfileUpdate, StoreError};

const USERNAME_MAX: usize = 30;
const EMAIL_MAX: usize = 254;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;
const LEO_ID_MAX: usize = 20;
const DISTRICT_MAX: usize = 50;
const CLUB_NAME_MAX: usize = 100;
const ABOUT_MAX: usize = 500;

const DUPLICATE_EMAIL: &str = "An account with that email already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";

struct Registration {
    username: String,
    email: String,
    password: String,
    leo_id: Option<String>,
    leo_district: String,
    club_name: String,
    about: Option<String>,
}

impl Registration {
    fn from_body(body: &RequestBody) -> Result<Self, Rejection> {
        let username = validate::non_empty(body, "username")?;
        let email = validate::non_empty(body, "email")?;
        let password = validate::non_empty(body, "password")?;
        let leo_district = validate::non_empty(body, "leoDistrict")?;
        let club_name = validate::non_empty(body, "clubName")?;
        let leo_id = validate::non_empty(body, "leoId")?;
        let about = validate::non_empty(body, "about")?;

        let (Some(username), Some(email), Some(password), Some(leo_district), Some(club_name)) =
            (username, email, password, leo_district, club_name)
        else {
            return Err(
                "Username, email, password, Leo District, and Club Name are required".into(),
            );
        };

        if !validate::is_email(email) {
            return Err("Invalid email address".into());
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(format!("Password must be at least {PASSWORD_MIN} characters"));
        }

        validate::max_len(username, "username", USERNAME_MAX)?;
        validate::max_len(email, "email", EMAIL_MAX)?;
        validate::max_len(password, "password", PASSWORD_MAX)?;
        if let Some(leo_id) = leo_id {
            validate::max_len(leo_id, "leoId", LEO_ID_MAX)?;
        }
        validate::max_len(leo_district, "leoDistrict", DISTRICT_MAX)?;
        validate::max_len(club_name, "clubName", CLUB_NAME_MAX)?;
        if let Some(about) = about {
            validate::max_len(about, "about", ABOUT_MAX)?;
        }

        Ok(Self {
            username: username.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
            leo_id: leo_id.map(|s| s.trim().to_string()),
            leo_district: leo_district.trim().to_string(),
            club_name: club_name.trim().to_string(),
            about: about.map(|s| s.trim().to_string()),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let input = match Registration::from_body(&req.body) {
        Ok(input) => input,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    if state.store.user_by_email(&input.email)?.is_some() {
        return Ok(conflict(res, DUPLICATE_EMAIL));
    }

    let password_hash = password::hash(input.password, state.bcrypt_cost).await?;
    let created = state.store.create_user(NewUser {
        username: input.username,
        email: input.email,
        password_hash,
        leo_id: input.leo_id,
        leo_district: input.leo_district,
        club_name: input.club_name,
        about: input.about,
    });

    match created {
        Ok(user) => {
            info!(user_id = %user.id, "User registered");
            res.status(StatusCode::CREATED).json(&json!({
                "message": "User created successfully",
                "userId": user.id,
            }))
        }
        // Lost a race with a concurrent registration for the same email.
        Err(StoreError::Conflict(_)) => Ok(conflict(res, DUPLICATE_EMAIL)),
        Err(e) => Err(e.into()),
    }
}

pub async fn login(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let (email, password) = match (
        validate::non_empty(&req.body, "email"),
        validate::non_empty(&req.body, "password"),
    ) {
        (Ok(Some(email)), Ok(Some(password))) => (normalize_email(email), password.to_string()),
        (Err(_), _) | (_, Err(_)) => return Ok(bad_request(res, "Invalid field types")),
        _ => return Ok(bad_request(res, "Email and password are required")),
    };

    let keys = state.tokens.as_deref().ok_or(HandlerError::SecretMissing)?;

    let Some(user) = state.store.user_by_email(&email)? else {
        return Ok(res.status(StatusCode::UNAUTHORIZED).message(BAD_CREDENTIALS));
    };
    if !password::verify(password, user.password_hash.clone()).await? {
        return Ok(res.status(StatusCode::UNAUTHORIZED).message(BAD_CREDENTIALS));
    }

    let token = keys.issue(&user.id)?;
    info!(user_id = %user.id, "User logged in");
    res.json(&json!({ "token": token, "user": user }))
}

pub async fn profile(state: AppState, req: ParsedRequest, res: ResponseBuilder) -> HandlerResult {
    let principal = req.principal()?;
    match state.store.user_by_id(&principal.id)? {
        Some(user) => res.json(&json!({ "user": user })),
        None => Ok(not_found(res, "User not found")),
    }
}

fn profile_update(body: &RequestBody) -> Result<ProfileUpdate, Rejection> {
    let Some(username) = validate::non_empty(body, "username")
        .map_err(|_| Rejection::from("Invalid field types"))?
    else {
        return Err("Username is required".into());
    };
    validate::max_len(username, "username", USERNAME_MAX)?;

    let about = validate::non_empty(body, "about")?;
    if let Some(about) = about {
        validate::max_len(about, "about", ABOUT_MAX)?;
    }

    let avatar_url = validate::non_empty(body, "avatarUrl")?;
    if let Some(url) = avatar_url {
        validate::https_url(url, "avatarUrl")?;
    }

    Ok(ProfileUpdate {
        username: username.trim().to_string(),
        about: about.map(|s| s.trim().to_string()),
        avatar_url: avatar_url.map(str::to_string),
    })
}

pub async fn update_profile(
    state: AppState,
    req: ParsedRequest,
    res: ResponseBuilder,
) -> HandlerResult {
    let principal = req.principal()?;
    let update = match profile_update(&req.body) {
        Ok(update) => update,
        Err(msg) => return Ok(bad_request(res, &msg)),
    };

    match state.store.update_profile(&principal.id, update)? {
        Some(user) => res.json(&json!({
            "message": "Profile updated successfully",
            "user": user,
        })),
        None => Ok(not_found(res, "User not found")),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{call, router, sign_up};
    use crate::api::{routes, AppState};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn registration(email: &str) -> serde_json::Value {
        json!({
            "username": "leo",
            "email": email,
            "password": "password123",
            "leoDistrict": "306 A1",
            "clubName": "Leo Club of Colombo",
        })
    }

    #[tokio::test]
    async fn test_register_then_login_then_profile() {
        let router = router();
        let (user_id, token) = sign_up(&router, "nimal").await;

        let (status, body) = call(&router, Method::GET, "/api/auth/profile", Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], json!(user_id));
        assert_eq!(body["user"]["email"], json!("nimal@example.com"));
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let router = router();

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "leo" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            json!("Username, email, password, Leo District, and Club Name are required")
        );

        let mut short = registration("a@b.co");
        short["password"] = json!("short");
        let (status, body) = call(&router, Method::POST, "/api/auth/register", None, Some(short)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("Password must be at least 8 characters"));

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("not-an-email")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("Invalid email address"));

        let mut long = registration("a@b.co");
        long["username"] = json!("x".repeat(31));
        let (status, body) = call(&router, Method::POST, "/api/auth/register", None, Some(long)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("username must be 30 characters or fewer"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_409_case_insensitive() {
        let router = router();
        let (status, _) = call(
            &router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("Leo@Example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("LEO@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], json!("An account with that email already exists"));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let router = router();
        sign_up(&router, "kamal").await;

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "kamal@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], json!("Invalid email or password"));

        let (status, _) = call(
            &router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&router, Method::POST, "/api/auth/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_without_secret_is_500() {
        let state = crate::api::testing::state();
        let router = routes(AppState::new(state.store, None, 4)).unwrap();

        let (status, body) = call(
            &router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "a@b.co", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let router = router();
        let (_, token) = sign_up(&router, "sunil").await;

        let (status, body) = call(
            &router,
            Method::PUT,
            "/api/auth/profile",
            Some(token.as_str()),
            Some(json!({ "username": "sunil2", "about": " hello ", "avatarUrl": "https://cdn.example.com/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], json!("sunil2"));
        assert_eq!(body["user"]["about"], json!("hello"));

        let (status, _) = call(
            &router,
            Method::PUT,
            "/api/auth/profile",
            Some(token.as_str()),
            Some(json!({ "username": "sunil2", "avatarUrl": "data:image/png;base64,AAAA" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &router,
            Method::PUT,
            "/api/auth/profile",
            Some(token.as_str()),
            Some(json!({ "about": "no name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("Username is required"));
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let router = router();
        let (status, body) = call(&router, Method::GET, "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], json!("Access denied. No token provided."));

        let (status, body) =
            call(&router, Method::GET, "/api/auth/profile", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], json!("Invalid token"));
    }
}
