use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, password::verify_password},
    config::Config,
    model::{
        action::{ActionKind, NewAction},
        role::Role,
    },
    models::{LoginReqDto, LoginResponse},
    store::{ActionLog, UserStore},
};
use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(users, actions, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    users: web::Data<dyn UserStore>,
    actions: web::Data<dyn ActionLog>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = user.email.trim();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Email and password required"
        }));
    }

    // 2️⃣ Fetch user
    let db_user = match users.find_user_by_email(email).await {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
    }

    if Role::from_id(db_user.role_id).is_none() {
        warn!(user_id = db_user.id, role_id = db_user.role_id, "User has an unknown role");
        return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
    }

    // 4️⃣ Generate access token
    let access_token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role_id,
        db_user.branch_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = users.touch_last_login(db_user.id).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    // 6️⃣ Audit (non-fatal)
    if let Err(e) = actions
        .record_action(NewAction {
            user_id: db_user.id,
            kind: ActionKind::Login,
            description: format!("{} logged in", db_user.name),
        })
        .await
    {
        error!(error = %e, "Failed to record login");
    }

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}

#[get("/me")]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "email": auth.email,
        "role": auth.role.to_string(),
        "branch_id": auth.branch_id
    }))
}
