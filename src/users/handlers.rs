use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthenticateRequest, AuthenticateResponse, MessageResponse, UserResponse,
            FAILED_TO_AUTHENTICATE, FAILED_TO_REGISTER,
        },
        services::AuthService,
    },
    state::AppState,
    users::repo_types::NewUser,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/register", post(register).get(get_register_user))
        .route("/:id", get(get_user))
        .route("/authenticate/:id", post(authenticate))
}

pub async fn home() -> Html<&'static str> {
    Html("This is the home page")
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Json<MessageResponse> {
    let Json(candidate) = match payload {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "register body rejected");
            return Json(MessageResponse::fail(FAILED_TO_REGISTER));
        }
    };
    Json(auth.register(candidate).await)
}

/// `GET /register` shares its path with the POST route but is a lookup of
/// the id `register`, like any other `GET /:id`.
pub async fn get_register_user(State(auth): State<AuthService>) -> Json<UserResponse> {
    Json(auth.get_user("register").await)
}

#[instrument(skip(auth))]
pub async fn get_user(
    State(auth): State<AuthService>,
    Path(id): Path<String>,
) -> Json<UserResponse> {
    Json(auth.get_user(&id).await)
}

#[instrument(skip(auth, payload))]
pub async fn authenticate(
    State(auth): State<AuthService>,
    Path(id): Path<String>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Json<AuthenticateResponse> {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "authenticate body rejected");
            return Json(AuthenticateResponse::Failed(MessageResponse::fail(
                FAILED_TO_AUTHENTICATE,
            )));
        }
    };
    // A well-formed body without `password` compares as empty.
    let password = request.password.unwrap_or_default();
    Json(auth.authenticate(&id, &password).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{auth::password::PasswordHasher, users::repo::MemoryUserStore};

    fn app() -> (Router, MemoryUserStore) {
        let store = MemoryUserStore::new();
        let fake = AppState::fake();
        let state = AppState::from_parts(
            fake.config,
            Arc::new(store.clone()),
            Arc::new(PasswordHasher::bcrypt(4)),
        );
        (user_routes().with_state(state), store)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    const STEVE: &str =
        r#"{"name":"Steve Jobs","email":"steve@gmail.com","password":"some password"}"#;

    async fn register_steve(app: &Router, store: &MemoryUserStore) -> String {
        let (status, body) = send(app, post_json("/register", STEVE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "User registered!"}));
        store.ids().await[0].to_string()
    }

    #[tokio::test]
    async fn base_route_works() {
        let (app, _) = app();
        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(ct.starts_with("text/html"), "content-type was {ct}");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"This is the home page");
    }

    #[tokio::test]
    async fn register_succeeds() {
        let (app, store) = app();
        register_steve(&app, &store).await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn register_fails_without_required_field() {
        let (app, store) = app();
        let (status, body) = send(
            &app,
            post_json("/register", r#"{"name":"Steve Jobs","password":"some password"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "message": "Failed to register"}));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn register_fails_on_malformed_body() {
        let (app, _) = app();
        let (status, body) = send(&app, post_json("/register", "{not json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "message": "Failed to register"}));
    }

    #[tokio::test]
    async fn get_user_by_id() {
        let (app, store) = app();
        let id = register_steve(&app, &store).await;

        let (status, body) = send(&app, get(&format!("/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"]["id"], json!(id));
        assert_eq!(body["message"]["name"], json!("Steve Jobs"));
        assert_eq!(body["message"]["email"], json!("steve@gmail.com"));
        assert_ne!(body["message"]["password"], json!("some password"));
    }

    #[tokio::test]
    async fn get_user_unknown_id() {
        let (app, _) = app();
        let expected = json!({"success": false, "message": "Failed to find user"});
        let (status, body) = send(&app, get(&format!("/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
        let (_, body) = send(&app, get("/5c0a7922c9d89830f4911426")).await;
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn authenticate_success() {
        let (app, store) = app();
        let id = register_steve(&app, &store).await;

        let (status, body) = send(
            &app,
            post_json(&format!("/authenticate/{id}"), r#"{"password":"some password"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert!(body["token"].as_str().unwrap().starts_with("Bearer "));
        assert_eq!(
            body["user"],
            json!({"id": id, "name": "Steve Jobs", "email": "steve@gmail.com"})
        );
    }

    #[tokio::test]
    async fn authenticate_wrong_password() {
        let (app, store) = app();
        let id = register_steve(&app, &store).await;

        let (status, body) = send(
            &app,
            post_json(&format!("/authenticate/{id}"), r#"{"password":"guess"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "message": "Wrong password"}));

        let (_, body) = send(&app, post_json(&format!("/authenticate/{id}"), "{}")).await;
        assert_eq!(body, json!({"success": false, "message": "Wrong password"}));
    }

    #[tokio::test]
    async fn authenticate_unknown_user() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            post_json(
                &format!("/authenticate/{}", Uuid::new_v4()),
                r#"{"password":"anything"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": false, "message": "Failed to authenticate user"})
        );
    }

    #[tokio::test]
    async fn authenticate_rejects_unparsable_body() {
        let (app, store) = app();
        let id = register_steve(&app, &store).await;
        let expected = json!({"success": false, "message": "Failed to authenticate user"});

        let (status, body) =
            send(&app, post_json(&format!("/authenticate/{id}"), "{not json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);

        let without_content_type = Request::builder()
            .method("POST")
            .uri(format!("/authenticate/{id}"))
            .body(Body::from(r#"{"password":"some password"}"#))
            .unwrap();
        let (status, body) = send(&app, without_content_type).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn get_register_is_a_user_lookup() {
        let (app, store) = app();
        register_steve(&app, &store).await;
        let (status, body) = send(&app, get("/register")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "message": "Failed to find user"}));
    }
}
