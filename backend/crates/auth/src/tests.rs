//! Router / use-case tests for the auth crate
//!
//! Router and use-case tests run against in-memory repositories. The
//! `pg_repo_tests` need a live database (`DATABASE_URL`) and are ignored by
//! default.

#[cfg(test)]
mod support {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use axum::middleware;
    use chrono::Utc;
    use kernel::id::UserId;
    use platform::background::{BackgroundConfig, BackgroundTasks};

    use crate::application::config::AuthConfig;
    use crate::application::mailer::{MailError, Mailer, OutgoingMail};
    use crate::domain::entity::{token::Token, user::User};
    use crate::domain::repository::{PermissionRepository, TokenRepository, UserRepository};
    use crate::domain::value_object::{
        email::Email,
        permission::{MOVIES_READ, MOVIES_WRITE, Permissions},
        token_scope::TokenScope,
        user_password::{RawPassword, UserPassword},
        user_role::UserRole,
    };
    use crate::error::{AuthError, AuthResult};
    use crate::presentation::middleware::{AuthMiddlewareState, authenticate};
    use crate::presentation::router::auth_router_generic;

    pub const PASSWORD: &str = "pa55word-long";

    #[derive(Default)]
    struct State {
        next_id: i64,
        users: BTreeMap<i64, User>,
        tokens: Vec<Token>,
        grants: BTreeMap<i64, BTreeSet<String>>,
    }

    /// Mirrors the Postgres repository's observable behaviour
    #[derive(Default)]
    pub struct MemoryRepo {
        state: Mutex<State>,
    }

    impl UserRepository for MemoryRepo {
        async fn insert(&self, user: &mut User) -> AuthResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.users.values().any(|u| u.email == user.email) {
                return Err(AuthError::DuplicateEmail);
            }
            state.next_id += 1;
            user.id = UserId::from_db(state.next_id);
            user.created_at = Utc::now();
            user.version = 1;
            state.users.insert(user.id.get(), user.clone());
            Ok(())
        }

        async fn register(
            &self,
            user: &mut User,
            permissions: &[String],
            activation_ttl: Duration,
        ) -> AuthResult<Token> {
            let mut state = self.state.lock().unwrap();
            if state.users.values().any(|u| u.email == user.email) {
                return Err(AuthError::DuplicateEmail);
            }
            state.next_id += 1;
            user.id = UserId::from_db(state.next_id);
            user.created_at = Utc::now();
            user.version = 1;
            state.users.insert(user.id.get(), user.clone());

            let known = [MOVIES_READ, MOVIES_WRITE];
            state.grants.entry(user.id.get()).or_default().extend(
                permissions
                    .iter()
                    .filter(|c| known.contains(&c.as_str()))
                    .cloned(),
            );

            let token = Token::generate(user.id, activation_ttl, TokenScope::Activation);
            state.tokens.push(token.clone());
            Ok(token)
        }

        async fn get(&self, id: UserId) -> AuthResult<User> {
            let state = self.state.lock().unwrap();
            state.users.get(&id.get()).cloned().ok_or(AuthError::UserNotFound)
        }

        async fn get_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
            let state = self.state.lock().unwrap();
            Ok(state.users.values().find(|u| &u.email == email).cloned())
        }

        async fn update(&self, user: &mut User) -> AuthResult<()> {
            let mut state = self.state.lock().unwrap();
            if state
                .users
                .values()
                .any(|u| u.email == user.email && u.id != user.id)
            {
                return Err(AuthError::DuplicateEmail);
            }
            let Some(stored) = state.users.get_mut(&user.id.get()) else {
                return Err(AuthError::EditConflict);
            };
            if stored.version != user.version {
                return Err(AuthError::EditConflict);
            }
            user.version += 1;
            *stored = user.clone();
            Ok(())
        }

        async fn delete(&self, id: UserId) -> AuthResult<()> {
            let mut state = self.state.lock().unwrap();
            state
                .users
                .remove(&id.get())
                .ok_or(AuthError::UserNotFound)?;
            state.tokens.retain(|t| t.user_id != id);
            state.grants.remove(&id.get());
            Ok(())
        }
    }

    impl TokenRepository for MemoryRepo {
        async fn insert(&self, token: &Token) -> AuthResult<()> {
            self.state.lock().unwrap().tokens.push(token.clone());
            Ok(())
        }

        async fn get_user_for_token(
            &self,
            scope: TokenScope,
            hash: &[u8; 32],
        ) -> AuthResult<Option<User>> {
            let state = self.state.lock().unwrap();
            let now = Utc::now();
            Ok(state
                .tokens
                .iter()
                .find(|t| &t.hash == hash && t.scope == scope && !t.is_expired_at(now))
                .and_then(|t| state.users.get(&t.user_id.get()).cloned()))
        }

        async fn delete_all_for_user(&self, scope: TokenScope, user_id: UserId) -> AuthResult<u64> {
            let mut state = self.state.lock().unwrap();
            let before = state.tokens.len();
            state
                .tokens
                .retain(|t| !(t.scope == scope && t.user_id == user_id));
            Ok((before - state.tokens.len()) as u64)
        }

        async fn delete_expired(&self) -> AuthResult<u64> {
            let mut state = self.state.lock().unwrap();
            let before = state.tokens.len();
            let now = Utc::now();
            state.tokens.retain(|t| !t.is_expired_at(now));
            Ok((before - state.tokens.len()) as u64)
        }
    }

    impl PermissionRepository for MemoryRepo {
        async fn get_all_for_user(&self, user_id: UserId) -> AuthResult<Permissions> {
            let state = self.state.lock().unwrap();
            Ok(state
                .grants
                .get(&user_id.get())
                .map(|codes| codes.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn add_for_user(&self, user_id: UserId, codes: &[String]) -> AuthResult<()> {
            let mut state = self.state.lock().unwrap();
            let known = [MOVIES_READ, MOVIES_WRITE];
            state.grants.entry(user_id.get()).or_default().extend(
                codes
                    .iter()
                    .filter(|c| known.contains(&c.as_str()))
                    .cloned(),
            );
            Ok(())
        }

        async fn change_role_for_user(&self, user_id: UserId, role: UserRole) -> AuthResult<()> {
            let mut state = self.state.lock().unwrap();
            let user = state
                .users
                .get_mut(&user_id.get())
                .ok_or(AuthError::UserNotFound)?;
            user.role = role;
            Ok(())
        }
    }

    /// Keeps every message instead of delivering it
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingMail>>,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    impl RecordingMailer {
        /// Token embedded in the most recent message
        pub fn last_token(&self) -> Option<String> {
            let sent = self.sent.lock().unwrap();
            let body = &sent.last()?.body;
            let start = body.find(r#""token": ""#)? + r#""token": ""#.len();
            let end = start + body[start..].find('"')?;
            Some(body[start..end].to_string())
        }
    }

    pub struct TestApp {
        pub repo: Arc<MemoryRepo>,
        pub mailer: Arc<RecordingMailer>,
        pub tasks: BackgroundTasks,
        pub router: Router,
    }

    impl TestApp {
        pub fn new() -> Self {
            let repo = Arc::new(MemoryRepo::default());
            let mailer = Arc::new(RecordingMailer::default());
            let tasks = BackgroundTasks::new(&BackgroundConfig::development());

            let router = auth_router_generic(
                repo.clone(),
                mailer.clone(),
                tasks.clone(),
                AuthConfig::development(),
            )
            .layer(middleware::from_fn_with_state(
                AuthMiddlewareState::new(repo.clone()),
                authenticate::<MemoryRepo>,
            ));

            Self {
                repo,
                mailer,
                tasks,
                router,
            }
        }

        pub async fn call(&self, req: Request<Body>) -> Response<Body> {
            use tower::ServiceExt;
            self.router.clone().oneshot(req).await.unwrap()
        }

        /// Wait for queued mail
        pub async fn drain(&self) {
            assert!(self.tasks.shutdown(Duration::from_secs(5)).await);
        }

        /// Insert a user directly, bypassing registration
        pub async fn seed_user(&self, email: &str, activated: bool, role: UserRole) -> User {
            let raw = RawPassword::new(PASSWORD.to_string()).unwrap();
            let mut user = User::new(
                "Test".into(),
                "User".into(),
                Email::new(email).unwrap(),
                UserPassword::from_raw(&raw, None).unwrap(),
            );
            user.activated = activated;
            user.role = role;
            UserRepository::insert(&*self.repo, &mut user).await.unwrap();
            user
        }

        /// Issue an authentication token for `user`
        pub async fn token_for(&self, user: &User) -> String {
            let token = Token::generate(
                user.id,
                Duration::from_secs(3600),
                TokenScope::Authentication,
            );
            TokenRepository::insert(&*self.repo, &token).await.unwrap();
            token.plaintext
        }
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn with_bearer(mut req: Request<Body>, token: &str) -> Request<Body> {
        req.headers_mut().insert(
            "authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
        req
    }

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod registration_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::support::*;
    use crate::domain::repository::PermissionRepository;
    use crate::domain::value_object::email::Email;
    use crate::domain::repository::UserRepository;

    #[tokio::test]
    async fn test_register_returns_202_and_mails_token() {
        let app = TestApp::new();
        let response = app
            .call(json_request(
                "POST",
                "/users",
                json!({"name": "Alice", "surname": "Smith", "email": "Alice@Example.com", "password": PASSWORD}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "alice@example.com");
        assert_eq!(body["user"]["activated"], false);
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password").is_none());

        app.drain().await;
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
        assert_eq!(app.mailer.last_token().unwrap().len(), 43);

        let user = app
            .repo
            .get_by_email(&Email::new("alice@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        let permissions = app.repo.get_all_for_user(user.id).await.unwrap();
        assert!(permissions.includes("movies:read"));
        assert!(!permissions.includes("movies:write"));
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let app = TestApp::new();
        let response = app
            .call(json_request(
                "POST",
                "/users",
                json!({"name": "", "surname": "Smith", "email": "nope", "password": "short"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["errors"]["name"], "must be provided");
        assert_eq!(body["errors"]["email"], "must be a valid email address");
        assert_eq!(body["errors"]["password"], "must be at least 8 characters long");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let app = TestApp::new();
        app.seed_user("alice@example.com", false, Default::default())
            .await;

        let response = app
            .call(json_request(
                "POST",
                "/users",
                json!({"name": "Alice", "surname": "Smith", "email": "alice@example.com", "password": PASSWORD}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(
            body["errors"]["email"],
            "a user with this email address already exists"
        );
    }

    #[tokio::test]
    async fn test_activation_scenario() {
        let app = TestApp::new();
        app.call(json_request(
            "POST",
            "/users",
            json!({"name": "Bob", "surname": "Jones", "email": "bob@example.com", "password": PASSWORD}),
        ))
        .await;
        app.drain().await;
        let token = app.mailer.last_token().unwrap();

        let response = app
            .call(json_request("PUT", "/users/activated", json!({"token": token})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["activated"], true);
        assert_eq!(body["user"]["version"], 2);

        // single use
        let response = app
            .call(json_request("PUT", "/users/activated", json!({"token": token})))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["token"], "invalid or expired activation token");
    }

    #[tokio::test]
    async fn test_activation_rejects_malformed_token() {
        let app = TestApp::new();
        let response = app
            .call(json_request("PUT", "/users/activated", json!({"token": "short"})))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["token"], "must be 43 bytes long");
    }

    #[tokio::test]
    async fn test_resend_activation_token() {
        let app = TestApp::new();
        app.seed_user("carol@example.com", false, Default::default())
            .await;
        app.seed_user("dave@example.com", true, Default::default())
            .await;

        let response = app
            .call(json_request(
                "POST",
                "/tokens/activation",
                json!({"email": "carol@example.com"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = app
            .call(json_request(
                "POST",
                "/tokens/activation",
                json!({"email": "dave@example.com"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["email"], "user has already been activated");

        let response = app
            .call(json_request(
                "POST",
                "/tokens/activation",
                json!({"email": "nobody@example.com"}),
            ))
            .await;
        let body = body_json(response).await;
        assert_eq!(body["errors"]["email"], "no matching email address found");

        app.drain().await;
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
    }
}

#[cfg(test)]
mod token_tests {
    use std::time::Duration;

    use axum::http::{StatusCode, header};
    use serde_json::json;

    use super::support::*;
    use crate::domain::entity::token::{Token, hash_plaintext};
    use crate::domain::repository::TokenRepository;
    use crate::domain::value_object::token_scope::TokenScope;

    #[tokio::test]
    async fn test_sign_in_and_use_token() {
        let app = TestApp::new();
        app.seed_user("erin@example.com", true, Default::default())
            .await;

        let response = app
            .call(json_request(
                "POST",
                "/tokens/authentication",
                json!({"email": "erin@example.com", "password": PASSWORD}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let token = body["authentication_token"]["token"].as_str().unwrap().to_string();
        assert_eq!(token.len(), 43);
        assert!(body["authentication_token"]["expiry"].is_string());

        let response = app
            .call(with_bearer(json_request("GET", "/users/me", json!({})), &token))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::VARY).unwrap(), "Authorization");
        let body = body_json(response).await;
        assert_eq!(body["user"]["email"], "erin@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::new();
        app.seed_user("frank@example.com", true, Default::default())
            .await;

        for (email, password) in [
            ("frank@example.com", "wrong-password"),
            ("ghost@example.com", PASSWORD),
        ] {
            let response = app
                .call(json_request(
                    "POST",
                    "/tokens/authentication",
                    json!({"email": email, "password": password}),
                ))
                .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["detail"], "invalid authentication credentials");
        }
    }

    #[tokio::test]
    async fn test_malformed_bearer_fails_fast() {
        let app = TestApp::new();
        for value in ["Bearer tooshort", "Basic Zm9vOmJhcg==", "Bearer"] {
            let mut req = json_request("GET", "/users/me", json!({}));
            req.headers_mut()
                .insert(header::AUTHORIZATION, value.parse().unwrap());
            let response = app.call(req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
            assert_eq!(
                response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                "Bearer"
            );
            assert_eq!(response.headers().get(header::VARY).unwrap(), "Authorization");
        }
    }

    #[tokio::test]
    async fn test_anonymous_me_requires_authentication() {
        let app = TestApp::new();
        let response = app.call(json_request("GET", "/users/me", json!({}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(
            body["detail"],
            "you must be authenticated to access this resource"
        );
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let app = TestApp::new();
        let user = app
            .seed_user("gina@example.com", true, Default::default())
            .await;

        let token = Token::generate(user.id, Duration::from_secs(60), TokenScope::Authentication);
        TokenRepository::insert(&*app.repo, &token).await.unwrap();
        let hash = hash_plaintext(&token.plaintext);

        let found = app
            .repo
            .get_user_for_token(TokenScope::Authentication, &hash)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, user.id);

        // wrong scope
        assert!(
            app.repo
                .get_user_for_token(TokenScope::Activation, &hash)
                .await
                .unwrap()
                .is_none()
        );

        // revoked
        let removed = app
            .repo
            .delete_all_for_user(TokenScope::Authentication, user.id)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(
            app.repo
                .get_user_for_token(TokenScope::Authentication, &hash)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_activation_token_end_to_end() {
        use crate::application::ActivateUserUseCase;
        use crate::error::AuthError;

        let app = TestApp::new();
        let user = app
            .seed_user("ivan@example.com", false, Default::default())
            .await;

        let token = Token::generate(user.id, Duration::from_secs(40), TokenScope::Activation);
        TokenRepository::insert(&*app.repo, &token).await.unwrap();

        let activated = ActivateUserUseCase::new(app.repo.clone())
            .execute(&token.plaintext)
            .await
            .unwrap();
        assert!(activated.activated);
        assert_eq!(activated.id, user.id);

        // activation already revoked every activation token
        app.repo
            .delete_all_for_user(TokenScope::Activation, user.id)
            .await
            .unwrap();
        let hash = hash_plaintext(&token.plaintext);
        assert!(
            app.repo
                .get_user_for_token(TokenScope::Activation, &hash)
                .await
                .unwrap()
                .is_none()
        );

        let err = ActivateUserUseCase::new(app.repo.clone())
            .execute(&token.plaintext)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let app = TestApp::new();
        let user = app
            .seed_user("hank@example.com", true, Default::default())
            .await;

        let token = Token::generate(user.id, Duration::ZERO, TokenScope::Authentication);
        TokenRepository::insert(&*app.repo, &token).await.unwrap();

        let response = app
            .call(with_bearer(
                json_request("GET", "/users/me", json!({})),
                &token.plaintext,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.repo.delete_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_tokens() {
        let app = TestApp::new();
        let user = app
            .seed_user("ivy@example.com", true, Default::default())
            .await;
        let token = app.token_for(&user).await;

        let response = app
            .call(with_bearer(
                json_request("DELETE", "/tokens/authentication", json!({})),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .call(with_bearer(json_request("GET", "/users/me", json!({})), &token))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod account_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::support::*;
    use crate::domain::repository::UserRepository;

    #[tokio::test]
    async fn test_inactive_account_cannot_update() {
        let app = TestApp::new();
        let user = app
            .seed_user("jane@example.com", false, Default::default())
            .await;
        let token = app.token_for(&user).await;

        let response = app
            .call(with_bearer(
                json_request("PATCH", "/users/me", json!({"name": "Janet"})),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_and_expected_version() {
        let app = TestApp::new();
        let user = app
            .seed_user("kim@example.com", true, Default::default())
            .await;
        let token = app.token_for(&user).await;

        let mut req = json_request("PATCH", "/users/me", json!({"name": "Kimberly"}));
        req.headers_mut()
            .insert("x-expected-version", "1".parse().unwrap());
        let response = app.call(with_bearer(req, &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["name"], "Kimberly");
        assert_eq!(body["user"]["version"], 2);

        // stale precondition
        let mut req = json_request("PATCH", "/users/me", json!({"name": "Kim"}));
        req.headers_mut()
            .insert("x-expected-version", "1".parse().unwrap());
        let response = app.call(with_bearer(req, &token)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let stored = app.repo.get(user.id).await.unwrap();
        assert_eq!(stored.name, "Kimberly");
    }

    #[tokio::test]
    async fn test_password_change_revokes_tokens() {
        let app = TestApp::new();
        let user = app
            .seed_user("leo@example.com", true, Default::default())
            .await;
        let token = app.token_for(&user).await;

        let response = app
            .call(with_bearer(
                json_request("PATCH", "/users/me", json!({"password": "brand-new-secret"})),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .call(with_bearer(json_request("GET", "/users/me", json!({})), &token))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_me() {
        let app = TestApp::new();
        let user = app
            .seed_user("mia@example.com", true, Default::default())
            .await;
        let token = app.token_for(&user).await;

        let response = app
            .call(with_bearer(
                json_request("DELETE", "/users/me", json!({})),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.repo.get(user.id).await.is_err());
    }
}

#[cfg(test)]
mod admin_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::support::*;
    use crate::domain::repository::{PermissionRepository, UserRepository};
    use crate::domain::value_object::user_role::UserRole;

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let app = TestApp::new();
        let user = app.seed_user("ned@example.com", true, UserRole::User).await;
        let token = app.token_for(&user).await;

        let response = app
            .call(with_bearer(
                json_request(
                    "PUT",
                    &format!("/users/{}/role", user.id),
                    json!({"role": "admin"}),
                ),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(
            body["detail"],
            "your user account doesn't have the necessary permissions to access this resource"
        );
    }

    #[tokio::test]
    async fn test_admin_changes_role_and_grants() {
        let app = TestApp::new();
        let admin = app.seed_user("root@example.com", true, UserRole::Admin).await;
        let target = app.seed_user("olga@example.com", true, UserRole::User).await;
        let token = app.token_for(&admin).await;

        let response = app
            .call(with_bearer(
                json_request(
                    "PUT",
                    &format!("/users/{}/role", target.id),
                    json!({"role": "admin"}),
                ),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let stored = app.repo.get(target.id).await.unwrap();
        assert_eq!(stored.role, UserRole::Admin);
        assert_eq!(stored.version, target.version);

        let response = app
            .call(with_bearer(
                json_request(
                    "POST",
                    &format!("/users/{}/permissions", target.id),
                    json!({"permissions": ["movies:write", "movies:read"]}),
                ),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["permissions"], json!(["movies:read", "movies:write"]));
        assert!(
            app.repo
                .get_all_for_user(target.id)
                .await
                .unwrap()
                .includes("movies:write")
        );
    }

    #[tokio::test]
    async fn test_admin_role_validation_and_missing_user() {
        let app = TestApp::new();
        let admin = app.seed_user("root@example.com", true, UserRole::Admin).await;
        let token = app.token_for(&admin).await;

        let response = app
            .call(with_bearer(
                json_request(
                    "PUT",
                    &format!("/users/{}/role", admin.id),
                    json!({"role": "superuser"}),
                ),
                &token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        for path in ["/users/999/role", "/users/abc/role", "/users/0/role"] {
            let response = app
                .call(with_bearer(
                    json_request("PUT", path, json!({"role": "user"})),
                    &token,
                ))
                .await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}

#[cfg(test)]
mod gate_tests {
    use std::sync::Arc;

    use super::support::*;
    use crate::error::AuthError;
    use crate::presentation::context::{AuthContext, Requirement};
    use crate::presentation::middleware::authorize;
    use crate::domain::repository::PermissionRepository;
    use crate::domain::value_object::user_role::UserRole;

    #[tokio::test]
    async fn test_authorize_is_default_deny() {
        let app = TestApp::new();
        let reader = app.seed_user("pat@example.com", true, UserRole::User).await;
        app.repo
            .add_for_user(reader.id, &["movies:read".to_string()])
            .await
            .unwrap();
        let inactive = app.seed_user("quin@example.com", false, UserRole::Admin).await;

        let ctx = AuthContext::User(Arc::new(reader));
        assert!(authorize(&*app.repo, &ctx, Requirement::Permission("movies:read")).await.is_ok());
        assert!(matches!(
            authorize(&*app.repo, &ctx, Requirement::Permission("movies:write")).await,
            Err(AuthError::NotPermitted)
        ));
        assert!(authorize(&*app.repo, &ctx, Requirement::Role(UserRole::User)).await.is_ok());
        assert!(matches!(
            authorize(&*app.repo, &ctx, Requirement::Role(UserRole::Admin)).await,
            Err(AuthError::NotPermitted)
        ));

        let ctx = AuthContext::User(Arc::new(inactive));
        assert!(authorize(&*app.repo, &ctx, Requirement::Authenticated).await.is_ok());
        assert!(matches!(
            authorize(&*app.repo, &ctx, Requirement::Role(UserRole::Admin)).await,
            Err(AuthError::InactiveAccount)
        ));

        assert!(matches!(
            authorize(&*app.repo, &AuthContext::Anonymous, Requirement::Authenticated).await,
            Err(AuthError::AuthenticationRequired)
        ));
    }
}

#[cfg(test)]
mod pg_repo_tests {
    use std::time::Duration;

    use sqlx::PgPool;

    use crate::domain::entity::token::{Token, hash_plaintext};
    use crate::domain::entity::user::User;
    use crate::domain::repository::{PermissionRepository, TokenRepository, UserRepository};
    use crate::domain::value_object::{
        email::Email,
        permission::{MOVIES_READ, MOVIES_WRITE},
        token_scope::TokenScope,
        user_password::{RawPassword, UserPassword},
        user_role::UserRole,
    };
    use crate::error::AuthError;
    use crate::infra::postgres::PgAuthRepository;

    use super::support::PASSWORD;

    fn repo(pool: PgPool) -> PgAuthRepository {
        PgAuthRepository::new(pool, Duration::from_secs(3))
    }

    fn user(email: &str) -> User {
        let raw = RawPassword::new(PASSWORD.to_string()).unwrap();
        User::new(
            "Test".into(),
            "User".into(),
            Email::new(email).unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
    }

    async fn seeded(repo: &PgAuthRepository, email: &str) -> User {
        let mut user = user(email);
        UserRepository::insert(repo, &mut user).await.unwrap();
        user
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_token_lookup_by_hash_scope_and_expiry(pool: PgPool) {
        let repo = repo(pool);
        let owner = seeded(&repo, "olga@example.com").await;

        let token = Token::generate(owner.id, Duration::from_secs(60), TokenScope::Authentication);
        TokenRepository::insert(&repo, &token).await.unwrap();
        let hash = hash_plaintext(&token.plaintext);

        let found = repo
            .get_user_for_token(TokenScope::Authentication, &hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, owner.id);
        assert_eq!(found.email, owner.email);

        assert!(
            repo.get_user_for_token(TokenScope::Activation, &hash)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.get_user_for_token(TokenScope::Authentication, &[0u8; 32])
                .await
                .unwrap()
                .is_none()
        );

        assert_eq!(
            repo.delete_all_for_user(TokenScope::Authentication, owner.id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.delete_all_for_user(TokenScope::Authentication, owner.id)
                .await
                .unwrap(),
            0
        );
        assert!(
            repo.get_user_for_token(TokenScope::Authentication, &hash)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_zero_ttl_token_never_resolves(pool: PgPool) {
        let repo = repo(pool);
        let owner = seeded(&repo, "pete@example.com").await;

        for _ in 0..20 {
            let token = Token::generate(owner.id, Duration::ZERO, TokenScope::Authentication);
            TokenRepository::insert(&repo, &token).await.unwrap();
            assert!(
                repo.get_user_for_token(
                    TokenScope::Authentication,
                    &hash_plaintext(&token.plaintext)
                )
                .await
                .unwrap()
                .is_none()
            );
        }

        let live = Token::generate(owner.id, Duration::from_secs(60), TokenScope::Authentication);
        TokenRepository::insert(&repo, &live).await.unwrap();
        assert_eq!(repo.delete_expired().await.unwrap(), 20);
        assert!(
            repo.get_user_for_token(TokenScope::Authentication, &hash_plaintext(&live.plaintext))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_grants_and_role_changes(pool: PgPool) {
        let repo = repo(pool);
        let owner = seeded(&repo, "rosa@example.com").await;
        assert_eq!(repo.get_all_for_user(owner.id).await.unwrap().iter().count(), 0);

        let codes = vec![MOVIES_READ.to_string(), "movies:delete".to_string()];
        repo.add_for_user(owner.id, &codes).await.unwrap();
        repo.add_for_user(owner.id, &codes).await.unwrap();

        let perms = repo.get_all_for_user(owner.id).await.unwrap();
        assert!(perms.includes(MOVIES_READ));
        assert!(!perms.includes(MOVIES_WRITE));
        assert_eq!(perms.iter().count(), 1);

        repo.change_role_for_user(owner.id, UserRole::Admin)
            .await
            .unwrap();
        let reloaded = UserRepository::get(&repo, owner.id).await.unwrap();
        assert_eq!(reloaded.role, UserRole::Admin);
        assert_eq!(reloaded.version, owner.version);

        let missing = kernel::id::UserId::from_db(owner.id.get() + 1000);
        assert!(matches!(
            repo.change_role_for_user(missing, UserRole::User).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_duplicate_email_and_stale_update(pool: PgPool) {
        let repo = repo(pool);
        let owner = seeded(&repo, "sam@example.com").await;

        let mut twin = user("SAM@example.com");
        assert!(matches!(
            UserRepository::insert(&repo, &mut twin).await,
            Err(AuthError::DuplicateEmail)
        ));

        let mut first = UserRepository::get(&repo, owner.id).await.unwrap();
        let mut second = first.clone();
        first.activate();
        repo.update(&mut first).await.unwrap();
        assert_eq!(first.version, 2);

        second.name = "Samuel".into();
        assert!(matches!(
            repo.update(&mut second).await,
            Err(AuthError::EditConflict)
        ));
        assert_eq!(UserRepository::get(&repo, owner.id).await.unwrap().version, 2);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_register_is_all_or_nothing(pool: PgPool) {
        let repo = repo(pool.clone());

        let mut account = user("tess@example.com");
        account.role = UserRole::User;
        let token = repo
            .register(&mut account, &[MOVIES_READ.to_string()], Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(account.version, 1);
        assert!(repo.get_all_for_user(account.id).await.unwrap().includes(MOVIES_READ));
        let activated = repo
            .get_user_for_token(TokenScope::Activation, &hash_plaintext(&token.plaintext))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(activated.id, account.id);

        let mut twin = user("tess@example.com");
        assert!(matches!(
            repo.register(&mut twin, &[MOVIES_READ.to_string()], Duration::from_secs(60))
                .await,
            Err(AuthError::DuplicateEmail)
        ));

        let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        let tokens: i64 = sqlx::query_scalar("SELECT count(*) FROM tokens")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((users, tokens), (1, 1));
    }
}
