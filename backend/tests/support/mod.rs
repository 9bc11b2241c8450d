//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use court_booking::api::{NewUser, Role, User};
use court_booking::db::repositories::LocalRepository;
use court_booking::db::UserRepository;
use court_booking::http::{create_router, AppState};
use court_booking::models::{ClubTimezone, FixedClock, SlotGrid};
use court_booking::services::{
    AssistantSettings, AuthService, AuthSettings, AvailabilityResolver, BookingPolicy, ChatProxy,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with environment variables set (`Some`) or removed (`None`),
/// restoring the previous values afterwards. Calls are serialized.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
    let _restore = EnvRestore(
        keys.into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect(),
    );
    for (k, v) in changes {
        match v {
            Some(val) => std::env::set_var(k, val),
            None => std::env::remove_var(k),
        }
    }
    f()
}

struct EnvRestore(Vec<(String, Option<String>)>);

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (k, v) in self.0.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// 2026-03-01 06:00 UTC, i.e. 09:00 at the club (UTC+3).
pub fn club_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn test_auth() -> AuthService {
    AuthService::new(AuthSettings {
        jwt_secret: "integration-secret".to_string(),
        token_ttl_hours: 1,
        bcrypt_cost: 4,
    })
}

/// A router over a fresh in-memory repository with a frozen clock.
pub struct TestApp {
    pub repo: LocalRepository,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new(policy: BookingPolicy) -> Self {
        Self::with_assistant(policy, AssistantSettings::default())
    }

    pub fn with_assistant(policy: BookingPolicy, assistant: AssistantSettings) -> Self {
        let repo = LocalRepository::new();
        let proxy = ChatProxy::new(assistant, "You are a test assistant.".to_string()).unwrap();
        let state = AppState::new(
            Arc::new(repo.clone()),
            AvailabilityResolver::new(SlotGrid::default(), policy),
            test_auth(),
            proxy,
            ClubTimezone::default(),
        )
        .with_clock(Arc::new(FixedClock(club_morning())));
        let router = create_router(state.clone(), &[]);
        Self {
            repo,
            state,
            router,
        }
    }

    /// Same repository and services, different instant.
    pub fn at(&self, instant: DateTime<Utc>) -> Self {
        let state = self.state.clone().with_clock(Arc::new(FixedClock(instant)));
        Self {
            repo: self.repo.clone(),
            router: create_router(state.clone(), &[]),
            state,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a member through the API and return their token.
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "correct-horse",
                    "full_name": "Test Player"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Insert an administrator directly and return a token for them.
    pub async fn admin_token(&self) -> String {
        let password_hash = self
            .state
            .auth
            .hash_password("admin-password".to_string())
            .await
            .unwrap();
        let admin: User = self
            .repo
            .create_user(NewUser {
                email: "admin@club.example".to_string(),
                full_name: Some("Club Admin".to_string()),
                role: Role::Admin,
                password_hash,
            })
            .await
            .unwrap();
        self.state.auth.issue_token(&admin).unwrap()
    }
}
