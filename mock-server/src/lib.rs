//! In-memory fake of the Uptime.com API subset the client speaks: the login
//! form exchange and the check-tag collection.
//!
//! Every `/check-tags/` route requires `Authorization: Token <token>`. The
//! state also supports injecting 503 responses to exercise client retries and
//! records the last `X-Subaccount` header it saw.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: usize = 250;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub pk: u64,
    pub url: String,
    pub tag: String,
    pub color_hex: String,
}

/// Writable tag fields. Unknown fields such as `pk` or `url` are rejected.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagInput {
    pub tag: String,
    pub color_hex: String,
}

#[derive(Serialize, Deserialize)]
pub struct ListEnvelope {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<Tag>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateEnvelope {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Tag,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
}

pub type Db = Arc<RwLock<BTreeMap<u64, Tag>>>;

/// Shared server state; cheap to clone.
#[derive(Clone)]
pub struct MockState {
    inner: Arc<Inner>,
}

struct Inner {
    token: String,
    email: String,
    password: String,
    page_size: usize,
    db: Db,
    next_pk: AtomicU64,
    fail_next: AtomicU32,
    last_subaccount: Mutex<Option<String>>,
}

impl MockState {
    pub fn new(token: &str, email: &str, password: &str) -> Self {
        Self::with_page_size(token, email, password, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(token: &str, email: &str, password: &str, page_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: token.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                page_size: page_size.max(1),
                db: Arc::new(RwLock::new(BTreeMap::new())),
                next_pk: AtomicU64::new(1),
                fail_next: AtomicU32::new(0),
                last_subaccount: Mutex::new(None),
            }),
        }
    }

    /// Answer the next `n` API requests with 503 Service Unavailable.
    pub fn fail_next(&self, n: u32) {
        self.inner.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn last_subaccount(&self) -> Option<String> {
        self.inner.last_subaccount.lock().unwrap().clone()
    }

    pub async fn tag_count(&self) -> usize {
        self.inner.db.read().await.len()
    }

    fn take_failure(&self) -> bool {
        self.inner
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub fn app(state: MockState) -> Router {
    let api = Router::new()
        .route("/check-tags/", get(list_tags).post(create_tag))
        .route("/check-tags/{pk}", get(get_tag).put(update_tag).delete(delete_tag))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .route("/auth/login/", post(login));
    Router::new().nest("/api/v1", api).with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

type Failure = (StatusCode, Json<serde_json::Value>);

fn failure(status: StatusCode, detail: &str) -> Failure {
    (status, Json(json!({ "detail": detail })))
}

fn not_found() -> Failure {
    failure(StatusCode::NOT_FOUND, "Not found.")
}

fn tag_url(pk: u64) -> String {
    format!("/api/v1/check-tags/{pk}/")
}

async fn require_token(State(state): State<MockState>, request: Request, next: Next) -> Response {
    if state.take_failure() {
        debug!(uri = %request.uri(), "injected failure");
        return failure(StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable.")
            .into_response();
    }

    let expected = format!("Token {}", state.inner.token);
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected.as_str()) {
        return failure(StatusCode::UNAUTHORIZED, "Invalid token.").into_response();
    }

    let subaccount = request
        .headers()
        .get("x-subaccount")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    *state.inner.last_subaccount.lock().unwrap() = subaccount;

    next.run(request).await
}

async fn login(State(state): State<MockState>, Form(form): Form<LoginForm>) -> Result<Json<serde_json::Value>, Failure> {
    if form.email != state.inner.email || form.password != state.inner.password {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "Unable to log in with provided credentials.",
        ));
    }
    info!(email = %form.email, "issued token");
    Ok(Json(json!({ "access_token": state.inner.token })))
}

async fn list_tags(State(state): State<MockState>, Query(params): Query<ListParams>) -> Json<ListEnvelope> {
    let tags = state.inner.db.read().await;
    let size = state.inner.page_size;
    let count = tags.len();
    let page = params.page.unwrap_or(1).max(1);

    // Pages past the addressable range are empty.
    let results = match (page - 1).checked_mul(size) {
        Some(start) => tags.values().skip(start).take(size).cloned().collect(),
        None => Vec::new(),
    };
    let has_next = page.checked_mul(size).is_some_and(|end| end < count);
    Json(ListEnvelope {
        count,
        next: has_next.then_some(page + 1),
        previous: (page > 1).then_some(page - 1),
        results,
    })
}

async fn create_tag(
    State(state): State<MockState>,
    Json(input): Json<TagInput>,
) -> (StatusCode, Json<CreateEnvelope>) {
    let pk = state.inner.next_pk.fetch_add(1, Ordering::SeqCst);
    let tag = Tag {
        pk,
        url: tag_url(pk),
        tag: input.tag,
        color_hex: input.color_hex,
    };
    let mut tags = state.inner.db.write().await;
    tags.insert(pk, tag.clone());
    let count = tags.len();
    (
        StatusCode::CREATED,
        Json(CreateEnvelope {
            count,
            next: None,
            previous: None,
            results: tag,
        }),
    )
}

async fn get_tag(State(state): State<MockState>, Path(pk): Path<u64>) -> Result<Json<Tag>, Failure> {
    let tags = state.inner.db.read().await;
    tags.get(&pk).cloned().map(Json).ok_or_else(not_found)
}

async fn update_tag(
    State(state): State<MockState>,
    Path(pk): Path<u64>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, Failure> {
    let mut tags = state.inner.db.write().await;
    let tag = tags.get_mut(&pk).ok_or_else(not_found)?;
    tag.tag = input.tag;
    tag.color_hex = input.color_hex;
    Ok(Json(tag.clone()))
}

async fn delete_tag(State(state): State<MockState>, Path(pk): Path<u64>) -> Result<StatusCode, Failure> {
    let mut tags = state.inner.db.write().await;
    tags.remove(&pk).map(|_| StatusCode::NO_CONTENT).ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> MockState {
        MockState::new("t", "me@example.com", "pw")
    }

    #[test]
    fn tag_serializes_with_api_field_names() {
        let tag = Tag {
            pk: 1,
            url: tag_url(1),
            tag: "prod".to_string(),
            color_hex: "#fff".to_string(),
        };
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["pk"], 1);
        assert_eq!(json["url"], "/api/v1/check-tags/1/");
        assert_eq!(json["tag"], "prod");
        assert_eq!(json["color_hex"], "#fff");
    }

    #[test]
    fn tag_input_rejects_server_fields() {
        let result: Result<TagInput, _> =
            serde_json::from_str(r##"{"pk":3,"tag":"a","color_hex":"#fff"}"##);
        assert!(result.is_err());
    }

    #[test]
    fn tag_input_requires_both_fields() {
        let result: Result<TagInput, _> = serde_json::from_str(r#"{"tag":"a"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn failures_are_consumed_one_at_a_time() {
        let state = state();
        state.fail_next(2);
        assert!(state.take_failure());
        assert!(state.take_failure());
        assert!(!state.take_failure());
    }

    #[test]
    fn page_size_is_at_least_one() {
        let state = MockState::with_page_size("t", "e", "p", 0);
        assert_eq!(state.inner.page_size, 1);
    }
}
