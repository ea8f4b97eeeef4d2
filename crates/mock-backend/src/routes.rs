//! HTTP surface: auth endpoints plus a PostgREST-style table API.
//!
//! Conventions mirror the hosted backend:
//!
//! * `POST /rest/v1/{table}` returns the inserted row as an object;
//! * `PATCH /rest/v1/{table}?filters` returns the updated rows as an array
//!   (empty when ownership scoping matched nothing);
//! * `DELETE /rest/v1/{table}?filters` returns `{"deleted": n}`;
//! * mutations to `messages` and `notifications` publish a change event on
//!   the matching realtime subject.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use nkeys::KeyPair;
use serde_json::{json, Map, Value};

use kollabx_models::{
    ChangeEvent, ChannelId, MessageId, NotificationId, ProjectId, UserId,
    DEFAULT_CHANNEL_NAME, MAX_CHANNELS_PER_PROJECT,
};
use kollabx_sdk::RealtimeSubjects;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::jwt;
use crate::store::{Filter, Store, TableQuery};

/// Token lifetime for both token families.
const TOKEN_TTL_SECS: u64 = 60 * 60 * 24;

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    /// Account key-pair used to sign realtime JWTs.
    pub account_kp: KeyPair,
    /// Realtime connection; `None` disables event publishing.
    pub nats: Option<async_nats::Client>,
    pub store: Mutex<Store>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/rpc/ensure_general_channel", post(ensure_general_channel))
        .route(
            "/rest/v1/{table}",
            get(select_rows)
                .post(insert_row)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let email = require_str(&body, "email")?;
    let password = require_str(&body, "password")?;
    let nkey = require_str(&body, "user_nkey_public")?;
    let full_name = body["full_name"].as_str();

    let user = UserId::generate();
    {
        let mut store = state.store.lock().unwrap();
        store.create_account(email, password, user)?;
        store.insert(
            "profiles",
            json!({
                "id": user,
                "full_name": full_name,
                "avatar_url": null,
                "bio": null,
                "skills": [],
                "github_url": null,
                "linkedin_url": null,
            }),
        )?;
    }

    tracing::info!(%user, email, "account created");
    auth_response(&state, user, nkey).map(Json)
}

async fn token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let email = require_str(&body, "email")?;
    let password = require_str(&body, "password")?;
    let nkey = require_str(&body, "user_nkey_public")?;

    let user = state
        .store
        .lock()
        .unwrap()
        .verify_credentials(email, password)
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

    auth_response(&state, user, nkey).map(Json)
}

/// Tokens are stateless, so logout only validates the caller.
async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    tracing::info!(%user, "signed out");
    Ok(Json(json!({ "ok": true })))
}

fn auth_response(state: &AppState, user: UserId, nkey: &str) -> Result<Value, ApiError> {
    let access_token = jwt::mint_access_token(&state.config.jwt_secret, user, TOKEN_TTL_SECS)?;
    let realtime_jwt =
        jwt::sign_realtime_jwt(&state.account_kp, nkey, user, TOKEN_TTL_SECS)?;
    Ok(json!({
        "access_token": access_token,
        "realtime_jwt": realtime_jwt,
        "user_id": user,
    }))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
    jwt::verify_access_token(&state.config.jwt_secret, bearer)
}

// ---------------------------------------------------------------------------
// Table API
// ---------------------------------------------------------------------------

async fn select_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, ApiError> {
    authenticate(&state, &headers)?;
    let query = TableQuery::from_pairs(&pairs)?;
    let rows = state.store.lock().unwrap().select(&table, &query)?;
    Ok(Json(rows))
}

async fn insert_row(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;

    let (row, event) = {
        let mut store = state.store.lock().unwrap();
        match table.as_str() {
            "projects" => (insert_project(&mut store, user, &body)?, None),
            "applications" => (insert_application(&mut store, user, &body)?, None),
            "team_members" => (insert_team_member(&mut store, user, &body)?, None),
            "channels" => (insert_channel(&mut store, user, &body)?, None),
            "messages" => {
                let row = insert_message(&mut store, user, &body)?;
                let subject = message_subject(&row)?;
                (row.clone(), Some((subject, ChangeEvent::insert(row))))
            }
            "notifications" => {
                let row = insert_notification(&mut store, &body)?;
                let subject = notification_subject(&row)?;
                (row.clone(), Some((subject, ChangeEvent::insert(row))))
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "inserts into {other} are not supported"
                )))
            }
        }
    };

    if let Some((subject, event)) = event {
        publish_event(&state, subject, event).await;
    }
    Ok(Json(row))
}

async fn update_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let mut query = TableQuery::from_pairs(&pairs)?;
    let patch = patch
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("patch body must be an object".into()))?;

    let (updated, events) = {
        let mut store = state.store.lock().unwrap();
        scope_update(&store, &table, user, &mut query.filters, &patch)?;

        let before = store.select(&table, &query)?;
        let updated = store.update(&table, &query.filters, &patch)?;

        let mut events = Vec::new();
        for new in &updated {
            let old = before.iter().find(|row| row["id"] == new["id"]);
            let subject = match table.as_str() {
                "messages" => Some(message_subject(new)?),
                "notifications" => Some(notification_subject(new)?),
                _ => None,
            };
            if let (Some(subject), Some(old)) = (subject, old) {
                events.push((subject, ChangeEvent::update(old.clone(), new.clone())));
            }
        }
        (updated, events)
    };

    for (subject, event) in events {
        publish_event(&state, subject, event).await;
    }
    Ok(Json(updated))
}

async fn delete_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let mut query = TableQuery::from_pairs(&pairs)?;

    let (deleted, events) = {
        let mut store = state.store.lock().unwrap();
        scope_delete(&store, &table, user, &mut query.filters)?;

        let doomed = store.select(&table, &query)?;
        let deleted = store.delete(&table, &query.filters)?;

        // Removing a project takes its dependents with it.
        if table == "projects" {
            for project in &doomed {
                cascade_delete_project(&mut store, project)?;
            }
        }

        let mut events = Vec::new();
        for row in doomed {
            let subject = match table.as_str() {
                "messages" => Some(message_subject(&row)?),
                "notifications" => Some(notification_subject(&row)?),
                _ => None,
            };
            if let Some(subject) = subject {
                events.push((subject, ChangeEvent::delete(row)));
            }
        }
        (deleted, events)
    };

    for (subject, event) in events {
        publish_event(&state, subject, event).await;
    }
    Ok(Json(json!({ "deleted": deleted })))
}

/// `POST /rest/v1/rpc/ensure_general_channel` with `{"project_id": …}`.
///
/// Recreates the default channel if it went missing, and returns it.
async fn ensure_general_channel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers)?;
    let project_id = require_str(&body, "project_id")?;

    let mut store = state.store.lock().unwrap();
    if store.find_by_id("projects", project_id)?.is_none() {
        return Err(ApiError::NotFound(format!("project {project_id}")));
    }

    let existing = store.select(
        "channels",
        &TableQuery {
            filters: vec![
                Filter::Eq("project_id".into(), project_id.into()),
                Filter::Eq("name".into(), DEFAULT_CHANNEL_NAME.into()),
            ],
            ..TableQuery::default()
        },
    )?;
    if let Some(channel) = existing.into_iter().next() {
        return Ok(Json(channel));
    }

    let channel = store.insert(
        "channels",
        json!({
            "id": ChannelId::generate(),
            "project_id": project_id,
            "name": DEFAULT_CHANNEL_NAME,
            "description": null,
        }),
    )?;
    Ok(Json(channel))
}

// ---------------------------------------------------------------------------
// Per-table insert rules
// ---------------------------------------------------------------------------

fn insert_project(store: &mut Store, user: UserId, body: &Value) -> Result<Value, ApiError> {
    let project_id = ProjectId::generate();
    let project = store.insert(
        "projects",
        json!({
            "id": project_id,
            "creator_id": user,
            "title": require_str(body, "title")?,
            "category": require_str(body, "category")?,
            "description": body["description"].as_str().unwrap_or_default(),
            "required_skills": array_or_empty(body, "required_skills"),
            "team_size": body["team_size"].as_u64().unwrap_or(1),
            "current_members": 1,
            "roles_needed": array_or_empty(body, "roles_needed"),
            "timeline": body["timeline"].clone(),
            "visibility": body["visibility"].as_str().unwrap_or("public"),
            "status": "open",
            "created_at": Utc::now(),
        }),
    )?;

    // Every project starts with its default channel and the creator on the
    // roster.
    store.insert(
        "channels",
        json!({
            "id": ChannelId::generate(),
            "project_id": project_id,
            "name": DEFAULT_CHANNEL_NAME,
            "description": null,
        }),
    )?;
    store.insert(
        "team_members",
        json!({
            "project_id": project_id,
            "user_id": user,
            "role": "Creator",
            "joined_at": Utc::now(),
        }),
    )?;

    Ok(project)
}

fn insert_application(store: &mut Store, user: UserId, body: &Value) -> Result<Value, ApiError> {
    let project_id = require_str(body, "project_id")?;
    if store.find_by_id("projects", project_id)?.is_none() {
        return Err(ApiError::NotFound(format!("project {project_id}")));
    }

    let pending = store.select(
        "applications",
        &TableQuery {
            filters: vec![
                Filter::Eq("project_id".into(), project_id.into()),
                Filter::Eq("applicant_id".into(), user.to_string()),
                Filter::Eq("status".into(), "pending".into()),
            ],
            ..TableQuery::default()
        },
    )?;
    if !pending.is_empty() {
        return Err(ApiError::Conflict("application already pending".into()));
    }

    store.insert(
        "applications",
        json!({
            "id": kollabx_models::ApplicationId::generate(),
            "project_id": project_id,
            "applicant_id": user,
            "message": body["message"].as_str().unwrap_or_default(),
            "role": body["role"].clone(),
            "status": "pending",
            "created_at": Utc::now(),
        }),
    )
}

fn insert_team_member(store: &mut Store, user: UserId, body: &Value) -> Result<Value, ApiError> {
    let project_id = require_str(body, "project_id")?;
    require_leader(store, project_id, user)?;

    store.insert(
        "team_members",
        json!({
            "project_id": project_id,
            "user_id": require_str(body, "user_id")?,
            "role": body["role"].clone(),
            "joined_at": Utc::now(),
        }),
    )
}

fn insert_channel(store: &mut Store, user: UserId, body: &Value) -> Result<Value, ApiError> {
    let project_id = require_str(body, "project_id")?;
    require_leader(store, project_id, user)?;

    let existing = store.select(
        "channels",
        &TableQuery {
            filters: vec![Filter::Eq("project_id".into(), project_id.into())],
            ..TableQuery::default()
        },
    )?;
    if existing.len() >= MAX_CHANNELS_PER_PROJECT {
        return Err(ApiError::Conflict(format!(
            "projects may have at most {MAX_CHANNELS_PER_PROJECT} channels"
        )));
    }

    store.insert(
        "channels",
        json!({
            "id": ChannelId::generate(),
            "project_id": project_id,
            "name": require_str(body, "name")?,
            "description": body["description"].clone(),
        }),
    )
}

fn insert_message(store: &mut Store, user: UserId, body: &Value) -> Result<Value, ApiError> {
    let channel_id = require_str(body, "channel_id")?;
    if store.find_by_id("channels", channel_id)?.is_none() {
        return Err(ApiError::NotFound(format!("channel {channel_id}")));
    }

    // Embed the author profile so live consumers can render the row
    // without a second lookup.
    let author = store
        .select(
            "profiles",
            &TableQuery {
                filters: vec![Filter::Eq("id".into(), user.to_string())],
                ..TableQuery::default()
            },
        )?
        .into_iter()
        .next()
        .map(|p| json!({ "full_name": p["full_name"], "avatar_url": p["avatar_url"] }))
        .unwrap_or(Value::Null);

    store.insert(
        "messages",
        json!({
            "id": MessageId::generate(),
            "channel_id": channel_id,
            "user_id": user,
            "content": require_str(body, "content")?,
            "created_at": Utc::now(),
            "author": author,
        }),
    )
}

fn insert_notification(store: &mut Store, body: &Value) -> Result<Value, ApiError> {
    // Notifications are addressed to other users (leader, applicant), so
    // the recipient comes from the body rather than the caller.
    store.insert(
        "notifications",
        json!({
            "id": NotificationId::generate(),
            "user_id": require_str(body, "user_id")?,
            "kind": require_str(body, "kind")?,
            "title": require_str(body, "title")?,
            "body": body["body"].as_str().unwrap_or_default(),
            "link": body["link"].clone(),
            "read": false,
            "created_at": Utc::now(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Ownership scoping
// ---------------------------------------------------------------------------

/// Constrain an update so callers can only touch rows they own.
fn scope_update(
    store: &Store,
    table: &str,
    user: UserId,
    filters: &mut Vec<Filter>,
    patch: &Map<String, Value>,
) -> Result<(), ApiError> {
    match table {
        "messages" => filters.push(Filter::Eq("user_id".into(), user.to_string())),
        "notifications" => filters.push(Filter::Eq("user_id".into(), user.to_string())),
        "profiles" => filters.push(Filter::Eq("id".into(), user.to_string())),
        "projects" => {
            // Member-count adjustments are issued by whoever joins or
            // leaves; everything else is creator-only.
            if !patch.keys().all(|k| k == "current_members") {
                filters.push(Filter::Eq("creator_id".into(), user.to_string()));
            }
        }
        "applications" => {
            // Reviewed by the leader of the project applied to.
            for row in store.select(table, &filters_query(filters))? {
                let project_id = row["project_id"].as_str().unwrap_or_default();
                require_leader(store, project_id, user)?;
            }
        }
        other => {
            return Err(ApiError::Forbidden(format!("updates to {other} are not allowed")))
        }
    }
    Ok(())
}

/// Constrain a delete the same way.
fn scope_delete(
    store: &Store,
    table: &str,
    user: UserId,
    filters: &mut Vec<Filter>,
) -> Result<(), ApiError> {
    match table {
        "messages" => filters.push(Filter::Eq("user_id".into(), user.to_string())),
        "notifications" => filters.push(Filter::Eq("user_id".into(), user.to_string())),
        "projects" => filters.push(Filter::Eq("creator_id".into(), user.to_string())),
        "team_members" => {
            // A member may remove themselves; otherwise only the leader.
            let caller = user.to_string();
            for row in store.select(table, &filters_query(filters))? {
                if row["user_id"].as_str() == Some(caller.as_str()) {
                    continue;
                }
                let project_id = row["project_id"].as_str().unwrap_or_default();
                require_leader(store, project_id, user)?;
            }
        }
        other => {
            return Err(ApiError::Forbidden(format!("deletes from {other} are not allowed")))
        }
    }
    Ok(())
}

fn require_leader(store: &Store, project_id: &str, user: UserId) -> Result<Value, ApiError> {
    let project = store
        .find_by_id("projects", project_id)?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id}")))?;
    if project["creator_id"].as_str() != Some(user.to_string().as_str()) {
        return Err(ApiError::Forbidden("only the project leader may do this".into()));
    }
    Ok(project)
}

fn cascade_delete_project(store: &mut Store, project: &Value) -> Result<(), ApiError> {
    let project_id = project["id"].as_str().unwrap_or_default().to_string();
    let by_project = vec![Filter::Eq("project_id".into(), project_id.clone())];

    let channels = store.select("channels", &filters_query(&by_project))?;
    for channel in channels {
        let channel_id = channel["id"].as_str().unwrap_or_default().to_string();
        store.delete("messages", &[Filter::Eq("channel_id".into(), channel_id)])?;
    }
    store.delete("channels", &by_project)?;
    store.delete("team_members", &by_project)?;
    store.delete("applications", &by_project)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn filters_query(filters: &[Filter]) -> TableQuery {
    TableQuery {
        filters: filters.to_vec(),
        ..TableQuery::default()
    }
}

fn require_str<'a>(body: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    body[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing field: {key}")))
}

fn array_or_empty(body: &Value, key: &str) -> Value {
    body[key]
        .as_array()
        .cloned()
        .map(Value::Array)
        .unwrap_or_else(|| json!([]))
}

fn message_subject(row: &Value) -> Result<String, ApiError> {
    let channel: ChannelId = row["channel_id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("message row has no channel_id".into()))?;
    Ok(RealtimeSubjects::channel_messages(channel))
}

fn notification_subject(row: &Value) -> Result<String, ApiError> {
    let user: UserId = row["user_id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("notification row has no user_id".into()))?;
    Ok(RealtimeSubjects::user_notifications(user))
}

async fn publish_event(state: &AppState, subject: String, event: ChangeEvent<Value>) {
    let Some(nats) = &state.nats else { return };
    let bytes = match serde_json::to_vec(&event) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("failed to encode change event: {e}");
            return;
        }
    };
    if let Err(e) = nats.publish(subject.clone(), bytes.into()).await {
        tracing::warn!(%subject, "failed to publish change event: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            config: AppConfig {
                listen_port: 0,
                jwt_secret: "test-secret".into(),
                nats_url: None,
            },
            account_kp: KeyPair::new_account(),
            nats: None,
            store: Mutex::new(Store::new()),
        })
    }

    fn server() -> TestServer {
        TestServer::new(router(test_state())).unwrap()
    }

    async fn sign_up(server: &TestServer, email: &str, name: &str) -> (String, String) {
        let user_kp = KeyPair::new(nkeys::KeyPairType::User);
        let res = server
            .post("/auth/v1/signup")
            .json(&json!({
                "email": email,
                "password": "hunter2",
                "full_name": name,
                "user_nkey_public": user_kp.public_key(),
            }))
            .await;
        res.assert_status_ok();
        let body: Value = res.json();
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["user_id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_project(server: &TestServer, token: &str, title: &str) -> Value {
        let res = server
            .post("/rest/v1/projects")
            .authorization_bearer(token)
            .json(&json!({
                "title": title,
                "category": "Web",
                "description": "a thing",
                "team_size": 3,
                "visibility": "public",
            }))
            .await;
        res.assert_status_ok();
        res.json()
    }

    #[tokio::test]
    async fn signup_then_sign_in() {
        let server = server();
        let (_, user_id) = sign_up(&server, "ada@example.com", "Ada").await;

        let user_kp = KeyPair::new(nkeys::KeyPairType::User);
        let res = server
            .post("/auth/v1/token")
            .json(&json!({
                "email": "ada@example.com",
                "password": "hunter2",
                "user_nkey_public": user_kp.public_key(),
            }))
            .await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["user_id"], user_id);
        assert!(body["realtime_jwt"].as_str().unwrap().contains('.'));

        let res = server
            .post("/auth/v1/token")
            .json(&json!({
                "email": "ada@example.com",
                "password": "wrong",
                "user_nkey_public": user_kp.public_key(),
            }))
            .await;
        res.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn rest_requires_bearer_token() {
        let server = server();
        let res = server.get("/rest/v1/projects").await;
        res.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn project_insert_bootstraps_channel_and_roster() {
        let server = server();
        let (token, user_id) = sign_up(&server, "ada@example.com", "Ada").await;
        let project = create_project(&server, &token, "Flight Tracker").await;

        assert_eq!(project["creator_id"], user_id);
        assert_eq!(project["status"], "open");
        assert_eq!(project["current_members"], 1);

        let res = server
            .get("/rest/v1/channels")
            .authorization_bearer(&token)
            .add_query_param("project_id", format!("eq.{}", project["id"].as_str().unwrap()))
            .await;
        let channels: Vec<Value> = res.json();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0]["name"], DEFAULT_CHANNEL_NAME);

        let res = server
            .get("/rest/v1/team_members")
            .authorization_bearer(&token)
            .add_query_param("project_id", format!("eq.{}", project["id"].as_str().unwrap()))
            .await;
        let roster: Vec<Value> = res.json();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0]["user_id"], user_id);
        assert_eq!(roster[0]["role"], "Creator");
    }

    #[tokio::test]
    async fn channel_count_is_capped() {
        let server = server();
        let (token, _) = sign_up(&server, "ada@example.com", "Ada").await;
        let project = create_project(&server, &token, "Flight Tracker").await;
        let project_id = project["id"].as_str().unwrap();

        for name in ["dev", "design"] {
            let res = server
                .post("/rest/v1/channels")
                .authorization_bearer(&token)
                .json(&json!({ "project_id": project_id, "name": name, "description": null }))
                .await;
            res.assert_status_ok();
        }

        let res = server
            .post("/rest/v1/channels")
            .authorization_bearer(&token)
            .json(&json!({ "project_id": project_id, "name": "overflow", "description": null }))
            .await;
        res.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn message_flow_with_author_join() {
        let server = server();
        let (token, user_id) = sign_up(&server, "ada@example.com", "Ada").await;
        let project = create_project(&server, &token, "Flight Tracker").await;
        let project_id = project["id"].as_str().unwrap();

        let res = server
            .get("/rest/v1/channels")
            .authorization_bearer(&token)
            .add_query_param("project_id", format!("eq.{project_id}"))
            .await;
        let channels: Vec<Value> = res.json();
        let channel_id = channels[0]["id"].as_str().unwrap();

        for content in ["first", "second"] {
            let res = server
                .post("/rest/v1/messages")
                .authorization_bearer(&token)
                .json(&json!({ "channel_id": channel_id, "content": content }))
                .await;
            res.assert_status_ok();
        }

        let res = server
            .get("/rest/v1/messages")
            .authorization_bearer(&token)
            .add_query_param("select", "*,author:profiles(full_name,avatar_url)")
            .add_query_param("channel_id", format!("eq.{channel_id}"))
            .add_query_param("order", "created_at.asc")
            .await;
        let messages: Vec<Value> = res.json();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "first");
        assert_eq!(messages[0]["user_id"], user_id);
        assert_eq!(messages[0]["author"]["full_name"], "Ada");
    }

    #[tokio::test]
    async fn project_updates_are_creator_scoped() {
        let server = server();
        let (creator, _) = sign_up(&server, "ada@example.com", "Ada").await;
        let (other, _) = sign_up(&server, "bob@example.com", "Bob").await;
        let project = create_project(&server, &creator, "Flight Tracker").await;
        let project_id = project["id"].as_str().unwrap();

        // Non-creator patching the title matches no rows.
        let res = server
            .patch("/rest/v1/projects")
            .authorization_bearer(&other)
            .add_query_param("id", format!("eq.{project_id}"))
            .json(&json!({ "title": "Hijacked" }))
            .await;
        res.assert_status_ok();
        let rows: Vec<Value> = res.json();
        assert!(rows.is_empty());

        // The creator succeeds.
        let res = server
            .patch("/rest/v1/projects")
            .authorization_bearer(&creator)
            .add_query_param("id", format!("eq.{project_id}"))
            .json(&json!({ "status": "closed" }))
            .await;
        let rows: Vec<Value> = res.json();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "closed");

        // Member-count adjustments are open to any member flow.
        let res = server
            .patch("/rest/v1/projects")
            .authorization_bearer(&other)
            .add_query_param("id", format!("eq.{project_id}"))
            .json(&json!({ "current_members": 2 }))
            .await;
        let rows: Vec<Value> = res.json();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["current_members"], 2);
    }

    #[tokio::test]
    async fn notification_read_state_is_owner_scoped() {
        let server = server();
        let (leader_token, leader_id) = sign_up(&server, "ada@example.com", "Ada").await;
        let (other_token, _) = sign_up(&server, "bob@example.com", "Bob").await;

        // Bob addresses a notification to Ada.
        let res = server
            .post("/rest/v1/notifications")
            .authorization_bearer(&other_token)
            .json(&json!({
                "user_id": leader_id,
                "kind": "application_received",
                "title": "New application",
                "body": "Someone applied",
                "link": null,
            }))
            .await;
        res.assert_status_ok();

        // Bob cannot mark Ada's notifications read.
        let res = server
            .patch("/rest/v1/notifications")
            .authorization_bearer(&other_token)
            .add_query_param("user_id", format!("eq.{leader_id}"))
            .json(&json!({ "read": true }))
            .await;
        let rows: Vec<Value> = res.json();
        assert!(rows.is_empty());

        // Ada can.
        let res = server
            .patch("/rest/v1/notifications")
            .authorization_bearer(&leader_token)
            .add_query_param("user_id", format!("eq.{leader_id}"))
            .add_query_param("read", "eq.false")
            .json(&json!({ "read": true }))
            .await;
        let rows: Vec<Value> = res.json();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["read"], true);
    }

    #[tokio::test]
    async fn ensure_general_channel_recreates_missing_default() {
        let server = server();
        let (token, _) = sign_up(&server, "ada@example.com", "Ada").await;
        let project = create_project(&server, &token, "Flight Tracker").await;
        let project_id = project["id"].as_str().unwrap();

        // Idempotent while the channel exists.
        let res = server
            .post("/rest/v1/rpc/ensure_general_channel")
            .authorization_bearer(&token)
            .json(&json!({ "project_id": project_id }))
            .await;
        res.assert_status_ok();
        let channel: Value = res.json();
        assert_eq!(channel["name"], DEFAULT_CHANNEL_NAME);

        let res = server
            .get("/rest/v1/channels")
            .authorization_bearer(&token)
            .add_query_param("project_id", format!("eq.{project_id}"))
            .await;
        let channels: Vec<Value> = res.json();
        assert_eq!(channels.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_pending_application_conflicts() {
        let server = server();
        let (leader, _) = sign_up(&server, "ada@example.com", "Ada").await;
        let (applicant, _) = sign_up(&server, "bob@example.com", "Bob").await;
        let project = create_project(&server, &leader, "Flight Tracker").await;
        let project_id = project["id"].as_str().unwrap();

        let apply = json!({ "project_id": project_id, "message": "hi", "role": null });
        let res = server
            .post("/rest/v1/applications")
            .authorization_bearer(&applicant)
            .json(&apply)
            .await;
        res.assert_status_ok();
        let application: Value = res.json();
        assert_eq!(application["status"], "pending");

        let res = server
            .post("/rest/v1/applications")
            .authorization_bearer(&applicant)
            .json(&apply)
            .await;
        res.assert_status(axum::http::StatusCode::CONFLICT);
    }
}
