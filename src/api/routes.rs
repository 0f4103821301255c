//! HTTP routes and handlers for the user API.
//!
//! The same router runs in three places: the standalone server, every
//! cluster worker, and the in-process tests. What differs is the
//! [`WritePath`]: standalone handlers apply mutations to their own store,
//! worker handlers forward them to the coordinator and leave the local
//! replica untouched until a snapshot comes back.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::validate::{self, INVALID_USER_ID, USER_NOT_FOUND};
use crate::common::{Error, Result};
use crate::ipc::ReplicationMessage;
use crate::store::{Mutation, SharedUserStore, User};

/// Where committed writes go.
#[derive(Clone)]
pub enum WritePath {
    /// Apply directly to the local store.
    Local,
    /// Forward to the coordinator. The local store is a replica and only
    /// incoming snapshots may write to it.
    Upstream(mpsc::UnboundedSender<ReplicationMessage>),
}

/// Shared state for the user API handlers.
#[derive(Clone)]
pub struct ApiContext {
    store: SharedUserStore,
    writes: WritePath,
}

impl ApiContext {
    /// Standalone context: reads and writes hit the same store.
    pub fn local(store: SharedUserStore) -> Self {
        Self {
            store,
            writes: WritePath::Local,
        }
    }

    /// Worker context: reads hit the replica, writes go upstream.
    pub fn forwarding(
        store: SharedUserStore,
        upstream: mpsc::UnboundedSender<ReplicationMessage>,
    ) -> Self {
        Self {
            store,
            writes: WritePath::Upstream(upstream),
        }
    }

    fn commit(&self, mutation: Mutation) -> Result<()> {
        match &self.writes {
            WritePath::Local => {
                self.store.write().unwrap().apply(mutation);
                Ok(())
            }
            WritePath::Upstream(tx) => {
                debug!(kind = mutation.kind(), "forwarding mutation to coordinator");
                tx.send(ReplicationMessage::Mutate(mutation))
                    .map_err(|_| Error::ChannelClosed("replication link to coordinator".into()))
            }
        }
    }
}

/// Build the user API router.
///
/// A method the route does not handle falls through to the same 404 as an
/// unknown path; routes are matched on method and path as one unit.
/// Request bodies are buffered whole, with no size cap.
pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(list_users).post(create_user).fallback(not_found),
        )
        .route(
            "/api/users/:user_id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .with_state(ctx)
}

async fn list_users(State(ctx): State<ApiContext>) -> Json<Vec<User>> {
    Json(ctx.store.read().unwrap().list())
}

async fn get_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    let id = parse_user_id(&user_id)?;
    let user = ctx
        .store
        .read()
        .unwrap()
        .find(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(USER_NOT_FOUND.into()))?;
    Ok(Json(user))
}

async fn create_user(State(ctx): State<ApiContext>, body: Bytes) -> Result<impl IntoResponse> {
    let value: Value = serde_json::from_slice(&body)?;
    let accepted = validate::validate_create(&value)?;
    let user = User::new(accepted.username, accepted.age, accepted.hobbies);
    ctx.commit(Mutation::Insert(user.clone()))?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<User>> {
    let id = parse_user_id(&user_id)?;
    let existing = ctx
        .store
        .read()
        .unwrap()
        .find(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(USER_NOT_FOUND.into()))?;

    let value: Value = serde_json::from_slice(&body)?;
    let patch = validate::validate_update(&value)?;
    let updated = patch.apply_to(&existing);
    ctx.commit(Mutation::Update(updated.clone()))?;
    Ok(Json(updated))
}

async fn delete_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_user_id(&user_id)?;
    if !ctx.store.read().unwrap().contains(id) {
        return Err(Error::NotFound(USER_NOT_FOUND.into()));
    }
    ctx.commit(Mutation::Delete(id.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Gate the path parameter on the 36-char hyphenated UUID shape; the
/// parser alone also takes compact, braced, and urn forms. Lookups still
/// use the raw string, ids are compared verbatim everywhere.
fn parse_user_id(raw: &str) -> Result<&str> {
    if raw.len() != 36 || uuid::Uuid::parse_str(raw).is_err() {
        return Err(Error::Validation(INVALID_USER_ID.into()));
    }
    Ok(raw)
}
