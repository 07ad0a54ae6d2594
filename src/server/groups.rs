use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::caller::{Caller, RequireToken};
use super::dto::{
    AddMemberRequest, ChangeResponse, CreateGroupRequest, GrantCommandRequest, ManageGroupRequest,
};
use super::response::{ApiResult, ok};
use crate::server::AppState;
use crate::types::{Group, GroupDetails, Membership, UserId};

// Path parameter names match the route: /groups/{name}/...

pub async fn list_groups(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<Group>> {
    ok(state.run(|w| w.list_groups()).await?)
}

pub async fn get_group(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<GroupDetails> {
    ok(state.run(move |w| w.group_details(&name)).await?)
}

pub async fn create_group(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<Group> {
    ok(state
        .run(move |w| w.create_group(actor, &req.name, req.parent.as_deref()))
        .await?)
}

pub async fn delete_group(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<ChangeResponse> {
    state.run(move |w| w.delete_group(actor, &name)).await?;
    ok(ChangeResponse { changed: true })
}

pub async fn add_member(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Membership> {
    ok(state
        .run(move |w| w.add_member(actor, req.user_id, &name, req.protected))
        .await?)
}

#[derive(serde::Deserialize)]
pub struct MemberPath {
    name: String,
    user_id: UserId,
}

pub async fn remove_member(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(path): Path<MemberPath>,
) -> ApiResult<ChangeResponse> {
    state
        .run(move |w| w.remove_member(actor, path.user_id, &path.name))
        .await?;
    ok(ChangeResponse { changed: true })
}

pub async fn grant_command(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<GrantCommandRequest>,
) -> ApiResult<ChangeResponse> {
    let changed = state
        .run(move |w| w.grant_command(actor, &name, &req.command))
        .await?;
    ok(ChangeResponse { changed })
}

#[derive(serde::Deserialize)]
pub struct CommandPath {
    name: String,
    command: String,
}

pub async fn revoke_command(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(path): Path<CommandPath>,
) -> ApiResult<ChangeResponse> {
    let changed = state
        .run(move |w| w.revoke_command(actor, &path.name, &path.command))
        .await?;
    ok(ChangeResponse { changed })
}

pub async fn add_managed(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<ManageGroupRequest>,
) -> ApiResult<ChangeResponse> {
    let changed = state
        .run(move |w| w.add_management_edge(actor, &name, &req.group))
        .await?;
    ok(ChangeResponse { changed })
}

#[derive(serde::Deserialize)]
pub struct ManagedPath {
    name: String,
    managed: String,
}

pub async fn remove_managed(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(path): Path<ManagedPath>,
) -> ApiResult<ChangeResponse> {
    let changed = state
        .run(move |w| w.remove_management_edge(actor, &path.name, &path.managed))
        .await?;
    ok(ChangeResponse { changed })
}
