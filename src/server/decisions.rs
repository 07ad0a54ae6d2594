use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::caller::RequireToken;
use super::dto::{
    CommandDecisionResponse, CommandQuery, EnsureUserRequest, ManageDecisionResponse, ManageQuery,
    NameQuery, UserGroupsResponse,
};
use super::response::{ApiResult, ok};
use crate::server::AppState;
use crate::types::{User, UserId};

pub async fn check_command(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommandQuery>,
) -> ApiResult<CommandDecisionResponse> {
    let decision = state
        .run(move |w| w.check_command(query.user, &query.command))
        .await?;
    ok(decision.into())
}

pub async fn check_manage(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ManageQuery>,
) -> ApiResult<ManageDecisionResponse> {
    let allowed = state
        .run(move |w| w.can_manage(query.user, &query.group))
        .await?;
    ok(ManageDecisionResponse { allowed })
}

pub async fn ensure_user(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
    Json(req): Json<EnsureUserRequest>,
) -> ApiResult<User> {
    ok(state.run(move |w| w.ensure_user(id, &req.name)).await?)
}

pub async fn find_users(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> ApiResult<Vec<User>> {
    ok(state
        .run(move |w| w.find_users_by_name(&query.name))
        .await?)
}

pub async fn user_groups(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> ApiResult<UserGroupsResponse> {
    let response = state
        .run(move |w| {
            Ok(UserGroupsResponse {
                groups: w.groups_of(id)?.into_iter().collect(),
                manageable: w.manageable_groups(id)?.into_iter().collect(),
            })
        })
        .await?;
    ok(response)
}
