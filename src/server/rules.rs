use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::caller::{Caller, RequireToken};
use super::dto::{AddAutolabelRequest, LabelsQuery, PriorityResponse, SetPriorityRequest};
use super::response::{ApiResult, ok};
use crate::server::AppState;
use crate::types::{AutolabelRule, Priority, RuleType};

#[derive(serde::Deserialize)]
pub struct AutolabelPath {
    repo: String,
    rule_type: RuleType,
}

pub async fn list_autolabels(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(path): Path<AutolabelPath>,
) -> ApiResult<Vec<AutolabelRule>> {
    ok(state
        .run(move |w| w.list_autolabel_rules(&path.repo, path.rule_type))
        .await?)
}

pub async fn add_autolabel(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(repo): Path<String>,
    Json(req): Json<AddAutolabelRequest>,
) -> ApiResult<AutolabelRule> {
    ok(state
        .run(move |w| w.add_autolabel_rule(actor, &repo, req.rule_type, &req.pattern, &req.label))
        .await?)
}

pub async fn remove_autolabel(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<AutolabelRule> {
    ok(state
        .run(move |w| w.remove_autolabel_rule(actor, &id))
        .await?)
}

/// Labels a webhook should apply to a subject, one per matching rule.
pub async fn labels_for(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(repo): Path<String>,
    Query(query): Query<LabelsQuery>,
) -> ApiResult<Vec<String>> {
    ok(state
        .run(move |w| w.labels_for(&repo, query.rule_type, &query.subject))
        .await?)
}

pub async fn get_priority(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(repo): Path<String>,
) -> ApiResult<PriorityResponse> {
    let lookup = repo.clone();
    let priority = state.run(move |w| w.priority_of(&lookup)).await?;
    ok(PriorityResponse {
        repository: repo,
        priority,
    })
}

pub async fn set_priority(
    Caller(actor): Caller,
    State(state): State<Arc<AppState>>,
    Path(repo): Path<String>,
    Json(req): Json<SetPriorityRequest>,
) -> ApiResult<PriorityResponse> {
    let row = state
        .run(move |w| w.set_priority(actor, &repo, req.priority))
        .await?;
    ok(PriorityResponse {
        repository: row.repository,
        priority: row.priority,
    })
}

pub async fn repositories_with(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(priority): Path<Priority>,
) -> ApiResult<Vec<String>> {
    ok(state.run(move |w| w.repositories_with(priority)).await?)
}
