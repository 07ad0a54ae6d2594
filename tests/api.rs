//! HTTP API tests driven directly against the router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use hallpass::config::Authority;
use hallpass::server::{ACTING_USER_HEADER, AppState, create_router};
use hallpass::store::{SqliteStore, Store};
use hallpass::warden::Warden;
use serde_json::{Value, json};
use tower::ServiceExt;

const OPERATOR: i64 = 100;
const TOKEN: &str = "test-token";

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new(api_token: Option<&str>) -> Self {
        let store = SqliteStore::open_in_memory().expect("open store");
        store.initialize().expect("initialize store");
        let warden = Warden::new(
            Arc::new(store),
            Authority::with_override(OPERATOR),
            Duration::from_secs(2),
        );
        let state = Arc::new(AppState::new(Arc::new(warden), api_token));
        Self {
            router: create_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header(ACTING_USER_HEADER, actor.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    async fn post(&self, uri: &str, actor: i64, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(actor), Some(body)).await
    }

    /// admins manages mods; user 1 in admins, user 2 in mods.
    async fn seeded() -> Self {
        let app = Self::new(None);
        app.post("/api/v1/groups", OPERATOR, json!({"name": "admins"}))
            .await;
        app.post(
            "/api/v1/groups",
            OPERATOR,
            json!({"name": "mods", "parent": "admins"}),
        )
        .await;
        app.post("/api/v1/groups/admins/members", OPERATOR, json!({"user_id": 1}))
            .await;
        app.post("/api/v1/groups/mods/members", OPERATOR, json!({"user_id": 2}))
            .await;
        app
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(None);
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_command_decisions() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .post(
            "/api/v1/groups/admins/commands",
            OPERATOR,
            json!({"command": "autolabel add"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);

    let (status, body) = app
        .get("/api/v1/check/command?user=1&command=autolabel%20add")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowed"], true);
    assert_eq!(body["data"]["group"], "admins");

    let (_, body) = app
        .get("/api/v1/check/command?user=2&command=autolabel%20add")
        .await;
    assert_eq!(body["data"]["allowed"], false);
    assert_eq!(
        body["data"]["message"],
        "Only members of groups _admins_ may run that command."
    );
}

#[tokio::test]
async fn test_management_decisions() {
    let app = TestApp::seeded().await;

    let (_, body) = app.get("/api/v1/check/manage?user=1&group=mods").await;
    assert_eq!(body["data"]["allowed"], true);

    let (_, body) = app.get("/api/v1/check/manage?user=2&group=admins").await;
    assert_eq!(body["data"]["allowed"], false);

    let (_, body) = app.get("/api/v1/users/1/groups").await;
    assert_eq!(body["data"]["groups"], json!(["admins"]));
    assert_eq!(body["data"]["manageable"], json!(["admins", "mods"]));
}

#[tokio::test]
async fn test_membership_errors_map_to_status() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .post("/api/v1/groups/admins/members", 2, json!({"user_id": 7}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "User 2 may not manage group admins.");

    let (status, _) = app
        .post("/api/v1/groups/mods/members", 1, json!({"user_id": 2}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/v1/groups/ghosts/members", OPERATOR, json!({"user_id": 2}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, "/api/v1/groups/mods/members/2", Some(1), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::DELETE, "/api/v1/groups/mods/members/2", Some(1), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_membership_is_refused() {
    let app = TestApp::seeded().await;
    app.post(
        "/api/v1/groups/admins/members",
        OPERATOR,
        json!({"user_id": 8, "protected": true}),
    )
    .await;

    let (status, _) = app
        .send(Method::DELETE, "/api/v1/groups/admins/members/8", Some(1), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.get("/api/v1/groups/admins").await;
    let members = body["data"]["members"].as_array().unwrap();
    assert!(members.iter().any(|m| m["user_id"] == 8 && m["protected"] == true));
}

#[tokio::test]
async fn test_mutations_need_acting_user() {
    let app = TestApp::seeded().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/groups",
            None,
            Some(json!({"name": "helpers"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "X-Acting-User header required");
}

#[tokio::test]
async fn test_group_details() {
    let app = TestApp::seeded().await;

    let (status, body) = app.get("/api/v1/groups/mods").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["group"]["name"], "mods");
    assert_eq!(body["data"]["is_managed_by"], json!(["admins"]));

    let (_, body) = app.get("/api/v1/groups").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rule_tables() {
    let app = TestApp::seeded().await;

    let (status, _) = app
        .post(
            "/api/v1/repositories/Vyxal/autolabels",
            1,
            json!({"rule_type": "branch_name", "pattern": "docs/*", "label": "documentation"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/v1/repositories/Vyxal/autolabels",
            OPERATOR,
            json!({"rule_type": "branch_name", "pattern": "docs/*", "label": "documentation"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rule_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .get("/api/v1/repositories/Vyxal/labels?rule_type=branch_name&subject=docs%2Freadme")
        .await;
    assert_eq!(body["data"], json!(["documentation"]));

    let (_, body) = app
        .get("/api/v1/repositories/Vyxal/autolabels/branch_name")
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/autolabels/{rule_id}"),
            Some(OPERATOR),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/repositories/foo/priority").await;
    assert_eq!(body["data"]["priority"], "default");

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/repositories/foo/priority",
            Some(OPERATOR),
            Some(json!({"priority": "ignored"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/priorities/ignored").await;
    assert_eq!(body["data"], json!(["foo"]));
}

#[tokio::test]
async fn test_api_token_is_enforced() {
    let app = TestApp::new(Some(TOKEN));

    let (status, _) = app.get("/api/v1/groups").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/api/v1/groups")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::get("/api/v1/groups")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_requests_share_the_store() {
    let app = TestApp::seeded().await;
    let mut requests = tokio::task::JoinSet::new();
    for user in 1..=8 {
        let router = app.router.clone();
        requests.spawn(async move {
            let request = Request::put(format!("/api/v1/users/{user}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"name": format!("user{user}")}).to_string()))
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        });
        let router = app.router.clone();
        requests.spawn(async move {
            let request = Request::get(format!("/api/v1/users/{user}/groups"))
                .body(Body::empty())
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        });
    }
    while let Some(status) = requests.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let (status, body) = app.get("/api/v1/users?name=user3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], 3);
}
