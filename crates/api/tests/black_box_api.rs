//! Black-box tests: a real server on an ephemeral port, driven over HTTP with
//! minted bearer tokens. Nothing here touches the crate's internals except
//! `build_app` and the claims type needed to mint tokens.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use brigade_auth::{JwtClaims, Role};
use brigade_core::{BranchId, ProductId, UserId};

const SECRET: &str = "test-secret";

struct TestApi {
    base_url: String,
    client: reqwest::Client,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for TestApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl TestApi {
    /// Serve the production router on an ephemeral port.
    async fn spawn() -> Self {
        let app = brigade_api::app::build_app(SECRET.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            server,
        }
    }

    /// Mint a token for a fresh user in `branch` holding `roles`.
    fn token(&self, branch_id: BranchId, roles: Vec<Role>) -> String {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: UserId::new(),
            branch_id,
            roles,
            issued_at: now,
            expires_at: now + ChronoDuration::minutes(10),
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post_json(&self, path: &str, token: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    async fn post_ok(&self, path: &str, token: &str) {
        let res = self.post(path, token).await;
        if res.status() != StatusCode::OK {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            panic!("expected 200 OK from {path}, got {status} body={body}");
        }
    }

    /// Open a one-line draft order; returns its id and the line's product.
    async fn create_order(&self, token: &str, kind: &str, quantity: i64) -> (String, ProductId) {
        let product_id = ProductId::new();
        let res = self
            .post_json(
                "/orders",
                token,
                &json!({
                    "supplier_id": brigade_core::SupplierId::new().to_string(),
                    "kind": kind,
                    "lines": [{ "product_id": product_id.to_string(), "quantity": quantity }],
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: serde_json::Value = res.json().await.unwrap();
        (created["id"].as_str().unwrap().to_string(), product_id)
    }

    /// Poll a GET endpoint until the projection catches up with the command path.
    async fn get_json_eventually<F>(&self, path: &str, token: &str, ready: F) -> serde_json::Value
    where
        F: Fn(&serde_json::Value) -> bool,
    {
        for _ in 0..50 {
            let res = self.get(path, token).await;
            if res.status() == StatusCode::OK {
                let body: serde_json::Value = res.json().await.unwrap();
                if ready(&body) {
                    return body;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        panic!("projection did not catch up within timeout for {path}");
    }
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let api = TestApi::spawn().await;

    let res = api
        .client
        .get(format!("{}/whoami", api.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn branch_context_is_derived_from_token() {
    let api = TestApi::spawn().await;
    let branch_id = BranchId::new();
    let token = api.token(branch_id, vec![Role::Admin]);

    let res = api.get("/whoami", &token).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["branch_id"].as_str().unwrap(), branch_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn order_lifecycle_draft_to_received() {
    let api = TestApi::spawn().await;
    let token = api.token(BranchId::new(), vec![Role::Admin]);

    let (id, product_id) = api.create_order(&token, "regular", 10).await;

    for step in ["submit", "approve", "commit"] {
        api.post_ok(&format!("/orders/{id}/{step}"), &token).await;
    }

    let res = api
        .post_json(
            &format!("/orders/{id}/receipts"),
            &token,
            &json!({ "line_no": 1, "quantity": 10 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    api.post_ok(&format!("/orders/{id}/reconcile"), &token).await;

    // Query side is eventually consistent with the command path.
    let order = api
        .get_json_eventually(&format!("/orders/{id}"), &token, |body| {
            body["state"] == "received"
        })
        .await;
    assert_eq!(order["request_status"], "approved");
    assert_eq!(order["items"][0]["received"], 10);

    // Receiving fed the stock read model.
    let stock = api
        .get_json_eventually(&format!("/inventory/stock/{product_id}"), &token, |body| {
            body["on_hand"] == 10
        })
        .await;
    assert_eq!(stock["product_id"].as_str().unwrap(), product_id.to_string());
}

#[tokio::test]
async fn approval_queue_counts_follow_the_workflow() {
    let api = TestApi::spawn().await;
    let token = api.token(BranchId::new(), vec![Role::Admin, Role::Manager]);

    let (id, _) = api.create_order(&token, "additional", 5).await;
    api.post_ok(&format!("/orders/{id}/submit"), &token).await;

    api.get_json_eventually("/approvals/counts?role=manager", &token, |body| {
        body["counts"]["additional"] == 1
    })
    .await;

    let pending = api
        .get_json_eventually("/approvals/additional?role=manager", &token, |body| {
            body["items"].as_array().map(|a| a.len()) == Some(1)
        })
        .await;
    assert_eq!(pending["items"][0]["id"].as_str().unwrap(), id);

    api.post_ok(&format!("/orders/{id}/approve"), &token).await;

    api.get_json_eventually("/approvals/counts?role=manager", &token, |body| {
        body["counts"]["additional"] == 0
    })
    .await;
}

#[tokio::test]
async fn staff_cannot_approve_orders() {
    let api = TestApi::spawn().await;
    let staff_token = api.token(BranchId::new(), vec![Role::Staff]);

    let (id, _) = api.create_order(&staff_token, "emergency", 3).await;
    api.post_ok(&format!("/orders/{id}/submit"), &staff_token).await;

    let res = api.post(&format!("/orders/{id}/approve"), &staff_token).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_transition_is_unprocessable() {
    let api = TestApi::spawn().await;
    let token = api.token(BranchId::new(), vec![Role::Admin]);

    let (id, _) = api.create_order(&token, "regular", 5).await;

    // Draft orders cannot be committed directly.
    let res = api.post(&format!("/orders/{id}/commit"), &token).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn registered_stock_can_be_adjusted_and_listed() {
    let api = TestApi::spawn().await;
    let token = api.token(BranchId::new(), vec![Role::Admin]);

    let product_id = ProductId::new();
    let res = api
        .post_json(
            "/inventory/items",
            &token,
            &json!({
                "product_id": product_id.to_string(),
                "name": "Arborio rice",
                "unit": "kg",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let item_id = created["id"].as_str().unwrap().to_string();

    let res = api
        .post_json(
            &format!("/inventory/items/{item_id}/adjust"),
            &token,
            &json!({ "delta": 25 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let stock = api
        .get_json_eventually(&format!("/inventory/stock/{product_id}"), &token, |body| {
            body["on_hand"] == 25
        })
        .await;
    assert_eq!(stock["name"], "Arborio rice");
    assert_eq!(stock["unit"], "kg");

    let listing = api
        .get_json_eventually("/inventory/stock", &token, |body| {
            body["items"].as_array().map(|a| a.len()) == Some(1)
        })
        .await;
    assert_eq!(listing["items"][0]["name"], "Arborio rice");
}

#[tokio::test]
async fn branch_isolation_blocks_cross_branch_reads_and_writes() {
    let api = TestApi::spawn().await;
    let token1 = api.token(BranchId::new(), vec![Role::Admin]);
    let token2 = api.token(BranchId::new(), vec![Role::Admin]);

    let (id, _) = api.create_order(&token1, "regular", 5).await;

    // The other branch cannot read it (projection lookup is branch-scoped)
    let res = api.get(&format!("/orders/{id}"), &token2).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Nor move it (dispatch happens under the other branch's context)
    let res = api.post(&format!("/orders/{id}/submit"), &token2).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
