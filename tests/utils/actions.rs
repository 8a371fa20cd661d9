use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use marketplace::ad::repository::AdRepository;

use super::setup::TestSetup;

pub const BOUNDARY: &str = "integration-test-boundary";

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Sends one request through the router and returns status and JSON body.
    /// Empty or non-JSON bodies come back as `Value::Null`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Registers an account and returns its session token
    pub async fn register(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send_json(
                "POST",
                "/api/register",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates an ad and returns its id
    pub async fn create_ad(&self, token: &str, brand: &str, size: &str, price: &str) -> i64 {
        let (status, body) = self
            .send_json(
                "POST",
                "/api/ads",
                Some(token),
                Some(json!({ "brand": brand, "size": size, "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create ad failed: {body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn checkout(&self, token: &str, ad_ids: &[i64]) -> (StatusCode, Value) {
        self.send_json(
            "POST",
            "/api/purchases/checkout",
            Some(token),
            Some(json!({ "adIds": ad_ids })),
        )
        .await
    }

    /// Uploads `bytes` as the multipart field `file`
    pub async fn upload_image(
        &self,
        token: Option<&str>,
        ad_id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/ads/{ad_id}/image"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Image path currently stored for an ad, read straight from the repository
    pub async fn stored_image_path(&self, ad_id: i64) -> Option<String> {
        self.state
            .ad_repository
            .get_ad(ad_id)
            .await
            .unwrap()
            .unwrap()
            .image_path
    }
}
