use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// One multipart field as received by the mock image host
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub cloud_name: String,
    pub fields: Vec<ReceivedField>,
}

impl ReceivedUpload {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> &ReceivedField {
        self.fields.iter().find(|f| f.name == name).unwrap()
    }
}

struct MockState {
    status: StatusCode,
    body: Value,
    uploads: Mutex<Vec<ReceivedUpload>>,
}

/// Cloudinary-compatible upload endpoint on a random local port
#[derive(Clone)]
pub struct MockImageHost {
    base_url: String,
    state: Arc<MockState>,
}

pub const HOSTED_URL: &str = "https://res.cloudinary.test/demo-cloud/image/upload/v1/shoe.png";

impl MockImageHost {
    /// Answers every upload with 200 and a `secure_url`
    pub async fn start() -> Self {
        Self::start_with(StatusCode::OK, json!({ "secure_url": HOSTED_URL })).await
    }

    pub async fn start_with(status: StatusCode, body: Value) -> Self {
        let state = Arc::new(MockState {
            status,
            body,
            uploads: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1_1/:cloud/image/upload", post(receive_upload))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.uploads.lock().unwrap().len()
    }
}

async fn receive_upload(
    State(state): State<Arc<MockState>>,
    Path(cloud_name): Path<String>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let value = field.bytes().await.unwrap().to_vec();
        fields.push(ReceivedField {
            name,
            filename,
            content_type,
            value,
        });
    }

    state.uploads.lock().unwrap().push(ReceivedUpload { cloud_name, fields });
    (state.status, Json(state.body.clone()))
}
