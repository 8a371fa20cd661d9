use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use tracing::{debug, instrument};

use super::gateway::AdImageGateway;
use super::uploader::ImageUpload;
use crate::ad::types::AdResponse;
use crate::shared::{AppError, AppState};

const FILE_FIELD: &str = "file";

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Pulls the `file` field out of the form. Other fields are skipped.
/// A body that is not multipart counts as "no file".
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<ImageUpload>, AppError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(error = %rejection, "Request body is not multipart");
            return Ok(None);
        }
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?;

        return Ok(Some(ImageUpload {
            bytes: bytes.to_vec(),
            filename,
            content_type,
        }));
    }

    Ok(None)
}

/// POST /api/ads/:id/image
///
/// Uploads the multipart field `file` to the image host and stores its URL on the ad
#[instrument(name = "upload_ad_image", skip(state, headers, multipart))]
pub async fn upload_ad_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AdResponse>, AppError> {
    let gateway = AdImageGateway::from_state(&state);

    let ad = gateway.authorize(id, authorization(&headers)).await?;
    let file = read_file_field(multipart).await?;

    Ok(Json(gateway.attach_authorized(&ad, file).await?))
}

/// DELETE /api/ads/:id/image
#[instrument(name = "delete_ad_image", skip(state, headers))]
pub async fn delete_ad_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<AdResponse>, AppError> {
    let gateway = AdImageGateway::from_state(&state);
    Ok(Json(gateway.detach_image(id, authorization(&headers)).await?))
}
