//! HTTP façade the client daemon exposes locally (§6): multipart upload,
//! JSON download with proof headers, and a health probe tied to the
//! WebSocket link's [`LinkStatus`].

use crate::connection::LinkStatus;
use crate::orchestrator::{Orchestrator, OrchestratorError};
use actix_multipart::form::{bytes::Bytes as FormBytes, text::Text, MultipartForm};
use actix_web::{get, post, web, HttpResponse, Result as ActixResult};
use merkle_tree::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub struct FacadeState {
    pub orchestrator: Arc<Orchestrator>,
    pub link: LinkStatus,
}

#[derive(MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "32MiB", rename = "file")]
    pub files: Vec<FormBytes>,
    #[multipart(rename = "filename")]
    pub filenames: Vec<Text<String>>,
}

#[derive(Serialize)]
struct UploadResponse {
    #[serde(rename = "receiptId")]
    receipt_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[post("/upload")]
pub async fn upload(
    form: MultipartForm<UploadForm>,
    state: web::Data<FacadeState>,
) -> ActixResult<HttpResponse> {
    let UploadForm { files, filenames } = form.into_inner();

    if files.len() != filenames.len() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "file and filename field counts must match".to_string(),
        }));
    }

    let mut batch = Vec::with_capacity(files.len());
    for (file, filename) in files.into_iter().zip(filenames) {
        let filename = filename.into_inner();
        common::file_utils::validate_filename(&filename)
            .map_err(|e| actix_web::error::ErrorBadRequest(e.message().to_string()))?;
        batch.push((filename, file.data.to_vec()));
    }

    info!(file_count = batch.len(), "POST /upload - request received");

    match state.orchestrator.upload(batch, HashAlgorithm::default()).await {
        Ok(receipt_id) => {
            info!(%receipt_id, "POST /upload - batch accepted");
            Ok(HttpResponse::Ok().json(UploadResponse { receipt_id }))
        }
        Err(e) => Ok(orchestrator_error_response(e)),
    }
}

#[derive(Deserialize)]
pub struct DownloadRequest {
    pub receipt_id: String,
    pub filename: String,
}

#[post("/download")]
pub async fn download(
    req: web::Json<DownloadRequest>,
    state: web::Data<FacadeState>,
) -> ActixResult<HttpResponse> {
    info!(receipt_id = %req.receipt_id, filename = %req.filename, "POST /download - request received");

    match state.orchestrator.download(&req.receipt_id, &req.filename).await {
        Ok((contents, proof)) => {
            let mut response = HttpResponse::Ok();
            response
                .insert_header(("Content-Type", "application/octet-stream"))
                .insert_header(("Content-Length", contents.len().to_string()))
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", req.filename),
                ))
                .insert_header(("Proof-Root-Hash", req.receipt_id.clone()));
            for (i, part) in proof.iter().enumerate() {
                let side = match part.sibling_type {
                    merkle_tree::SiblingType::Left => "left",
                    merkle_tree::SiblingType::Right => "right",
                    merkle_tree::SiblingType::None => continue,
                };
                response.insert_header((
                    format!("Proof-Sibling-{i}-{side}"),
                    hex::encode(&part.sibling_hash),
                ));
            }
            Ok(response.body(contents))
        }
        Err(e @ OrchestratorError::CorruptedFile) => Ok(HttpResponse::build(
            actix_web::http::StatusCode::from_u16(427).unwrap(),
        )
        .json(ErrorResponse { error: e.to_string() })),
        Err(e) => Ok(orchestrator_error_response(e)),
    }
}

#[get("/health")]
pub async fn health(state: web::Data<FacadeState>) -> ActixResult<HttpResponse> {
    if state.link.is_live() {
        Ok(HttpResponse::Ok().json(common::HealthResponse { status: "ok".to_string() }))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(common::HealthResponse {
            status: "disconnected".to_string(),
        }))
    }
}

fn orchestrator_error_response(e: OrchestratorError) -> HttpResponse {
    match e {
        OrchestratorError::UnknownReceipt | OrchestratorError::FileNotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse { error: e.to_string() })
        }
        OrchestratorError::Rejected(_) | OrchestratorError::BuildFailed(_) => {
            HttpResponse::BadRequest().json(ErrorResponse { error: e.to_string() })
        }
        OrchestratorError::ServerUnresponsive
        | OrchestratorError::ServerShutdown
        | OrchestratorError::UnexpectedReply
        | OrchestratorError::CorruptedFile
        | OrchestratorError::Store(_) => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse { error: e.to_string() })
        }
    }
}
