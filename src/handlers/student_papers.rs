//! Student-token-gated exam-paper bookkeeping: saved papers and the
//! append-only download history.

use axum::extract::Path;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database;
use crate::database::students::StudentStore;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentStudent};

/// POST /api/student/auth/save-paper/:paper_id
///
/// Idempotent: saving an already-saved paper reports success.
pub async fn save_paper(
    Extension(CurrentStudent(student)): Extension<CurrentStudent>,
    Path(paper_id): Path<String>,
) -> ApiResult<Value> {
    let paper_id = parse_paper_id(&paper_id)?;

    let pool = database::pool().await?;
    let newly_saved = StudentStore::new(pool).save_paper(student.id, paper_id).await?;

    let message = if newly_saved {
        "Paper saved successfully"
    } else {
        "Paper already saved"
    };

    Ok(ApiResponse::success(json!({ "message": message })))
}

/// GET /api/student/auth/saved-papers
pub async fn saved_papers(
    Extension(CurrentStudent(student)): Extension<CurrentStudent>,
) -> ApiResult<Value> {
    let pool = database::pool().await?;
    let papers = StudentStore::new(pool).saved_papers(student.id).await?;

    Ok(ApiResponse::success(json!({ "papers": papers })))
}

/// POST /api/student/auth/downloads/:paper_id
///
/// Appends to the download history log.
pub async fn record_download(
    Extension(CurrentStudent(student)): Extension<CurrentStudent>,
    Path(paper_id): Path<String>,
) -> ApiResult<Value> {
    let paper_id = parse_paper_id(&paper_id)?;

    let pool = database::pool().await?;
    StudentStore::new(pool).record_download(student.id, paper_id).await?;

    Ok(ApiResponse::success(json!({ "message": "Download recorded" })))
}

/// GET /api/student/auth/downloads
pub async fn download_history(
    Extension(CurrentStudent(student)): Extension<CurrentStudent>,
) -> ApiResult<Value> {
    let pool = database::pool().await?;
    let history = StudentStore::new(pool).download_history(student.id).await?;

    Ok(ApiResponse::success(json!({ "downloads": history })))
}

fn parse_paper_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid paper ID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_id_must_be_uuid() {
        assert!(parse_paper_id("not-a-uuid").is_err());
        assert!(parse_paper_id("6b7f8f64-9c1d-4a2b-8f3e-2a1b0c9d8e7f").is_ok());
    }
}
