use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path, Query};
use chrono::Utc;
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::context::UserInfo;
use crate::core::application::{application_detail, document_file_name, document_folder, list_applications, prepare_submission, review_application, submit_application, DocumentKind};
use crate::core::models::application::{Application, ApplicationCreate, ApplicationDetail, ApplicationStatus, ReviewDecision};
use crate::core::ports::storage::DocumentStore;
use crate::database::sqlx::PgStore;
use crate::error::Error;
use crate::request::Pagination;
use crate::response::{CreateResponse, List, ProcedureResponse};
use crate::storer::sign::UrlSigner;

/// Multipart submission: text fields form the payload, `resume`/`transcript`
/// file fields become stored documents. Validation runs before any byte is
/// written, and the row insert happens only after uploads succeed, so a
/// failed submission leaves no partial application behind.
pub async fn create<D: DocumentStore>(user_info: UserInfo, mut payload: Multipart, db: Data<PgPool>, documents: Data<D>) -> Result<Json<CreateResponse>, Error> {
    let mut fields: Map<String, Value> = Map::new();
    let mut resume: Option<(String, Vec<u8>)> = None;
    let mut transcript: Option<(String, Vec<u8>)> = None;
    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().to_owned();
        let file_name = field.content_disposition().get_filename().map(str::to_owned);
        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            content.extend_from_slice(&chunk);
        }
        match name.as_str() {
            "resume" => resume = Some((file_name.unwrap_or_else(|| "resume.pdf".into()), content)),
            "transcript" => transcript = Some((file_name.unwrap_or_else(|| "transcript.pdf".into()), content)),
            _ => {
                let value = String::from_utf8(content).map_err(|_| Error::Validation(format!("field {} is not valid utf-8", name)))?;
                fields.insert(name, Value::String(value));
            }
        }
    }
    for key in ["class_id", "project_id"] {
        if let Some(Value::String(raw)) = fields.get(key).cloned() {
            if raw.trim().is_empty() {
                fields.remove(key);
            } else {
                let n: i32 = raw.trim().parse().map_err(|_| Error::Validation(format!("field {} must be a number", key)))?;
                fields.insert(key.to_owned(), Value::from(n));
            }
        }
    }
    let create: ApplicationCreate = serde_json::from_value(Value::Object(fields))?;

    let mut conn = PgStore::new(db.acquire().await?);
    let responses = prepare_submission(&mut conn, &create).await?;
    drop(conn);

    let folder = document_folder(&create.full_name, user_info.id);
    let resume_path = match &resume {
        Some((original, bytes)) => Some(documents.put(&folder, &document_file_name(&create.full_name, DocumentKind::Resume, original), bytes)?),
        None => None,
    };
    let transcript_path = match &transcript {
        Some((original, bytes)) => Some(documents.put(&folder, &document_file_name(&create.full_name, DocumentKind::Transcript, original), bytes)?),
        None => None,
    };

    let store = PgStore::new(db.begin().await?);
    let id = submit_application(store, user_info.id, &create, responses, resume_path, transcript_path).await?;
    Ok(Json(CreateResponse { id }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: i64,
    pub size: i64,
    pub status: Option<ApplicationStatus>,
}

pub async fn list(user_info: UserInfo, Query(params): Query<ListParams>, db: Data<PgPool>) -> Result<Json<List<Application>>, Error> {
    Pagination::check(params.page, params.size)?;
    let mut store = PgStore::new(db.acquire().await?);
    let (list, total) = list_applications(&mut store, user_info.id, params.status, params.page, params.size).await?;
    Ok(Json(List::new(list, total)))
}

pub async fn detail(user_info: UserInfo, application_id: Path<(i32,)>, db: Data<PgPool>, signer: Data<UrlSigner>) -> Result<Json<ApplicationDetail>, Error> {
    let application_id = application_id.into_inner().0;
    let mut store = PgStore::new(db.acquire().await?);
    let mut detail = application_detail(&mut store, user_info.id, application_id).await?;
    let now = Utc::now();
    detail.resume_url = detail.application.resume_path.as_deref().map(|p| signer.mint(p, now));
    detail.transcript_url = detail.application.transcript_path.as_deref().map(|p| signer.mint(p, now));
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub status: ReviewDecision,
}

pub async fn review(user_info: UserInfo, application_id: Path<(i32,)>, Json(req): Json<ReviewRequest>, db: Data<PgPool>) -> Result<Json<ProcedureResponse>, Error> {
    let application_id = application_id.into_inner().0;
    let store = PgStore::new(db.begin().await?);
    let summary = review_application(store, user_info.id, application_id, req.status).await?;
    Ok(Json(ProcedureResponse::ok(summary.message)))
}
