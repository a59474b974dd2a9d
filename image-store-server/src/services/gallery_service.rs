use actix_multipart::form::bytes::Bytes as FormBytes;
use actix_multipart::form::{MultipartForm, MultipartFormConfig};
use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse, Responder};
use askama::Template;
use blob_storage::extension::ALLOWED_EXTENSIONS;
use blob_storage::BlobService;
use serde::{Deserialize, Serialize};
use crate::errors::GalleryErr;

pub const APP_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const APP_TYPE_JSON: &str = "application/json";

/// Largest accepted upload body.
pub const MAX_CONTENT_LENGTH: usize = 1024 * 1024;

pub struct AppState {
    pub(crate) blobs: BlobService,
    pub(crate) deployment_type: String,
    pub(crate) location: String,
}

impl AppState {
    pub fn new(blobs: BlobService, deployment_type: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            blobs,
            deployment_type: deployment_type.into(),
            location: location.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    deployment_type: &'a str,
    location: &'a str,
    accept: String,
    items: Vec<String>,
}

#[derive(Serialize)]
struct Health<'a> {
    status: &'a str,
    storage: &'a str,
}

#[derive(MultipartForm)]
pub struct UploadForm {
    file: Option<FormBytes>,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    filename: String,
}

pub fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(MAX_CONTENT_LENGTH)
        .memory_limit(MAX_CONTENT_LENGTH)
}

fn redirect_to_index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/"))
        .finish()
}

#[get("/")]
pub async fn index(shared_state: web::Data<AppState>) -> Result<HttpResponse, GalleryErr> {
    let items = shared_state.blobs.list_blobs().await;
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    let page = IndexTemplate {
        deployment_type: &shared_state.deployment_type,
        location: &shared_state.location,
        accept,
        items,
    }
    .render()?;
    Ok(HttpResponse::Ok().content_type(APP_TYPE_HTML).body(page))
}

#[get("/favicon.ico")]
pub async fn favicon() -> impl Responder {
    HttpResponse::Ok().finish()
}

#[get("/health")]
pub async fn health(shared_state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type(APP_TYPE_JSON)
        .json(Health {
            status: "ok",
            storage: &shared_state.deployment_type,
        })
}

#[get("/view/{filename}")]
pub async fn view(
    filename: web::Path<String>,
    shared_state: web::Data<AppState>
) -> impl Responder {
    match shared_state.blobs.view(&filename).await {
        Ok(content) => HttpResponse::Ok()
            .content_type(content.content_type)
            .body(content.data),
        Err(e) => {
            tracing::debug!("view {} redirected: {}", filename, e);
            redirect_to_index()
        }
    }
}

#[get("/upload")]
pub async fn upload_page() -> impl Responder {
    redirect_to_index()
}

#[post("/upload")]
pub async fn upload(
    MultipartForm(form): MultipartForm<UploadForm>,
    shared_state: web::Data<AppState>,
) -> impl Responder {
    let Some(file) = form.file else {
        tracing::error!("No file part");
        return redirect_to_index();
    };
    let filename = file.file_name.unwrap_or_default();
    if filename.is_empty() {
        tracing::info!("No file selected for upload");
        return redirect_to_index();
    }

    match shared_state.blobs.upload(&filename, &file.data).await {
        Ok(name) => tracing::info!("File {} uploaded as {}", filename, name),
        Err(e) => tracing::debug!("upload of {} dropped: {}", filename, e),
    }
    redirect_to_index()
}

#[get("/delete")]
pub async fn delete_page() -> impl Responder {
    redirect_to_index()
}

#[post("/delete")]
pub async fn delete(
    form: web::Form<DeleteForm>,
    shared_state: web::Data<AppState>,
) -> impl Responder {
    if let Err(e) = shared_state.blobs.delete(&form.filename).await {
        tracing::debug!("delete of {} dropped: {}", form.filename, e);
    }
    redirect_to_index()
}
