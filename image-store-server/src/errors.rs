use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;


#[derive(Debug, Error)]
pub enum GalleryErr {
    #[error("Failed to render page")]
    Template(#[from] askama::Error),
}

impl ResponseError for GalleryErr {
    fn error_response(&self) -> HttpResponse {
        match self {
            GalleryErr::Template(_) => HttpResponse::InternalServerError().body(self.to_string()),
        }
    }
}
