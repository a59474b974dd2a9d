use actix_web::web;

pub mod gallery_service;

/// Registers every gallery route on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(gallery_service::multipart_config())
        .service(gallery_service::index)
        .service(gallery_service::favicon)
        .service(gallery_service::health)
        .service(gallery_service::view)
        .service(gallery_service::upload_page)
        .service(gallery_service::upload)
        .service(gallery_service::delete_page)
        .service(gallery_service::delete);
}
