pub mod file;
pub mod gemini;

use actix_web::web;

use crate::errors::AppError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(web::resource("/upload").route(web::post().to(file::upload_file)))
    .service(web::resource("/files").route(web::get().to(file::list_files)))
    .service(web::resource("/gemini").route(web::post().to(gemini::generate)));
}
