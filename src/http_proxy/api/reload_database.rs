use std::path::Path;

use crate::app_context::AppContext;
use crate::http_proxy::utilities::authorization;
use crate::http_proxy::utilities::error_json::ErrorJson;
use actix_web::web;
use actix_web::web::Data;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use serde_json::json;

pub async fn reload_database(request: HttpRequest, context: Data<AppContext>) -> impl Responder {
    let Some(token) = authorization::extract_authorization_token(&request) else {
        return HttpResponse::Unauthorized().json(ErrorJson::from("Missing Authorization header"));
    };
    if !authorization::is_admin_token(&context.config, &token) {
        log::warn!("Rejected database reload with an invalid admin token");
        return HttpResponse::Unauthorized().json(ErrorJson::from("Invalid admin token"));
    }

    let Some(lookup) = context.geo_acl.resolver().provider().as_mmdb() else {
        return HttpResponse::Conflict()
            .json(ErrorJson::from("Lookup backend does not use a geolocation database"));
    };
    let Some(path) = context.config.mmdb_path.clone() else {
        return HttpResponse::Conflict()
            .json(ErrorJson::from("No geolocation database path configured"));
    };

    let db = lookup.database().clone();
    match web::block(move || db.reload_from_file(Path::new(&path))).await {
        Ok(Ok(_)) => {
            let snapshot = lookup.database().snapshot();
            HttpResponse::Ok().json(json!({
                "generation": snapshot.generation(),
                "source": snapshot.source(),
                "loaded_at": snapshot.loaded_at(),
            }))
        }
        Ok(Err(err)) => HttpResponse::InternalServerError().json(ErrorJson::from(err)),
        Err(err) => HttpResponse::InternalServerError().json(ErrorJson::from(err.to_string())),
    }
}
