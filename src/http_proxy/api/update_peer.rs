use crate::app_context::AppContext;
use crate::http_proxy::utilities::authorization;
use crate::http_proxy::utilities::error_json::ErrorJson;
use crate::policy::CountryPolicy;
use actix_web::web::Data;
use actix_web::web::Json;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct UpdatePeerPayload {
    peer: String,
    allowed_countries: String,
}

pub async fn update_peer(
    request: HttpRequest,
    context: Data<AppContext>,
    body: Json<UpdatePeerPayload>,
) -> impl Responder {
    let Some(token) = authorization::extract_authorization_token(&request) else {
        return HttpResponse::Unauthorized().json(ErrorJson::from("Missing Authorization header"));
    };
    if !authorization::is_admin_token(&context.config, &token) {
        log::warn!("Rejected peer update with an invalid admin token");
        return HttpResponse::Unauthorized().json(ErrorJson::from("Invalid admin token"));
    }

    let peer = body.peer.trim();
    if peer.is_empty() {
        return HttpResponse::BadRequest().json(ErrorJson::from("Missing peer name"));
    }

    let policy = CountryPolicy::parse(&body.allowed_countries);
    log::info!(
        "Updating allowed countries for peer '{peer}': '{}' ({policy})",
        body.allowed_countries
    );

    context.peers.update(peer, &body.allowed_countries).await;

    HttpResponse::Ok().json(json!({
        "mode": policy.mode(),
        "policy": policy.to_string(),
    }))
}
