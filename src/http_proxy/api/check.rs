use crate::app_context::AppContext;
use crate::decision::Reason;
use crate::helpers::parse_source_ip;
use crate::http_proxy::utilities::error_json::ErrorJson;
use crate::policy::CountryPolicy;
use actix_web::web::Data;
use actix_web::web::Json;
use actix_web::HttpResponse;
use actix_web::Responder;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CheckPayload {
    peer: String,
    ip: String,
    /// Overrides the policy configured for the peer.
    allowed_countries: Option<String>,
}

#[derive(Serialize)]
struct CheckResponse {
    allowed: bool,
    sense: i32,
    reason: Reason,
}

pub async fn check(context: Data<AppContext>, body: Json<CheckPayload>) -> impl Responder {
    let ip = match parse_source_ip(&body.ip) {
        Ok(ip) => ip,
        Err(err) => return HttpResponse::BadRequest().json(ErrorJson::from(err)),
    };

    // an ad-hoc override is parsed for this request only and never enters the policy cache
    let verdict = match &body.allowed_countries {
        Some(allowed_countries) => {
            let policy = CountryPolicy::parse(allowed_countries);
            context.geo_acl.evaluate_policy(ip, &policy, &body.peer).await
        }
        None => match context.peers.allowed_countries(&body.peer).await {
            Some(allowed_countries) => {
                context
                    .geo_acl
                    .evaluate(ip, &allowed_countries, &body.peer)
                    .await
            }
            None => {
                return HttpResponse::NotFound()
                    .json(ErrorJson::from(format!("Unknown peer '{}'", body.peer)));
            }
        },
    };

    match verdict {
        Ok(verdict) => HttpResponse::Ok().json(CheckResponse {
            allowed: verdict.allowed,
            sense: verdict.sense().into(),
            reason: verdict.reason,
        }),
        Err(err) => HttpResponse::BadRequest().json(ErrorJson::from(err)),
    }
}
