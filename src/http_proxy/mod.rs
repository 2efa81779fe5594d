use crate::app_context::AppContext;
use actix_web::{web, App, HttpServer};
use api::{check, reload_database, update_peer};
use nullnet_liberror::{location, Error, ErrorHandler, Location};

mod api;
mod utilities;

pub async fn run_http_proxy(context: AppContext) -> Result<(), Error> {
    let addr = context.config.http_addr.clone();
    log::info!("HTTP API listening on {addr}");

    let context = web::Data::new(context);

    HttpServer::new(move || App::new().app_data(context.clone()).configure(routes))
        .bind(addr)
        .handle_err(location!())?
        .run()
        .await
        .handle_err(location!())
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/geoacl/api/v1/check", web::post().to(check))
        .route("/geoacl/api/v1/update_peer", web::post().to(update_peer))
        .route(
            "/geoacl/api/v1/reload_database",
            web::post().to(reload_database),
        );
}
