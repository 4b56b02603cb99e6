use std::env;
use std::sync::RwLock;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use gbce::exchange::gbce_v1::GbceV1;
use gbce::http::gbce_v1::server::*;
use gbce::http::gbce_v1::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let address: String = args
        .get(1)
        .context("usage: gbce_server_v1 <address> <port>")?
        .clone();
    let port: u16 = args
        .get(2)
        .context("usage: gbce_server_v1 <address> <port>")?
        .parse()?;

    let app_state = AppState::create(GbceV1::gbce());

    let gbce_state = web::Data::new(RwLock::new(app_state));

    HttpServer::new(move || {
        App::new()
            .app_data(gbce_state.clone())
            .service(list_stocks)
            .service(dividend_yield)
            .service(pe_ratio)
            .service(record_trade)
            .service(volume_weighted_price)
            .service(gbce_index)
    })
    .bind((address, port))?
    .run()
    .await?;

    Ok(())
}
