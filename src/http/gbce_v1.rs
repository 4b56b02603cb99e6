use std::sync::RwLock;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::exchange::gbce_v1::{GbceV1, IndexError, Stock, TradeType};

/// Aggregate queries take the read side, `record_trade` takes the write side. The exchange itself
/// carries no synchronization.
pub type GbceState = RwLock<AppState>;

pub struct AppState {
    pub market: GbceV1,
}

impl AppState {
    pub fn create(market: GbceV1) -> Self {
        Self { market }
    }
}

#[derive(Debug, Display, Error)]
pub enum GbceV1Error {
    #[display("Symbol is not listed in the stock catalog")]
    UnknownSymbol,
    #[display("Price must be a valid non-negative integer representing the value in pennies")]
    InvalidPrice,
    #[display("Quantity must be a valid non-negative integer number of shares")]
    InvalidQuantity,
    #[display("Trade type must be either buy or sell")]
    InvalidTradeType,
    #[display("All-share index could not be computed from the current trade log")]
    IndexComputation,
}

impl From<IndexError> for GbceV1Error {
    fn from(_value: IndexError) -> Self {
        GbceV1Error::IndexComputation
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub error: String,
    pub message: String,
}

impl ResponseError for GbceV1Error {
    fn status_code(&self) -> StatusCode {
        match self {
            GbceV1Error::UnknownSymbol => StatusCode::NOT_FOUND,
            GbceV1Error::InvalidPrice
            | GbceV1Error::InvalidQuantity
            | GbceV1Error::InvalidTradeType => StatusCode::BAD_REQUEST,
            GbceV1Error::IndexComputation => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorMessage {
            code: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
            message: self.to_string(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StockListResponse {
    pub stocks: Vec<Stock>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PriceQuery {
    pub price: String,
}

impl PriceQuery {
    /// Prices arrive as query strings so digits are checked before parsing, anything else is a
    /// client error rather than a zero-result edge case.
    pub fn parse_price(&self) -> Result<u64, GbceV1Error> {
        if self.price.is_empty() || !self.price.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GbceV1Error::InvalidPrice);
        }
        self.price.parse().map_err(|_| GbceV1Error::InvalidPrice)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DividendYieldResponse {
    pub dividend_yield: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PeRatioResponse {
    pub pe_ratio: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RecordTradeRequest {
    pub quantity: i64,
    pub price: i64,
    pub trade_type: String,
}

/// Core-ready trade inputs produced by the validator pipeline.
pub struct ValidatedTrade {
    pub quantity: u64,
    pub price: u64,
    pub typ: TradeType,
}

type TradeValidator = fn(&RecordTradeRequest) -> Result<(), GbceV1Error>;

fn price_is_valid(req: &RecordTradeRequest) -> Result<(), GbceV1Error> {
    if req.price < 0 {
        return Err(GbceV1Error::InvalidPrice);
    }
    Ok(())
}

fn quantity_is_valid(req: &RecordTradeRequest) -> Result<(), GbceV1Error> {
    if req.quantity < 0 {
        return Err(GbceV1Error::InvalidQuantity);
    }
    Ok(())
}

fn trade_type_is_valid(req: &RecordTradeRequest) -> Result<(), GbceV1Error> {
    match req.trade_type.as_str() {
        "buy" | "sell" => Ok(()),
        _ => Err(GbceV1Error::InvalidTradeType),
    }
}

//Validators run in declaration order, first failure wins
const RECORD_TRADE_VALIDATORS: &[TradeValidator] =
    &[price_is_valid, quantity_is_valid, trade_type_is_valid];

impl RecordTradeRequest {
    pub fn validated(&self) -> Result<ValidatedTrade, GbceV1Error> {
        for validator in RECORD_TRADE_VALIDATORS {
            validator(self)?;
        }

        let typ = match self.trade_type.as_str() {
            "buy" => TradeType::Buy,
            _ => TradeType::Sell,
        };
        Ok(ValidatedTrade {
            quantity: self.quantity as u64,
            price: self.price as u64,
            typ,
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VolumeWeightedPriceResponse {
    pub volume_weighted_price: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GbceIndexResponse {
    pub gbce_index: f64,
}

pub mod server {
    use actix_web::{get, post, web};

    use super::{
        DividendYieldResponse, GbceIndexResponse, GbceState, GbceV1Error, PeRatioResponse,
        PriceQuery, RecordTradeRequest, StockListResponse, VolumeWeightedPriceResponse,
    };

    #[get("/stocks/list")]
    pub async fn list_stocks(
        app: web::Data<GbceState>,
    ) -> Result<web::Json<StockListResponse>, GbceV1Error> {
        let state = app.read().unwrap();

        Ok(web::Json(StockListResponse {
            stocks: state.market.list_stocks(),
        }))
    }

    #[get("/stocks/{symbol}/dividend_yield")]
    pub async fn dividend_yield(
        app: web::Data<GbceState>,
        path: web::Path<(String,)>,
        query: web::Query<PriceQuery>,
    ) -> Result<web::Json<DividendYieldResponse>, GbceV1Error> {
        let (symbol,) = path.into_inner();
        let price = query.parse_price()?;
        let state = app.read().unwrap();

        if let Some(stock) = state.market.get_stock(&symbol) {
            Ok(web::Json(DividendYieldResponse {
                dividend_yield: stock.dividend_yield(price as f64),
            }))
        } else {
            Err(GbceV1Error::UnknownSymbol)
        }
    }

    #[get("/stocks/{symbol}/pe_ratio")]
    pub async fn pe_ratio(
        app: web::Data<GbceState>,
        path: web::Path<(String,)>,
        query: web::Query<PriceQuery>,
    ) -> Result<web::Json<PeRatioResponse>, GbceV1Error> {
        let (symbol,) = path.into_inner();
        let price = query.parse_price()?;
        let state = app.read().unwrap();

        if let Some(stock) = state.market.get_stock(&symbol) {
            Ok(web::Json(PeRatioResponse {
                pe_ratio: stock.pe_ratio(price as f64),
            }))
        } else {
            Err(GbceV1Error::UnknownSymbol)
        }
    }

    #[post("/stocks/{symbol}/record_trade")]
    pub async fn record_trade(
        app: web::Data<GbceState>,
        path: web::Path<(String,)>,
        record: web::Json<RecordTradeRequest>,
    ) -> Result<web::Json<()>, GbceV1Error> {
        let (symbol,) = path.into_inner();
        let validated = record.validated()?;
        let mut state = app.write().unwrap();

        // The ledger does not check symbols itself, unknown symbols stop here
        if state.market.get_stock(&symbol).is_none() {
            return Err(GbceV1Error::UnknownSymbol);
        }

        state
            .market
            .record(symbol, validated.quantity, validated.price, validated.typ);
        Ok(web::Json(()))
    }

    #[get("/stocks/{symbol}/volume_weighted_price")]
    pub async fn volume_weighted_price(
        app: web::Data<GbceState>,
        path: web::Path<(String,)>,
    ) -> Result<web::Json<VolumeWeightedPriceResponse>, GbceV1Error> {
        let (symbol,) = path.into_inner();
        let state = app.read().unwrap();

        if state.market.get_stock(&symbol).is_none() {
            return Err(GbceV1Error::UnknownSymbol);
        }
        Ok(web::Json(VolumeWeightedPriceResponse {
            volume_weighted_price: state.market.volume_weighted_price(&symbol),
        }))
    }

    #[get("/gbce_index")]
    pub async fn gbce_index(
        app: web::Data<GbceState>,
    ) -> Result<web::Json<GbceIndexResponse>, GbceV1Error> {
        let state = app.read().unwrap();

        Ok(web::Json(GbceIndexResponse {
            gbce_index: state.market.all_share_index()?,
        }))
    }
}

pub mod client {
    use reqwest::Result;

    use super::{
        DividendYieldResponse, GbceIndexResponse, PeRatioResponse, RecordTradeRequest,
        StockListResponse, VolumeWeightedPriceResponse,
    };

    pub struct Client {
        pub path: String,
        pub client: reqwest::Client,
    }

    impl Client {
        pub async fn list_stocks(&self) -> Result<StockListResponse> {
            self.client
                .get(self.path.clone() + "/stocks/list")
                .send()
                .await?
                .json::<StockListResponse>()
                .await
        }

        pub async fn dividend_yield(
            &self,
            symbol: &str,
            price: u64,
        ) -> Result<DividendYieldResponse> {
            self.client
                .get(self.path.clone() + format!("/stocks/{symbol}/dividend_yield").as_str())
                .query(&[("price", price.to_string())])
                .send()
                .await?
                .json::<DividendYieldResponse>()
                .await
        }

        pub async fn pe_ratio(&self, symbol: &str, price: u64) -> Result<PeRatioResponse> {
            self.client
                .get(self.path.clone() + format!("/stocks/{symbol}/pe_ratio").as_str())
                .query(&[("price", price.to_string())])
                .send()
                .await?
                .json::<PeRatioResponse>()
                .await
        }

        pub async fn record_trade(
            &self,
            symbol: &str,
            quantity: i64,
            price: i64,
            trade_type: impl Into<String>,
        ) -> Result<()> {
            let req = RecordTradeRequest {
                quantity,
                price,
                trade_type: trade_type.into(),
            };
            self.client
                .post(self.path.clone() + format!("/stocks/{symbol}/record_trade").as_str())
                .json(&req)
                .send()
                .await?
                .json::<()>()
                .await
        }

        pub async fn volume_weighted_price(
            &self,
            symbol: &str,
        ) -> Result<VolumeWeightedPriceResponse> {
            self.client
                .get(self.path.clone() + format!("/stocks/{symbol}/volume_weighted_price").as_str())
                .send()
                .await?
                .json::<VolumeWeightedPriceResponse>()
                .await
        }

        pub async fn gbce_index(&self) -> Result<GbceIndexResponse> {
            self.client
                .get(self.path.clone() + "/gbce_index")
                .send()
                .await?
                .json::<GbceIndexResponse>()
                .await
        }

        pub fn new(path: String) -> Self {
            Self {
                path,
                client: reqwest::Client::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;

    use actix_web::{test, web, App};

    use crate::exchange::gbce_v1::GbceV1;

    use super::server::*;
    use super::{
        AppState, DividendYieldResponse, GbceIndexResponse, RecordTradeRequest, StockListResponse,
        VolumeWeightedPriceResponse,
    };

    #[actix_web::test]
    async fn test_single_trade_loop() {
        let gbce_state = web::Data::new(RwLock::new(AppState::create(GbceV1::gbce())));

        let app = test::init_service(
            App::new()
                .app_data(gbce_state)
                .service(list_stocks)
                .service(dividend_yield)
                .service(pe_ratio)
                .service(record_trade)
                .service(volume_weighted_price)
                .service(gbce_index),
        )
        .await;

        let req = test::TestRequest::get().uri("/stocks/list").to_request();
        let resp: StockListResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.stocks.len(), 5);

        let req1 = test::TestRequest::get()
            .uri("/stocks/GIN/dividend_yield?price=100")
            .to_request();
        let resp1: DividendYieldResponse = test::call_and_read_body_json(&app, req1).await;
        assert_eq!(resp1.dividend_yield, 0.02);

        let req2 = test::TestRequest::post()
            .set_json(RecordTradeRequest {
                quantity: 8,
                price: 100,
                trade_type: "buy".to_string(),
            })
            .uri("/stocks/TEA/record_trade")
            .to_request();
        test::call_and_read_body(&app, req2).await;

        let req3 = test::TestRequest::post()
            .set_json(RecordTradeRequest {
                quantity: 2,
                price: 50,
                trade_type: "sell".to_string(),
            })
            .uri("/stocks/TEA/record_trade")
            .to_request();
        test::call_and_read_body(&app, req3).await;

        let req4 = test::TestRequest::get()
            .uri("/stocks/TEA/volume_weighted_price")
            .to_request();
        let resp4: VolumeWeightedPriceResponse = test::call_and_read_body_json(&app, req4).await;
        assert_eq!(resp4.volume_weighted_price, 90.0);

        let req5 = test::TestRequest::get().uri("/gbce_index").to_request();
        let resp5: GbceIndexResponse = test::call_and_read_body_json(&app, req5).await;
        assert!(resp5.gbce_index > 0.0);
    }

    #[actix_web::test]
    async fn test_that_unknown_symbol_is_a_not_found_error() {
        let gbce_state = web::Data::new(RwLock::new(AppState::create(GbceV1::gbce())));

        let app = test::init_service(
            App::new()
                .app_data(gbce_state)
                .service(record_trade)
                .service(volume_weighted_price),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/stocks/XYZ/volume_weighted_price")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let req1 = test::TestRequest::post()
            .set_json(RecordTradeRequest {
                quantity: 1,
                price: 100,
                trade_type: "buy".to_string(),
            })
            .uri("/stocks/XYZ/record_trade")
            .to_request();
        let resp1 = test::call_service(&app, req1).await;
        assert_eq!(resp1.status(), 404);
    }

    #[actix_web::test]
    async fn test_that_invalid_inputs_are_bad_requests() {
        let gbce_state = web::Data::new(RwLock::new(AppState::create(GbceV1::gbce())));

        let app = test::init_service(
            App::new()
                .app_data(gbce_state)
                .service(dividend_yield)
                .service(record_trade),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/stocks/POP/dividend_yield?price=ten")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let req1 = test::TestRequest::post()
            .set_json(RecordTradeRequest {
                quantity: 1,
                price: 100,
                trade_type: "hold".to_string(),
            })
            .uri("/stocks/POP/record_trade")
            .to_request();
        let resp1 = test::call_service(&app, req1).await;
        assert_eq!(resp1.status(), 400);

        let req2 = test::TestRequest::post()
            .set_json(RecordTradeRequest {
                quantity: 1,
                price: -100,
                trade_type: "buy".to_string(),
            })
            .uri("/stocks/POP/record_trade")
            .to_request();
        let resp2 = test::call_service(&app, req2).await;
        assert_eq!(resp2.status(), 400);
    }
}
