use std::collections::HashMap;

use derive_more::{Display, Error};
use log::{error, info};
use rand::thread_rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockType {
    Common,
    Preferred,
}

/// A tradable instrument and its dividend parameters. All monetary fields are integer minor
/// currency units (pennies). `fixed_dividend` is a fraction in [0, 1] and is only meaningful for
/// preferred stock.
///
/// Stocks are immutable once constructed; a catalog entry is replaced wholesale, never edited.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Stock {
    pub symbol: String,
    #[serde(rename = "type")]
    pub stock_type: StockType,
    pub last_dividend: u64,
    pub fixed_dividend: f64,
    pub par_value: u64,
}

impl Stock {
    pub fn common(symbol: impl Into<String>, last_dividend: u64, par_value: u64) -> Self {
        Self {
            symbol: symbol.into(),
            stock_type: StockType::Common,
            last_dividend,
            fixed_dividend: 0.0,
            par_value,
        }
    }

    pub fn preferred(
        symbol: impl Into<String>,
        last_dividend: u64,
        fixed_dividend: f64,
        par_value: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            stock_type: StockType::Preferred,
            last_dividend,
            fixed_dividend,
            par_value,
        }
    }

    /// Dividend yield at the given price in pennies. A non-positive price is a defined zero-result
    /// edge case rather than an error.
    pub fn dividend_yield(&self, price: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        match self.stock_type {
            StockType::Common => self.last_dividend as f64 / price,
            StockType::Preferred => (self.fixed_dividend * self.par_value as f64) / price,
        }
    }

    /// P/E ratio at the given price in pennies. Zero when the price is non-positive or the stock
    /// pays no dividend, so the ratio is never computed against a zero divisor.
    pub fn pe_ratio(&self, price: f64) -> f64 {
        if price <= 0.0 || self.last_dividend == 0 {
            return 0.0;
        }
        price / self.last_dividend as f64
    }
}

/// Static set of tradable instruments keyed by symbol.
#[derive(Clone, Debug, Default)]
pub struct StockCatalog {
    inner: HashMap<String, Stock>,
}

impl StockCatalog {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn add(&mut self, stock: Stock) {
        self.inner.insert(stock.symbol.clone(), stock);
    }

    pub fn get(&self, symbol: &str) -> Option<&Stock> {
        self.inner.get(symbol)
    }

    pub fn list(&self) -> Vec<Stock> {
        self.inner.values().cloned().collect()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Trade {
    pub symbol: String,
    pub quantity: u64,
    pub price: u64,
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime,
    pub typ: TradeType,
}

#[derive(Debug, Display, Error)]
pub enum IndexError {
    #[display("all-share index computation left the floating-point range")]
    NonFinite,
}

/// Append-only record of executed trades. Aggregates are recomputed from the full log on every
/// call rather than maintained as running totals, so the volume-weighted price changes as
/// wall-clock time advances past the window boundary even when no trade is recorded.
#[derive(Clone, Debug, Default)]
pub struct TradeLedger {
    inner: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Appends a trade stamped with the current UTC time. The ledger does not check the symbol
    /// against any catalog, that is the caller's responsibility. A non-positive quantity is
    /// floored to one share rather than rejected.
    pub fn record(&mut self, symbol: impl Into<String>, quantity: u64, price: u64, typ: TradeType) {
        let symbol = symbol.into();
        //Cannot trade zero stocks
        let quantity = quantity.max(1);
        info!(
            "LEDGER: Traded for {}: {} shares at {}, type: {:?}",
            symbol, quantity, price, typ
        );
        self.inner.push(Trade {
            symbol,
            quantity,
            price,
            timestamp: OffsetDateTime::now_utc(),
            typ,
        });
    }

    pub fn list(&self) -> &[Trade] {
        &self.inner
    }

    /// Quantity-weighted average price over trades for `symbol` within the last fifteen minutes,
    /// boundary inclusive. Zero when no trade matches.
    pub fn volume_weighted_price(&self, symbol: &str) -> f64 {
        let now = OffsetDateTime::now_utc();
        let window = Duration::minutes(15);

        let mut total_quantity = 0u64;
        let mut total_value = 0.0;
        for trade in self
            .inner
            .iter()
            .filter(|t| t.symbol == symbol && (now - t.timestamp) <= window)
        {
            total_quantity += trade.quantity;
            total_value += trade.quantity as f64 * trade.price as f64;
        }

        if total_quantity == 0 {
            return 0.0;
        }
        total_value / total_quantity as f64
    }

    /// Geometric mean of every trade price in the ledger, market-wide with no time window. Goes
    /// through the arithmetic mean of the lns to provide overflow resistance when many prices are
    /// multiplied. Zero when the ledger is empty.
    ///
    /// A zero price in the log has no defined ln; it surfaces here as a non-finite intermediate
    /// and propagates as [IndexError] rather than being misreported as an empty-ledger zero.
    pub fn all_share_index(&self) -> Result<f64, IndexError> {
        if self.inner.is_empty() {
            return Ok(0.0);
        }

        let log_sum: f64 = self.inner.iter().map(|t| (t.price as f64).ln()).sum();
        let index = (log_sum / self.inner.len() as f64).exp();
        if !log_sum.is_finite() || !index.is_finite() {
            error!(
                "LEDGER: All-share index over {} trades produced non-finite value (log sum {})",
                self.inner.len(),
                log_sum
            );
            return Err(IndexError::NonFinite);
        }
        Ok(index)
    }
}

/// One catalog bound to one ledger. Servers share a single instance for the lifetime of the
/// process; tests build fresh instances for isolation.
#[derive(Clone, Debug)]
pub struct GbceV1 {
    catalog: StockCatalog,
    ledger: TradeLedger,
}

impl GbceV1 {
    pub fn new(catalog: StockCatalog) -> Self {
        Self {
            catalog,
            ledger: TradeLedger::new(),
        }
    }

    /// The GBCE sample catalog the server binary boots with.
    pub fn gbce() -> Self {
        let mut catalog = StockCatalog::new();
        catalog.add(Stock::common("TEA", 0, 100));
        catalog.add(Stock::common("POP", 8, 100));
        catalog.add(Stock::common("ALE", 23, 60));
        catalog.add(Stock::preferred("GIN", 8, 0.02, 100));
        catalog.add(Stock::common("JOE", 13, 250));
        Self::new(catalog)
    }

    pub fn get_stock(&self, symbol: &str) -> Option<&Stock> {
        self.catalog.get(symbol)
    }

    pub fn list_stocks(&self) -> Vec<Stock> {
        self.catalog.list()
    }

    pub fn record(&mut self, symbol: impl Into<String>, quantity: u64, price: u64, typ: TradeType) {
        self.ledger.record(symbol, quantity, price, typ);
    }

    pub fn trade_log(&self) -> &[Trade] {
        self.ledger.list()
    }

    pub fn volume_weighted_price(&self, symbol: &str) -> f64 {
        self.ledger.volume_weighted_price(symbol)
    }

    pub fn all_share_index(&self) -> Result<f64, IndexError> {
        self.ledger.all_share_index()
    }
}

/// Generates a randomly traded [GbceV1] for use in tests that don't depend on prices.
pub fn random_gbce_generator(length: i64) -> GbceV1 {
    let price_dist = Uniform::new(50.0, 150.0);
    let quantity_dist = Uniform::new(1.0, 1000.0);
    let mut rng = thread_rng();

    let mut market = GbceV1::gbce();
    let symbols = ["TEA", "POP", "ALE", "GIN", "JOE"];

    for pos in 0..length {
        let typ = if pos % 2 == 0 {
            TradeType::Buy
        } else {
            TradeType::Sell
        };
        market.record(
            symbols[pos as usize % symbols.len()],
            quantity_dist.sample(&mut rng) as u64,
            price_dist.sample(&mut rng) as u64,
            typ,
        );
    }
    market
}
