//! # What is GBCE?
//!
//! GBCE provides trading analytics for the Global Beverage Corporation Exchange against a fully
//! in-memory market. The standard mechanism for running the market is the JSON server but users
//! can also import a lib. The lib is intended to be used primarily for testing and creating
//! examples within Rust.
//!
//! # Implementation
//!
//! The market implementation is composed of:
//! - A catalog, [StockCatalog](crate::exchange::gbce_v1::StockCatalog), holding the static set of
//!   tradable instruments and their dividend parameters.
//! - A ledger, [TradeLedger](crate::exchange::gbce_v1::TradeLedger), an append-only trade log that
//!   computes the volume-weighted price and the all-share index on demand from its current
//!   contents.
//! - An exchange facade, [GbceV1](crate::exchange::gbce_v1::GbceV1), binding one catalog to one
//!   ledger. This ends up being a fairly thin wrapper as all of the actual computation lives in
//!   the catalog and the ledger.
//! - The server implementation returning JSON responses over the exchange impl.
//! - The client implementation which provides a Rust API for the server, as much for documenting
//!   how clients can call the server.
//!
//! The exchange contains no native synchronization; the server wraps it in a RwLock so aggregate
//! queries can run concurrently while trade submissions take the lock exclusively.
//!
//! ``
//! cargo run --bin gbce_server_v1 [ipv4_address] [port]
//! ``
pub mod exchange;
pub mod http;
