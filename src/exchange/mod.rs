//! Exchanges are the main interface presented to clients. They support the set of operations that
//! are used to query and mutate a market. However, the majority of the computation is passed to
//! the catalog and the ledger and the logic contained within the Exchange itself primarily
//! relates to binding the two together behind a single handle that servers can share.
pub mod gbce_v1;
