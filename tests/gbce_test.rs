use gbce::exchange::gbce_v1::{random_gbce_generator, GbceV1, TradeType};

#[test]
fn test_that_gbce_works() {
    let mut market = GbceV1::gbce();

    market.record("TEA", 50, 120, TradeType::Buy);
    market.record("POP", 10, 80, TradeType::Sell);

    assert_eq!(market.trade_log().len(), 2);
    assert_eq!(market.volume_weighted_price("TEA"), 120.0);
    assert!(market.all_share_index().unwrap() > 0.0);
}

#[test]
fn test_that_random_market_has_computable_aggregates() {
    let market = random_gbce_generator(1000);

    assert_eq!(market.trade_log().len(), 1000);
    assert!(market.volume_weighted_price("TEA") > 0.0);
    assert!(market.all_share_index().unwrap() > 0.0);
}
