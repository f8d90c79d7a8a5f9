//! End-to-end account summary scenarios.
//!
//! Each test builds a full snapshot, runs the margin manager, and checks the
//! exact figures a caller would see.

use margin_core::*;

fn fp(literal: &str) -> FixedPoint {
    literal.parse().unwrap()
}

fn btc_weights() -> ProductWeights {
    ProductWeights {
        long_initial: fp("0.9"),
        long_maintenance: fp("0.95"),
        short_initial: fp("1.1"),
        short_maintenance: fp("1.05"),
    }
}

fn quote_deposit(amount: &str) -> Balance {
    Balance::spot(ProductId(0), fp(amount), fp("1"), ProductWeights::quote())
}

fn snapshot(balances: Vec<Balance>, isolated_positions: Vec<IsolatedPosition>) -> SubaccountSnapshot {
    SubaccountSnapshot {
        subaccount: "0xtest_default".to_string(),
        taken_at: Timestamp::from_millis(1_700_000_000_000),
        balances,
        isolated_positions,
    }
}

#[test]
fn spot_only_account_is_unlevered() {
    let summary = MarginManager::new(snapshot(
        vec![
            quote_deposit("100000"),
            Balance::spot(ProductId(3), fp("20"), fp("3000"), btc_weights()),
        ],
        vec![],
    ))
    .calculate_account_summary();

    assert_eq!(summary.unweighted_health, fp("160000"));
    // the ETH deposit is haircut to 0.9 in the initial regime
    assert_eq!(summary.initial_health, fp("154000"));
    assert_eq!(summary.margin_usage_fraction, FixedPoint::ZERO);
    assert_eq!(summary.maint_margin_usage_fraction, FixedPoint::ZERO);
    assert_eq!(summary.account_leverage, FixedPoint::ZERO);
    assert_eq!(summary.funds_available, fp("154000"));
    assert_eq!(summary.total_spot_deposits, fp("160000"));
    assert_eq!(summary.total_spot_borrows, FixedPoint::ZERO);
    assert!(summary.cross_positions.is_empty());
}

#[test]
fn leveraged_long_cross_account() {
    // 10 BTC long entered at $50,000 with no price movement: the quote leg
    // owes exactly the entry notional
    let summary = MarginManager::new(snapshot(
        vec![
            quote_deposit("100000"),
            Balance::perp(ProductId(2), fp("10"), fp("50000"), btc_weights(), fp("-500000")),
        ],
        vec![],
    ))
    .calculate_account_summary();

    // unweighted: 100000 + (500000 - 500000)
    assert_eq!(summary.unweighted_health, fp("100000"));
    // initial: 100000 + (450000 - 500000)
    assert_eq!(summary.initial_health, fp("50000"));
    assert_eq!(summary.maintenance_health, fp("75000"));
    assert_eq!(summary.margin_usage_fraction, fp("0.5"));
    assert_eq!(summary.maint_margin_usage_fraction, fp("0.25"));
    // 500000 notional over 100000 equity
    assert_eq!(summary.account_leverage, fp("5"));

    let position = &summary.cross_positions[0];
    assert_eq!(position.notional_value, fp("500000"));
    assert_eq!(position.margin_used, fp("50000"));
    assert_eq!(position.unsettled, FixedPoint::ZERO);
    assert_eq!(position.est_pnl, EstPnl::Unknown);
}

#[test]
fn short_cross_account_uses_short_weights() {
    let summary = MarginManager::new(snapshot(
        vec![
            quote_deposit("100000"),
            Balance::perp(ProductId(2), fp("-10"), fp("50000"), btc_weights(), fp("500000")),
        ],
        vec![],
    ))
    .calculate_account_summary();

    // initial: 100000 + (-550000 + 500000)
    assert_eq!(summary.initial_health, fp("50000"));
    assert_eq!(summary.unweighted_health, fp("100000"));

    let position = &summary.cross_positions[0];
    // the reported per-position health carries the 1.1 short haircut
    assert_eq!(position.initial_health, fp("-550000"));
    assert_eq!(position.maintenance_health, fp("-525000"));
    assert_eq!(position.notional_value, fp("500000"));
}

#[test]
fn quote_only_balances_leave_leverage_at_zero() {
    let without = MarginManager::new(snapshot(vec![quote_deposit("50000")], vec![]))
        .calculate_account_summary();
    let with_more = MarginManager::new(snapshot(
        vec![quote_deposit("50000"), quote_deposit("25000")],
        vec![],
    ))
    .calculate_account_summary();

    assert_eq!(without.account_leverage, FixedPoint::ZERO);
    assert_eq!(with_more.account_leverage, FixedPoint::ZERO);
}

#[test]
fn leverage_numerator_never_sees_the_quote_asset() {
    let perp = Balance::perp(ProductId(2), fp("2"), fp("50000"), btc_weights(), fp("-100000"));
    let summary = MarginManager::new(snapshot(vec![quote_deposit("50000"), perp], vec![]))
        .calculate_account_summary();

    // numerator is the perp notional alone; the 50k quote deposit only
    // appears in the denominator
    assert_eq!(
        summary.account_leverage,
        fp("100000") / summary.unweighted_health
    );
}

#[test]
fn indexer_events_feed_est_pnl_without_touching_health() {
    let balances = vec![
        quote_deposit("100000"),
        Balance::perp(ProductId(2), fp("10"), fp("50000"), btc_weights(), fp("-500000")),
    ];
    let events = vec![IndexerSnapshotEvent {
        product_id: ProductId(2),
        isolated: false,
        net_entry_unrealized: fp("495000"),
    }];

    let plain = MarginManager::new(snapshot(balances.clone(), vec![])).calculate_account_summary();
    let with_events = MarginManager::new(snapshot(balances, vec![]))
        .with_indexer_events(events)
        .calculate_account_summary();

    assert_eq!(plain.cross_positions[0].est_pnl, EstPnl::Unknown);
    assert_eq!(
        with_events.cross_positions[0].est_pnl,
        EstPnl::Known(fp("5000"))
    );

    // everything that is not est_pnl is identical
    assert_eq!(plain.initial_health, with_events.initial_health);
    assert_eq!(plain.maintenance_health, with_events.maintenance_health);
    assert_eq!(plain.unweighted_health, with_events.unweighted_health);
    assert_eq!(plain.margin_usage_fraction, with_events.margin_usage_fraction);
    assert_eq!(plain.account_leverage, with_events.account_leverage);
    assert_eq!(plain.portfolio_value, with_events.portfolio_value);
}

#[test]
fn isolated_position_full_metrics() {
    let summary = MarginManager::new(snapshot(
        vec![quote_deposit("25000")],
        vec![IsolatedPosition {
            product_id: ProductId(2),
            position_size: fp("0.5"),
            oracle_price: fp("50000"),
            weights: btc_weights(),
            quote_amount: fp("5000"),
            unsettled_pnl: fp("750"),
        }],
    ))
    .calculate_account_summary();

    let position = &summary.isolated_positions[0];
    assert_eq!(position.notional_value, fp("25000"));
    assert_eq!(position.net_margin, fp("5750"));
    // 25000 / 5750
    assert_eq!(
        position.leverage,
        IsolatedLeverage::Defined(fp("25000") / fp("5750"))
    );
    // 5000 + 0.5 x 50000 x 0.9 + (750 - 25000)
    assert_eq!(position.initial_health, fp("3250"));
    assert_eq!(position.maintenance_health, fp("4500"));

    // cross pool is untouched by the isolated leg; portfolio adds net margin
    assert_eq!(summary.unweighted_health, fp("25000"));
    assert_eq!(summary.portfolio_value, fp("30750"));
}

#[test]
fn zero_net_margin_isolated_position_has_undefined_leverage() {
    let summary = MarginManager::new(snapshot(
        vec![quote_deposit("1000")],
        vec![IsolatedPosition {
            product_id: ProductId(2),
            position_size: fp("1"),
            oracle_price: fp("50000"),
            weights: btc_weights(),
            quote_amount: fp("2000"),
            unsettled_pnl: fp("-2000"),
        }],
    ))
    .calculate_account_summary();

    let position = &summary.isolated_positions[0];
    assert_eq!(position.net_margin, FixedPoint::ZERO);
    assert_eq!(position.leverage, IsolatedLeverage::Undefined);
    assert!(!position.leverage.is_defined());

    // the report spells it out rather than printing infinity
    let report = render_account_summary(&summary);
    assert!(report.contains("N/A (zero net margin)"));
}

#[test]
fn liquidatable_account_detected() {
    let balances = vec![
        quote_deposit("1000"),
        Balance::spot(ProductId(3), fp("-1"), fp("2000"), btc_weights()),
    ];
    let aggregate = aggregate_health(&balances);

    // 1000 - 2000 x 1.05 < 0
    assert!(aggregate.is_liquidatable());

    let summary = MarginManager::new(snapshot(balances, vec![])).calculate_account_summary();
    assert!(summary.maintenance_health.is_negative());
    assert_eq!(summary.funds_until_liquidation, FixedPoint::ZERO);
}

#[test]
fn repeat_invocations_are_bit_identical() {
    let manager = MarginManager::new(snapshot(
        vec![
            quote_deposit("80000"),
            Balance::spot(ProductId(3), fp("-5"), fp("3000"), btc_weights()),
            Balance::perp(ProductId(2), fp("1.5"), fp("50000"), btc_weights(), fp("-72000")),
        ],
        vec![IsolatedPosition {
            product_id: ProductId(4),
            position_size: fp("-2"),
            oracle_price: fp("3000"),
            weights: btc_weights(),
            quote_amount: fp("1500"),
            unsettled_pnl: fp("250"),
        }],
    ));

    let first = manager.calculate_account_summary();
    let second = manager.calculate_account_summary();
    assert_eq!(first, second);

    // and the serialized forms match byte for byte
    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn summary_serde_round_trip() {
    let summary = MarginManager::new(snapshot(
        vec![
            quote_deposit("80000"),
            Balance::perp(ProductId(2), fp("1.5"), fp("50000"), btc_weights(), fp("-72000")),
        ],
        vec![],
    ))
    .calculate_account_summary();

    let json = serde_json::to_string(&summary).unwrap();
    let restored: AccountSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(summary, restored);
}

#[test]
fn many_product_account_stays_consistent() {
    let mut balances = vec![quote_deposit("10000000")];
    let mut expected_unweighted = fp("10000000");

    for i in 1..=50u32 {
        let price = FixedPoint::from_int(100 + i as i64);
        if i % 2 == 0 {
            let amount = FixedPoint::from_int(i as i64);
            balances.push(Balance::spot(ProductId(i), amount, price, btc_weights()));
            expected_unweighted += amount * price;
        } else {
            let amount = FixedPoint::from_int(-(i as i64));
            let v_quote = FixedPoint::from_int(50);
            balances.push(Balance::perp(ProductId(i), amount, price, btc_weights(), v_quote));
            expected_unweighted += amount * price + v_quote;
        }
    }

    let summary = MarginManager::new(snapshot(balances, vec![])).calculate_account_summary();
    assert_eq!(summary.unweighted_health, expected_unweighted);
    assert_eq!(summary.cross_positions.len(), 25);
    assert!(summary.margin_usage_fraction <= FixedPoint::ONE);
    assert!(!summary.margin_usage_fraction.is_negative());
    assert!(summary.initial_health < summary.unweighted_health);
}

#[test]
fn twap_order_lifecycle() {
    // split 120 into 12 IOC children with 0.5% slippage
    let total = fp("120");
    let times = 12u32;

    validate_twap_split(total, times, None).unwrap();
    let amounts = equal_amounts(total, times).unwrap();
    assert_eq!(amounts.len(), 12);
    assert_eq!(amounts.iter().sum::<FixedPoint>(), total);

    let appendix = build_twap_appendix(times, fp("0.005"), false, false).unwrap();
    assert_eq!(order_execution_type(appendix), OrderType::Ioc);
    assert!(order_is_trigger_order(appendix));
    let twap = order_twap_data(appendix).unwrap();
    assert_eq!(twap.times, times);
    assert_eq!(twap.slippage_frac, fp("0.005"));

    assert_eq!(estimate_completion_time(times, 300).unwrap(), 3300);
}
