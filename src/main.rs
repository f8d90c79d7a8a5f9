//! Margin engine demo.
//!
//! Builds sample subaccount snapshots, runs the margin manager over them and
//! renders the account reports, then round-trips a few order appendixes.

use margin_core::*;

fn main() {
    println!("Margin Core Engine Demo");
    println!("Deterministic margin, health and leverage calculation\n");

    scenario_1_spot_only_account();
    scenario_2_cross_margin_account();
    scenario_3_isolated_position();
    scenario_4_order_appendix();

    println!("\nAll scenarios completed.");
}

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

fn eth_weights() -> ProductWeights {
    ProductWeights {
        long_initial: fp("0.85"),
        long_maintenance: fp("0.92"),
        short_initial: fp("1.15"),
        short_maintenance: fp("1.08"),
    }
}

/// A subaccount holding only spot deposits: margin usage stays at zero.
fn scenario_1_spot_only_account() {
    println!("Scenario 1: Spot-Only Account\n");

    let snapshot = SubaccountSnapshot {
        subaccount: "0xdemo_default".to_string(),
        taken_at: Timestamp::now(),
        balances: vec![
            Balance::spot(ProductId(0), fp("100000"), fp("1"), ProductWeights::quote()),
            Balance::spot(ProductId(3), fp("20"), fp("3000"), eth_weights()),
        ],
        isolated_positions: vec![],
    };

    let summary = MarginManager::new(snapshot).calculate_account_summary();
    println!("{}\n", render_account_summary(&summary));
}

/// Cross-margin account: quote deposit, a BTC perp long and an ETH borrow,
/// with indexer events feeding the estimated PnL column.
fn scenario_2_cross_margin_account() {
    println!("Scenario 2: Cross-Margin Account\n");

    let snapshot = SubaccountSnapshot {
        subaccount: "0xdemo_default".to_string(),
        taken_at: Timestamp::now(),
        balances: vec![
            Balance::spot(ProductId(0), fp("80000"), fp("1"), ProductWeights::quote()),
            Balance::spot(ProductId(3), fp("-5"), fp("3000"), eth_weights()),
            Balance::perp(ProductId(2), fp("1.5"), fp("50000"), btc_weights(), fp("-72000")),
        ],
        isolated_positions: vec![],
    };

    let events = vec![IndexerSnapshotEvent {
        product_id: ProductId(2),
        isolated: false,
        net_entry_unrealized: fp("71500"),
    }];

    let manager = MarginManager::new(snapshot).with_indexer_events(events);
    let summary = manager.calculate_account_summary();
    println!("{}\n", render_account_summary(&summary));

    println!(
        "  liquidatable: {}",
        summary.maintenance_health.is_negative()
    );
    println!();
}

/// One isolated BTC position alongside the cross pool.
fn scenario_3_isolated_position() {
    println!("Scenario 3: Isolated Position\n");

    let snapshot = SubaccountSnapshot {
        subaccount: "0xdemo_default".to_string(),
        taken_at: Timestamp::now(),
        balances: vec![Balance::spot(
            ProductId(0),
            fp("25000"),
            fp("1"),
            ProductWeights::quote(),
        )],
        isolated_positions: vec![IsolatedPosition {
            product_id: ProductId(2),
            position_size: fp("0.5"),
            oracle_price: fp("50000"),
            weights: btc_weights(),
            quote_amount: fp("5000"),
            unsettled_pnl: fp("750"),
        }],
    };

    let summary = MarginManager::new(snapshot).calculate_account_summary();
    println!("{}\n", render_account_summary(&summary));
}

/// Appendix codec round trips and a rejected configuration.
fn scenario_4_order_appendix() {
    println!("Scenario 4: Order Appendix\n");

    let isolated_order = AppendixParams {
        order_type: OrderType::PostOnly,
        isolated: true,
        isolated_margin: Some(fp("2500")),
        ..Default::default()
    };
    let appendix = encode(&isolated_order).unwrap();
    println!("  isolated post-only order appendix: {:#034x}", appendix);
    let decoded = decode(appendix);
    println!(
        "  decoded: version={} type={:?} isolated={} margin={}",
        decoded.version,
        decoded.order_type,
        decoded.isolated,
        decoded.isolated_margin.unwrap()
    );

    let twap_appendix = build_twap_appendix(12, fp("0.005"), false, false).unwrap();
    let twap = order_twap_data(twap_appendix).unwrap();
    println!(
        "  twap appendix: {} executions, slippage {}",
        twap.times, twap.slippage_frac
    );

    let conflicting = AppendixParams {
        isolated: true,
        trigger_type: TriggerType::Twap,
        twap: Some(TwapParams {
            times: 4,
            slippage_frac: fp("0.01"),
        }),
        ..Default::default()
    };
    match encode(&conflicting) {
        Err(err) => println!("  rejected as expected: {}", err),
        Ok(_) => println!("  unexpected acceptance"),
    }
}
