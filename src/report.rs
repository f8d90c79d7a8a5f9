// 9.0 report.rs: text rendering of an AccountSummary, laid out like the
// margin manager panel in the UI. estimated PnL without indexer data renders
// as N/A, never as zero.

use crate::fixed_point::FixedPoint;
use crate::margin::{AccountSummary, EstPnl, IsolatedLeverage};
use crate::types::BalanceKind;

const RULE: &str =
    "================================================================================";

pub fn render_account_summary(summary: &AccountSummary) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.to_string());
    lines.push("MARGIN MANAGER".to_string());
    lines.push(RULE.to_string());

    // overview
    let initial_margin_used = summary.unweighted_health - summary.initial_health;
    lines.push(String::new());
    lines.push("--- Overview ---".to_string());
    lines.push(format!("Total Equity:              {}", money(summary.portfolio_value)));
    lines.push(format!("Initial Margin Used:       {}", money(initial_margin_used)));
    lines.push(format!("Initial Margin Available:  {}", money(summary.funds_available)));
    lines.push(format!("Leverage:                  {}x", fixed(summary.account_leverage, 2)));

    // unified margin pool
    lines.push(String::new());
    lines.push("--- UNIFIED MARGIN ---".to_string());
    lines.push(format!("Margin Usage:              {}", percent(summary.margin_usage_fraction)));
    lines.push(format!("Maint. Margin Usage:       {}", percent(summary.maint_margin_usage_fraction)));
    lines.push(format!("Available Margin:          {}", money(summary.funds_available)));
    lines.push(format!("Funds Until Liquidation:   {}", money(summary.funds_until_liquidation)));

    // quote balance box
    let total_unsettled: FixedPoint = summary.cross_positions.iter().map(|p| p.unsettled).sum();
    let cash_balance = summary.total_spot_deposits - summary.total_spot_borrows;
    let net_balance = cash_balance + total_unsettled;
    lines.push(String::new());
    lines.push("Quote Balance".to_string());
    lines.push(format!("  Cash Balance:            {}", money(cash_balance)));
    lines.push(format!("  Unsettled PnL:           {}", money(total_unsettled)));
    lines.push(format!("  Net Balance:             {}", money(net_balance)));

    // spot balances
    lines.push(String::new());
    lines.push("Balances".to_string());
    let mut spot_shown = false;
    for spot in &summary.spot_positions {
        if spot.amount.is_zero() {
            continue;
        }
        spot_shown = true;
        debug_assert_eq!(spot.kind, BalanceKind::Spot);
        let label = if spot.amount.is_negative() { "Borrow" } else { "Deposit" };
        let value = (spot.amount * spot.oracle_price).abs();
        let (init_weight, maint_weight) = if spot.amount.is_negative() {
            (spot.weights.short_initial, spot.weights.short_maintenance)
        } else {
            (spot.weights.long_initial, spot.weights.long_maintenance)
        };
        lines.push(format!("  {} ({})", spot.product_id, label));
        lines.push(format!("    Balance:                {}", fixed(spot.amount.abs(), 4)));
        lines.push(format!("    Value:                  {}", money(value)));
        lines.push(format!(
            "    Init. Weight / Margin:  {} / {}",
            fixed(init_weight, 2),
            money(value * init_weight)
        ));
        lines.push(format!(
            "    Maint. Weight / Margin: {} / {}",
            fixed(maint_weight, 2),
            money(value * maint_weight)
        ));
    }
    if !spot_shown {
        lines.push("  No spot balances".to_string());
    }

    // cross perp positions
    lines.push(String::new());
    lines.push("Perps".to_string());
    if summary.cross_positions.is_empty() {
        lines.push("  No perp positions".to_string());
    }
    for position in &summary.cross_positions {
        let side = if position.position_size.is_negative() { "Short" } else { "Long" };
        lines.push(format!("  {} ({} / Cross)", position.product_id, side));
        lines.push(format!("    Position:               {}", fixed(position.position_size, 3)));
        lines.push(format!("    Notional:               {}", money(position.notional_value)));
        let est_pnl = match position.est_pnl {
            EstPnl::Known(pnl) if !pnl.is_negative() => format!("+{}", money(pnl)),
            EstPnl::Known(pnl) => money(pnl),
            EstPnl::Unknown => "N/A".to_string(),
        };
        lines.push(format!("    Est. PnL:               {}", est_pnl));
        lines.push(format!("    Unsettled:              {}", money(position.unsettled)));

        let (init_weight, maint_weight) = if position.position_size.is_negative() {
            (position.weights.short_initial, position.weights.short_maintenance)
        } else {
            (position.weights.long_initial, position.weights.long_maintenance)
        };
        let init_margin = position.notional_value * (FixedPoint::ONE - init_weight).abs();
        let maint_margin = position.notional_value * (FixedPoint::ONE - maint_weight).abs();
        lines.push(format!(
            "    Init. Weight / Margin:  {} / {}",
            fixed(init_weight, 2),
            money(init_margin)
        ));
        lines.push(format!(
            "    Maint. Weight / Margin: {} / {}",
            fixed(maint_weight, 2),
            money(maint_margin)
        ));
    }

    // isolated positions
    let total_isolated_margin: FixedPoint =
        summary.isolated_positions.iter().map(|p| p.net_margin).sum();
    lines.push(String::new());
    lines.push("--- ISOLATED POSITIONS ---".to_string());
    lines.push(format!(
        "Total Margin in Isolated Positions: {}",
        money(total_isolated_margin)
    ));
    if summary.isolated_positions.is_empty() {
        lines.push("  No isolated positions".to_string());
    }
    for position in &summary.isolated_positions {
        let side = if position.position_size.is_negative() { "Short" } else { "Long" };
        lines.push(format!("  {} ({} / Isolated)", position.product_id, side));
        lines.push(format!("    Position:               {}", fixed(position.position_size, 3)));
        lines.push(format!("    Notional:               {}", money(position.notional_value)));
        lines.push(format!("    Margin:                 {}", money(position.net_margin)));
        let leverage = match position.leverage {
            IsolatedLeverage::Defined(value) => format!("{}x", fixed(value, 2)),
            IsolatedLeverage::Undefined => "N/A (zero net margin)".to_string(),
        };
        lines.push(format!("    Leverage:               {}", leverage));
        lines.push(format!("    Init. Health:           {}", money(position.initial_health)));
        lines.push(format!("    Maint. Health:          {}", money(position.maintenance_health)));
    }

    lines.push(RULE.to_string());
    lines.join("\n")
}

// 9.1: formatting helpers. truncation, not rounding: a report never shows
// more funds than exist.

fn fixed(value: FixedPoint, decimals: u32) -> String {
    let scale_down = 10i128.pow(crate::fixed_point::FIXED_POINT_DECIMALS - decimals);
    let scaled = value.raw() / scale_down;
    let base = 10i128.pow(decimals);
    let sign = if scaled < 0 { "-" } else { "" };
    let mag = scaled.unsigned_abs();
    format!(
        "{}{}.{:0width$}",
        sign,
        mag / base as u128,
        mag % base as u128,
        width = decimals as usize
    )
}

fn money(value: FixedPoint) -> String {
    format!("${}", fixed(value, 2))
}

fn percent(fraction: FixedPoint) -> String {
    format!("{}%", fixed(fraction * FixedPoint::from_int(100), 2))
}
