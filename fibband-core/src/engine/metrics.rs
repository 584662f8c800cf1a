//! Performance metrics — pure functions over the closed trade list and the
//! per-exit equity curve.

use crate::domain::Trade;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Equity after each exit, starting from `initial_capital`.
pub fn equity_curve(initial_capital: f64, trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut capital = initial_capital;
    curve.push(capital);
    for trade in trades {
        capital += trade.pnl.unwrap_or(0.0);
        curve.push(capital);
    }
    curve
}

/// Per-trade return as a fraction of the capital committed at entry.
pub fn trade_returns(trades: &[Trade]) -> Vec<f64> {
    trades.iter().map(Trade::return_pct).collect()
}

pub fn total_pnl(trades: &[Trade]) -> f64 {
    trades.iter().filter_map(|t| t.pnl).sum()
}

/// Fraction of trades with positive PnL, in [0, 1].
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Largest peak-to-trough decline as a positive fraction in [0, 1].
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if !eq.is_finite() {
            continue;
        }
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.clamp(0.0, 1.0)
}

/// Mean trade return over its sample standard deviation, scaled by
/// `sqrt(annualization)`. Zero for fewer than two trades or zero variance.
pub fn sharpe_ratio(returns: &[f64], annualization: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let std = std_dev(returns);
    if std < 1e-15 || !std.is_finite() {
        return 0.0;
    }
    let ratio = mean / std * annualization.sqrt();
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Gross profit over gross loss, capped at 100.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let pnls = || trades.iter().filter_map(|t| t.pnl);
    let gross_profit: f64 = pnls().filter(|p| *p > 0.0).sum();
    let gross_loss: f64 = pnls().filter(|p| *p < 0.0).map(f64::abs).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Days between two millisecond timestamps.
pub fn period_days(first_ms: i64, last_ms: i64) -> f64 {
    (last_ms.saturating_sub(first_ms)).max(0) as f64 / MS_PER_DAY
}

/// Trades per day over `days`; with a sub-day span the count itself is returned.
pub fn trades_per_day(trade_count: usize, days: f64) -> f64 {
    if trade_count == 0 {
        0.0
    } else if days < 1.0 {
        trade_count as f64
    } else {
        trade_count as f64 / days
    }
}

pub fn avg_duration_ms(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.duration_ms() as f64).sum::<f64>() / trades.len() as f64
}

pub fn avg_signal_strength(trades: &[Trade]) -> f64 {
    let strengths: Vec<f64> = trades.iter().map(|t| t.signal_strength).collect();
    mean_f64(&strengths)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};

    fn closed_trade(pnl: f64, capital: f64, entry_ms: i64, exit_ms: i64) -> Trade {
        Trade {
            id: 1,
            direction: Direction::Long,
            entry_index: 0,
            entry_time: entry_ms,
            entry_price: 100.0,
            stop_price: 98.0,
            target_price: 103.0,
            leverage: 1.0,
            capital_at_entry: capital,
            signal_strength: 100.0,
            open: false,
            exit_index: Some(1),
            exit_time: Some(exit_ms),
            exit_price: Some(100.0),
            pnl: Some(pnl),
            exit_reason: Some(ExitReason::Timeout),
        }
    }

    // ── Drawdown ──

    #[test]
    fn drawdown_peak_to_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - 0.25).abs() < 1e-12);
    }

    #[test]
    fn drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_full_loss_is_one() {
        assert_eq!(max_drawdown(&[100.0, 0.0]), 1.0);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_zero_for_single_trade_or_flat_returns() {
        assert_eq!(sharpe_ratio(&[0.05], 362_880.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 362_880.0), 0.0);
    }

    #[test]
    fn sharpe_uses_sample_std() {
        // mean 0.02, sample std 0.02 * sqrt(2)
        let s = sharpe_ratio(&[0.0, 0.04], 4.0);
        assert!((s - 2.0_f64.sqrt()).abs() < 1e-9);
    }

    // ── Trade aggregates ──

    #[test]
    fn win_rate_and_profit_factor() {
        let trades = vec![
            closed_trade(300.0, 10_000.0, 0, 60_000),
            closed_trade(-100.0, 10_300.0, 60_000, 180_000),
        ];
        assert_eq!(win_rate(&trades), 0.5);
        assert!((profit_factor(&trades) - 3.0).abs() < 1e-12);
        assert!((total_pnl(&trades) - 200.0).abs() < 1e-12);
        assert_eq!(avg_duration_ms(&trades), 90_000.0);
    }

    #[test]
    fn profit_factor_caps_without_losses() {
        let trades = vec![closed_trade(50.0, 1_000.0, 0, 1)];
        assert_eq!(profit_factor(&trades), 100.0);
        assert_eq!(profit_factor(&[]), 0.0);
    }

    #[test]
    fn equity_curve_compounds_pnl() {
        let trades = vec![
            closed_trade(100.0, 1_000.0, 0, 1),
            closed_trade(-50.0, 1_100.0, 1, 2),
        ];
        assert_eq!(equity_curve(1_000.0, &trades), vec![1_000.0, 1_100.0, 1_050.0]);
        let returns = trade_returns(&trades);
        assert!((returns[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn frequency_over_sub_day_span() {
        assert_eq!(trades_per_day(3, period_days(0, 3_600_000)), 3.0);
        assert_eq!(trades_per_day(4, 2.0), 2.0);
        assert_eq!(trades_per_day(0, 0.0), 0.0);
    }
}
