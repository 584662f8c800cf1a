//! Aggregate result of one backtest run.

use serde::{Deserialize, Serialize};

use super::metrics;
use super::timeframe::Timeframe;
use crate::domain::Trade;

/// Performance summary computed once from the closed trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    // ── Counts ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,

    // ── Returns ──
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_pnl: f64,
    /// `total_pnl / initial_capital`.
    pub total_return: f64,
    pub win_rate: f64,
    pub profit_factor: f64,

    // ── Risk ──
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,

    // ── Timing ──
    pub timeframe: Timeframe,
    pub first_trade_time: Option<i64>,
    pub last_trade_time: Option<i64>,
    pub trading_period_days: f64,
    pub trades_per_day: f64,
    pub avg_trade_duration_ms: f64,
    pub avg_signal_strength: f64,

    // ── Input accounting ──
    pub candles_processed: usize,
    pub candles_rejected: usize,

    // ── Detail ──
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
}

impl BacktestResult {
    /// Build the summary from closed trades in exit order.
    pub fn from_trades(
        trades: Vec<Trade>,
        initial_capital: f64,
        timeframe: Timeframe,
        candles_processed: usize,
        candles_rejected: usize,
    ) -> Self {
        let equity_curve = metrics::equity_curve(initial_capital, &trades);
        let final_capital = equity_curve.last().copied().unwrap_or(initial_capital);
        let total_pnl = metrics::total_pnl(&trades);
        let total_return = if initial_capital > 0.0 {
            total_pnl / initial_capital
        } else {
            0.0
        };

        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = trades.iter().filter(|t| t.pnl.is_some_and(|p| p < 0.0)).count();

        let first_trade_time = trades.iter().map(|t| t.entry_time).min();
        let last_trade_time = trades
            .iter()
            .map(|t| t.exit_time.unwrap_or(t.entry_time))
            .max();
        let trading_period_days = match (first_trade_time, last_trade_time) {
            (Some(first), Some(last)) => metrics::period_days(first, last),
            _ => 0.0,
        };

        let returns = metrics::trade_returns(&trades);

        Self {
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            initial_capital,
            final_capital,
            total_pnl,
            total_return,
            win_rate: metrics::win_rate(&trades),
            profit_factor: metrics::profit_factor(&trades),
            max_drawdown: metrics::max_drawdown(&equity_curve),
            sharpe_ratio: metrics::sharpe_ratio(&returns, timeframe.annualization_factor()),
            timeframe,
            first_trade_time,
            last_trade_time,
            trading_period_days,
            trades_per_day: metrics::trades_per_day(trades.len(), trading_period_days),
            avg_trade_duration_ms: metrics::avg_duration_ms(&trades),
            avg_signal_strength: metrics::avg_signal_strength(&trades),
            candles_processed,
            candles_rejected,
            equity_curve,
            trades,
        }
    }

    /// Result of a run that never traded.
    pub fn empty(initial_capital: f64, timeframe: Timeframe) -> Self {
        Self::from_trades(Vec::new(), initial_capital, timeframe, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, ExitReason};

    #[test]
    fn empty_result_is_neutral() {
        let r = BacktestResult::empty(10_000.0, Timeframe::Minutes);
        assert_eq!(r.total_trades, 0);
        assert_eq!(r.final_capital, 10_000.0);
        assert_eq!(r.win_rate, 0.0);
        assert_eq!(r.max_drawdown, 0.0);
        assert_eq!(r.sharpe_ratio, 0.0);
        assert!(r.first_trade_time.is_none());
    }

    #[test]
    fn period_spans_first_entry_to_last_exit() {
        let trade = Trade {
            id: 1,
            direction: Direction::Short,
            entry_index: 0,
            entry_time: 0,
            entry_price: 100.0,
            stop_price: 102.0,
            target_price: 97.0,
            leverage: 1.0,
            capital_at_entry: 1_000.0,
            signal_strength: 100.0,
            open: false,
            exit_index: Some(10),
            exit_time: Some(2 * 86_400_000),
            exit_price: Some(90.0),
            pnl: Some(100.0),
            exit_reason: Some(ExitReason::TakeProfit),
        };
        let r = BacktestResult::from_trades(vec![trade], 1_000.0, Timeframe::Minutes, 11, 0);
        assert_eq!(r.trading_period_days, 2.0);
        assert_eq!(r.trades_per_day, 0.5);
        assert_eq!(r.winning_trades, 1);
        assert!((r.total_return - 0.1).abs() < 1e-12);
        assert_eq!(r.equity_curve, vec![1_000.0, 1_100.0]);
    }
}
