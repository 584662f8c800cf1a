//! Simple Moving Average (SMA) over an arbitrary value series.
//!
//! First defined value at index period-1. Any non-finite value inside the
//! window makes that position `None`.

pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut bad_in_window = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sum += v;
        } else {
            bad_in_window += 1;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_finite() {
                sum -= leaving;
            } else {
                bad_in_window -= 1;
            }
        }

        if i + 1 >= period && bad_in_window == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}
