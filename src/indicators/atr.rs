// =============================================================================
// Average True Range (ATR) — trailing-mean variant
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR here is the plain mean of the most recent `window` TR values.  When
// fewer than `window` TR samples exist, the mean is taken over whatever
// samples are available — the divisor is always the actual sample count, so
// the calculation can never divide by zero.
//
// Default window: 14
// =============================================================================

use crate::types::Candle;

/// Compute the trailing-mean ATR from a slice of OHLC candles (oldest first).
///
/// # Returns
/// `None` when:
/// - `window` is zero.
/// - Fewer than 2 candles exist (no True Range can be formed).
/// - Any intermediate value is non-finite.
pub fn average_true_range(candles: &[Candle], window: usize) -> Option<f64> {
    if window == 0 || candles.len() < 2 {
        return None;
    }

    // --- Step 1: True Range for each consecutive pair ------------------------
    let mut tr_values: Vec<f64> = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        let high = candles[i].high;
        let low = candles[i].low;
        let prev_close = candles[i - 1].close;

        let hl = high - low;
        let hc = (high - prev_close).abs();
        let lc = (low - prev_close).abs();

        let tr = hl.max(hc).max(lc);
        if !tr.is_finite() {
            return None;
        }
        tr_values.push(tr);
    }

    // --- Step 2: Mean of the most recent `window` samples --------------------
    let start = tr_values.len().saturating_sub(window);
    let tail = &tr_values[start..];
    let atr = tail.iter().sum::<f64>() / tail.len() as f64;

    if atr.is_finite() {
        Some(atr)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Build a test candle with the given OHLC values.
    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            ts: 0,
            open,
            high,
            low,
            close,
        }
    }

    #[test]
    fn atr_window_zero() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 20];
        assert!(average_true_range(&candles, 0).is_none());
    }

    #[test]
    fn atr_single_candle() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0)];
        assert!(average_true_range(&candles, 14).is_none());
    }

    #[test]
    fn atr_two_candles_partial_window() {
        // Only one TR sample exists; the mean is over that single sample, not
        // a zero divisor.
        let candles = vec![
            candle(100.0, 102.0, 98.0, 101.0),
            candle(101.0, 104.0, 99.0, 103.0),
        ];
        let atr = average_true_range(&candles, 14).unwrap();
        // TR = max(104-99, |104-101|, |99-101|) = 5
        assert!((atr - 5.0).abs() < 1e-9, "expected 5.0, got {atr}");
    }

    #[test]
    fn atr_constant_range() {
        // All candles span the same 10-point range, close at the midpoint.
        let mut candles = Vec::new();
        for i in 0..30 {
            let base = 100.0 + i as f64 * 0.1; // slight drift
            candles.push(candle(base, base + 5.0, base - 5.0, base));
        }
        let atr = average_true_range(&candles, 14).unwrap();
        assert!(
            (atr - 10.0).abs() < 1.0,
            "expected ATR near 10.0, got {atr}"
        );
    }

    #[test]
    fn atr_uses_only_trailing_window() {
        // Early candles are wildly volatile, the last 14 TRs are constant.
        // The trailing mean must ignore the early noise entirely.
        let mut candles = Vec::new();
        for _ in 0..10 {
            candles.push(candle(100.0, 150.0, 50.0, 100.0));
        }
        for _ in 0..15 {
            candles.push(candle(100.0, 101.0, 99.0, 100.0));
        }
        let atr = average_true_range(&candles, 14).unwrap();
        assert!((atr - 2.0).abs() < 1e-9, "expected 2.0, got {atr}");
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        // Gap scenario: |H - prevClose| > H - L
        let candles = vec![
            candle(100.0, 105.0, 95.0, 95.0),   // close at low
            candle(110.0, 115.0, 108.0, 112.0), // gap up: |115-95|=20 > 115-108=7
        ];
        let atr = average_true_range(&candles, 14).unwrap();
        assert!((atr - 20.0).abs() < 1e-9, "expected 20.0, got {atr}");
    }

    #[test]
    fn atr_result_is_positive() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.5).sin() * 10.0;
                candle(base - 0.5, base + 2.0, base - 2.0, base + 0.5)
            })
            .collect();
        let atr = average_true_range(&candles, 14).unwrap();
        assert!(atr > 0.0, "ATR must be positive, got {atr}");
    }

    #[test]
    fn atr_nan_returns_none() {
        let candles = vec![
            candle(100.0, 105.0, 95.0, 100.0),
            candle(100.0, f64::NAN, 95.0, 100.0),
            candle(100.0, 105.0, 95.0, 100.0),
        ];
        assert!(average_true_range(&candles, 14).is_none());
    }
}
