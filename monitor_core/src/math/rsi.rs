use std::collections::VecDeque;

/// Streaming Relative Strength Index over a rolling window of `period`
/// price changes, using simple averages of gains and losses.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    last_price: Option<f64>,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
}

impl Rsi {
    /// # Panics
    /// Panics if `period` is 0.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            last_price: None,
            gains: VecDeque::with_capacity(period + 1),
            losses: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Feed the next closing price. Returns `None` until `period` changes
    /// have been seen, and for a window with neither gains nor losses.
    pub fn add(&mut self, price: f64) -> Option<f64> {
        let last_price = self.last_price.replace(price)?;
        let change = price - last_price;

        self.gains.push_back(change.max(0.0));
        self.losses.push_back((-change).max(0.0));
        if self.gains.len() > self.period {
            self.gains.pop_front();
            self.losses.pop_front();
        }

        if self.gains.len() < self.period {
            return None;
        }

        let avg_gain = self.gains.iter().sum::<f64>() / self.period as f64;
        let avg_loss = self.losses.iter().sum::<f64>() / self.period as f64;
        rsi_from_averages(avg_gain, avg_loss)
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        // flat window: no momentum either way
        if avg_gain == 0.0 {
            return None;
        }
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

/// RSI of the most recent `period` changes of `prices` (oldest first).
///
/// Returns `None` when fewer than `period + 1` prices are available or when
/// the window is flat. Full precision; round for display only.
///
/// # Panics
/// Panics if `period` is 0.
pub fn compute_rsi(prices: &[f64], period: usize) -> Option<f64> {
    let mut rsi = Rsi::new(period);
    prices.iter().map(|&p| rsi.add(p)).last().flatten()
}
