//! Per-channel metric calculators
//!
//! One module per interaction channel. Each channel owns a bounded sample
//! buffer, a running count of everything it has seen, and the last computed
//! metrics; metrics recompute on every push once the channel reaches its
//! minimum sample count and otherwise stay at their previous values.

pub mod clicks;
pub mod clipboard;
pub mod focus;
pub mod movement;
pub mod typing;

pub use clicks::{ClickChannel, ClickMetrics};
pub use clipboard::{ClipboardChannel, ClipboardMetrics};
pub use focus::{FocusChannel, FocusMetrics};
pub use movement::{MovementChannel, MovementMetrics};
pub use typing::{TypingChannel, TypingMetrics};

/// Arithmetic mean of a sample set; 0 when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a sample set; 0 when empty.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[4.0]), 4.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
        // Population stddev of {2, 4, 4, 4, 5, 5, 7, 9} is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }
}
