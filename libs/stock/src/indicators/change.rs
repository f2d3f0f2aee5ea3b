#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Movement {
    Exceeded,
    Within,
}

/// Absolute day-over-day move of `latest` against the `prior` close, in percent.
/// The base is the earlier close, so 105 after 100 is a 5% move.
pub fn percent_change(latest: f64, prior: f64) -> f64 {
    (latest - prior).abs() / prior * 100.0
}

/// A move only counts once it is strictly above `threshold`.
pub fn classify(change: f64, threshold: f64) -> Movement {
    if change > threshold {
        Movement::Exceeded
    } else {
        Movement::Within
    }
}
