//! Spectral tools for finding cycle lengths.

mod periodogram;

pub use periodogram::{detect_seasonal_periods, dominant_period, periodogram, SpectralPoint};
