pub mod fft;
pub mod stats;

pub use fft::{fft_frequencies, FftHelper};
pub use stats::StatsHelper;
