pub mod mode;
pub mod signal;

pub use mode::{Mode, Quantity, Radius};
pub use signal::Signal;
