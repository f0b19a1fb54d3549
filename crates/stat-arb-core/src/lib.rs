pub mod error;
pub mod types;

#[cfg(feature = "backtest")]
pub mod backtest;

#[cfg(feature = "screening")]
pub mod screening;

#[cfg(feature = "sweep")]
pub mod sweep;

pub use error::StatArbError;
pub use types::*;

/// Standard result type for all stat-arb operations
pub type StatArbResult<T> = Result<T, StatArbError>;
