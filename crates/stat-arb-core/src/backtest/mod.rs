pub mod accounting;
pub mod engine;
pub mod performance;
pub mod regression;
pub mod signal;
pub mod spread;
