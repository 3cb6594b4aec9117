// Engine library root: energy-resource accounting over a multi-year horizon.

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod horizon;
pub mod ledger;
pub mod metrics;
pub mod passport;

pub use error::{EngineError, EngineResult};
pub use ledger::{ConsumptionLedger, HorizonSource, ProductionLedger};
