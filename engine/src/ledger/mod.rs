// Dataset lifecycle: the consumption and production ledgers own their
// entity collections and keep every per-year array aligned to the horizon.
pub mod consumption;
pub mod production;

use energy_shared::models::Horizon;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

pub use consumption::ConsumptionLedger;
pub use production::ProductionLedger;

/// Read accessor through which the production ledger adopts the
/// consumption horizon.
pub trait HorizonSource {
    fn horizon(&self) -> Horizon;
}

impl HorizonSource for Horizon {
    fn horizon(&self) -> Horizon {
        *self
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn check_year(index: usize, years_count: usize) -> EngineResult<()> {
    if index < years_count {
        Ok(())
    } else {
        Err(EngineError::YearOutOfRange { index, years_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 36);
    }

    #[test]
    fn test_year_index_is_bounded_by_horizon() {
        assert!(check_year(2, 3).is_ok());
        assert!(matches!(
            check_year(3, 3),
            Err(EngineError::YearOutOfRange { index: 3, years_count: 3 })
        ));
    }
}
