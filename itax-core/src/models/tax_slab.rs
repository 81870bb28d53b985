use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of a progressive slab table.
///
/// Income in `(min_income, max_income]` is taxed at `rate`. The top slab has
/// no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlab {
    pub min_income: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxSlab {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            rate,
        }
    }

    /// Whether `income` falls inside this slab. Upper bounds are inclusive.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income > self.min_income && self.max_income.is_none_or(|max| income <= max)
    }

    /// Portion of `income` that lies inside this slab.
    pub fn portion_of(
        &self,
        income: Decimal,
    ) -> Decimal {
        if income <= self.min_income {
            return Decimal::ZERO;
        }
        let upper = match self.max_income {
            Some(max) if income > max => max,
            _ => income,
        };
        upper - self.min_income
    }
}
