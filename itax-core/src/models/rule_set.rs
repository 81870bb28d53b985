use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FinancialYear, Regime, TaxSlab};

/// Errors found while validating a [`TaxRuleSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSetError {
    #[error("{regime} regime has no tax slabs")]
    EmptySlabs { regime: Regime },

    #[error("{regime} regime slab {index} starts at {found}, expected {expected}")]
    SlabGap {
        regime: Regime,
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("{regime} regime slab {index} ends at {max}, which is not above its start {min}")]
    InvertedSlab {
        regime: Regime,
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("{regime} regime slab {index} is open-ended but is not the top slab")]
    OpenSlabNotLast { regime: Regime, index: usize },

    #[error("{regime} regime top slab must be open-ended")]
    BoundedTopSlab { regime: Regime },

    #[error("{field} must be between 0 and 1, got {rate}")]
    InvalidRate { field: String, rate: Decimal },

    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: String, value: Decimal },

    #[error("surcharge tier {index} threshold {threshold} is not above the previous tier")]
    SurchargeTiersNotAscending { index: usize, threshold: Decimal },
}

/// Full rebate of slab tax for incomes at or below a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebate {
    pub income_threshold: Decimal,
}

impl Rebate {
    pub fn applies_to(
        &self,
        taxable_income: Decimal,
    ) -> bool {
        taxable_income <= self.income_threshold
    }
}

/// Standard deduction, slab table and rebate for one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeRules {
    pub standard_deduction: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebate: Option<Rebate>,
    pub slabs: Vec<TaxSlab>,
}

/// Statutory ceiling per old-regime deduction. `None` leaves a field uncapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_80c: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_80d: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hra: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_loan_interest: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_deductions: Option<Decimal>,
}

impl DeductionLimits {
    /// Every ceiling with its rule-file key, in declaration order.
    pub fn fields(&self) -> [(&'static str, Option<Decimal>); 7] {
        [
            ("section_80c", self.section_80c),
            ("section_80d", self.section_80d),
            ("hra", self.hra),
            ("lta", self.lta),
            ("nps", self.nps),
            ("home_loan_interest", self.home_loan_interest),
            ("other_deductions", self.other_deductions),
        ]
    }
}

/// Surcharge rate that applies once taxable income exceeds `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeTier {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Every rate, ceiling and threshold the engine needs for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRuleSet {
    pub financial_year: FinancialYear,
    pub cess_rate: Decimal,
    #[serde(default)]
    pub deduction_limits: DeductionLimits,
    /// Ordered by ascending threshold.
    #[serde(default)]
    pub surcharge_tiers: Vec<SurchargeTier>,
    pub old_regime: RegimeRules,
    pub new_regime: RegimeRules,
}

impl TaxRuleSet {
    /// Rates for FY 2024-25 as enacted by the July 2024 budget.
    pub fn fy_2024_25() -> Self {
        Self {
            financial_year: FinancialYear(2024),
            cess_rate: dec!(0.04),
            deduction_limits: DeductionLimits {
                section_80c: Some(dec!(150000)),
                section_80d: Some(dec!(50000)),
                hra: None,
                lta: Some(dec!(50000)),
                nps: Some(dec!(50000)),
                home_loan_interest: Some(dec!(200000)),
                other_deductions: None,
            },
            surcharge_tiers: vec![
                SurchargeTier {
                    threshold: dec!(5000000),
                    rate: dec!(0.10),
                },
                SurchargeTier {
                    threshold: dec!(10000000),
                    rate: dec!(0.15),
                },
                SurchargeTier {
                    threshold: dec!(20000000),
                    rate: dec!(0.25),
                },
                SurchargeTier {
                    threshold: dec!(50000000),
                    rate: dec!(0.37),
                },
            ],
            old_regime: RegimeRules {
                standard_deduction: dec!(50000),
                rebate: None,
                slabs: vec![
                    TaxSlab::new(dec!(0), Some(dec!(250000)), dec!(0)),
                    TaxSlab::new(dec!(250000), Some(dec!(500000)), dec!(0.05)),
                    TaxSlab::new(dec!(500000), Some(dec!(1000000)), dec!(0.20)),
                    TaxSlab::new(dec!(1000000), None, dec!(0.30)),
                ],
            },
            new_regime: RegimeRules {
                standard_deduction: dec!(75000),
                rebate: Some(Rebate {
                    income_threshold: dec!(700000),
                }),
                slabs: vec![
                    TaxSlab::new(dec!(0), Some(dec!(300000)), dec!(0)),
                    TaxSlab::new(dec!(300000), Some(dec!(700000)), dec!(0.05)),
                    TaxSlab::new(dec!(700000), Some(dec!(1000000)), dec!(0.10)),
                    TaxSlab::new(dec!(1000000), Some(dec!(1200000)), dec!(0.15)),
                    TaxSlab::new(dec!(1200000), Some(dec!(1500000)), dec!(0.20)),
                    TaxSlab::new(dec!(1500000), None, dec!(0.30)),
                ],
            },
        }
    }

    pub fn regime(
        &self,
        regime: Regime,
    ) -> &RegimeRules {
        match regime {
            Regime::Old => &self.old_regime,
            Regime::New => &self.new_regime,
        }
    }

    pub fn regime_mut(
        &mut self,
        regime: Regime,
    ) -> &mut RegimeRules {
        match regime {
            Regime::Old => &mut self.old_regime,
            Regime::New => &mut self.new_regime,
        }
    }

    /// Checks that the tables describe a well-formed progressive schedule.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleSetError`] found.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        check_rate("cess rate", self.cess_rate)?;

        for (field, limit) in self.deduction_limits.fields() {
            if let Some(limit) = limit {
                check_non_negative(format!("{field} limit"), limit)?;
            }
        }

        let mut previous: Option<Decimal> = None;
        for (index, tier) in self.surcharge_tiers.iter().enumerate() {
            check_non_negative(format!("surcharge tier {index} threshold"), tier.threshold)?;
            check_rate(format!("surcharge tier {index} rate"), tier.rate)?;
            if previous.is_some_and(|p| tier.threshold <= p) {
                return Err(RuleSetError::SurchargeTiersNotAscending {
                    index,
                    threshold: tier.threshold,
                });
            }
            previous = Some(tier.threshold);
        }

        for regime in Regime::ALL {
            validate_regime(regime, self.regime(regime))?;
        }

        Ok(())
    }
}

fn validate_regime(
    regime: Regime,
    rules: &RegimeRules,
) -> Result<(), RuleSetError> {
    check_non_negative(
        format!("{regime} regime standard deduction"),
        rules.standard_deduction,
    )?;
    if let Some(rebate) = &rules.rebate {
        check_non_negative(
            format!("{regime} regime rebate threshold"),
            rebate.income_threshold,
        )?;
    }

    let first = rules
        .slabs
        .first()
        .ok_or(RuleSetError::EmptySlabs { regime })?;
    check_non_negative(format!("{regime} regime first slab"), first.min_income)?;

    let last = rules.slabs.len() - 1;
    let mut expected_min = first.min_income;
    for (index, slab) in rules.slabs.iter().enumerate() {
        if slab.min_income != expected_min {
            return Err(RuleSetError::SlabGap {
                regime,
                index,
                expected: expected_min,
                found: slab.min_income,
            });
        }
        check_rate(format!("{regime} regime slab {index} rate"), slab.rate)?;

        match slab.max_income {
            Some(max) if max <= slab.min_income => {
                return Err(RuleSetError::InvertedSlab {
                    regime,
                    index,
                    min: slab.min_income,
                    max,
                });
            }
            Some(_) if index == last => return Err(RuleSetError::BoundedTopSlab { regime }),
            Some(max) => expected_min = max,
            None if index != last => return Err(RuleSetError::OpenSlabNotLast { regime, index }),
            None => {}
        }
    }

    Ok(())
}

fn check_rate(
    field: impl Into<String>,
    rate: Decimal,
) -> Result<(), RuleSetError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RuleSetError::InvalidRate {
            field: field.into(),
            rate,
        });
    }
    Ok(())
}

fn check_non_negative(
    field: impl Into<String>,
    value: Decimal,
) -> Result<(), RuleSetError> {
    if value < Decimal::ZERO {
        return Err(RuleSetError::NegativeAmount {
            field: field.into(),
            value,
        });
    }
    Ok(())
}
