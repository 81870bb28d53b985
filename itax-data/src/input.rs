//! Structured input produced by document extraction.
//!
//! The extraction service reads an uploaded salary slip or Form 16 and
//! answers with JSON shaped like
//!
//! ```json
//! {
//!   "incomeDetails": { "salaryIncome": 1200000, "otherIncome": 15000 },
//!   "deductionDetails": { "section80C": 150000, "hra": null },
//!   "taxRegime": "old"
//! }
//! ```
//!
//! usually wrapped in a `{ "success": true, "data": ... }` envelope and
//! sometimes inside a Markdown code fence. Values the service could not find
//! are missing or `null` and read as zero.

use itax_core::{DeductionDetails, IncomeDetails, Regime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid input JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Extraction response reported success but carried no data")]
    MissingData,

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: String, value: Decimal },

    #[error("{field} of {value} exceeds the largest supported amount, {max}")]
    TooLarge {
        field: String,
        value: Decimal,
        max: Decimal,
    },
}

/// Largest amount accepted for any single field: ₹10^15 (a crore crore).
/// Five such incomes taxed at the top slab with surcharge and cess stay far
/// inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Engine inputs plus the regime the document suggests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxInput {
    #[serde(deserialize_with = "null_as_default")]
    pub income_details: IncomeDetails,

    #[serde(deserialize_with = "null_as_default")]
    pub deduction_details: DeductionDetails,

    /// `old` when the document gives no hint.
    #[serde(deserialize_with = "null_as_default")]
    pub tax_regime: Regime,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TaxInput {
    /// Parses an extraction response: a bare object, an envelope, or either
    /// wrapped in a code fence.
    ///
    /// # Errors
    ///
    /// [`InputError::ExtractionFailed`] for an envelope with `success: false`,
    /// [`InputError::MissingData`] for a successful envelope without `data`,
    /// and [`InputError::Json`] for anything that does not match the shape.
    pub fn from_json(text: &str) -> Result<Self, InputError> {
        let value: Value = serde_json::from_str(strip_code_fence(text))?;

        let is_envelope = value
            .as_object()
            .is_some_and(|object| object.contains_key("success"));
        if !is_envelope {
            return Ok(serde_json::from_value(value)?);
        }

        let envelope: Envelope = serde_json::from_value(value)?;
        if !envelope.success {
            let reason = match (envelope.message, envelope.error) {
                (Some(message), Some(error)) => format!("{message}: {error}"),
                (Some(message), None) => message,
                (None, Some(error)) => error,
                (None, None) => "no reason given".to_string(),
            };
            return Err(InputError::ExtractionFailed(reason));
        }

        let data = envelope.data.ok_or(InputError::MissingData)?;
        debug!("unwrapped extraction envelope");
        Ok(serde_json::from_value(data)?)
    }

    /// Rejects negative amounts and amounts above [`MAX_AMOUNT`], naming the
    /// first offending field.
    pub fn validate(&self) -> Result<(), InputError> {
        let income = self
            .income_details
            .fields()
            .into_iter()
            .map(|(name, value)| ("incomeDetails", name, value));
        let deductions = self
            .deduction_details
            .fields()
            .into_iter()
            .map(|(name, value)| ("deductionDetails", name, value));

        for (group, name, value) in income.chain(deductions) {
            let field = || format!("{group}.{name}");
            if value < Decimal::ZERO {
                return Err(InputError::NegativeAmount {
                    field: field(),
                    value,
                });
            }
            if value > MAX_AMOUNT {
                return Err(InputError::TooLarge {
                    field: field(),
                    value,
                    max: MAX_AMOUNT,
                });
            }
        }
        Ok(())
    }
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FULL: &str = r#"{
        "incomeDetails": {
            "salaryIncome": 1200000,
            "businessIncome": 0,
            "capitalGains": 50000,
            "housePropertyIncome": 0,
            "otherIncome": 15000
        },
        "deductionDetails": {
            "section80C": 150000,
            "section80D": 25000,
            "hra": 120000,
            "lta": 0,
            "nps": 50000,
            "homeLoanInterest": 0,
            "otherDeductions": 0
        },
        "taxRegime": "new"
    }"#;

    #[test]
    fn parses_bare_object() {
        let input = TaxInput::from_json(FULL).unwrap();

        assert_eq!(input.income_details.salary_income, dec!(1200000));
        assert_eq!(input.income_details.capital_gains, dec!(50000));
        assert_eq!(input.deduction_details.section_80c, dec!(150000));
        assert_eq!(input.deduction_details.section_80d, dec!(25000));
        assert_eq!(input.deduction_details.nps, dec!(50000));
        assert_eq!(input.tax_regime, Regime::New);
    }

    #[test]
    fn missing_and_null_values_read_as_zero() {
        let input = TaxInput::from_json(
            r#"{"incomeDetails": {"salaryIncome": 800000, "otherIncome": null},
                "deductionDetails": {"hra": null}}"#,
        )
        .unwrap();

        assert_eq!(input.income_details, IncomeDetails::salaried(dec!(800000)));
        assert_eq!(input.deduction_details, DeductionDetails::default());
    }

    #[test]
    fn missing_regime_defaults_to_old() {
        let input = TaxInput::from_json(r#"{"incomeDetails": {}}"#).unwrap();
        assert_eq!(input.tax_regime, Regime::Old);

        let input = TaxInput::from_json(r#"{"taxRegime": null, "deductionDetails": null}"#).unwrap();
        assert_eq!(input.tax_regime, Regime::Old);
        assert_eq!(input.deduction_details, DeductionDetails::default());
    }

    #[test]
    fn unwraps_successful_envelope() {
        let text = format!(r#"{{"success": true, "data": {FULL}}}"#);

        let input = TaxInput::from_json(&text).unwrap();

        assert_eq!(input, TaxInput::from_json(FULL).unwrap());
    }

    #[test]
    fn failed_envelope_carries_message() {
        let err = TaxInput::from_json(
            r#"{"success": false, "message": "Failed to process document", "error": "quota exceeded"}"#,
        )
        .unwrap_err();

        match err {
            InputError::ExtractionFailed(reason) => {
                assert_eq!(reason, "Failed to process document: quota exceeded");
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }

    #[test]
    fn successful_envelope_without_data_is_an_error() {
        let err = TaxInput::from_json(r#"{"success": true}"#).unwrap_err();

        assert!(matches!(err, InputError::MissingData));
    }

    #[test]
    fn strips_markdown_code_fences() {
        let fenced = format!("```json\n{FULL}\n```\n");
        let bare_fence = format!("```\n{FULL}\n```");

        assert_eq!(TaxInput::from_json(&fenced).unwrap(), TaxInput::from_json(FULL).unwrap());
        assert_eq!(TaxInput::from_json(&bare_fence).unwrap(), TaxInput::from_json(FULL).unwrap());
    }

    #[test]
    fn unknown_regime_is_rejected() {
        let err = TaxInput::from_json(r#"{"taxRegime": "flat"}"#).unwrap_err();

        assert!(matches!(err, InputError::Json(_)));
    }

    #[test]
    fn validate_accepts_zero_and_positive_amounts() {
        assert!(TaxInput::from_json(FULL).unwrap().validate().is_ok());
        assert!(TaxInput::default().validate().is_ok());
    }

    #[test]
    fn validate_names_negative_field() {
        let mut input = TaxInput::from_json(FULL).unwrap();
        input.deduction_details.home_loan_interest = dec!(-5000);

        match input.validate() {
            Err(InputError::NegativeAmount { field, value }) => {
                assert_eq!(field, "deductionDetails.homeLoanInterest");
                assert_eq!(value, dec!(-5000));
            }
            other => panic!("expected NegativeAmount, got {other:?}"),
        }
    }

    #[test]
    fn max_amount_is_a_crore_crore() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000000));
    }

    #[test]
    fn validate_rejects_amounts_beyond_decimal_safe_range() {
        let mut input = TaxInput::default();
        input.income_details.salary_income = dec!(40000000000000000000000000000);
        input.income_details.business_income = dec!(40000000000000000000000000000);

        match input.validate() {
            Err(InputError::TooLarge { field, value, max }) => {
                assert_eq!(field, "incomeDetails.salaryIncome");
                assert_eq!(value, dec!(40000000000000000000000000000));
                assert_eq!(max, MAX_AMOUNT);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn largest_amounts_stay_computable() {
        let input = TaxInput {
            income_details: IncomeDetails {
                salary_income: MAX_AMOUNT,
                business_income: MAX_AMOUNT,
                capital_gains: MAX_AMOUNT,
                house_property_income: MAX_AMOUNT,
                other_income: MAX_AMOUNT,
            },
            ..TaxInput::default()
        };
        assert!(input.validate().is_ok());

        let result = itax_core::TaxEngine::default().calculate_tax_liability(
            &input.income_details,
            &input.deduction_details,
            Regime::New,
        );

        assert_eq!(result.total_income, dec!(5000000000000000));
        assert!(result.total_tax_liability > Decimal::ZERO);
    }
}
