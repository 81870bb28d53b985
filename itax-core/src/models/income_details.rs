use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Gross income by source for one financial year.
///
/// Field names follow the document-extraction contract (`salaryIncome`,
/// `businessIncome`, ...). Missing or `null` values read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeDetails {
    #[serde(deserialize_with = "amount_or_zero")]
    pub salary_income: Decimal,

    /// Business or professional income.
    #[serde(deserialize_with = "amount_or_zero")]
    pub business_income: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub capital_gains: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub house_property_income: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub other_income: Decimal,
}

impl IncomeDetails {
    /// Income made up entirely of salary.
    pub fn salaried(amount: Decimal) -> Self {
        Self {
            salary_income: amount,
            ..Self::default()
        }
    }

    /// Every source with its contract field name, in declaration order.
    pub fn fields(&self) -> [(&'static str, Decimal); 5] {
        [
            ("salaryIncome", self.salary_income),
            ("businessIncome", self.business_income),
            ("capitalGains", self.capital_gains),
            ("housePropertyIncome", self.house_property_income),
            ("otherIncome", self.other_income),
        ]
    }
}

/// Reads an optional decimal, treating `null` as zero.
pub(crate) fn amount_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Decimal> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(Decimal::ZERO))
}
