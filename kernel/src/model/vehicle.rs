use once_cell::sync::Lazy;
use regex::Regex;
use shared::error::{AppError, AppResult};
use std::fmt;

// 通常ナンバー (MH12AA7842) または BH シリーズ (22BH1489AA)
static VEHICLE_NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Z]{2}\d{2}[A-Z]{1,2}\d{1,4}|\d{2}BH\d{4}[A-Z]{2})$")
        .expect("vehicle number pattern must compile")
});

/// A registration number, trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleNumber(String);

impl VehicleNumber {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let normalized = raw.trim().to_uppercase();
        if !VEHICLE_NUMBER_PATTERN.is_match(&normalized) {
            return Err(AppError::ValidationError(format!(
                "invalid vehicle number `{}`: expected a standard (MH12AA7842) or BH series (22BH1489AA) number",
                raw.trim()
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<VehicleNumber> for String {
    fn from(value: VehicleNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_and_bh_series() {
        assert_eq!(
            VehicleNumber::parse("MH12AA7842").unwrap().as_str(),
            "MH12AA7842"
        );
        assert_eq!(
            VehicleNumber::parse("22BH1489AA").unwrap().as_str(),
            "22BH1489AA"
        );
        assert_eq!(VehicleNumber::parse("KA01A1").unwrap().as_str(), "KA01A1");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(
            VehicleNumber::parse("  mh12aa7842 ").unwrap(),
            VehicleNumber::parse("MH12AA7842").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_numbers() {
        for raw in ["", "MH12", "MH12AAA7842", "MH12AA78421", "22BH148AA", "M-12AA7842"] {
            assert!(
                matches!(VehicleNumber::parse(raw), Err(AppError::ValidationError(_))),
                "{raw} should be rejected"
            );
        }
    }
}
