use shared::error::{AppError, AppResult};

const PINCODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pincode(String);

impl Pincode {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != PINCODE_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::ValidationError(format!(
                "pincode must be exactly {PINCODE_LEN} digits: `{trimmed}`"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Pincode> for String {
    fn from(value: Pincode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digits_only() {
        assert_eq!(Pincode::parse(" 400001 ").unwrap().as_str(), "400001");
        assert!(Pincode::parse("40001").is_err());
        assert!(Pincode::parse("4000011").is_err());
        assert!(Pincode::parse("40O001").is_err());
    }
}
