//! Supported currency table
//!
//! Static lookup consulted by the transport layer and by account creation.

use std::fmt;

/// Currency codes known to the ledger.
///
/// `YEN` is declared for completeness but is not accepted for new accounts.
pub mod codes {
    pub const EUR: &str = "EUR";
    pub const CAD: &str = "CAD";
    pub const USD: &str = "USD";
    pub const GBP: &str = "GBP";
    pub const GHS: &str = "GHS";
    pub const NGN: &str = "NGN";
    pub const KES: &str = "KES";
    pub const FCFA: &str = "FCFA";
    pub const ZAR: &str = "ZAR";
    pub const YEN: &str = "YEN";
    pub const CNY: &str = "CNY";
}

const SUPPORTED: &[&str] = &[
    codes::EUR,
    codes::CAD,
    codes::USD,
    codes::GBP,
    codes::GHS,
    codes::NGN,
    codes::KES,
    codes::FCFA,
    codes::ZAR,
    codes::CNY,
];

/// Returns true if accounts may be opened in `currency`.
///
/// Matching is exact: codes are uppercase.
pub fn is_supported(currency: &str) -> bool {
    SUPPORTED.contains(&currency)
}

/// Validated currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Currency(String);

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Unsupported currency: '{0}'")]
pub struct UnsupportedCurrency(pub String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, UnsupportedCurrency> {
        if is_supported(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(UnsupportedCurrency(code.to_string()))
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field validator for request DTOs (`#[validate(custom(function = ...))]`)
pub fn validate_currency(currency: &str) -> Result<(), validator::ValidationError> {
    if is_supported(currency) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("currency");
        err.message = Some(format!("unsupported currency '{}'", currency).into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_currencies() {
        assert!(is_supported("USD"));
        assert!(is_supported("FCFA"));
        assert!(is_supported("CNY"));
        assert_eq!(SUPPORTED.len(), 10);
    }

    #[test]
    fn test_yen_declared_but_unsupported() {
        assert!(!is_supported(codes::YEN));
    }

    #[test]
    fn test_lowercase_rejected() {
        assert!(!is_supported("usd"));
        assert_eq!(
            Currency::new("usd"),
            Err(UnsupportedCurrency("usd".to_string()))
        );
    }

    #[test]
    fn test_currency_display() {
        let c = Currency::new("GHS").unwrap();
        assert_eq!(c.to_string(), "GHS");
    }

    #[test]
    fn test_validate_currency_fn() {
        assert!(validate_currency("EUR").is_ok());
        let err = validate_currency("XXX").unwrap_err();
        assert_eq!(err.code, "currency");
    }
}
