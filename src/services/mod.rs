//! Business services. Each service owns an `Arc<DatabaseConnection>` and is
//! cheap to clone.

pub mod accounts;
pub mod addresses;
pub mod catalog;
pub mod dashboard;
pub mod interactions;
pub mod orders;
pub mod ratings;
pub mod relationships;
pub mod wishlist;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects strings that are empty once trimmed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Clamps a caller supplied page size.
pub(crate) fn page_window(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let limit = limit.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    ((page - 1) * limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_and_negative_checks() {
        assert!(not_blank("Widget").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(non_negative(&dec!(0)).is_ok());
        assert!(non_negative(&dec!(9.99)).is_ok());
        assert!(non_negative(&dec!(-0.01)).is_err());
    }

    #[test]
    fn page_window_bounds() {
        assert_eq!(page_window(None, None), (0, 20));
        assert_eq!(page_window(Some(3), Some(10)), (20, 10));
        assert_eq!(page_window(Some(0), Some(1000)), (0, 100));
    }
}
