//! Ghanaian phone number validation, normalization, and mobile-money
//! provider detection.
//!
//! Exactly one implementation of these rules exists; the payment-method
//! registry and the checkout flow both call into this module so manual
//! entry and checkout-triggered saves can never disagree.

use std::fmt;

/// Mobile-money provider inferred from a phone number prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MomoProvider {
    /// MTN Mobile Money
    Mtn,
    /// Telecel Cash
    Telecel,
    /// AT Money
    AirtelTigo,
    /// Valid number with no recognised provider prefix
    Unknown,
}

impl MomoProvider {
    /// Customer-facing label stored on the payment method.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mtn => "MTN Mobile Money",
            Self::Telecel => "Telecel Cash",
            Self::AirtelTigo => "AT Money",
            Self::Unknown => "Mobile Money",
        }
    }
}

impl fmt::Display for MomoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Checks a number against the local format: `0`, then `2`, `3`, or `5`,
/// then eight more digits.
#[must_use]
pub fn is_valid_local_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let mut chars = phone.chars();
    phone.len() == 10
        && chars.next() == Some('0')
        && matches!(chars.next(), Some('2' | '3' | '5'))
        && chars.all(|c| c.is_ascii_digit())
}

/// Converts a number to the local `0XXXXXXXXX` form.
///
/// Accepts local input as-is and international input with or without a
/// leading `+`. Returns `None` for anything that is not a valid Ghanaian
/// mobile number.
#[must_use]
pub fn to_local(phone: &str) -> Option<String> {
    let phone = phone.trim();
    let phone = phone.strip_prefix('+').unwrap_or(phone);
    if is_valid_local_phone(phone) {
        return Some(phone.to_string());
    }
    if phone.len() == 12 && phone.starts_with("233") && phone.chars().all(|c| c.is_ascii_digit()) {
        let local = format!("0{}", &phone[3..]);
        if is_valid_local_phone(&local) {
            return Some(local);
        }
    }
    None
}

/// Converts a number to the international MSISDN form the payment gateway
/// expects: `233` followed by the trailing nine digits, no `+`.
#[must_use]
pub fn normalize_msisdn(phone: &str) -> Option<String> {
    to_local(phone).map(|local| format!("233{}", &local[1..]))
}

/// Infers the mobile-money provider from the first three digits of the
/// local form.
///
/// Numbers that do not parse at all map to [`MomoProvider::Unknown`], which
/// carries the generic label.
#[must_use]
pub fn detect_provider(phone: &str) -> MomoProvider {
    let Some(local) = to_local(phone) else {
        return MomoProvider::Unknown;
    };
    match &local[..3] {
        "024" | "025" | "053" | "054" | "055" | "059" => MomoProvider::Mtn,
        "020" | "050" => MomoProvider::Telecel,
        "026" | "027" | "056" | "057" => MomoProvider::AirtelTigo,
        _ => MomoProvider::Unknown,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_local_numbers() {
        for phone in ["0241234567", "0501234567", "0271234567", "0301234567"] {
            assert!(is_valid_local_phone(phone), "{phone} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        for phone in [
            "024123456",    // too short
            "02412345678",  // too long
            "1241234567",   // does not start with 0
            "0941234567",   // second digit out of range
            "024123456a",   // non-digit
            "",
        ] {
            assert!(!is_valid_local_phone(phone), "{phone} should be invalid");
        }
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(is_valid_local_phone("  0241234567  "));
    }

    #[test]
    fn normalizes_local_to_msisdn() {
        assert_eq!(
            normalize_msisdn("0241234567").as_deref(),
            Some("233241234567")
        );
    }

    #[test]
    fn accepts_international_input() {
        assert_eq!(
            normalize_msisdn("233241234567").as_deref(),
            Some("233241234567")
        );
        assert_eq!(
            normalize_msisdn("+233241234567").as_deref(),
            Some("233241234567")
        );
        assert_eq!(to_local("233241234567").as_deref(), Some("0241234567"));
    }

    #[test]
    fn rejects_unnormalizable_input() {
        assert_eq!(normalize_msisdn("not a phone"), None);
        assert_eq!(normalize_msisdn("23324123456"), None); // 11 digits
        assert_eq!(normalize_msisdn("441234567890"), None); // wrong country
    }

    #[test]
    fn detects_every_mtn_prefix() {
        for prefix in ["024", "025", "053", "054", "055", "059"] {
            let phone = format!("{prefix}1234567");
            assert_eq!(detect_provider(&phone), MomoProvider::Mtn, "{phone}");
        }
    }

    #[test]
    fn detects_every_telecel_prefix() {
        for prefix in ["020", "050"] {
            let phone = format!("{prefix}1234567");
            assert_eq!(detect_provider(&phone), MomoProvider::Telecel, "{phone}");
        }
    }

    #[test]
    fn detects_every_at_prefix() {
        for prefix in ["026", "027", "056", "057"] {
            let phone = format!("{prefix}1234567");
            assert_eq!(detect_provider(&phone), MomoProvider::AirtelTigo, "{phone}");
        }
    }

    #[test]
    fn unlisted_prefix_gets_generic_label() {
        assert_eq!(detect_provider("0301234567"), MomoProvider::Unknown);
        assert_eq!(detect_provider("0301234567").label(), "Mobile Money");
    }

    #[test]
    fn detection_works_on_international_form() {
        assert_eq!(detect_provider("233241234567"), MomoProvider::Mtn);
        assert_eq!(detect_provider("+233501234567"), MomoProvider::Telecel);
    }

    #[test]
    fn garbage_maps_to_unknown() {
        assert_eq!(detect_provider("hello"), MomoProvider::Unknown);
    }
}
