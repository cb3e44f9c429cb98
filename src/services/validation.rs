//! Validation gateway.
//!
//! Turns the raw checkout form into a typed request, or a list of every
//! violated field. Existence of the referenced address and shift is a
//! separate stage owned by the orchestrator; this module only checks shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::Violation;

/// Letters of any script (right-to-left included), combining marks, spaces
/// and common name punctuation. Control characters and symbols fail.
static DISPLAY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}][\p{L}\p{M} .,'’-]{1,49}$").expect("valid regex"));

/// Loose international shape before whitespace stripping: optional leading
/// `+`, then digits, spaces, hyphens, parentheses.
static PHONE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-()]*$").expect("valid regex"));

/// The raw checkout form as submitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutInput {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        regex(
            path = "DISPLAY_NAME_RE",
            message = "Name may only contain letters, spaces and common punctuation"
        )
    )]
    pub full_name: String,

    #[validate(
        regex(path = "PHONE_SHAPE_RE", message = "Phone number format is not recognized"),
        custom = "validate_phone_length"
    )]
    pub phone: String,

    #[validate(length(min = 1, message = "Please select a delivery address"))]
    pub address_id: String,

    #[validate(length(min = 1, message = "Please select a delivery shift"))]
    pub shift_id: String,

    pub payment_method: String,

    /// Retained for older storefront clients that still submit it; the flag
    /// is recorded as-is and not enforced.
    #[serde(default)]
    pub accepted_terms: Option<bool>,
}

/// Accepted payment labels. Anything else is a validation failure, never a
/// silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
    Wallet,
}

/// A checkout request that passed the gateway: phone normalized, identifiers
/// parsed, payment method typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub phone: String,
    pub address_id: Uuid,
    pub shift_id: Uuid,
    pub payment_method: PaymentMethod,
    pub accepted_terms: Option<bool>,
}

fn strip_whitespace(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

fn validate_phone_length(phone: &str) -> Result<(), ValidationError> {
    let stripped = strip_whitespace(phone);
    if (10..=15).contains(&stripped.chars().count()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_length");
        err.message = Some("Phone number must be 10 to 15 characters".into());
        Err(err)
    }
}

/// Validate and normalize. Collects every violation across both the derive
/// rules and the typed conversions; the list is sorted by field so callers
/// see a stable order.
pub fn validate(input: CheckoutInput) -> Result<CheckoutRequest, Vec<Violation>> {
    let mut violations: Vec<Violation> = Vec::new();

    if let Err(errors) = Validate::validate(&input) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                violations.push(Violation::new(field, message));
            }
        }
    }

    let address_id = parse_reference(&input.address_id, "address_id", &mut violations);
    let shift_id = parse_reference(&input.shift_id, "shift_id", &mut violations);

    let payment_method = match PaymentMethod::from_str(&input.payment_method) {
        Ok(method) => Some(method),
        Err(_) => {
            violations.push(Violation::new(
                "payment_method",
                "Unknown payment method".to_string(),
            ));
            None
        }
    };

    match (address_id, shift_id, payment_method) {
        (Some(address_id), Some(shift_id), Some(payment_method)) if violations.is_empty() => {
            Ok(CheckoutRequest {
                full_name: input.full_name.trim().to_string(),
                phone: strip_whitespace(&input.phone),
                address_id,
                shift_id,
                payment_method,
                accepted_terms: input.accepted_terms,
            })
        }
        _ => {
            violations
                .sort_by(|a, b| a.field.cmp(b.field).then_with(|| a.message.cmp(&b.message)));
            Err(violations)
        }
    }
}

fn parse_reference(
    raw: &str,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<Uuid> {
    if raw.is_empty() {
        // The emptiness violation is already on the list.
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            violations.push(Violation::new(field, format!("{field} is not a valid reference")));
            None
        }
    }
}
