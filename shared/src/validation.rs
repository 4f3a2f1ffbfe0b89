//! Validation utilities for the Beverage Distribution Manager
//!
//! Form-level checks shared by the backend and the browser.

use rust_decimal::Decimal;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

// ============================================================================
// Account Validations
// ============================================================================

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============================================================================
// Master Data Validations
// ============================================================================

/// Validate a user-chosen identifier (roles, sites, beverage types):
/// 2-32 characters of ASCII letters, digits, '-' or '_'
pub fn validate_identifier(id: &str) -> Result<(), &'static str> {
    if id.len() < 2 {
        return Err("Identifier must be at least 2 characters");
    }
    if id.len() > 32 {
        return Err("Identifier must be at most 32 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Identifier may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}

/// Validate a required display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Validate SAP/SKU code format (non-empty, no whitespace)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.is_empty() {
        return Err("SKU is required");
    }
    if sku.chars().any(char::is_whitespace) {
        return Err("SKU cannot contain spaces");
    }
    if sku.len() > 40 {
        return Err("SKU must be at most 40 characters");
    }
    Ok(())
}

pub fn validate_units_per_box(units_per_box: i32) -> Result<(), &'static str> {
    if units_per_box <= 0 {
        return Err("Units per box must be greater than zero");
    }
    Ok(())
}

pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    // NUMERIC(12, 2)
    if price > Decimal::new(999_999_999_999, 2) {
        return Err("Unit price is too large");
    }
    Ok(())
}
