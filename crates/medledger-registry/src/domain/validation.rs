//! # Input Validation
//!
//! Checks applied before any ledger or blob-store call. Each failure is a
//! `RegistryError::Validation`.

use sha2::{Digest, Sha256};
use shared_types::{AdminProfile, Address};

use super::entities::{NewAdmin, NewPatient};
use super::errors::RegistryError;

/// Required digit count of a patient phone number.
pub const PHONE_NUMBER_DIGITS: usize = 10;

/// Lowest decorative rating.
pub const MIN_DISPLAY_RATING: u8 = 3;

/// Parse a user-supplied address.
pub fn parse_address(field: &str, input: &str) -> Result<Address, RegistryError> {
    input
        .parse::<Address>()
        .map_err(|e| RegistryError::Validation(format!("{field}: {e}")))
}

/// Reject blank text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Document bytes must be non-empty and within the configured limit.
pub fn check_document_size(len: usize, max_bytes: usize) -> Result<(), RegistryError> {
    if len == 0 {
        return Err(RegistryError::Validation("document is empty".to_string()));
    }
    if len > max_bytes {
        return Err(RegistryError::Validation(format!(
            "document is {len} bytes, limit is {max_bytes}"
        )));
    }
    Ok(())
}

pub fn check_new_admin(admin: &NewAdmin) -> Result<(), RegistryError> {
    require_text("name", &admin.name)?;
    require_text("institution", &admin.institution)?;
    require_text("department", &admin.department)?;
    require_text("qualification", &admin.qualification)
}

pub fn check_new_patient(patient: &NewPatient) -> Result<(), RegistryError> {
    require_text("name", &patient.name)?;
    if patient.age == 0 {
        return Err(RegistryError::Validation(
            "age must be a positive number".to_string(),
        ));
    }
    // Checked exactly as it will be submitted.
    let phone = patient.phone_number.as_str();
    if phone.len() != PHONE_NUMBER_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistryError::Validation(format!(
            "phone number must be {PHONE_NUMBER_DIGITS} digits"
        )));
    }
    Ok(())
}

/// Decorative rating in `3..=4`, seeded from the admin's identity so it
/// never changes between listings.
pub fn display_rating(profile: &AdminProfile) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(profile.address.as_bytes());
    hasher.update(profile.admin_id.to_be_bytes());
    let digest = hasher.finalize();
    MIN_DISPLAY_RATING + (digest[0] % 2)
}
