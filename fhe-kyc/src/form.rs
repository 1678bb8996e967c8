//! KYC form fields and their mapping to the encrypted plaintexts.

use crate::constants::{
    DOCUMENT_TYPE_FALLBACK, DOCUMENT_TYPES, MIN_AGE, NATIONALITIES, NATIONALITY_OTHER,
};
use crate::error::{KycError, KycResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// What the user typed. Name and email never leave the client; only the derived age and the
/// two codes are encrypted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycFormState {
    pub full_name: String,
    pub email: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub nationality: String,
    pub document_type: String,
}

/// Plaintexts handed to the encrypted-input builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KycAttributes {
    pub age: u32,
    pub nationality: u8,
    pub document_type: u8,
}

pub fn nationality_code(label: &str) -> u8 {
    NATIONALITIES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, c)| *c)
        .unwrap_or(NATIONALITY_OTHER)
}

pub fn document_type_code(label: &str) -> u8 {
    DOCUMENT_TYPES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, c)| *c)
        .unwrap_or(DOCUMENT_TYPE_FALLBACK)
}

/// Whole years elapsed between `birth` and `today`; negative if `birth` is in the future.
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

impl KycFormState {
    pub fn birth_date(&self) -> KycResult<NaiveDate> {
        NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").map_err(|_| {
            KycError::InvalidForm(format!(
                "date of birth must be YYYY-MM-DD, got {:?}",
                self.date_of_birth
            ))
        })
    }

    pub fn validate(&self) -> KycResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(KycError::InvalidForm("full name is required".to_string()));
        }

        let email = self.email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
            None => false,
        };
        if !valid_email {
            return Err(KycError::InvalidForm("a valid email address is required".to_string()));
        }

        self.birth_date()?;
        Ok(())
    }

    pub fn age_on(&self, today: NaiveDate) -> KycResult<u32> {
        let birth = self.birth_date()?;
        if birth > today {
            return Err(KycError::InvalidForm("date of birth is in the future".to_string()));
        }
        Ok(calculate_age(birth, today) as u32)
    }

    /// Validate the form and derive the plaintexts, enforcing the minimum age.
    pub fn attributes_on(&self, today: NaiveDate) -> KycResult<KycAttributes> {
        self.validate()?;

        let age = self.age_on(today)?;
        if age < MIN_AGE {
            return Err(KycError::AgeRequirement { age, min_age: MIN_AGE });
        }

        Ok(KycAttributes {
            age,
            nationality: nationality_code(&self.nationality),
            document_type: document_type_code(&self.document_type),
        })
    }
}
