// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead form validator.
//!
//! Implements the client-side checks run on every keystroke and again on
//! submit:
//! - HTML metacharacter sanitization
//! - Name, email and phone number format rules
//! - Consent presence
//!
//! Validation never fails hard: bad input always yields a descriptive
//! [`ValidationError`], never a panic or an `Err`.

use crate::config::ValidationConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\s'\-]+$").expect("name pattern compiles"));

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static DEFAULT_VALIDATOR: Lazy<LeadValidator> =
    Lazy::new(|| LeadValidator::new(ValidationConfig::default()));

/// A lead form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Email,
    PhoneNumber,
    Consent,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::PhoneNumber, Field::Consent];

    /// Form-side field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::PhoneNumber => "phoneNumber",
            Field::Consent => "consent",
        }
    }

    /// Label used in user-facing messages.
    fn label(&self) -> &'static str {
        match self {
            Field::Name => "nombre",
            Field::Email => "email",
            Field::PhoneNumber => "teléfono",
            Field::Consent => "consentimiento",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = ();

    /// Accepts the form names plus the backend's `phone` alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "phoneNumber" | "phone" => Ok(Field::PhoneNumber),
            "consent" => Ok(Field::Consent),
            _ => Err(()),
        }
    }
}

/// Current value of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    /// Truthiness as the form sees it: a checked box or any non-empty text.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Flag(b) => *b,
        }
    }

    /// Sanitized copy; flags pass through unchanged.
    pub fn sanitized(&self) -> FieldValue {
        match self {
            FieldValue::Text(s) => FieldValue::Text(sanitize(s)),
            FieldValue::Flag(b) => FieldValue::Flag(*b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Snapshot of the lead form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub consent: bool,
    /// Honeypot. Real visitors never see it, so it stays empty.
    #[serde(default)]
    pub website: String,
}

impl LeadForm {
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::Email => FieldValue::Text(self.email.clone()),
            Field::PhoneNumber => FieldValue::Text(self.phone_number.clone()),
            Field::Consent => FieldValue::Flag(self.consent),
        }
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::Consent, value) => self.consent = value.is_truthy(),
            (Field::Name, FieldValue::Text(s)) => self.name = s,
            (Field::Email, FieldValue::Text(s)) => self.email = s,
            (Field::PhoneNumber, FieldValue::Text(s)) => self.phone_number = s,
            (field, FieldValue::Flag(_)) => {
                debug!(field = field.as_str(), "Ignoring flag value for text field");
            }
        }
    }
}

/// Reason a field value was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El campo {field} es obligatorio")]
    Required { field: Field },

    #[error("El {field} debe tener entre {min} y {max} caracteres")]
    Length { field: Field, min: usize, max: usize },

    #[error("El {field} debe tener al menos {min} dígitos")]
    TooShort { field: Field, min: usize },

    #[error("El {field} no puede superar {max} caracteres")]
    TooLong { field: Field, max: usize },

    #[error("El formato del {field} no es válido")]
    InvalidFormat { field: Field },

    #[error("Debes aceptar el tratamiento de tus datos para continuar")]
    ConsentRequired,

    /// Rejection reported by the backend for this field.
    #[error("{message}")]
    Server { field: Field, message: String },
}

/// Per-field validation errors. An empty result means the form is submittable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: BTreeMap<Field, ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    /// Record `error` for `field`, or clear it when `None`.
    pub fn set(&mut self, field: Field, error: Option<ValidationError>) {
        match error {
            Some(err) => {
                self.errors.insert(field, err);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &ValidationError)> {
        self.errors.iter()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.errors.keys().copied().collect()
    }
}

impl FromIterator<(Field, ValidationError)> for ValidationResult {
    fn from_iter<I: IntoIterator<Item = (Field, ValidationError)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, err) in &self.errors {
            map.serialize_entry(field.as_str(), &err.to_string())?;
        }
        map.end()
    }
}

/// Escape HTML metacharacters.
///
/// `&` is left alone, so running this over already sanitized text changes
/// nothing.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Validate one field by its form name. Unknown names are accepted.
pub fn validate_field(name: &str, value: &FieldValue) -> Option<ValidationError> {
    match name.parse::<Field>() {
        Ok(field) => DEFAULT_VALIDATOR.validate_field(field, value),
        Err(()) => {
            debug!(field = %name, "Unknown field, skipping validation");
            None
        }
    }
}

/// Validate the whole form with the default limits.
pub fn validate_form(form: &LeadForm) -> ValidationResult {
    DEFAULT_VALIDATOR.validate_form(form)
}

/// Lead form validator with configurable limits.
#[derive(Debug, Clone)]
pub struct LeadValidator {
    config: ValidationConfig,
}

impl LeadValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate_field(&self, field: Field, value: &FieldValue) -> Option<ValidationError> {
        let result = match field {
            Field::Name => self.validate_name(value),
            Field::Email => self.validate_email(value),
            Field::PhoneNumber => self.validate_phone(value),
            Field::Consent => {
                if value.is_truthy() {
                    None
                } else {
                    Some(ValidationError::ConsentRequired)
                }
            }
        };

        if let Some(err) = &result {
            debug!(field = field.as_str(), error = %err, "Field invalid");
        }
        result
    }

    pub fn validate_form(&self, form: &LeadForm) -> ValidationResult {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                self.validate_field(field, &form.value(field))
                    .map(|err| (field, err))
            })
            .collect()
    }

    fn validate_name(&self, value: &FieldValue) -> Option<ValidationError> {
        let field = Field::Name;
        let Some(raw) = value.as_text() else {
            return Some(ValidationError::InvalidFormat { field });
        };

        let name = raw.trim();
        if name.is_empty() {
            return Some(ValidationError::Required { field });
        }

        let len = name.chars().count();
        if len < self.config.name_min_len || len > self.config.name_max_len {
            return Some(ValidationError::Length {
                field,
                min: self.config.name_min_len,
                max: self.config.name_max_len,
            });
        }

        if !NAME_PATTERN.is_match(name) {
            return Some(ValidationError::InvalidFormat { field });
        }

        None
    }

    fn validate_email(&self, value: &FieldValue) -> Option<ValidationError> {
        let field = Field::Email;
        let Some(raw) = value.as_text() else {
            return Some(ValidationError::InvalidFormat { field });
        };

        let email = raw.trim();
        if email.is_empty() {
            return Some(ValidationError::Required { field });
        }

        if !EMAIL_PATTERN.is_match(email) {
            return Some(ValidationError::InvalidFormat { field });
        }

        if email.chars().count() > self.config.email_max_len {
            return Some(ValidationError::TooLong {
                field,
                max: self.config.email_max_len,
            });
        }

        None
    }

    fn validate_phone(&self, value: &FieldValue) -> Option<ValidationError> {
        let field = Field::PhoneNumber;
        let Some(raw) = value.as_text() else {
            return Some(ValidationError::InvalidFormat { field });
        };

        if raw.trim().is_empty() {
            return Some(ValidationError::Required { field });
        }

        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        if cleaned.len() < self.config.phone_min_digits {
            return Some(ValidationError::TooShort {
                field,
                min: self.config.phone_min_digits,
            });
        }

        if !cleaned.starts_with(|c: char| c == '+' || c.is_ascii_digit()) {
            return Some(ValidationError::InvalidFormat { field });
        }

        if raw.chars().count() > self.config.phone_max_len {
            return Some(ValidationError::TooLong {
                field,
                max: self.config.phone_max_len,
            });
        }

        None
    }
}
