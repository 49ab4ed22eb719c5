//! Bulk employee import.
//!
//! Rows arrive as JSON field maps (already parsed from the uploaded file).
//! The whole batch is validated before anything is written: required fields,
//! field formats, and duplicate emails across all rows.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;

use hrspace_auth::Role;
use hrspace_core::{DomainError, Email, EmployeeId};

use crate::{NewEmployee, PersonalDetails};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("import batch is empty")]
    EmptyBatch,

    #[error("row {row}: expected an object of fields")]
    NotAnObject { row: usize },

    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: invalid '{field}': {reason}")]
    InvalidField {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("duplicate email '{email}' in rows {first} and {second}")]
    DuplicateEmail {
        email: String,
        first: usize,
        second: usize,
    },
}

impl From<ImportError> for DomainError {
    fn from(value: ImportError) -> Self {
        DomainError::validation(value.to_string())
    }
}

/// Validate a batch of rows into employee drafts (rows are numbered from 1).
pub fn parse_batch(rows: &[Value]) -> Result<Vec<NewEmployee>, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::EmptyBatch);
    }

    let mut seen: HashMap<Email, usize> = HashMap::new();
    let mut drafts = Vec::with_capacity(rows.len());

    for (index, value) in rows.iter().enumerate() {
        let row = index + 1;
        let Value::Object(fields) = value else {
            return Err(ImportError::NotAnObject { row });
        };

        let draft = parse_row(row, fields)?;
        if let Some(first) = seen.insert(draft.email.clone(), row) {
            return Err(ImportError::DuplicateEmail {
                email: draft.email.to_string(),
                first,
                second: row,
            });
        }
        drafts.push(draft);
    }

    Ok(drafts)
}

fn parse_row(row: usize, fields: &Map<String, Value>) -> Result<NewEmployee, ImportError> {
    let cells = Cells { row, fields };

    let name = cells.required("name")?;
    let email = cells.required("email")?;
    let email = Email::parse(&email).map_err(|e| cells.invalid("email", e))?;
    let role: Role = cells.required("role")?.parse().map_err(|e| cells.invalid("role", e))?;

    let mut draft = NewEmployee::new(name, email, role);
    draft.password = cells.text("password");
    draft.title = cells.text("title");
    draft.onboard_date = cells.date("onboardDate")?;
    draft.department = cells.parsed("department")?;
    draft.employment_type = cells.parsed("employmentType")?;
    if let Some(status) = cells.parsed("employmentStatus")? {
        draft.employment_status = status;
    }
    draft.line_manager_id = cells.parsed::<EmployeeId>("lineManager")?;
    draft.personal = PersonalDetails {
        gross_salary: cells.parsed("grossSalary")?,
        gender: cells.parsed("gender")?,
        birthday: cells.date("birthday")?,
        phone: cells.text("phone"),
        personal_email: cells.text("personalEmail"),
        permanent_address: cells.text("permanentAdd"),
        city: cells.text("perAddCity"),
    };

    Ok(draft)
}

/// Accessor over one row. Empty cells read as absent.
struct Cells<'a> {
    row: usize,
    fields: &'a Map<String, Value>,
}

impl Cells<'_> {
    fn text(&self, field: &str) -> Option<String> {
        let text = match self.fields.get(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn required(&self, field: &'static str) -> Result<String, ImportError> {
        self.text(field).ok_or(ImportError::MissingField {
            row: self.row,
            field,
        })
    }

    fn parsed<T>(&self, field: &'static str) -> Result<Option<T>, ImportError>
    where
        T: core::str::FromStr,
        T::Err: core::fmt::Display,
    {
        self.text(field)
            .map(|raw| raw.parse::<T>().map_err(|e| self.invalid(field, e)))
            .transpose()
    }

    fn date(&self, field: &'static str) -> Result<Option<NaiveDate>, ImportError> {
        self.text(field)
            .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| self.invalid(field, e)))
            .transpose()
    }

    fn invalid(&self, field: &'static str, reason: impl core::fmt::Display) -> ImportError {
        ImportError::InvalidField {
            row: self.row,
            field,
            reason: reason.to_string(),
        }
    }
}
