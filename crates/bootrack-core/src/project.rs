//! Project type.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, validate_project_code};

/// A project groups issues under a short human-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub code: String,
}

impl Project {
    /// Creates an unsaved project after checking its code.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        validate_project_code(&code)?;
        Ok(Self {
            id: 0,
            name: name.into(),
            code,
        })
    }

    /// Generated code of issue `number` in this project.
    pub fn issue_code(&self, number: i64) -> String {
        format!("{}-{number}", self.code)
    }
}
