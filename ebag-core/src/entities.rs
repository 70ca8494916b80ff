//! Demo entities served by the system of record.

use serde::{Deserialize, Serialize};

/// Demo row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demo {
    pub id: i64,
    pub info: String,
}

impl Demo {
    pub fn new(id: i64, info: impl Into<String>) -> Self {
        Self {
            id,
            info: info.into(),
        }
    }
}

/// Registered user, optionally attached to a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>, school_id: Option<i64>) -> Self {
        Self {
            id,
            username: username.into(),
            school_id,
        }
    }
}
