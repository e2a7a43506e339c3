//! Non-fatal diagnostics attached to Data API responses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::write_diagnostic;

/// A warning returned from the API, such as a filter on an unindexed column.
///
/// Warnings never fail an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Ordered warnings from one or more responses.
pub type Warnings = Vec<Warning>;

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_diagnostic(
            f,
            self.message.as_deref(),
            "unknown warning",
            [
                ("code", self.error_code.as_deref()),
                ("family", self.family.as_deref()),
                ("scope", self.scope.as_deref()),
            ],
        )
    }
}
