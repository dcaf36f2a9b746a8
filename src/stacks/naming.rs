//! Resource naming: `org-app-stack-logical-hhhh`.

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};

/// Naming context threaded explicitly into every builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    pub org: String,
    pub app: String,
    pub stack: String,
}

impl Naming {
    pub fn new(org: impl Into<String>, app: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            app: app.into(),
            stack: stack.into(),
        }
    }

    /// Standard name and `Name` tag for a logical resource. The suffix is the
    /// first four hex chars of `sha256("<stack>-<logical>")`.
    pub fn name_tag(&self, logical: &str) -> String {
        let digest = Sha256::digest(format!("{}-{}", self.stack, logical).as_bytes());
        format!(
            "{}-{}-{}-{}-{:02x}{:02x}",
            self.org, self.app, self.stack, logical, digest[0], digest[1]
        )
    }

    /// Stacks that never carry production-only resources.
    pub fn is_non_production(&self) -> bool {
        matches!(self.stack.as_str(), "dev" | "staging")
    }
}
