//! Abstract size tiers and their per-provider database classes.

use crate::core::error::{Error, Result};
use crate::core::types::CloudProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    #[default]
    Micro,
    Small,
    Medium,
}

impl SizeTier {
    /// Managed database class for the tier.
    pub fn db_size(&self, provider: CloudProvider) -> &'static str {
        match (provider, self) {
            (CloudProvider::Aws, Self::Micro) => "db.t3.micro",
            (CloudProvider::Aws, Self::Small) => "db.t3.small",
            (CloudProvider::Aws, Self::Medium) => "db.t3.medium",
            (CloudProvider::Azure, Self::Micro) => "B_Standard_B1ms",
            (CloudProvider::Azure, Self::Small) => "B_Standard_B2s",
            (CloudProvider::Azure, Self::Medium) => "GP_Standard_D2s_v3",
            (CloudProvider::Gcp, Self::Micro) => "db-f1-micro",
            (CloudProvider::Gcp, Self::Small) => "db-g1-small",
            (CloudProvider::Gcp, Self::Medium) => "db-custom-1-3840",
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Micro => write!(f, "micro"),
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

impl FromStr for SizeTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            other => Err(Error::InvalidConfig(format!(
                "unknown size tier '{}' (expected micro, small or medium)",
                other
            ))),
        }
    }
}
