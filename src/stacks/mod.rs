//! Stack builders: pure functions from options to ordered descriptors.

pub mod backend;
pub mod frontend;
pub mod naming;
pub mod permissions;
pub mod sizes;

pub use backend::{backend_resources, BackendOptions, DatabaseOptions};
pub use frontend::{frontend_resources, FrontendOptions};
pub use naming::Naming;
pub use permissions::{app_runtime, infra_deployer, PermissionOutputs, PermissionStack};
pub use sizes::SizeTier;

use crate::core::error::{Error, Result};
use crate::core::types::{CloudProvider, Policy, StackConfig, DEFAULT_BUDGET_LIMIT_USD};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Built-in stack templates for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Backend,
    Frontend,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => write!(f, "backend"),
            Self::Frontend => write!(f, "frontend"),
        }
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            other => Err(Error::InvalidConfig(format!(
                "unknown template '{}' (expected backend or frontend)",
                other
            ))),
        }
    }
}

/// Tags every resource of a built stack carries.
pub fn stack_tags(naming: &Naming, component: &str) -> IndexMap<String, String> {
    IndexMap::from([
        ("Project".to_string(), naming.app.clone()),
        ("Stack".to_string(), naming.stack.clone()),
        ("Component".to_string(), component.to_string()),
    ])
}

impl StackConfig {
    /// Render a template's default options into a stack file.
    pub fn from_template(
        template: Template,
        naming: &Naming,
        provider: CloudProvider,
        region: &str,
    ) -> Result<Self> {
        let (resources, description) = match template {
            Template::Backend => (
                backend_resources(naming, provider, &BackendOptions::default())?,
                "Network, load balancer, container service, database, secrets, monitoring",
            ),
            Template::Frontend => (
                frontend_resources(naming, &FrontendOptions::default())?,
                "Static frontend hosting",
            ),
        };
        Ok(Self {
            version: "1.0".to_string(),
            name: format!("{}-{}", template, naming.stack),
            description: Some(description.to_string()),
            provider: provider.to_string(),
            region: region.to_string(),
            tags: stack_tags(naming, &format!("{}-infra", template)),
            budget_limit: DEFAULT_BUDGET_LIMIT_USD,
            policy: Policy::default(),
            resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser;

    #[test]
    fn test_template_parse() {
        assert_eq!("backend".parse::<Template>().unwrap(), Template::Backend);
        assert!("mobile".parse::<Template>().is_err());
    }

    #[test]
    fn test_backend_template_validates() {
        let naming = Naming::new("acme", "shop", "dev");
        let config =
            StackConfig::from_template(Template::Backend, &naming, CloudProvider::Aws, "us-east-1")
                .unwrap();
        assert_eq!(config.name, "backend-dev");
        assert_eq!(config.tags["Component"], "backend-infra");
        assert_eq!(config.resources.len(), 6);
        assert!(parser::validate_config(&config).is_empty());
    }

    #[test]
    fn test_template_yaml_roundtrip() {
        let naming = Naming::new("acme", "shop", "prod");
        let config =
            StackConfig::from_template(Template::Frontend, &naming, CloudProvider::Aws, "us-east-1")
                .unwrap();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed = parser::parse_config(&yaml).unwrap();
        assert_eq!(parsed.resources, config.resources);
        assert_eq!(parsed.tags, config.tags);
    }
}
