//! Frontend stack: static hosting, optional DNS zone and edge firewall
//! attached to the hosting app.

use super::naming::Naming;
use crate::core::error::{Error, Result};
use crate::core::types::{ResourceDescriptor, ResourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendOptions {
    pub domain: String,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    /// Repository token; required with `repo_url`
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    /// Monorepo subdirectory; empty means repository root
    #[serde(default)]
    pub app_root: Option<String>,
    #[serde(default)]
    pub enable_dns: bool,
    /// Ignored for dev and staging stacks
    #[serde(default)]
    pub enable_waf: bool,
    /// Create the firewall without attaching it to the hosting app
    #[serde(default)]
    pub skip_waf_association: bool,
}

/// Frontend descriptors in creation order.
pub fn frontend_resources(naming: &Naming, options: &FrontendOptions) -> Result<Vec<ResourceDescriptor>> {
    if options.repo_url.is_some() && options.access_token.is_none() {
        return Err(Error::InvalidConfig(format!(
            "stack '{}': repoUrl is set but no access token was provided",
            naming.stack
        )));
    }
    let app_root = options.app_root.as_deref().filter(|r| !r.is_empty());

    let mut resources = vec![
        ResourceDescriptor::new(ResourceKind::FrontendHosting, naming.name_tag("frontend"))
            .with_key("frontendHosting")
            .field_opt("repoUrl", options.repo_url.as_deref())
            .field_opt("branch", options.branch.as_deref())
            .field_opt("framework", options.framework.as_deref())
            .field_opt("accessToken", options.access_token.as_deref())
            .field_opt("appRoot", app_root),
    ];

    if options.enable_dns {
        if options.domain.trim().is_empty() {
            return Err(Error::InvalidConfig("enableDns requires a domain".to_string()));
        }
        resources.push(
            ResourceDescriptor::new(ResourceKind::Dns, naming.name_tag("frontend-dns"))
                .with_key("dns")
                .field("domain", options.domain.as_str()),
        );
    }

    if options.enable_waf && !naming.is_non_production() {
        let mut firewall =
            ResourceDescriptor::new(ResourceKind::Firewall, naming.name_tag("frontend-waf"))
                .with_key("firewall")
                .field("scope", "global");
        if !options.skip_waf_association {
            firewall = firewall.reference("resourceArn", "frontendHosting.appArn");
        }
        resources.push(firewall);
    } else if options.enable_waf {
        tracing::info!(stack = %naming.stack, "firewall skipped for non-production stack");
    }

    Ok(resources)
}
