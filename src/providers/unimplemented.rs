//! Placeholder adapter table for providers without an implementation.

use super::ProviderAdapters;
use crate::components::*;
use crate::core::error::{Error, Result};
use crate::core::types::{CloudProvider, ResourceKind};

/// Fails every capability with `NotImplemented`.
#[derive(Debug, Clone, Copy)]
pub struct Unimplemented {
    provider: CloudProvider,
}

impl Unimplemented {
    pub fn new(provider: CloudProvider) -> Self {
        Self { provider }
    }

    fn fail<T>(&self, kind: ResourceKind) -> Result<T> {
        Err(Error::NotImplemented {
            provider: self.provider.display_name().to_string(),
            component: self.component_label(kind),
        })
    }

    /// Component name as reported; frontend hosting names the product that
    /// would back it.
    fn component_label(&self, kind: ResourceKind) -> String {
        match (kind, self.provider) {
            (ResourceKind::FrontendHosting, CloudProvider::Azure) => {
                format!("{} (Static Web Apps)", kind)
            }
            (ResourceKind::FrontendHosting, CloudProvider::Gcp) => {
                format!("{} (Firebase Hosting)", kind)
            }
            _ => kind.to_string(),
        }
    }
}

impl ProviderAdapters for Unimplemented {
    fn provider(&self) -> CloudProvider {
        self.provider
    }

    fn ensure_supported(&self, kind: ResourceKind) -> Result<()> {
        self.fail(kind)
    }

    fn network(&mut self, _: &NetworkArgs) -> Result<NetworkOutputs> {
        self.fail(ResourceKind::Network)
    }

    fn load_balancer(&mut self, _: &LoadBalancerArgs) -> Result<LoadBalancerOutputs> {
        self.fail(ResourceKind::LoadBalancer)
    }

    fn container_service(&mut self, _: &ContainerServiceArgs) -> Result<ContainerServiceOutputs> {
        self.fail(ResourceKind::ContainerService)
    }

    fn database(&mut self, _: &DatabaseArgs) -> Result<DatabaseOutputs> {
        self.fail(ResourceKind::Database)
    }

    fn secrets(&mut self, _: &SecretsArgs) -> Result<SecretsOutputs> {
        self.fail(ResourceKind::Secrets)
    }

    fn monitoring(&mut self, _: &MonitoringArgs) -> Result<MonitoringOutputs> {
        self.fail(ResourceKind::Monitoring)
    }

    fn firewall(&mut self, _: &FirewallArgs) -> Result<FirewallOutputs> {
        self.fail(ResourceKind::Firewall)
    }

    fn dns(&mut self, _: &DnsArgs) -> Result<DnsOutputs> {
        self.fail(ResourceKind::Dns)
    }

    fn cdn(&mut self, _: &CdnArgs) -> Result<CdnOutputs> {
        self.fail(ResourceKind::Cdn)
    }

    fn frontend_hosting(&mut self, _: &FrontendHostingArgs) -> Result<FrontendHostingOutputs> {
        self.fail(ResourceKind::FrontendHosting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn meta(provider: CloudProvider) -> ComponentMeta {
        ComponentMeta {
            name: "x".into(),
            provider,
            region: "westeurope".into(),
            tags: IndexMap::new(),
        }
    }

    #[test]
    fn test_every_capability_fails() {
        let mut t = Unimplemented::new(CloudProvider::Gcp);
        let m = meta(CloudProvider::Gcp);
        let errors = [
            t.secrets(&SecretsArgs { meta: m.clone() }).unwrap_err(),
            t.monitoring(&MonitoringArgs {
                meta: m.clone(),
                log_retention_days: 7,
            })
            .unwrap_err(),
            t.dns(&DnsArgs {
                meta: m.clone(),
                domain: "example.com".into(),
                target_value: None,
            })
            .unwrap_err(),
            t.cdn(&CdnArgs {
                meta: m.clone(),
                origin_url_or_id: "https://x".into(),
            })
            .unwrap_err(),
        ];
        for e in errors {
            assert!(matches!(e, Error::NotImplemented { .. }));
            assert!(e.to_string().starts_with("GCP adapter for "));
        }
    }

    #[test]
    fn test_frontend_labels_name_product() {
        let azure = Unimplemented::new(CloudProvider::Azure);
        assert_eq!(
            azure.component_label(ResourceKind::FrontendHosting),
            "frontendHosting (Static Web Apps)"
        );
        let gcp = Unimplemented::new(CloudProvider::Gcp);
        assert_eq!(
            gcp.component_label(ResourceKind::FrontendHosting),
            "frontendHosting (Firebase Hosting)"
        );
        assert_eq!(gcp.component_label(ResourceKind::LoadBalancer), "loadBalancer");
    }

    #[test]
    fn test_azure_frontend_message() {
        let mut t = Unimplemented::new(CloudProvider::Azure);
        let err = t
            .frontend_hosting(&FrontendHostingArgs {
                meta: meta(CloudProvider::Azure),
                repo_url: None,
                branch: "main".into(),
                framework: "React".into(),
                access_token: None,
                app_root: None,
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Azure adapter for frontendHosting (Static Web Apps) is not implemented"
        );
    }
}
