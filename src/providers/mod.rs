//! Provider adapter registry.
//!
//! Each provider exposes the same ten component capabilities through
//! [`ProviderAdapters`]. AWS is the only working table; Azure and GCP are
//! [`Unimplemented`] stand-ins that fail on every call.

pub mod aws;
pub mod unimplemented;

pub use aws::AwsAdapters;
pub use unimplemented::Unimplemented;

use crate::components::*;
use crate::core::error::Result;
use crate::core::types::{CloudProvider, Declaration, ResourceKind};

/// One provider's table of component creators.
///
/// Adapters run strictly one at a time; `&mut self` lets an implementation
/// record what it declared without interior mutability.
pub trait ProviderAdapters {
    /// Which provider this table implements.
    fn provider(&self) -> CloudProvider;

    /// Fails when this table cannot create `kind` at all. Checked before
    /// arguments are decoded.
    fn ensure_supported(&self, _kind: ResourceKind) -> Result<()> {
        Ok(())
    }

    fn network(&mut self, args: &NetworkArgs) -> Result<NetworkOutputs>;
    fn load_balancer(&mut self, args: &LoadBalancerArgs) -> Result<LoadBalancerOutputs>;
    fn container_service(&mut self, args: &ContainerServiceArgs)
        -> Result<ContainerServiceOutputs>;
    fn database(&mut self, args: &DatabaseArgs) -> Result<DatabaseOutputs>;
    fn secrets(&mut self, args: &SecretsArgs) -> Result<SecretsOutputs>;
    fn monitoring(&mut self, args: &MonitoringArgs) -> Result<MonitoringOutputs>;
    fn firewall(&mut self, args: &FirewallArgs) -> Result<FirewallOutputs>;
    fn dns(&mut self, args: &DnsArgs) -> Result<DnsOutputs>;
    fn cdn(&mut self, args: &CdnArgs) -> Result<CdnOutputs>;
    fn frontend_hosting(&mut self, args: &FrontendHostingArgs) -> Result<FrontendHostingOutputs>;

    /// Provider-level resources declared so far, in declaration order.
    fn declarations(&self) -> &[Declaration] {
        &[]
    }
}

/// Adapter table for a provider.
pub fn get_provider(provider: CloudProvider) -> Box<dyn ProviderAdapters> {
    match provider {
        CloudProvider::Aws => Box::new(AwsAdapters::new()),
        CloudProvider::Azure | CloudProvider::Gcp => Box::new(Unimplemented::new(provider)),
    }
}

/// Adapter table for a provider identifier; unknown identifiers fail.
pub fn by_name(provider: &str) -> Result<Box<dyn ProviderAdapters>> {
    Ok(get_provider(provider.parse()?))
}
