//! AWS adapter table.
//!
//! Each capability renders the AWS resources a component needs as
//! [`Declaration`]s and returns outputs built from deterministic
//! identifiers: BLAKE3 over region and logical name. The same stack always
//! yields the same ids.

mod compute;
mod data;
mod edge;
mod network;

use super::ProviderAdapters;
use crate::components::*;
use crate::core::error::Result;
use crate::core::types::{CloudProvider, Declaration};
use crate::provenance::hasher;
use serde_json::Value;

/// Placeholder account used in rendered ARNs.
pub const DEFAULT_ACCOUNT_ID: &str = "000000000000";

/// AWS component adapters. Collects every declaration made through it.
#[derive(Debug, Clone)]
pub struct AwsAdapters {
    account_id: String,
    declarations: Vec<Declaration>,
}

impl Default for AwsAdapters {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsAdapters {
    pub fn new() -> Self {
        Self {
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            declarations: Vec::new(),
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    fn declare(&mut self, type_token: &str, name: &str, properties: Value) {
        tracing::trace!(type_token, name, "declare");
        self.declarations.push(Declaration {
            type_token: type_token.to_string(),
            name: name.to_string(),
            properties,
        });
    }

    /// `<prefix>-<17 hex>`, the shape of EC2-style ids.
    fn resource_id(prefix: &str, region: &str, name: &str) -> String {
        format!("{}-{}", prefix, hasher::short_id(&[region, prefix, name], 17))
    }

    fn arn(&self, service: &str, region: &str, resource: &str) -> String {
        format!(
            "arn:aws:{}:{}:{}:{}",
            service, region, self.account_id, resource
        )
    }
}

/// Availability zone for the `index`-th subnet, round-robin over a/b/c.
fn availability_zone(region: &str, index: usize) -> String {
    const ZONES: [char; 3] = ['a', 'b', 'c'];
    format!("{}{}", region, ZONES[index % ZONES.len()])
}

impl ProviderAdapters for AwsAdapters {
    fn provider(&self) -> CloudProvider {
        CloudProvider::Aws
    }

    fn network(&mut self, args: &NetworkArgs) -> Result<NetworkOutputs> {
        self.create_network(args)
    }

    fn load_balancer(&mut self, args: &LoadBalancerArgs) -> Result<LoadBalancerOutputs> {
        self.create_load_balancer(args)
    }

    fn container_service(&mut self, args: &ContainerServiceArgs) -> Result<ContainerServiceOutputs> {
        self.create_container_service(args)
    }

    fn database(&mut self, args: &DatabaseArgs) -> Result<DatabaseOutputs> {
        self.create_database(args)
    }

    fn secrets(&mut self, args: &SecretsArgs) -> Result<SecretsOutputs> {
        self.create_secrets(args)
    }

    fn monitoring(&mut self, args: &MonitoringArgs) -> Result<MonitoringOutputs> {
        self.create_monitoring(args)
    }

    fn firewall(&mut self, args: &FirewallArgs) -> Result<FirewallOutputs> {
        self.create_firewall(args)
    }

    fn dns(&mut self, args: &DnsArgs) -> Result<DnsOutputs> {
        self.create_dns(args)
    }

    fn cdn(&mut self, args: &CdnArgs) -> Result<CdnOutputs> {
        self.create_cdn(args)
    }

    fn frontend_hosting(&mut self, args: &FrontendHostingArgs) -> Result<FrontendHostingOutputs> {
        self.create_frontend_hosting(args)
    }

    fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}
