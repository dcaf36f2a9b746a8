//! Typed argument and output records for the ten component kinds.
//!
//! Arguments are decoded from a resolved descriptor (base context merged in,
//! `type`/`key` stripped). Outputs are what adapters hand back and what later
//! descriptors may reference. Wire names are camelCase throughout.

use crate::core::types::CloudProvider;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fields every component argument record carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub name: String,
    pub provider: CloudProvider,
    pub region: String,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
}

impl ComponentMeta {
    /// Resource tags with `Name` set to `name`.
    pub fn named_tags(&self, name: &str) -> IndexMap<String, String> {
        let mut tags = self.tags.clone();
        tags.insert("Name".to_string(), name.to_string());
        tags
    }
}

// ============================================================================
// Network
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub cidr_block: String,
    pub public_subnet_cidrs: Vec<String>,
    pub private_subnet_cidrs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOutputs {
    pub vpc_id: String,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<String>,
}

// ============================================================================
// Load balancer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub is_public: bool,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerOutputs {
    pub load_balancer_id: String,
    pub dns_name: String,
    pub url: String,
}

// ============================================================================
// Container service
// ============================================================================

pub const DEFAULT_CONTAINER_PORT: u16 = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerServiceArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    /// vCPUs (fractional, e.g. 0.25)
    pub cpu: f64,
    /// Memory in MiB
    pub memory: u32,
    pub image: String,
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
    pub min_capacity: u32,
    pub max_capacity: u32,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_CONTAINER_PORT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerServiceOutputs {
    pub service_id: String,
    pub endpoint: String,
}

// ============================================================================
// Database
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub instance_size: String,
    pub storage_gb: u32,
    pub subnet_ids: Vec<String>,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_engine_version")]
    pub engine_version: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_storage_type")]
    pub storage_type: String,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub publicly_accessible: bool,
    #[serde(default = "default_true")]
    pub skip_final_snapshot: bool,
}

fn default_engine() -> String {
    "postgres".to_string()
}

fn default_engine_version() -> String {
    "15".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_storage_type() -> String {
    "gp3".to_string()
}

fn default_true() -> bool {
    true
}

impl DatabaseArgs {
    /// Logical database name; derived from the resource name when unset.
    pub fn effective_db_name(&self) -> String {
        self.db_name
            .clone()
            .unwrap_or_else(|| self.meta.name.replace('-', "_"))
    }

    /// Engine listener port.
    pub fn port(&self) -> u16 {
        match self.engine.as_str() {
            "mysql" | "mariadb" => 3306,
            _ => 5432,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOutputs {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
}

// ============================================================================
// Secrets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsOutputs {
    pub secrets_store_id: String,
    pub arn_or_uri: String,
}

// ============================================================================
// Monitoring
// ============================================================================

pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    #[serde(default = "default_retention")]
    pub log_retention_days: u32,
}

fn default_retention() -> u32 {
    DEFAULT_LOG_RETENTION_DAYS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringOutputs {
    pub log_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_namespace: Option<String>,
}

// ============================================================================
// CDN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub origin_url_or_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnOutputs {
    pub cdn_id: String,
    pub cdn_url: String,
}

// ============================================================================
// DNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub domain: String,
    #[serde(default)]
    pub target_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsOutputs {
    pub zone_id: String,
    pub name_servers: Vec<String>,
}

// ============================================================================
// Firewall
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallScope {
    /// Edge (CDN-attached)
    Global,
    Regional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    pub scope: FirewallScope,
    /// Resource the ACL is attached to, e.g. an Amplify app ARN
    #[serde(default)]
    pub resource_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallOutputs {
    pub firewall_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,
}

// ============================================================================
// Frontend hosting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendHostingArgs {
    #[serde(flatten)]
    pub meta: ComponentMeta,
    /// Git repository for CI/CD; manual deploys when absent
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_framework")]
    pub framework: String,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Monorepo subdirectory holding the app
    #[serde(default)]
    pub app_root: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_framework() -> String {
    "React".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendHostingOutputs {
    pub app_url: String,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_arn: Option<String>,
}
