//! Stack, descriptor, lock, plan and provenance types.
//!
//! Descriptors are the wire format between stack builders and the dispatcher:
//! a `type` tag, a `name`, an optional context `key`, optional `tags`, and a
//! free-form set of kind-specific fields that may contain `{ref: "key.prop"}`
//! placeholders. Kind-specific typing is recovered when the dispatcher decodes
//! adapter arguments (see `crate::components`).

use super::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Default monthly budget (USD) recorded for a stack.
pub const DEFAULT_BUDGET_LIMIT_USD: f64 = 150.0;

// ============================================================================
// Providers and resource kinds
// ============================================================================

/// The closed set of cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub const ALL: [CloudProvider; 3] = [Self::Aws, Self::Azure, Self::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }

    /// Human-facing label used in adapter messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::Gcp => "GCP",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

/// The ten resource kinds every provider table must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Network,
    LoadBalancer,
    ContainerService,
    Database,
    Secrets,
    Monitoring,
    Cdn,
    Dns,
    Firewall,
    FrontendHosting,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        Self::Network,
        Self::LoadBalancer,
        Self::ContainerService,
        Self::Database,
        Self::Secrets,
        Self::Monitoring,
        Self::Cdn,
        Self::Dns,
        Self::Firewall,
        Self::FrontendHosting,
    ];

    /// Wire name (the descriptor's `type` tag).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::LoadBalancer => "loadBalancer",
            Self::ContainerService => "containerService",
            Self::Database => "database",
            Self::Secrets => "secrets",
            Self::Monitoring => "monitoring",
            Self::Cdn => "cdn",
            Self::Dns => "dns",
            Self::Firewall => "firewall",
            Self::FrontendHosting => "frontendHosting",
        }
    }

    /// Kind-specific fields a descriptor must carry (literal or ref).
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Network => &["cidrBlock", "publicSubnetCidrs", "privateSubnetCidrs"],
            Self::LoadBalancer => &["isPublic", "subnetIds"],
            Self::ContainerService => &[
                "cpu",
                "memory",
                "image",
                "vpcId",
                "subnetIds",
                "minCapacity",
                "maxCapacity",
            ],
            Self::Database => &["instanceSize", "storageGb", "subnetIds"],
            Self::Secrets | Self::Monitoring | Self::FrontendHosting => &[],
            Self::Cdn => &["originUrlOrId"],
            Self::Dns => &["domain"],
            Self::Firewall => &["scope"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::UnknownResourceKind(s.to_string()))
    }
}

// ============================================================================
// References
// ============================================================================

/// Placeholder for another resource's output: `{ref: "network.vpcId"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "ref")]
    pub path: String,
}

impl Ref {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// JSON form of the reference.
    pub fn to_value(&self) -> Value {
        let mut m = Map::new();
        m.insert("ref".to_string(), Value::String(self.path.clone()));
        Value::Object(m)
    }

    /// Returns the path if `value` is an object with a string-valued `ref`.
    pub fn path_of(value: &Value) -> Option<&str> {
        value.as_object()?.get("ref")?.as_str()
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// One resource to provision, as declared in a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Kind tag. Kept as a string so unknown kinds survive parsing and are
    /// reported at validation/dispatch time.
    #[serde(rename = "type")]
    pub kind: String,

    /// Resource name (used for tagging and naming)
    pub name: String,

    /// Context key for references; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Per-resource tags (replace the base tags when present)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexMap<String, String>>,

    /// Kind-specific fields, literal or `{ref: ...}`
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            name: name.into(),
            key: None,
            tags: None,
            fields: Map::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_tags(mut self, tags: IndexMap<String, String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set a literal field.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Set a literal field only when a value is present.
    pub fn field_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Set a field to a reference to an earlier resource's output.
    pub fn reference(mut self, name: &str, path: &str) -> Self {
        self.fields.insert(name.to_string(), Ref::new(path).to_value());
        self
    }

    /// The key this resource's outputs are stored under.
    pub fn context_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    /// Parse the kind tag.
    pub fn resource_kind(&self) -> Result<ResourceKind> {
        self.kind.parse()
    }

    /// Full JSON object form, including `type` and `key`.
    pub fn to_object(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("type".to_string(), Value::String(self.kind.clone()));
        m.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(ref key) = self.key {
            m.insert("key".to_string(), Value::String(key.clone()));
        }
        if let Some(ref tags) = self.tags {
            m.insert("tags".to_string(), string_map_value(tags));
        }
        for (k, v) in &self.fields {
            m.insert(k.clone(), v.clone());
        }
        m
    }
}

/// Ambient values merged under every resolved descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseContext {
    pub provider: CloudProvider,
    pub region: String,
    #[serde(default)]
    pub tags: IndexMap<String, String>,
}

impl BaseContext {
    pub fn to_object(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(
            "provider".to_string(),
            Value::String(self.provider.to_string()),
        );
        m.insert("region".to_string(), Value::String(self.region.clone()));
        m.insert("tags".to_string(), string_map_value(&self.tags));
        m
    }
}

/// Accumulated adapter outputs, keyed by context key, in creation order.
pub type ResourceContext = IndexMap<String, Value>;

fn string_map_value(map: &IndexMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

// ============================================================================
// Stack file
// ============================================================================

/// Root configuration: one stack of ordered resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Stack name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provider identifier (aws, azure, gcp)
    pub provider: String,

    /// Provider region
    pub region: String,

    /// Tags applied to every resource
    #[serde(default)]
    pub tags: IndexMap<String, String>,

    /// Monthly budget in USD
    #[serde(default = "default_budget")]
    pub budget_limit: f64,

    #[serde(default)]
    pub policy: Policy,

    /// Resources, created in list order
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

fn default_budget() -> f64 {
    DEFAULT_BUDGET_LIMIT_USD
}

impl StackConfig {
    pub fn cloud_provider(&self) -> Result<CloudProvider> {
        self.provider.parse()
    }

    pub fn base_context(&self) -> Result<BaseContext> {
        Ok(BaseContext {
            provider: self.cloud_provider()?,
            region: self.region.clone(),
            tags: self.tags.clone(),
        })
    }
}

/// Execution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// What to do with references that resolve to nothing
    #[serde(default)]
    pub references: RefPolicy,

    /// Persist the stack lock after apply
    #[serde(default = "default_true")]
    pub lock_file: bool,

    /// Append provenance events during apply
    #[serde(default = "default_true")]
    pub provenance: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            references: RefPolicy::default(),
            lock_file: true,
            provenance: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Handling of references whose path is absent from the context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefPolicy {
    /// Stop before invoking the adapter.
    #[default]
    Strict,
    /// Pass the absent value through; the adapter decides.
    Lenient,
}

// ============================================================================
// Provider declarations
// ============================================================================

/// One provider-level resource an adapter registered for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Provider type token (e.g. `aws:ec2/vpc:Vpc`)
    #[serde(rename = "type")]
    pub type_token: String,

    /// Logical name
    pub name: String,

    /// Declared properties
    #[serde(default)]
    pub properties: Value,
}

// ============================================================================
// State / Lock file
// ============================================================================

/// Per-stack lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackLock {
    pub schema: String,

    /// Stack name
    pub stack: String,

    pub provider: String,

    pub region: String,

    /// When the lock was generated
    pub generated_at: String,

    /// Generator version
    pub generator: String,

    /// Per-resource state, keyed by context key
    pub resources: IndexMap<String, ResourceLock>,

    /// Provider-level declarations from the last apply
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// Per-resource lock entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLock {
    #[serde(rename = "type")]
    pub kind: String,

    pub status: ResourceStatus,

    #[serde(default)]
    pub applied_at: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<f64>,

    /// BLAKE3 hash of the unresolved descriptor
    pub hash: String,

    /// Adapter outputs
    #[serde(default)]
    pub outputs: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    Failed,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::NoOp => write!(f, "NO-OP"),
        }
    }
}

/// A single planned change.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    /// Context key
    pub resource_key: String,

    pub kind: String,

    pub action: PlanAction,

    pub description: String,
}

/// Full execution plan, in descriptor order.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub name: String,
    pub provider: String,
    pub changes: Vec<PlannedChange>,

    /// Lock entries no longer declared (reported, never destroyed)
    pub orphaned: Vec<String>,

    pub to_create: u32,
    pub to_update: u32,
    pub unchanged: u32,
}

// ============================================================================
// Provenance events
// ============================================================================

/// Provenance event for the JSONL event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvenanceEvent {
    ApplyStarted {
        stack: String,
        run_id: String,
        provider: String,
        cloudplat_version: String,
    },
    ResourceStarted {
        stack: String,
        resource: String,
        kind: String,
    },
    ResourceCreated {
        stack: String,
        resource: String,
        duration_seconds: f64,
        hash: String,
    },
    ResourceFailed {
        stack: String,
        resource: String,
        error: String,
    },
    ApplyCompleted {
        stack: String,
        run_id: String,
        resources_created: u32,
        resources_failed: u32,
        total_seconds: f64,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: ProvenanceEvent,
}

// ============================================================================
// Apply result
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub stack: String,
    pub run_id: String,
    pub dry_run: bool,
    pub resources_created: u32,
    pub plan: ExecutionPlan,
    pub total_duration: std::time::Duration,
    pub outputs: ResourceContext,
}
