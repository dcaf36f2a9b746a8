//! Backend stack: network, load balancer, container service, database,
//! secrets and monitoring.

use super::naming::Naming;
use super::sizes::SizeTier;
use crate::core::error::{Error, Result};
use crate::core::types::{CloudProvider, ResourceDescriptor, ResourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    pub engine: String,
    pub engine_version: String,
    pub username: String,
    /// Omitted from descriptors when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub storage_gb: u32,
    pub storage_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    pub publicly_accessible: bool,
    pub skip_final_snapshot: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            engine: "postgres".to_string(),
            engine_version: "15".to_string(),
            username: "admin".to_string(),
            password: None,
            storage_gb: 20,
            storage_type: "gp3".to_string(),
            db_name: None,
            publicly_accessible: false,
            skip_final_snapshot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendOptions {
    pub db_tier: SizeTier,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub container_image: String,
    pub database: DatabaseOptions,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            db_tier: SizeTier::Micro,
            min_capacity: 1,
            max_capacity: 2,
            container_image: "nginx:latest".to_string(),
            database: DatabaseOptions::default(),
        }
    }
}

/// Backend descriptors in creation order.
pub fn backend_resources(
    naming: &Naming,
    provider: CloudProvider,
    options: &BackendOptions,
) -> Result<Vec<ResourceDescriptor>> {
    if options.min_capacity > options.max_capacity {
        return Err(Error::InvalidConfig(format!(
            "minCapacity ({}) must not exceed maxCapacity ({})",
            options.min_capacity, options.max_capacity
        )));
    }
    if options.container_image.trim().is_empty() {
        return Err(Error::InvalidConfig("containerImage must be set".to_string()));
    }
    let db = &options.database;

    Ok(vec![
        ResourceDescriptor::new(ResourceKind::Network, naming.name_tag("backend-network"))
            .with_key("network")
            .field("cidrBlock", "10.1.0.0/16")
            .field("publicSubnetCidrs", vec!["10.1.1.0/24", "10.1.2.0/24"])
            .field("privateSubnetCidrs", vec!["10.1.10.0/24", "10.1.11.0/24"]),
        ResourceDescriptor::new(ResourceKind::LoadBalancer, naming.name_tag("backend-lb"))
            .with_key("loadBalancer")
            .field("isPublic", true)
            .reference("subnetIds", "network.publicSubnetIds"),
        ResourceDescriptor::new(ResourceKind::ContainerService, naming.name_tag("backend-svc"))
            .with_key("containerService")
            .field("cpu", 0.25)
            .field("memory", 512)
            .field("image", options.container_image.as_str())
            .reference("vpcId", "network.vpcId")
            .reference("subnetIds", "network.privateSubnetIds")
            .field("minCapacity", options.min_capacity)
            .field("maxCapacity", options.max_capacity)
            .field("port", 80),
        ResourceDescriptor::new(ResourceKind::Database, naming.name_tag("backend-db"))
            .with_key("database")
            .field("instanceSize", options.db_tier.db_size(provider))
            .field("storageGb", db.storage_gb)
            .reference("subnetIds", "network.privateSubnetIds")
            .field("engine", db.engine.as_str())
            .field("engineVersion", db.engine_version.as_str())
            .field("username", db.username.as_str())
            .field_opt("password", db.password.as_deref())
            .field("storageType", db.storage_type.as_str())
            .field_opt("dbName", db.db_name.as_deref())
            .field("publiclyAccessible", db.publicly_accessible)
            .field("skipFinalSnapshot", db.skip_final_snapshot),
        ResourceDescriptor::new(ResourceKind::Secrets, naming.name_tag("backend-secrets"))
            .with_key("secrets"),
        ResourceDescriptor::new(ResourceKind::Monitoring, naming.name_tag("backend-monitoring"))
            .with_key("monitoring")
            .field("logRetentionDays", 7),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::check_reference_order;
    use crate::core::types::Ref;
    use serde_json::json;

    fn naming() -> Naming {
        Naming::new("acme", "shop", "dev")
    }

    #[test]
    fn test_backend_order_and_keys() {
        let ds = backend_resources(&naming(), CloudProvider::Aws, &BackendOptions::default()).unwrap();
        let keys: Vec<_> = ds.iter().map(|d| d.context_key()).collect();
        assert_eq!(
            keys,
            vec!["network", "loadBalancer", "containerService", "database", "secrets", "monitoring"]
        );
        assert!(check_reference_order(&ds).is_empty());
    }

    #[test]
    fn test_backend_fields() {
        let ds = backend_resources(&naming(), CloudProvider::Aws, &BackendOptions::default()).unwrap();
        assert_eq!(ds[0].name, "acme-shop-dev-backend-network-25be");
        assert_eq!(ds[0].fields["cidrBlock"], json!("10.1.0.0/16"));
        assert_eq!(
            Ref::path_of(&ds[1].fields["subnetIds"]),
            Some("network.publicSubnetIds")
        );
        assert_eq!(
            Ref::path_of(&ds[2].fields["subnetIds"]),
            Some("network.privateSubnetIds")
        );
        assert_eq!(ds[2].fields["cpu"], json!(0.25));
        assert_eq!(ds[3].fields["instanceSize"], json!("db.t3.micro"));
        assert!(!ds[3].fields.contains_key("password"));
        assert!(!ds[3].fields.contains_key("dbName"));
        assert_eq!(ds[5].fields["logRetentionDays"], json!(7));
    }

    #[test]
    fn test_backend_password_and_tier() {
        let mut options = BackendOptions::default();
        options.db_tier = SizeTier::Small;
        options.database.password = Some("s3cret".into());
        let ds = backend_resources(&naming(), CloudProvider::Aws, &options).unwrap();
        assert_eq!(ds[3].fields["password"], json!("s3cret"));
        assert_eq!(ds[3].fields["instanceSize"], json!("db.t3.small"));
    }

    #[test]
    fn test_backend_dispatches_on_aws() {
        use crate::core::dispatcher::create_resources;
        use crate::core::types::BaseContext;

        let ds = backend_resources(&naming(), CloudProvider::Aws, &BackendOptions::default()).unwrap();
        let base = BaseContext {
            provider: CloudProvider::Aws,
            region: "us-east-1".to_string(),
            tags: Default::default(),
        };
        let ctx = create_resources(CloudProvider::Aws, &ds, &base).unwrap();
        assert_eq!(ctx.len(), 6);
        assert_eq!(ctx["network"]["publicSubnetIds"].as_array().unwrap().len(), 2);
        assert!(ctx["loadBalancer"]["url"].as_str().unwrap().starts_with("https://"));
        assert_eq!(ctx["database"]["port"], json!(5432));
    }

    #[test]
    fn test_backend_rejects_inverted_capacity() {
        let options = BackendOptions {
            min_capacity: 3,
            max_capacity: 1,
            ..BackendOptions::default()
        };
        let err = backend_resources(&naming(), CloudProvider::Aws, &options).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
