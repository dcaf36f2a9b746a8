//! RDS database, Secrets Manager and CloudWatch log groups.

use super::AwsAdapters;
use crate::components::*;
use crate::core::error::{Error, Result};
use crate::core::types::ResourceKind;
use crate::provenance::hasher;
use serde_json::json;

/// Retention values CloudWatch Logs accepts.
pub const LOG_RETENTION_DAYS: [u32; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

const SECRET_PLACEHOLDER: &str = "[secret]";

impl AwsAdapters {
    pub(super) fn create_database(&mut self, args: &DatabaseArgs) -> Result<DatabaseOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();
        if args.storage_gb == 0 {
            return Err(Error::invalid_args(
                name,
                ResourceKind::Database,
                "storageGb must be positive",
            ));
        }
        if args.subnet_ids.is_empty() {
            return Err(Error::invalid_args(
                name,
                ResourceKind::Database,
                "subnetIds must not be empty",
            ));
        }

        let group_name = format!("{}-sg", name);
        self.declare(
            "aws:rds/subnetGroup:SubnetGroup",
            &group_name,
            json!({
                "subnetIds": args.subnet_ids,
                "tags": args.meta.named_tags(&group_name),
            }),
        );

        let port = args.port();
        self.declare(
            "aws:rds/instance:Instance",
            name,
            json!({
                "allocatedStorage": args.storage_gb,
                "storageType": args.storage_type,
                "engine": args.engine,
                "engineVersion": args.engine_version,
                "instanceClass": args.instance_size,
                "dbName": args.effective_db_name(),
                "username": args.username,
                "password": SECRET_PLACEHOLDER,
                "dbSubnetGroupName": group_name,
                "publiclyAccessible": args.publicly_accessible,
                "skipFinalSnapshot": args.skip_final_snapshot,
                "port": port,
                "tags": args.meta.named_tags(name),
            }),
        );
        if args.password.is_none() {
            tracing::warn!(resource = name, "no database password supplied; set one before a real deployment");
        }

        let host = format!(
            "{}.{}.{}.rds.amazonaws.com",
            name,
            hasher::short_id(&[region, "rds", name], 12),
            region
        );
        Ok(DatabaseOutputs {
            endpoint: format!("{}:{}", host, port),
            host,
            port,
        })
    }

    pub(super) fn create_secrets(&mut self, args: &SecretsArgs) -> Result<SecretsOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();
        self.declare(
            "aws:secretsmanager/secret:Secret",
            name,
            json!({ "name": name, "tags": args.meta.named_tags(name) }),
        );

        // Secrets Manager appends six random characters to secret ARNs
        let suffix = hasher::short_id(&[region, "secret", name], 6);
        let arn = self.arn("secretsmanager", region, &format!("secret:{}-{}", name, suffix));
        Ok(SecretsOutputs {
            secrets_store_id: arn.clone(),
            arn_or_uri: arn,
        })
    }

    pub(super) fn create_monitoring(&mut self, args: &MonitoringArgs) -> Result<MonitoringOutputs> {
        let name = args.meta.name.as_str();
        if !LOG_RETENTION_DAYS.contains(&args.log_retention_days) {
            return Err(Error::invalid_args(
                name,
                ResourceKind::Monitoring,
                format!(
                    "logRetentionDays {} is not a CloudWatch retention value",
                    args.log_retention_days
                ),
            ));
        }

        let log_group = format!("/cloud-platform/{}", name);
        self.declare(
            "aws:cloudwatch/logGroup:LogGroup",
            name,
            json!({
                "name": log_group,
                "retentionInDays": args.log_retention_days,
                "tags": args.meta.named_tags(name),
            }),
        );

        Ok(MonitoringOutputs {
            metrics_namespace: Some(format!("CloudPlatform/{}", log_group)),
            log_group_id: log_group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::meta;
    use super::*;
    use crate::providers::ProviderAdapters;

    fn db() -> DatabaseArgs {
        DatabaseArgs {
            meta: meta("orders-db"),
            instance_size: "db.t3.micro".into(),
            storage_gb: 20,
            subnet_ids: vec!["subnet-2".into()],
            engine: "postgres".into(),
            engine_version: "15".into(),
            username: "admin".into(),
            password: Some("hunter2".into()),
            storage_type: "gp3".into(),
            db_name: None,
            publicly_accessible: false,
            skip_final_snapshot: true,
        }
    }

    #[test]
    fn test_database_outputs() {
        let mut aws = AwsAdapters::new();
        let out = aws.database(&db()).unwrap();
        assert_eq!(out.port, 5432);
        assert!(out.host.starts_with("orders-db."));
        assert!(out.host.ends_with(".us-east-1.rds.amazonaws.com"));
        assert_eq!(out.endpoint, format!("{}:5432", out.host));
    }

    #[test]
    fn test_database_never_declares_password() {
        let mut aws = AwsAdapters::new();
        aws.database(&db()).unwrap();
        let instance = &aws.declarations()[1];
        assert_eq!(instance.properties["password"], SECRET_PLACEHOLDER);
        assert_eq!(instance.properties["dbName"], "orders_db");
        assert_eq!(instance.properties["dbSubnetGroupName"], "orders-db-sg");
        let rendered = serde_json::to_string(aws.declarations()).unwrap();
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_database_mysql_port() {
        let mut args = db();
        args.engine = "mysql".into();
        let out = AwsAdapters::new().database(&args).unwrap();
        assert_eq!(out.port, 3306);
    }

    #[test]
    fn test_database_rejects_zero_storage() {
        let mut args = db();
        args.storage_gb = 0;
        assert!(AwsAdapters::new().database(&args).is_err());
    }

    #[test]
    fn test_secrets_arn() {
        let out = AwsAdapters::new()
            .secrets(&SecretsArgs { meta: meta("app-secrets") })
            .unwrap();
        assert!(out
            .arn_or_uri
            .starts_with("arn:aws:secretsmanager:us-east-1:000000000000:secret:app-secrets-"));
        assert_eq!(out.secrets_store_id, out.arn_or_uri);
    }

    #[test]
    fn test_monitoring_log_group() {
        let out = AwsAdapters::new()
            .monitoring(&MonitoringArgs {
                meta: meta("api-logs"),
                log_retention_days: 7,
            })
            .unwrap();
        assert_eq!(out.log_group_id, "/cloud-platform/api-logs");
        assert_eq!(
            out.metrics_namespace.as_deref(),
            Some("CloudPlatform//cloud-platform/api-logs")
        );
    }

    #[test]
    fn test_monitoring_rejects_unsupported_retention() {
        let err = AwsAdapters::new()
            .monitoring(&MonitoringArgs {
                meta: meta("api-logs"),
                log_retention_days: 8,
            })
            .unwrap_err();
        assert!(err.to_string().contains("logRetentionDays 8"));
    }
}
