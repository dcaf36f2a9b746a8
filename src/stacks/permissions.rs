//! Permission stacks: the IAM policy a deployer needs to apply the backend
//! and frontend stacks, and the least-privilege role those stacks run as.
//!
//! Both render AWS IAM declarations directly. Other providers get no
//! declarations and empty outputs.

use super::naming::Naming;
use super::stack_tags;
use crate::core::error::Result;
use crate::core::types::{CloudProvider, Declaration};
use crate::providers::aws::DEFAULT_ACCOUNT_ID;
use serde::Serialize;
use serde_json::{json, Value};

const POLICY_VERSION: &str = "2012-10-17";

/// Services allowed to assume the runtime role.
pub const RUNTIME_PRINCIPALS: [&str; 2] = ["ecs-tasks.amazonaws.com", "lambda.amazonaws.com"];

/// What a permission stack exports. Empty strings when nothing was declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOutputs {
    pub policy_arn: String,
    pub policy_name: String,
    pub role_arn: String,
    pub role_name: String,
    pub region: String,
}

/// Declarations plus exported outputs of one permission stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionStack {
    pub declarations: Vec<Declaration>,
    pub outputs: PermissionOutputs,
}

impl PermissionStack {
    fn skipped(naming: &Naming, provider: CloudProvider, region: &str, what: &str) -> Self {
        tracing::info!(stack = %naming.stack, provider = %provider, "{} is AWS-only; nothing declared", what);
        Self {
            declarations: Vec::new(),
            outputs: PermissionOutputs {
                region: region.to_string(),
                ..PermissionOutputs::default()
            },
        }
    }
}

fn statement(sid: &str, actions: &[&str], resource: &str) -> Value {
    json!({
        "Sid": sid,
        "Effect": "Allow",
        "Action": actions,
        "Resource": resource,
    })
}

fn policy_arn(account_id: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:policy/{}", account_id, name)
}

fn declaration(type_token: &str, name: &str, properties: Value) -> Declaration {
    Declaration {
        type_token: type_token.to_string(),
        name: name.to_string(),
        properties,
    }
}

/// Statements granting everything the backend and frontend stacks create.
pub fn infra_deployer_statements() -> Vec<Value> {
    vec![
        statement("Networking", &["ec2:*", "elasticloadbalancing:*"], "*"),
        statement("Compute", &["ecs:*", "ecr:*", "lambda:*"], "*"),
        statement("Database", &["rds:*"], "*"),
        statement(
            "IAM",
            &[
                "iam:CreateRole",
                "iam:PutRolePolicy",
                "iam:AttachRolePolicy",
                "iam:PassRole",
                "iam:GetRole",
                "iam:ListAttachedRolePolicies",
                "iam:GetRolePolicy",
                "iam:DetachRolePolicy",
                "iam:DeleteRolePolicy",
                "iam:DeleteRole",
            ],
            "*",
        ),
        statement("DNS", &["route53:*"], "*"),
        statement("FirewallWAF", &["wafv2:*"], "*"),
        statement(
            "Amplify",
            &[
                "amplify:CreateApp",
                "amplify:TagResource",
                "amplify:CreateBranch",
                "amplify:GetApp",
                "amplify:GetBranch",
                "amplify:ListApps",
                "amplify:UpdateApp",
                "amplify:UpdateBranch",
            ],
            "arn:aws:amplify:*:*:apps/*",
        ),
    ]
}

/// Statements the running backend and frontend need: their secrets, IAM
/// database auth and their own log groups.
pub fn runtime_statements() -> Vec<Value> {
    vec![
        statement(
            "ReadSecrets",
            &["secretsmanager:GetSecretValue"],
            "arn:aws:secretsmanager:*:*:secret:backend-*",
        ),
        statement(
            "DatabaseAccess",
            &["rds-db:connect"],
            "arn:aws:rds-db:*:*:dbuser:*/backend-*",
        ),
        statement(
            "WriteLogs",
            &["logs:CreateLogStream", "logs:PutLogEvents"],
            "arn:aws:logs:*:*:log-group:/cloud-platform/*",
        ),
    ]
}

/// Policy for the identity that applies the backend and frontend stacks.
pub fn infra_deployer(
    naming: &Naming,
    provider: CloudProvider,
    region: &str,
) -> Result<PermissionStack> {
    if provider != CloudProvider::Aws {
        return Ok(PermissionStack::skipped(naming, provider, region, "infra deployer policy"));
    }

    let name = format!("{}-infra-deployer-{}", naming.app, naming.stack);
    let document = json!({ "Version": POLICY_VERSION, "Statement": infra_deployer_statements() });
    let policy = declaration(
        "aws:iam/policy:Policy",
        "infra-deployer-policy",
        json!({
            "name": name,
            "description": "Allows deploying the backend and frontend stacks: EC2, ECS, RDS, Amplify, Route53, WAF, Secrets.",
            "policy": serde_json::to_string(&document)?,
            "tags": stack_tags(naming, "infra-permissions"),
        }),
    );

    Ok(PermissionStack {
        declarations: vec![policy],
        outputs: PermissionOutputs {
            policy_arn: policy_arn(DEFAULT_ACCOUNT_ID, &name),
            policy_name: name,
            region: region.to_string(),
            ..PermissionOutputs::default()
        },
    })
}

/// Runtime policy, a role ECS tasks and Lambda functions can assume, and
/// the attachment between them.
pub fn app_runtime(
    naming: &Naming,
    provider: CloudProvider,
    region: &str,
) -> Result<PermissionStack> {
    if provider != CloudProvider::Aws {
        return Ok(PermissionStack::skipped(naming, provider, region, "runtime role"));
    }

    let name = format!("{}-app-runtime-{}", naming.app, naming.stack);
    let tags = stack_tags(naming, "runtime-permissions");
    let document = json!({ "Version": POLICY_VERSION, "Statement": runtime_statements() });
    let assume_role = json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": RUNTIME_PRINCIPALS },
            "Action": "sts:AssumeRole",
        }],
    });
    let policy_arn = policy_arn(DEFAULT_ACCOUNT_ID, &name);

    let declarations = vec![
        declaration(
            "aws:iam/policy:Policy",
            "app-runtime-policy",
            json!({
                "name": name,
                "description": "Minimal permissions for backend/frontend at runtime: secrets, RDS connect, logs.",
                "policy": serde_json::to_string(&document)?,
                "tags": tags,
            }),
        ),
        declaration(
            "aws:iam/role:Role",
            "app-runtime-role",
            json!({
                "name": name,
                "assumeRolePolicy": serde_json::to_string(&assume_role)?,
                "tags": tags,
            }),
        ),
        declaration(
            "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
            "app-runtime-policy-attach",
            json!({ "role": name, "policyArn": policy_arn }),
        ),
    ];

    Ok(PermissionStack {
        declarations,
        outputs: PermissionOutputs {
            role_arn: format!("arn:aws:iam::{}:role/{}", DEFAULT_ACCOUNT_ID, name),
            role_name: name.clone(),
            policy_arn,
            policy_name: name,
            region: region.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> Naming {
        Naming::new("acme", "shop", "prod")
    }

    fn sids(statements: &[Value]) -> Vec<&str> {
        statements.iter().map(|s| s["Sid"].as_str().unwrap()).collect()
    }

    fn document(d: &Declaration, field: &str) -> Value {
        serde_json::from_str(d.properties[field].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_infra_deployer_policy() {
        let stack = infra_deployer(&naming(), CloudProvider::Aws, "us-east-1").unwrap();
        assert_eq!(stack.declarations.len(), 1);
        let policy = &stack.declarations[0];
        assert_eq!(policy.type_token, "aws:iam/policy:Policy");
        assert_eq!(policy.properties["name"], "shop-infra-deployer-prod");

        let doc = document(policy, "policy");
        assert_eq!(doc["Version"], "2012-10-17");
        let statements = doc["Statement"].as_array().unwrap();
        assert_eq!(
            sids(statements),
            vec!["Networking", "Compute", "Database", "IAM", "DNS", "FirewallWAF", "Amplify"]
        );
        assert_eq!(statements[6]["Resource"], "arn:aws:amplify:*:*:apps/*");
        assert!(statements[3]["Action"]
            .as_array()
            .unwrap()
            .contains(&json!("iam:PassRole")));

        assert_eq!(
            stack.outputs.policy_arn,
            "arn:aws:iam::000000000000:policy/shop-infra-deployer-prod"
        );
        assert!(stack.outputs.role_arn.is_empty());
    }

    #[test]
    fn test_runtime_role_and_attachment() {
        let stack = app_runtime(&naming(), CloudProvider::Aws, "eu-west-1").unwrap();
        let tokens: Vec<&str> = stack.declarations.iter().map(|d| d.type_token.as_str()).collect();
        assert_eq!(
            tokens,
            vec![
                "aws:iam/policy:Policy",
                "aws:iam/role:Role",
                "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
            ]
        );

        let statements = document(&stack.declarations[0], "policy")["Statement"].clone();
        let statements = statements.as_array().unwrap();
        assert_eq!(sids(statements), vec!["ReadSecrets", "DatabaseAccess", "WriteLogs"]);
        assert_eq!(statements[0]["Action"], json!(["secretsmanager:GetSecretValue"]));
        assert_eq!(statements[1]["Resource"], "arn:aws:rds-db:*:*:dbuser:*/backend-*");

        let trust = document(&stack.declarations[1], "assumeRolePolicy");
        assert_eq!(
            trust["Statement"][0]["Principal"]["Service"],
            json!(["ecs-tasks.amazonaws.com", "lambda.amazonaws.com"])
        );
        assert_eq!(trust["Statement"][0]["Action"], "sts:AssumeRole");

        let attach = &stack.declarations[2].properties;
        assert_eq!(attach["role"], "shop-app-runtime-prod");
        assert_eq!(attach["policyArn"], json!(stack.outputs.policy_arn));
        assert_eq!(stack.outputs.role_name, "shop-app-runtime-prod");
        assert_eq!(stack.outputs.region, "eu-west-1");
    }

    #[test]
    fn test_non_aws_declares_nothing() {
        for provider in [CloudProvider::Azure, CloudProvider::Gcp] {
            for stack in [
                infra_deployer(&naming(), provider, "westeurope").unwrap(),
                app_runtime(&naming(), provider, "westeurope").unwrap(),
            ] {
                assert!(stack.declarations.is_empty());
                assert_eq!(
                    stack.outputs,
                    PermissionOutputs {
                        region: "westeurope".into(),
                        ..PermissionOutputs::default()
                    }
                );
            }
        }
    }

    #[test]
    fn test_outputs_serialize_camel_case() {
        let stack = app_runtime(&naming(), CloudProvider::Aws, "us-east-1").unwrap();
        let v = serde_json::to_value(&stack.outputs).unwrap();
        assert!(v["roleArn"].as_str().unwrap().ends_with(":role/shop-app-runtime-prod"));
        assert_eq!(v["policyName"], "shop-app-runtime-prod");
    }
}
