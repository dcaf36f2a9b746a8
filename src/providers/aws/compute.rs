//! Application load balancer and Fargate container service.

use super::AwsAdapters;
use crate::components::*;
use crate::core::error::{Error, Result};
use crate::core::types::ResourceKind;
use crate::provenance::hasher;
use serde_json::json;

const ECS_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

impl AwsAdapters {
    pub(super) fn create_load_balancer(
        &mut self,
        args: &LoadBalancerArgs,
    ) -> Result<LoadBalancerOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();
        if args.subnet_ids.is_empty() {
            return Err(Error::invalid_args(
                name,
                ResourceKind::LoadBalancer,
                "subnetIds must not be empty",
            ));
        }

        self.declare(
            "aws:lb/loadBalancer:LoadBalancer",
            name,
            json!({
                "loadBalancerType": "application",
                "subnets": args.subnet_ids,
                "internal": !args.is_public,
                "tags": args.meta.named_tags(name),
            }),
        );

        let suffix = hasher::short_id(&[region, "alb", name], 16);
        let load_balancer_id = self.arn(
            "elasticloadbalancing",
            region,
            &format!("loadbalancer/app/{}/{}", name, suffix),
        );
        let dns_name = format!("{}-{}.{}.elb.amazonaws.com", name, &suffix[..10], region);
        let scheme = if args.is_public { "https" } else { "http" };
        let url = format!("{}://{}", scheme, dns_name);

        Ok(LoadBalancerOutputs {
            load_balancer_id,
            dns_name,
            url,
        })
    }

    pub(super) fn create_container_service(
        &mut self,
        args: &ContainerServiceArgs,
    ) -> Result<ContainerServiceOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();
        let invalid = |reason: String| Error::invalid_args(name, ResourceKind::ContainerService, reason);

        if args.min_capacity > args.max_capacity {
            return Err(invalid(format!(
                "minCapacity ({}) exceeds maxCapacity ({})",
                args.min_capacity, args.max_capacity
            )));
        }
        if args.cpu <= 0.0 {
            return Err(invalid(format!("cpu must be positive, got {}", args.cpu)));
        }
        if args.subnet_ids.is_empty() {
            return Err(invalid("subnetIds must not be empty".to_string()));
        }

        let sg_name = format!("{}-sg", name);
        let sg_id = Self::resource_id("sg", region, &sg_name);
        self.declare(
            "aws:ec2/securityGroup:SecurityGroup",
            &sg_name,
            json!({
                "vpcId": args.vpc_id,
                "description": format!("Allow inbound for {}", name),
                "ingress": [{
                    "protocol": "tcp",
                    "fromPort": args.port,
                    "toPort": args.port,
                    "cidrBlocks": ["0.0.0.0/0"],
                    "description": "Allow LB",
                }],
                "egress": [{ "protocol": "-1", "fromPort": 0, "toPort": 0, "cidrBlocks": ["0.0.0.0/0"] }],
                "tags": args.meta.named_tags(&sg_name),
            }),
        );

        let cluster_arn = self.arn("ecs", region, &format!("cluster/{}", name));
        self.declare(
            "aws:ecs/cluster:Cluster",
            name,
            json!({ "tags": args.meta.named_tags(name) }),
        );

        let role_name = format!("{}-exec", name);
        let role_arn = self.arn("iam", "", &format!("role/{}", role_name));
        self.declare(
            "aws:iam/role:Role",
            &role_name,
            json!({
                "assumeRolePolicy": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "tags": args.meta.named_tags(&role_name),
            }),
        );
        self.declare(
            "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
            &format!("{}-exec-policy", name),
            json!({ "role": role_name, "policyArn": ECS_EXECUTION_POLICY_ARN }),
        );

        let container_definitions = json!([{
            "name": name,
            "image": args.image,
            "portMappings": [{ "containerPort": args.port, "protocol": "tcp" }],
            "logConfiguration": {
                "logDriver": "awslogs",
                "options": {
                    "awslogs-group": format!("/ecs/{}", name),
                    "awslogs-region": region,
                },
            },
        }]);
        let task_arn = self.arn("ecs", region, &format!("task-definition/{}:1", name));
        self.declare(
            "aws:ecs/taskDefinition:TaskDefinition",
            name,
            json!({
                "family": name,
                "cpu": fargate_cpu_units(args.cpu).to_string(),
                "memory": args.memory.to_string(),
                "networkMode": "awsvpc",
                "requiresCompatibilities": ["FARGATE"],
                "executionRoleArn": role_arn,
                "containerDefinitions": container_definitions.to_string(),
                "tags": args.meta.named_tags(name),
            }),
        );

        let service_arn = self.arn("ecs", region, &format!("service/{}/{}", name, name));
        self.declare(
            "aws:ecs/service:Service",
            name,
            json!({
                "cluster": cluster_arn,
                "taskDefinition": task_arn,
                "desiredCount": args.min_capacity,
                "launchType": "FARGATE",
                "networkConfiguration": {
                    "subnets": args.subnet_ids,
                    "assignPublicIp": false,
                    "securityGroups": [sg_id],
                },
                "tags": args.meta.named_tags(name),
            }),
        );

        Ok(ContainerServiceOutputs {
            service_id: service_arn,
            endpoint: format!("{}:{}", cluster_arn, name),
        })
    }
}

/// Fargate expresses CPU in units of 1/1024 vCPU.
fn fargate_cpu_units(vcpu: f64) -> u32 {
    (vcpu * 1024.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::super::tests::meta;
    use super::*;
    use crate::providers::ProviderAdapters;

    fn lb(is_public: bool) -> LoadBalancerArgs {
        LoadBalancerArgs {
            meta: meta("api-lb"),
            is_public,
            subnet_ids: vec!["subnet-1".into(), "subnet-3".into()],
        }
    }

    fn svc() -> ContainerServiceArgs {
        ContainerServiceArgs {
            meta: meta("api"),
            cpu: 0.25,
            memory: 512,
            image: "nginx:latest".into(),
            vpc_id: "vpc-1".into(),
            subnet_ids: vec!["subnet-2".into()],
            min_capacity: 1,
            max_capacity: 3,
            port: 8080,
        }
    }

    #[test]
    fn test_public_lb_https() {
        let mut aws = AwsAdapters::new();
        let out = aws.load_balancer(&lb(true)).unwrap();
        assert!(out.url.starts_with("https://api-lb-"));
        assert!(out.dns_name.ends_with(".us-east-1.elb.amazonaws.com"));
        assert!(out.load_balancer_id.starts_with(
            "arn:aws:elasticloadbalancing:us-east-1:000000000000:loadbalancer/app/api-lb/"
        ));
        let decl = &aws.declarations()[0];
        assert_eq!(decl.properties["internal"], false);
        assert_eq!(decl.properties["subnets"], json!(["subnet-1", "subnet-3"]));
    }

    #[test]
    fn test_internal_lb_http() {
        let mut aws = AwsAdapters::new();
        let out = aws.load_balancer(&lb(false)).unwrap();
        assert!(out.url.starts_with("http://"));
        assert_eq!(aws.declarations()[0].properties["internal"], true);
    }

    #[test]
    fn test_lb_rejects_empty_subnets() {
        let mut args = lb(true);
        args.subnet_ids.clear();
        assert!(AwsAdapters::new().load_balancer(&args).is_err());
    }

    #[test]
    fn test_container_service() {
        let mut aws = AwsAdapters::new();
        let out = aws.container_service(&svc()).unwrap();
        assert_eq!(
            out.endpoint,
            "arn:aws:ecs:us-east-1:000000000000:cluster/api:api"
        );
        assert!(out.service_id.ends_with("service/api/api"));

        let decls = aws.declarations();
        let types: Vec<_> = decls.iter().map(|d| d.type_token.as_str()).collect();
        assert_eq!(
            types,
            vec![
                "aws:ec2/securityGroup:SecurityGroup",
                "aws:ecs/cluster:Cluster",
                "aws:iam/role:Role",
                "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
                "aws:ecs/taskDefinition:TaskDefinition",
                "aws:ecs/service:Service",
            ]
        );
        assert_eq!(decls[0].properties["ingress"][0]["fromPort"], 8080);
        assert_eq!(decls[3].properties["policyArn"], ECS_EXECUTION_POLICY_ARN);
        assert_eq!(decls[4].properties["cpu"], "256");
        assert_eq!(decls[4].properties["memory"], "512");
        let defs: serde_json::Value =
            serde_json::from_str(decls[4].properties["containerDefinitions"].as_str().unwrap())
                .unwrap();
        assert_eq!(defs[0]["logConfiguration"]["options"]["awslogs-group"], "/ecs/api");
        assert_eq!(decls[5].properties["desiredCount"], 1);
    }

    #[test]
    fn test_container_rejects_min_over_max() {
        let mut args = svc();
        args.min_capacity = 4;
        let err = AwsAdapters::new().container_service(&args).unwrap_err();
        assert!(err.to_string().contains("minCapacity (4) exceeds maxCapacity (3)"));
    }

    #[test]
    fn test_fargate_cpu_units() {
        assert_eq!(fargate_cpu_units(0.25), 256);
        assert_eq!(fargate_cpu_units(1.0), 1024);
        assert_eq!(fargate_cpu_units(0.5), 512);
    }
}
