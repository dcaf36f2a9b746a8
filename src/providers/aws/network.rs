//! VPC with public/private subnets, internet gateway and a single NAT.

use super::{availability_zone, AwsAdapters};
use crate::components::{NetworkArgs, NetworkOutputs};
use crate::core::error::{Error, Result};
use crate::core::types::ResourceKind;
use serde_json::json;
use std::net::Ipv4Addr;

/// Accepts `a.b.c.d/n` with n in 0..=32.
pub(super) fn validate_cidr(resource: &str, cidr: &str) -> Result<()> {
    let bad = || Error::invalid_args(resource, ResourceKind::Network, format!("invalid CIDR '{}'", cidr));
    let (addr, prefix) = cidr.split_once('/').ok_or_else(bad)?;
    addr.parse::<Ipv4Addr>().map_err(|_| bad())?;
    let prefix: u8 = prefix.parse().map_err(|_| bad())?;
    if prefix > 32 {
        return Err(bad());
    }
    Ok(())
}

impl AwsAdapters {
    pub(super) fn create_network(&mut self, args: &NetworkArgs) -> Result<NetworkOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();

        validate_cidr(name, &args.cidr_block)?;
        for cidr in args.public_subnet_cidrs.iter().chain(&args.private_subnet_cidrs) {
            validate_cidr(name, cidr)?;
        }
        if args.public_subnet_cidrs.is_empty() {
            return Err(Error::invalid_args(
                name,
                ResourceKind::Network,
                "at least one public subnet is required to host the NAT gateway",
            ));
        }

        let vpc_id = Self::resource_id("vpc", region, name);
        self.declare(
            "aws:ec2/vpc:Vpc",
            name,
            json!({
                "cidrBlock": args.cidr_block,
                "enableDnsHostnames": true,
                "enableDnsSupport": true,
                "tags": args.meta.named_tags(name),
            }),
        );

        let igw_name = format!("{}-igw", name);
        let igw_id = Self::resource_id("igw", region, &igw_name);
        self.declare(
            "aws:ec2/internetGateway:InternetGateway",
            &igw_name,
            json!({ "vpcId": vpc_id, "tags": args.meta.named_tags(&igw_name) }),
        );

        let public_subnet_ids = self.subnets(args, &vpc_id, "public", &args.public_subnet_cidrs);
        let private_subnet_ids =
            self.subnets(args, &vpc_id, "private", &args.private_subnet_cidrs);

        let public_rt = format!("{}-public-rt", name);
        let public_rt_id = Self::resource_id("rtb", region, &public_rt);
        self.declare(
            "aws:ec2/routeTable:RouteTable",
            &public_rt,
            json!({
                "vpcId": vpc_id,
                "routes": [{ "cidrBlock": "0.0.0.0/0", "gatewayId": igw_id }],
                "tags": args.meta.named_tags(&public_rt),
            }),
        );
        self.associate(name, "public", &public_rt_id, &public_subnet_ids);

        let eip_name = format!("{}-nat-eip", name);
        let eip_id = Self::resource_id("eipalloc", region, &eip_name);
        self.declare(
            "aws:ec2/eip:Eip",
            &eip_name,
            json!({ "domain": "vpc", "tags": args.meta.named_tags(&eip_name) }),
        );

        let nat_name = format!("{}-nat", name);
        let nat_id = Self::resource_id("nat", region, &nat_name);
        self.declare(
            "aws:ec2/natGateway:NatGateway",
            &nat_name,
            json!({
                "allocationId": eip_id,
                "subnetId": public_subnet_ids[0],
                "tags": args.meta.named_tags(&nat_name),
            }),
        );

        let private_rt = format!("{}-private-rt", name);
        let private_rt_id = Self::resource_id("rtb", region, &private_rt);
        self.declare(
            "aws:ec2/routeTable:RouteTable",
            &private_rt,
            json!({
                "vpcId": vpc_id,
                "routes": [{ "cidrBlock": "0.0.0.0/0", "natGatewayId": nat_id }],
                "tags": args.meta.named_tags(&private_rt),
            }),
        );
        self.associate(name, "private", &private_rt_id, &private_subnet_ids);

        Ok(NetworkOutputs {
            vpc_id,
            public_subnet_ids,
            private_subnet_ids,
            nat_gateway_id: Some(nat_id),
        })
    }

    fn subnets(&mut self, args: &NetworkArgs, vpc_id: &str, tier: &str, cidrs: &[String]) -> Vec<String> {
        let public = tier == "public";
        cidrs
            .iter()
            .enumerate()
            .map(|(i, cidr)| {
                let subnet = format!("{}-{}-{}", args.meta.name, tier, i);
                let mut props = json!({
                    "vpcId": vpc_id,
                    "cidrBlock": cidr,
                    "availabilityZone": availability_zone(&args.meta.region, i),
                    "tags": args.meta.named_tags(&subnet),
                });
                if public {
                    props["mapPublicIpOnLaunch"] = json!(true);
                }
                self.declare("aws:ec2/subnet:Subnet", &subnet, props);
                Self::resource_id("subnet", &args.meta.region, &subnet)
            })
            .collect()
    }

    fn associate(&mut self, name: &str, tier: &str, route_table_id: &str, subnet_ids: &[String]) {
        for (i, subnet_id) in subnet_ids.iter().enumerate() {
            self.declare(
                "aws:ec2/routeTableAssociation:RouteTableAssociation",
                &format!("{}-{}-rta-{}", name, tier, i),
                json!({ "subnetId": subnet_id, "routeTableId": route_table_id }),
            );
        }
    }
}
