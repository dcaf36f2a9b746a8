//! Edge components: WAF, Route53, CloudFront and Amplify hosting.

use super::AwsAdapters;
use crate::components::*;
use crate::core::error::{Error, Result};
use crate::core::types::ResourceKind;
use crate::provenance::hasher;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Requests per IP allowed within the rate-limit window.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 1000;
/// Rate-limit evaluation window, seconds.
pub const RATE_LIMIT_WINDOW_SEC: u32 = 60;

/// Rewrites every non-asset path to the SPA entry point.
const SPA_REWRITE_SOURCE: &str =
    "</^[^.]+$|\\.(?!(css|gif|ico|jpg|js|png|txt|svg|woff|ttf|map|json)$)([^.]+$)/>";

fn visibility_config(metric_name: &str) -> Value {
    json!({
        "cloudwatchMetricsEnabled": true,
        "metricName": metric_name,
        "sampledRequestsEnabled": true,
    })
}

static HTTP_SCHEME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^https?://"));

/// Host part of an origin URL: scheme and path stripped.
pub fn origin_domain(origin: &str) -> Result<String> {
    let scheme = HTTP_SCHEME
        .as_ref()
        .map_err(|e| Error::InvalidConfig(format!("origin pattern: {}", e)))?;
    let stripped = scheme.replace(origin, "");
    Ok(stripped.split('/').next().unwrap_or_default().to_string())
}

/// Amplify build spec for a root or monorepo app.
pub fn build_spec(app_root: Option<&str>) -> String {
    const ARTIFACT_DIR: &str = "dist";
    match app_root {
        Some(root) => format!(
            "version: 1
applications:
  - appRoot: {root}
    frontend:
      phases:
        preBuild:
          commands:
            - npm ci
        build:
          commands:
            - npm run build
      artifacts:
        baseDirectory: {ARTIFACT_DIR}
        files:
          - '**/*'
      cache:
        paths:
          - node_modules/**/*
"
        ),
        None => format!(
            "version: 1
frontend:
  phases:
    preBuild:
      commands:
        - npm ci
    build:
      commands:
        - npm run build
  artifacts:
    baseDirectory: {ARTIFACT_DIR}
    files:
      - '**/*'
  cache:
    paths:
      - node_modules/**/*
"
        ),
    }
}

impl AwsAdapters {
    pub(super) fn create_firewall(&mut self, args: &FirewallArgs) -> Result<FirewallOutputs> {
        let name = args.meta.name.as_str();
        let (scope, arn_region) = match args.scope {
            // CloudFront-scoped ACLs live in us-east-1
            FirewallScope::Global => ("CLOUDFRONT", "us-east-1"),
            FirewallScope::Regional => ("REGIONAL", args.meta.region.as_str()),
        };

        self.declare(
            "aws:wafv2/webAcl:WebAcl",
            name,
            json!({
                "name": name,
                "scope": scope,
                "defaultAction": { "allow": {} },
                "rules": [
                    {
                        "name": format!("{}-common-ruleset", name),
                        "priority": 1,
                        "overrideAction": { "none": {} },
                        "statement": {
                            "managedRuleGroupStatement": {
                                "vendorName": "AWS",
                                "name": "AWSManagedRulesCommonRuleSet",
                            },
                        },
                        "visibilityConfig": visibility_config(&format!("{}-CommonRuleSet", name)),
                    },
                    {
                        "name": format!("{}-ip-reputation", name),
                        "priority": 2,
                        "overrideAction": { "none": {} },
                        "statement": {
                            "managedRuleGroupStatement": {
                                "vendorName": "AWS",
                                "name": "AWSManagedRulesAmazonIpReputationList",
                                "ruleActionOverrides": [
                                    { "name": "AWSManagedRPDoSList", "actionToUse": { "block": {} } },
                                    { "name": "AWSManagedIPDDoSList", "actionToUse": { "block": {} } },
                                ],
                            },
                        },
                        "visibilityConfig": visibility_config(&format!("{}-IpReputation", name)),
                    },
                    {
                        "name": format!("{}-rate-limit", name),
                        "priority": 3,
                        "action": { "block": {} },
                        "statement": {
                            "rateBasedStatement": {
                                "limit": RATE_LIMIT_MAX_REQUESTS,
                                "aggregateKeyType": "IP",
                                "evaluationWindowSec": RATE_LIMIT_WINDOW_SEC,
                            },
                        },
                        "visibilityConfig": visibility_config(&format!("{}-RateLimit", name)),
                    },
                ],
                "visibilityConfig": visibility_config(name),
                "tags": args.meta.named_tags(name),
            }),
        );

        let firewall_id = uuid_like(&[arn_region, "wafv2", name]);
        let acl_scope = if scope == "CLOUDFRONT" { "global" } else { "regional" };
        let firewall_arn = self.arn(
            "wafv2",
            arn_region,
            &format!("{}/webacl/{}/{}", acl_scope, name, firewall_id),
        );
        if let Some(ref resource_arn) = args.resource_arn {
            self.declare(
                "aws:wafv2/webAclAssociation:WebAclAssociation",
                &format!("{}-association", name),
                json!({
                    "resourceArn": resource_arn,
                    "webAclArn": firewall_arn,
                    "region": arn_region,
                }),
            );
        }
        Ok(FirewallOutputs {
            firewall_id,
            firewall_arn: Some(firewall_arn),
        })
    }

    pub(super) fn create_dns(&mut self, args: &DnsArgs) -> Result<DnsOutputs> {
        let name = args.meta.name.as_str();
        if args.domain.trim().is_empty() {
            return Err(Error::invalid_args(name, ResourceKind::Dns, "domain must not be empty"));
        }
        self.declare(
            "aws:route53/zone:Zone",
            name,
            json!({ "name": args.domain, "tags": args.meta.named_tags(name) }),
        );
        if let Some(ref target) = args.target_value {
            tracing::debug!(resource = name, value = %target, "dns target recorded; no record declared");
        }

        let zone_id = format!(
            "Z{}",
            hasher::short_id(&["route53", args.domain.as_str()], 20).to_uppercase()
        );
        let shard = hasher::short_id(&["route53-ns", args.domain.as_str()], 4);
        let shard = u32::from_str_radix(&shard, 16).unwrap_or_default() % 2048;
        let name_servers = vec![
            format!("ns-{}.awsdns-{:02}.com", shard, shard % 64),
            format!("ns-{}.awsdns-{:02}.net", shard + 1, (shard + 1) % 64),
            format!("ns-{}.awsdns-{:02}.org", shard + 2, (shard + 2) % 64),
            format!("ns-{}.awsdns-{:02}.co.uk", shard + 3, (shard + 3) % 64),
        ];
        Ok(DnsOutputs {
            zone_id,
            name_servers,
        })
    }

    pub(super) fn create_cdn(&mut self, args: &CdnArgs) -> Result<CdnOutputs> {
        let name = args.meta.name.as_str();
        let domain = origin_domain(&args.origin_url_or_id)?;
        if domain.is_empty() {
            return Err(Error::invalid_args(
                name,
                ResourceKind::Cdn,
                format!("cannot derive an origin domain from '{}'", args.origin_url_or_id),
            ));
        }

        self.declare(
            "aws:cloudfront/distribution:Distribution",
            name,
            json!({
                "enabled": true,
                "defaultRootObject": "index.html",
                "origins": [{
                    "originId": name,
                    "domainName": domain,
                    "customOriginConfig": {
                        "httpPort": 80,
                        "httpsPort": 443,
                        "originProtocolPolicy": "http-only",
                        "originSslProtocols": ["TLSv1.2"],
                    },
                }],
                "defaultCacheBehavior": {
                    "targetOriginId": name,
                    "viewerProtocolPolicy": "redirect-to-https",
                    "allowedMethods": ["GET", "HEAD", "OPTIONS"],
                    "cachedMethods": ["GET", "HEAD"],
                    "compress": true,
                },
                "restrictions": { "geoRestriction": { "restrictionType": "none" } },
                "viewerCertificate": { "cloudfrontDefaultCertificate": true },
                "tags": args.meta.named_tags(name),
            }),
        );

        let cdn_id = format!(
            "E{}",
            hasher::short_id(&["cloudfront", name], 13).to_uppercase()
        );
        let distribution_domain = format!(
            "d{}.cloudfront.net",
            hasher::short_id(&["cloudfront-domain", name], 13)
        );
        Ok(CdnOutputs {
            cdn_id,
            cdn_url: format!("https://{}", distribution_domain),
        })
    }

    pub(super) fn create_frontend_hosting(
        &mut self,
        args: &FrontendHostingArgs,
    ) -> Result<FrontendHostingOutputs> {
        let name = args.meta.name.as_str();
        let region = args.meta.region.as_str();
        if args.access_token.is_some() && args.repo_url.is_none() {
            tracing::warn!(resource = name, "accessToken ignored without repoUrl");
        }

        let app_name = format!("{}-app", name);
        let mut app = json!({
            "name": name,
            "buildSpec": build_spec(args.app_root.as_deref()),
            "customRules": [{ "source": SPA_REWRITE_SOURCE, "status": "200", "target": "/index.html" }],
            "tags": args.meta.named_tags(name),
        });
        if let Some(ref repo) = args.repo_url {
            app["repository"] = json!(repo);
            if args.access_token.is_some() {
                app["accessToken"] = json!("[secret]");
            }
        }
        if let Some(ref root) = args.app_root {
            app["environmentVariables"] = json!({ "AMPLIFY_MONOREPO_APP_ROOT": root });
        }
        self.declare("aws:amplify/app:App", &app_name, app);

        self.declare(
            "aws:amplify/branch:Branch",
            &format!("{}-branch", name),
            json!({
                "branchName": args.branch,
                "framework": args.framework,
                "stage": "PRODUCTION",
                "enableAutoBuild": true,
                "tags": args.meta.named_tags(name),
            }),
        );

        let app_id = format!("d{}", hasher::short_id(&[region, "amplify", name], 13));
        let app_arn = self.arn("amplify", region, &format!("apps/{}", app_id));
        Ok(FrontendHostingOutputs {
            app_url: format!("https://{}.{}.amplifyapp.com", args.branch, app_id),
            app_id,
            app_arn: Some(app_arn),
        })
    }
}

/// 8-4-4-4-12 hex id, the shape WAF uses for ACL ids.
fn uuid_like(components: &[&str]) -> String {
    let hex = hasher::short_id(components, 32);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::meta;
    use super::*;
    use crate::providers::ProviderAdapters;

    fn frontend(app_root: Option<&str>, repo: Option<&str>) -> FrontendHostingArgs {
        FrontendHostingArgs {
            meta: meta("web"),
            repo_url: repo.map(String::from),
            branch: "main".into(),
            framework: "React".into(),
            access_token: repo.map(|_| "ghp_token".to_string()),
            app_root: app_root.map(String::from),
        }
    }

    #[test]
    fn test_origin_domain() {
        assert_eq!(
            origin_domain("https://api-lb-1.us-east-1.elb.amazonaws.com/health").unwrap(),
            "api-lb-1.us-east-1.elb.amazonaws.com"
        );
        assert_eq!(origin_domain("http://example.com").unwrap(), "example.com");
        assert_eq!(origin_domain("bucket.s3.amazonaws.com").unwrap(), "bucket.s3.amazonaws.com");
    }

    #[test]
    fn test_global_firewall() {
        let mut aws = AwsAdapters::new();
        let out = aws
            .firewall(&FirewallArgs {
                meta: {
                    let mut m = meta("web-waf");
                    m.region = "eu-west-1".into();
                    m
                },
                scope: FirewallScope::Global,
                resource_arn: None,
            })
            .unwrap();
        let arn = out.firewall_arn.unwrap();
        assert!(arn.starts_with("arn:aws:wafv2:us-east-1:000000000000:global/webacl/web-waf/"));
        assert_eq!(out.firewall_id.len(), 36);

        let acl = &aws.declarations()[0].properties;
        assert_eq!(acl["scope"], "CLOUDFRONT");
        assert_eq!(acl["rules"].as_array().unwrap().len(), 3);
        assert_eq!(acl["rules"][2]["statement"]["rateBasedStatement"]["limit"], 1000);
        assert_eq!(
            acl["rules"][2]["statement"]["rateBasedStatement"]["evaluationWindowSec"],
            60
        );
    }

    #[test]
    fn test_regional_firewall() {
        let mut aws = AwsAdapters::new();
        let out = aws
            .firewall(&FirewallArgs {
                meta: meta("api-waf"),
                scope: FirewallScope::Regional,
                resource_arn: None,
            })
            .unwrap();
        assert!(out.firewall_arn.unwrap().contains(":us-east-1:000000000000:regional/"));
        assert_eq!(aws.declarations()[0].properties["scope"], "REGIONAL");
    }

    #[test]
    fn test_firewall_association_pinned_to_us_east_1() {
        let mut aws = AwsAdapters::new();
        let app_arn = "arn:aws:amplify:eu-west-1:000000000000:apps/d123";
        let out = aws
            .firewall(&FirewallArgs {
                meta: {
                    let mut m = meta("web-waf");
                    m.region = "eu-west-1".into();
                    m
                },
                scope: FirewallScope::Global,
                resource_arn: Some(app_arn.into()),
            })
            .unwrap();
        let decls = aws.declarations();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].type_token, "aws:wafv2/webAclAssociation:WebAclAssociation");
        assert_eq!(decls[1].name, "web-waf-association");
        assert_eq!(decls[1].properties["resourceArn"], app_arn);
        assert_eq!(decls[1].properties["webAclArn"], json!(out.firewall_arn));
        assert_eq!(decls[1].properties["region"], "us-east-1");
    }

    #[test]
    fn test_origin_domain_repeated_calls() {
        for _ in 0..3 {
            assert_eq!(origin_domain("https://a.example/x").unwrap(), "a.example");
        }
    }

    #[test]
    fn test_dns_zone() {
        let out = AwsAdapters::new()
            .dns(&DnsArgs {
                meta: meta("zone"),
                domain: "example.com".into(),
                target_value: None,
            })
            .unwrap();
        assert!(out.zone_id.starts_with('Z'));
        assert_eq!(out.name_servers.len(), 4);
        assert!(out.name_servers.iter().all(|ns| ns.contains(".awsdns-")));
    }

    #[test]
    fn test_cdn() {
        let mut aws = AwsAdapters::new();
        let out = aws
            .cdn(&CdnArgs {
                meta: meta("cdn"),
                origin_url_or_id: "https://origin.example.com/app".into(),
            })
            .unwrap();
        assert!(out.cdn_url.starts_with("https://d"));
        assert!(out.cdn_url.ends_with(".cloudfront.net"));
        assert_eq!(
            aws.declarations()[0].properties["origins"][0]["domainName"],
            "origin.example.com"
        );
    }

    #[test]
    fn test_cdn_rejects_empty_origin() {
        let err = AwsAdapters::new()
            .cdn(&CdnArgs {
                meta: meta("cdn"),
                origin_url_or_id: "https://".into(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("origin domain"));
    }

    #[test]
    fn test_frontend_root_app() {
        let mut aws = AwsAdapters::new();
        let out = aws.frontend_hosting(&frontend(None, None)).unwrap();
        assert_eq!(
            out.app_url,
            format!("https://main.{}.amplifyapp.com", out.app_id)
        );
        assert!(out.app_arn.unwrap().ends_with(&format!("apps/{}", out.app_id)));

        let app = &aws.declarations()[0].properties;
        assert!(app["buildSpec"].as_str().unwrap().starts_with("version: 1\nfrontend:"));
        assert!(app.get("environmentVariables").is_none());
        assert!(app.get("repository").is_none());
        assert_eq!(app["customRules"][0]["target"], "/index.html");
        assert_eq!(aws.declarations()[1].properties["stage"], "PRODUCTION");
    }

    #[test]
    fn test_frontend_monorepo_with_repo() {
        let mut aws = AwsAdapters::new();
        aws.frontend_hosting(&frontend(
            Some("apps/web"),
            Some("https://github.com/acme/platform"),
        ))
        .unwrap();
        let app = &aws.declarations()[0].properties;
        assert!(app["buildSpec"].as_str().unwrap().contains("appRoot: apps/web"));
        assert_eq!(
            app["environmentVariables"]["AMPLIFY_MONOREPO_APP_ROOT"],
            "apps/web"
        );
        assert_eq!(app["repository"], "https://github.com/acme/platform");
        assert_eq!(app["accessToken"], "[secret]");
    }

    #[test]
    fn test_uuid_like_shape() {
        let id = uuid_like(&["a"]);
        let parts: Vec<_> = id.split('-').map(str::len).collect();
        assert_eq!(parts, vec![8, 4, 4, 4, 12]);
    }
}
