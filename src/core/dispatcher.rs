//! Descriptor dispatch.
//!
//! Walks descriptors in list order: check the provider supports the kind,
//! resolve refs against the outputs created so far, strip dispatch-only
//! fields, decode the kind's typed arguments, invoke the provider's adapter
//! and store its outputs under the context key.
//! Single pass, no dependency inference; the first failure stops the pass.

use super::error::{Error, Result};
use super::resolver;
use super::types::{BaseContext, CloudProvider, RefPolicy, ResourceContext, ResourceDescriptor, ResourceKind};
use crate::components::*;
use crate::providers::{self, ProviderAdapters};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Fields that steer dispatch and never reach an adapter.
const DISPATCH_ONLY_FIELDS: [&str; 2] = ["type", "key"];

/// Dispatch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub references: RefPolicy,
}

impl DispatchOptions {
    pub fn lenient() -> Self {
        Self {
            references: RefPolicy::Lenient,
        }
    }
}

/// Create every descriptor with the provider's adapter table and return the
/// final context.
pub fn create_resources(
    provider: CloudProvider,
    descriptors: &[ResourceDescriptor],
    base: &BaseContext,
) -> Result<ResourceContext> {
    let mut adapters = providers::get_provider(provider);
    let mut context = ResourceContext::new();
    create_resources_with(
        adapters.as_mut(),
        descriptors,
        base,
        DispatchOptions::default(),
        &mut context,
    )?;
    Ok(context)
}

/// Create every descriptor into `context`. On failure, outputs of the
/// descriptors that preceded the failing one remain in `context`.
pub fn create_resources_with(
    adapters: &mut dyn ProviderAdapters,
    descriptors: &[ResourceDescriptor],
    base: &BaseContext,
    options: DispatchOptions,
    context: &mut ResourceContext,
) -> Result<()> {
    for descriptor in descriptors {
        create_one(adapters, descriptor, base, options, context)?;
    }
    Ok(())
}

/// Create a single descriptor and record its outputs. Returns the outputs.
pub fn create_one(
    adapters: &mut dyn ProviderAdapters,
    descriptor: &ResourceDescriptor,
    base: &BaseContext,
    options: DispatchOptions,
    context: &mut ResourceContext,
) -> Result<Value> {
    let key = descriptor.context_key();
    let kind = descriptor.resource_kind()?;
    adapters.ensure_supported(kind)?;

    let missing = resolver::unresolved_refs(&Value::Object(descriptor.fields.clone()), context);
    match (options.references, missing.first()) {
        (RefPolicy::Strict, Some(path)) => {
            return Err(Error::UnresolvedReference {
                resource: key.to_string(),
                path: path.clone(),
            });
        }
        (RefPolicy::Lenient, Some(_)) => {
            for path in &missing {
                tracing::warn!(resource = key, path = %path, "reference resolved to nothing");
            }
        }
        (_, None) => {}
    }

    let args = adapter_args(descriptor, context, base);
    tracing::debug!(resource = key, kind = %kind, provider = %adapters.provider(), "dispatch");
    let outputs = invoke(adapters, kind, key, args)?;
    context.insert(key.to_string(), outputs.clone());
    Ok(outputs)
}

/// Resolved descriptor with the dispatch-only fields removed.
pub fn adapter_args(
    descriptor: &ResourceDescriptor,
    context: &ResourceContext,
    base: &BaseContext,
) -> Map<String, Value> {
    let mut args = resolver::resolve_descriptor(descriptor, context, base);
    for field in DISPATCH_ONLY_FIELDS {
        args.remove(field);
    }
    args
}

fn invoke(
    adapters: &mut dyn ProviderAdapters,
    kind: ResourceKind,
    resource: &str,
    args: Map<String, Value>,
) -> Result<Value> {
    let args = Value::Object(args);
    match kind {
        ResourceKind::Network => call(resource, kind, args, |a: &NetworkArgs| adapters.network(a)),
        ResourceKind::LoadBalancer => {
            call(resource, kind, args, |a: &LoadBalancerArgs| adapters.load_balancer(a))
        }
        ResourceKind::ContainerService => call(resource, kind, args, |a: &ContainerServiceArgs| {
            adapters.container_service(a)
        }),
        ResourceKind::Database => call(resource, kind, args, |a: &DatabaseArgs| adapters.database(a)),
        ResourceKind::Secrets => call(resource, kind, args, |a: &SecretsArgs| adapters.secrets(a)),
        ResourceKind::Monitoring => {
            call(resource, kind, args, |a: &MonitoringArgs| adapters.monitoring(a))
        }
        ResourceKind::Cdn => call(resource, kind, args, |a: &CdnArgs| adapters.cdn(a)),
        ResourceKind::Dns => call(resource, kind, args, |a: &DnsArgs| adapters.dns(a)),
        ResourceKind::Firewall => call(resource, kind, args, |a: &FirewallArgs| adapters.firewall(a)),
        ResourceKind::FrontendHosting => call(resource, kind, args, |a: &FrontendHostingArgs| {
            adapters.frontend_hosting(a)
        }),
    }
}

/// Decode typed arguments, run the adapter, encode its outputs.
fn call<A, O>(
    resource: &str,
    kind: ResourceKind,
    args: Value,
    adapter: impl FnOnce(&A) -> Result<O>,
) -> Result<Value>
where
    A: DeserializeOwned,
    O: Serialize,
{
    let typed: A =
        serde_json::from_value(args).map_err(|e| Error::invalid_args(resource, kind, e.to_string()))?;
    let outputs = adapter(&typed)?;
    Ok(serde_json::to_value(outputs)?)
}
