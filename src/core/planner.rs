//! Plan generation: diff declared descriptors against the stack lock.

use super::types::*;
use crate::provenance::hasher;
use std::collections::HashSet;

/// Generate an execution plan by comparing the stack to its lock.
pub fn plan(config: &StackConfig, lock: Option<&StackLock>) -> ExecutionPlan {
    let mut changes = Vec::new();
    let mut to_create = 0u32;
    let mut to_update = 0u32;
    let mut unchanged = 0u32;

    for descriptor in &config.resources {
        let action = determine_action(descriptor, lock);
        match action {
            PlanAction::Create => to_create += 1,
            PlanAction::Update => to_update += 1,
            PlanAction::NoOp => unchanged += 1,
        }
        changes.push(PlannedChange {
            resource_key: descriptor.context_key().to_string(),
            kind: descriptor.kind.clone(),
            action,
            description: describe_action(descriptor, action),
        });
    }

    let declared: HashSet<&str> = config.resources.iter().map(|d| d.context_key()).collect();
    let orphaned = lock
        .map(|l| {
            l.resources
                .keys()
                .filter(|k| !declared.contains(k.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    ExecutionPlan {
        name: config.name.clone(),
        provider: config.provider.clone(),
        changes,
        orphaned,
        to_create,
        to_update,
        unchanged,
    }
}

fn determine_action(descriptor: &ResourceDescriptor, lock: Option<&StackLock>) -> PlanAction {
    let entry = match lock.and_then(|l| l.resources.get(descriptor.context_key())) {
        Some(e) => e,
        None => return PlanAction::Create,
    };
    // Previously failed: re-apply
    if entry.status != ResourceStatus::Created {
        return PlanAction::Update;
    }
    if entry.hash == hasher::hash_descriptor(descriptor) {
        PlanAction::NoOp
    } else {
        PlanAction::Update
    }
}

fn describe_action(descriptor: &ResourceDescriptor, action: PlanAction) -> String {
    let key = descriptor.context_key();
    match action {
        PlanAction::Create => match descriptor.resource_kind() {
            Ok(ResourceKind::Network) => {
                let cidr = descriptor
                    .fields
                    .get("cidrBlock")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                format!("{}: create network {}", key, cidr)
            }
            Ok(ResourceKind::ContainerService) => {
                let image = descriptor
                    .fields
                    .get("image")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                format!("{}: run {}", key, image)
            }
            Ok(ResourceKind::Dns) => {
                let domain = descriptor
                    .fields
                    .get("domain")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                format!("{}: create zone {}", key, domain)
            }
            Ok(kind) => format!("{}: create {} '{}'", key, kind, descriptor.name),
            Err(_) => format!("{}: create (unknown type {})", key, descriptor.kind),
        },
        PlanAction::Update => format!("{}: update (descriptor changed or previous failure)", key),
        PlanAction::NoOp => format!("{}: no changes", key),
    }
}
