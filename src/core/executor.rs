//! Executor: orchestration loop for apply.
//!
//! parse → validate → plan → for each descriptor in order:
//! dispatch → hash → lock entry → event. The first failure stops the run,
//! the partial lock is written and the error is returned; nothing is rolled
//! back.

use super::dispatcher::{self, DispatchOptions};
use super::error::{Error, Result};
use super::parser;
use super::planner;
use super::state;
use super::types::*;
use crate::provenance::{eventlog, hasher};
use crate::providers::{self, ProviderAdapters};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// Configuration for an apply run.
pub struct ApplyConfig<'a> {
    pub config: &'a StackConfig,
    pub state_dir: &'a Path,
    pub dry_run: bool,
    /// Force lenient reference handling regardless of the stack policy.
    pub lenient: bool,
}

impl ApplyConfig<'_> {
    fn references(&self) -> RefPolicy {
        if self.lenient {
            RefPolicy::Lenient
        } else {
            self.config.policy.references
        }
    }
}

/// Execute the apply loop with the stack provider's adapter table.
pub fn apply(cfg: &ApplyConfig) -> Result<ApplyResult> {
    let mut adapters = providers::by_name(&cfg.config.provider)?;
    apply_with(cfg, adapters.as_mut())
}

/// Execute the apply loop with an explicit adapter table.
pub fn apply_with(cfg: &ApplyConfig, adapters: &mut dyn ProviderAdapters) -> Result<ApplyResult> {
    let start = Instant::now();
    let config = cfg.config;
    let references = cfg.references();

    let errors = parser::validate_config_with(config, references);
    if !errors.is_empty() {
        for e in &errors {
            tracing::error!(stack = %config.name, "{}", e);
        }
        return Err(Error::Validation(errors.len()));
    }

    let previous = state::load_lock(cfg.state_dir, &config.name)?;
    let plan = planner::plan(config, previous.as_ref());
    let run_id = eventlog::generate_run_id();

    if cfg.dry_run {
        tracing::info!(stack = %config.name, to_create = plan.to_create, to_update = plan.to_update, "dry run");
        return Ok(ApplyResult {
            stack: config.name.clone(),
            run_id,
            dry_run: true,
            resources_created: 0,
            plan,
            total_duration: start.elapsed(),
            outputs: ResourceContext::new(),
        });
    }

    let base = config.base_context()?;
    let options = DispatchOptions { references };
    let mut lock = previous.unwrap_or_else(|| state::new_lock(config));
    lock.generated_at = eventlog::now_rfc3339();
    lock.provider = config.provider.clone();
    lock.region = config.region.clone();

    let mut rec = Recorder {
        cfg,
        lock: &mut lock,
        run_id: &run_id,
    };
    rec.event(ProvenanceEvent::ApplyStarted {
        stack: config.name.clone(),
        run_id: run_id.clone(),
        provider: config.provider.clone(),
        cloudplat_version: env!("CARGO_PKG_VERSION").to_string(),
    });
    tracing::info!(stack = %config.name, run_id = %run_id, resources = config.resources.len(), "apply started");

    let mut context = ResourceContext::new();
    let mut created = 0u32;
    for descriptor in &config.resources {
        let key = descriptor.context_key();
        rec.event(ProvenanceEvent::ResourceStarted {
            stack: config.name.clone(),
            resource: key.to_string(),
            kind: descriptor.kind.clone(),
        });

        let resource_start = Instant::now();
        let outcome = dispatcher::create_one(adapters, descriptor, &base, options, &mut context);
        let duration = resource_start.elapsed().as_secs_f64();

        match outcome {
            Ok(outputs) => {
                rec.success(descriptor, outputs, duration);
                created += 1;
            }
            Err(e) => {
                rec.failure(descriptor, &e, duration);
                if let Err(save_err) = rec.finish(adapters, created, 1, start.elapsed().as_secs_f64()) {
                    tracing::error!(stack = %config.name, "partial lock not saved: {}", save_err);
                }
                tracing::error!(stack = %config.name, resource = key, "apply stopped: {}", e);
                return Err(e);
            }
        }
    }

    rec.finish(adapters, created, 0, start.elapsed().as_secs_f64())?;
    tracing::info!(stack = %config.name, created, "apply completed");

    Ok(ApplyResult {
        stack: config.name.clone(),
        run_id,
        dry_run: false,
        resources_created: created,
        plan,
        total_duration: start.elapsed(),
        outputs: context,
    })
}

/// Records per-resource outcomes into the lock and event log.
struct Recorder<'a> {
    cfg: &'a ApplyConfig<'a>,
    lock: &'a mut StackLock,
    run_id: &'a str,
}

impl Recorder<'_> {
    fn stack(&self) -> &str {
        &self.cfg.config.name
    }

    /// Event log failures are logged, never fatal.
    fn event(&self, event: ProvenanceEvent) {
        if !self.cfg.config.policy.provenance {
            return;
        }
        if let Err(e) = eventlog::append_event(self.cfg.state_dir, self.stack(), event) {
            tracing::warn!(stack = %self.stack(), "cannot append event: {}", e);
        }
    }

    fn success(&mut self, descriptor: &ResourceDescriptor, outputs: Value, duration: f64) {
        let hash = hasher::hash_descriptor(descriptor);
        self.lock.resources.insert(
            descriptor.context_key().to_string(),
            ResourceLock {
                kind: descriptor.kind.clone(),
                status: ResourceStatus::Created,
                applied_at: Some(eventlog::now_rfc3339()),
                duration_seconds: Some(duration),
                hash: hash.clone(),
                outputs,
            },
        );
        self.event(ProvenanceEvent::ResourceCreated {
            stack: self.stack().to_string(),
            resource: descriptor.context_key().to_string(),
            duration_seconds: duration,
            hash,
        });
    }

    fn failure(&mut self, descriptor: &ResourceDescriptor, error: &Error, duration: f64) {
        self.lock.resources.insert(
            descriptor.context_key().to_string(),
            ResourceLock {
                kind: descriptor.kind.clone(),
                status: ResourceStatus::Failed,
                applied_at: Some(eventlog::now_rfc3339()),
                duration_seconds: Some(duration),
                hash: hasher::hash_descriptor(descriptor),
                outputs: Value::Null,
            },
        );
        self.event(ProvenanceEvent::ResourceFailed {
            stack: self.stack().to_string(),
            resource: descriptor.context_key().to_string(),
            error: error.to_string(),
        });
    }

    /// Store declarations, persist the lock and close the run.
    fn finish(
        &mut self,
        adapters: &dyn ProviderAdapters,
        created: u32,
        failed: u32,
        total_seconds: f64,
    ) -> Result<()> {
        self.lock.declarations = adapters.declarations().to_vec();
        if self.cfg.config.policy.lock_file {
            state::save_lock(self.cfg.state_dir, self.lock)?;
        }
        self.event(ProvenanceEvent::ApplyCompleted {
            stack: self.stack().to_string(),
            run_id: self.run_id.to_string(),
            resources_created: created,
            resources_failed: failed,
            total_seconds,
        });
        Ok(())
    }
}
