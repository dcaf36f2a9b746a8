//! CLI subcommands.

use crate::core::error::{Error, Result};
use crate::core::{executor, parser, planner, state, types};
use crate::provenance::eventlog;
use crate::stacks::{Naming, Template};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new stack from a template
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Stack template (backend, frontend)
        #[arg(short, long, default_value = "backend")]
        template: Template,

        /// Organization prefix for resource names
        #[arg(long, default_value = "acme")]
        org: String,

        /// Application name
        #[arg(long, default_value = "app")]
        app: String,

        /// Stack (environment) name
        #[arg(long, default_value = "dev")]
        stack: String,

        /// Cloud provider (aws, azure, gcp)
        #[arg(long, default_value = "aws")]
        provider: types::CloudProvider,

        /// Provider region
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Validate stack.yaml without creating anything
    Validate {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,
    },

    /// Show execution plan (descriptors vs lock)
    Plan {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,
    },

    /// Create every resource in order
    Apply {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Plan only
        #[arg(long)]
        dry_run: bool,

        /// Pass unresolved references through instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Show current state from lock files
    Status {
        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Target specific stack
        #[arg(short, long)]
        stack: Option<String>,
    },

    /// Print recorded outputs of the last apply
    Outputs {
        /// Path to stack.yaml
        #[arg(short, long, default_value = "stack.yaml")]
        file: PathBuf,

        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Only this resource's outputs
        #[arg(short, long)]
        key: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init {
            path,
            template,
            org,
            app,
            stack,
            provider,
            region,
        } => cmd_init(&path, template, &Naming::new(org, app, stack), provider, &region),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file, state_dir } => cmd_plan(&file, &state_dir),
        Commands::Apply {
            file,
            state_dir,
            dry_run,
            lenient,
        } => cmd_apply(&file, &state_dir, dry_run, lenient),
        Commands::Status { state_dir, stack } => cmd_status(&state_dir, stack.as_deref()),
        Commands::Outputs {
            file,
            state_dir,
            key,
            json,
        } => cmd_outputs(&file, &state_dir, key.as_deref(), json),
    }
}

fn cmd_init(
    path: &Path,
    template: Template,
    naming: &Naming,
    provider: types::CloudProvider,
    region: &str,
) -> Result<()> {
    let config_path = path.join("stack.yaml");
    if config_path.exists() {
        return Err(Error::InvalidConfig(format!(
            "{} already exists",
            config_path.display()
        )));
    }

    let config = types::StackConfig::from_template(template, naming, provider, region)?;
    let state_dir = path.join("state");
    std::fs::create_dir_all(&state_dir)?;
    std::fs::write(&config_path, serde_yaml_ng::to_string(&config)?)?;

    println!("Initialized {} stack at {}", template, path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", state_dir.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    println!(
        "OK: {} ({}, {} resources)",
        config.name,
        config.provider,
        config.resources.len()
    );
    Ok(())
}

/// Parse and validate a stack file, printing every error.
fn parse_and_validate(file: &Path) -> Result<types::StackConfig> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(Error::Validation(errors.len()))
}

fn cmd_plan(file: &Path, state_dir: &Path) -> Result<()> {
    let config = parse_and_validate(file)?;
    let lock = state::load_lock(state_dir, &config.name)?;
    print_plan(&planner::plan(&config, lock.as_ref()));
    Ok(())
}

/// Display a plan to stdout.
fn print_plan(plan: &types::ExecutionPlan) {
    println!(
        "Planning: {} on {} ({} resources)",
        plan.name,
        plan.provider,
        plan.changes.len()
    );
    println!();

    for change in &plan.changes {
        let symbol = match change.action {
            types::PlanAction::Create => "+",
            types::PlanAction::Update => "~",
            types::PlanAction::NoOp => " ",
        };
        println!("  {} {}", symbol, change.description);
    }
    for key in &plan.orphaned {
        println!("  ! {}: no longer declared (left in place)", key);
    }

    println!();
    println!(
        "Plan: {} to add, {} to change, {} unchanged, {} orphaned.",
        plan.to_create,
        plan.to_update,
        plan.unchanged,
        plan.orphaned.len()
    );
}

fn cmd_apply(file: &Path, state_dir: &Path, dry_run: bool, lenient: bool) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    let cfg = executor::ApplyConfig {
        config: &config,
        state_dir,
        dry_run,
        lenient,
    };

    let result = executor::apply(&cfg)?;

    if result.dry_run {
        print_plan(&result.plan);
        println!("Dry run: no changes applied.");
        return Ok(());
    }

    println!(
        "Apply complete: {} created ({:.2}s, run {}).",
        result.resources_created,
        result.total_duration.as_secs_f64(),
        result.run_id
    );
    Ok(())
}

fn cmd_status(state_dir: &Path, stack_filter: Option<&str>) -> Result<()> {
    if !state_dir.is_dir() {
        println!("No state found. Run `cloudplat apply` first.");
        return Ok(());
    }

    let mut names: Vec<String> = std::fs::read_dir(state_dir)?
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| stack_filter.is_none_or(|f| f == name))
        .collect();
    names.sort();

    let mut found = false;
    for name in &names {
        if let Some(lock) = state::load_lock(state_dir, name)? {
            found = true;
            let events = eventlog::read_events(state_dir, name)?;
            println!("Stack: {} ({} / {})", lock.stack, lock.provider, lock.region);
            println!("  Generated: {}", lock.generated_at);
            println!("  Generator: {}", lock.generator);
            println!("  Events: {}", events.len());
            println!("  Declarations: {}", lock.declarations.len());
            println!("  Resources: {}", lock.resources.len());

            for (key, rl) in &lock.resources {
                let duration = rl
                    .duration_seconds
                    .map(|d| format!(" ({:.2}s)", d))
                    .unwrap_or_default();
                println!("    {}: {} [{}]{}", key, rl.status, rl.kind, duration);
            }
            println!();
        }
    }

    if !found {
        println!("No state found. Run `cloudplat apply` first.");
    }

    Ok(())
}

fn cmd_outputs(file: &Path, state_dir: &Path, key: Option<&str>, json: bool) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    let lock = state::load_lock(state_dir, &config.name)?.ok_or_else(|| {
        Error::State(format!(
            "no lock for stack '{}'; run `cloudplat apply` first",
            config.name
        ))
    })?;

    let mut outputs = serde_json::Map::new();
    for (k, rl) in &lock.resources {
        if key.is_some_and(|wanted| wanted != k) || rl.status != types::ResourceStatus::Created {
            continue;
        }
        outputs.insert(k.clone(), rl.outputs.clone());
    }
    if let Some(wanted) = key {
        if outputs.is_empty() {
            return Err(Error::State(format!(
                "no recorded outputs for '{}' in stack '{}'",
                wanted, config.name
            )));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    for (k, value) in &outputs {
        println!("{}:", k);
        if let Some(fields) = value.as_object() {
            for (field, v) in fields {
                match v {
                    serde_json::Value::String(s) => println!("  {}: {}", field, s),
                    other => println!("  {}: {}", field, other),
                }
            }
        }
    }
    Ok(())
}
