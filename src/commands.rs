//! Command implementations behind the CLI.
//!
//! Each `run_*` takes the resolved config plus its parsed args and prints to
//! stdout; logs go to stderr through `tracing`.
use crate::cli::{
    BandArgs, BundlesArgs, CapabilityOp, Command, DeleteArgs, DiagArgs, EditArgs, EditOp,
    ExportArgs, FetchArgs, GenerateArgs, ImportArgs, InitArgs, ListArgs, RequirementOp, RoleOp,
    RootArgs, ServeArgs, ShowArgs, ValidateArgs,
};
use crate::config::{self, ResolvedConfig, ServiceConfig};
use crate::diag;
use crate::error::ShiftError;
use crate::generate::Generator;
use crate::model::{CapabilityAdd, ConfigDocument, DailyRequirement, WorkConstraint};
use crate::server;
use crate::staging::write_atomic;
use crate::store::{DocumentStore, STAGING_NAME};
use crate::util::display_path;
use crate::validate::{review, ValidationReport};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn run(args: RootArgs) -> Result<()> {
    let mut service = config::load_config(args.config.as_deref())?;
    config::apply_process_env(&mut service)?;
    let resolved = config::resolve(&service, args.data_dir.as_deref())?;
    tracing::debug!(data_dir = %resolved.data_dir.display(), "resolved config");
    match args.command {
        Command::Serve(args) => run_serve(resolved, args),
        Command::Init(args) => run_init(&service, &resolved, args),
        Command::List(args) => run_list(&resolved, args),
        Command::Show(args) => run_show(&resolved, args),
        Command::Import(args) => run_import(&resolved, args),
        Command::ExportDoc(args) => run_export(&resolved, args),
        Command::Delete(args) => run_delete(&resolved, args),
        Command::Validate(args) => run_validate(&resolved, args),
        Command::Edit(args) => run_edit(&resolved, args),
        Command::Generate(args) => run_generate(&resolved, args),
        Command::Bundles(args) => run_bundles(&resolved, args),
        Command::Fetch(args) => run_fetch(&resolved, args),
        Command::Diag(args) => run_diag(&resolved, args),
    }
}

fn open_store(resolved: &ResolvedConfig) -> Result<DocumentStore> {
    let store = DocumentStore::new(resolved.paths(), resolved.limits);
    store
        .init()
        .with_context(|| format!("initialize data dir {}", resolved.data_dir.display()))?;
    Ok(store)
}

/// The staging slot is only written by staging a document.
fn ensure_writable(name: &str) -> Result<()> {
    if name == STAGING_NAME {
        return Err(ShiftError::InvalidName {
            name: name.to_string(),
            reason: "the staging slot is written by generate",
        }
        .into());
    }
    Ok(())
}

fn open_generator(resolved: &ResolvedConfig) -> Result<Generator> {
    Ok(Generator::new(open_store(resolved)?, resolved.generator_settings()))
}

pub fn run_serve(mut resolved: ResolvedConfig, args: ServeArgs) -> Result<()> {
    if let Some(bind) = args.bind {
        resolved.bind = bind;
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(server::serve(&resolved))
}

pub fn run_init(service: &ServiceConfig, resolved: &ResolvedConfig, args: InitArgs) -> Result<()> {
    let store = open_store(resolved)?;
    println!("data dir ready at {}", resolved.data_dir.display());
    if let Some(name) = args.example.as_deref() {
        ensure_writable(name)?;
        if store.exists(name)? && !args.force {
            return Err(anyhow!(
                "document {name:?} already exists (use --force to overwrite)"
            ));
        }
        store.save(name, &ConfigDocument::example())?;
        println!("stored example document as {name:?}");
    }
    if let Some(path) = args.write_config.as_deref() {
        let effective = ServiceConfig {
            data_dir: Some(resolved.data_dir.clone()),
            bind: Some(resolved.bind.to_string()),
            ..service.clone()
        };
        config::write_config(path, &effective)?;
        println!("wrote config {}", path.display());
    }
    Ok(())
}

pub fn run_list(resolved: &ResolvedConfig, args: ListArgs) -> Result<()> {
    let names = open_store(resolved)?.list()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn run_show(resolved: &ResolvedConfig, args: ShowArgs) -> Result<()> {
    let doc = open_store(resolved)?.load(&args.name)?;
    println!("{}", doc.to_json_pretty()?);
    Ok(())
}

pub fn run_import(resolved: &ResolvedConfig, args: ImportArgs) -> Result<()> {
    ensure_writable(&args.name)?;
    let bytes =
        fs::read(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let doc = ConfigDocument::from_json_slice(&bytes)
        .with_context(|| format!("parse document {}", args.file.display()))?;
    let store = open_store(resolved)?;
    if store.exists(&args.name)? && !args.force {
        return Err(anyhow!(
            "document {:?} already exists (use --force to overwrite)",
            args.name
        ));
    }
    store.save(&args.name, &doc)?;
    println!("imported {} as {:?}", args.file.display(), args.name);
    print_report(&review(&doc));
    Ok(())
}

pub fn run_export(resolved: &ResolvedConfig, args: ExportArgs) -> Result<()> {
    let doc = open_store(resolved)?.load(&args.name)?;
    let mut text = doc.to_json_pretty()?;
    text.push('\n');
    match args.out {
        Some(out) => {
            write_atomic(&out, text.as_bytes())?;
            eprintln!("wrote {}", out.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

pub fn run_delete(resolved: &ResolvedConfig, args: DeleteArgs) -> Result<()> {
    open_store(resolved)?.delete(&args.name)?;
    println!("deleted {:?}", args.name);
    Ok(())
}

pub fn run_validate(resolved: &ResolvedConfig, args: ValidateArgs) -> Result<()> {
    let doc = match (&args.file, &args.name) {
        (Some(file), _) => {
            let bytes = fs::read(file).with_context(|| format!("read {}", file.display()))?;
            ConfigDocument::from_json_slice(&bytes)
                .with_context(|| format!("parse document {}", file.display()))?
        }
        (None, Some(name)) => open_store(resolved)?.load(name)?,
        (None, None) => return Err(anyhow!("pass a document name or --file")),
    };
    let report = review(&doc);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    if !report.is_valid() {
        return Err(anyhow!(
            "{} blocking violation(s)",
            report.violations.len()
        ));
    }
    Ok(())
}

pub fn run_edit(resolved: &ResolvedConfig, args: EditArgs) -> Result<()> {
    ensure_writable(&args.name)?;
    let store = open_store(resolved)?;
    let mut doc = store.load(&args.name)?;
    let summary = apply_edit(&mut doc, args.op)
        .with_context(|| format!("edit document {:?}", args.name))?;
    store.save(&args.name, &doc)?;
    tracing::info!(name = %args.name, edit = %summary, "saved edit");
    println!("{summary}");
    print_report(&review(&doc));
    Ok(())
}

/// Apply one edit and describe what happened.
pub fn apply_edit(doc: &mut ConfigDocument, op: EditOp) -> Result<String> {
    let summary = match op {
        EditOp::Role(RoleOp::Add { role, role_type }) => {
            doc.add_role(&role, role_type)?;
            format!("added role {role:?} ({role_type})")
        }
        EditOp::Role(RoleOp::Remove { role }) => {
            let unfilled = doc.delete_role(&role)?;
            let mut summary = format!("removed role {role:?}");
            if !unfilled.is_empty() {
                summary.push_str(&format!(
                    "; now unfilled: {}",
                    unfilled.join(", ")
                ));
            }
            summary
        }
        EditOp::Role(RoleOp::Rename { old, new }) => {
            doc.rename_role(&old, &new)?;
            format!("renamed role {old:?} to {new:?}")
        }
        EditOp::Role(RoleOp::Set {
            role,
            role_type,
            count,
        }) => {
            if role_type.is_none() && count.is_none() {
                return Err(anyhow!("role set needs --type or --count"));
            }
            if doc.role(&role).is_none() {
                return Err(ShiftError::unknown("role", &role).into());
            }
            if let Some(role_type) = role_type {
                doc.set_role_type(&role, role_type)?;
            }
            if let Some(count) = count {
                doc.set_role_count(&role, count)?;
            }
            format!("updated role {role:?}")
        }
        EditOp::Requirement(RequirementOp::Add { key }) => {
            doc.add_daily_requirement(&key)?;
            format!("added requirement {key:?}")
        }
        EditOp::Requirement(RequirementOp::Remove { key }) => {
            doc.delete_daily_requirement(&key)?;
            format!("removed requirement {key:?}")
        }
        EditOp::Requirement(RequirementOp::Rename { old, new }) => {
            doc.rename_daily_requirement(&old, &new)?;
            format!("renamed requirement {old:?} to {new:?}")
        }
        EditOp::Requirement(RequirementOp::Set(band)) => {
            let key = band.key.clone();
            let current = doc
                .requirement(&key)
                .copied()
                .ok_or_else(|| ShiftError::unknown("daily requirement", &key))?;
            doc.set_daily_requirement(&key, merge_band(current, &band))?;
            format!("updated band of {key:?}")
        }
        EditOp::Capability(CapabilityOp::Add { key, role, tier }) => {
            match doc.add_capability(&key, tier, &role)? {
                CapabilityAdd::Added => format!("added {role:?} to {key}.{tier}"),
                CapabilityAdd::Duplicate => {
                    format!("{role:?} is already in {key}.{tier}; nothing changed")
                }
            }
        }
        EditOp::Capability(CapabilityOp::Remove { key, role, tier }) => {
            doc.remove_capability(&key, tier, &role)?;
            format!("removed {role:?} from {key}.{tier}")
        }
        EditOp::Capability(CapabilityOp::SetTier { key, tier, roles }) => {
            let count = roles.len();
            doc.set_capability_tier(&key, tier, roles)?;
            format!("set {key}.{tier} to {count} role(s)")
        }
        EditOp::Reorder(args) => {
            doc.reorder(args.list, args.keys)?;
            format!("reordered {}", args.list)
        }
        EditOp::Constraint(args) => {
            let current = *doc.work_constraints().get(args.worker_type);
            let constraint = WorkConstraint::new(
                args.weekly_days_off.unwrap_or(current.weekly_days_off),
                args.max_consecutive_days
                    .unwrap_or(current.max_consecutive_days),
                args.min_monthly_workdays
                    .unwrap_or(current.min_monthly_workdays),
            );
            doc.set_work_constraint(args.worker_type, constraint)?;
            format!("updated work constraint for {}", args.worker_type)
        }
        EditOp::Scope(args) => {
            doc.set_calendar_scope(args.year, &args.months)?;
            format!(
                "scope set to {} with months [{}]",
                args.year,
                doc.months().join(", ")
            )
        }
        EditOp::Headcount(args) => {
            let value = if args.unset { None } else { Some(args.on) };
            doc.set_optimize_headcount(value);
            match value {
                Some(flag) => format!("optimize_headcount = {flag}"),
                None => "optimize_headcount cleared".to_string(),
            }
        }
    };
    Ok(summary)
}

fn merge_band(current: DailyRequirement, band: &BandArgs) -> DailyRequirement {
    DailyRequirement::new(
        band.normal_min.unwrap_or(current.normal_min),
        band.normal_max.unwrap_or(current.normal_max),
        band.friend_min.unwrap_or(current.friend_min),
        band.friend_max.unwrap_or(current.friend_max),
    )
}

pub fn run_generate(resolved: &ResolvedConfig, args: GenerateArgs) -> Result<()> {
    let generator = open_generator(resolved)?;
    let handle = generator
        .generate(&args.name)
        .with_context(|| format!("generate from {:?}", args.name))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&handle)?);
    } else {
        let bundle_dir = resolved.paths().bundle_dir(&handle.bundle_id);
        println!("generated {}", handle.bundle_id);
        println!(
            "bundle: {}",
            display_path(&bundle_dir, Some(&resolved.data_dir))
        );
    }
    Ok(())
}

pub fn run_bundles(resolved: &ResolvedConfig, args: BundlesArgs) -> Result<()> {
    let bundles = open_generator(resolved)?.list_bundles()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&bundles)?);
    } else {
        for bundle in bundles {
            println!("{}\t{}", bundle.bundle_id, bundle.created_at.to_rfc3339());
        }
    }
    Ok(())
}

pub fn run_fetch(resolved: &ResolvedConfig, args: FetchArgs) -> Result<()> {
    let archive = open_generator(resolved)?.fetch(&args.bundle_id)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{}.tar.gz", args.bundle_id)));
    write_atomic(&out, &archive)?;
    println!("wrote {} ({} bytes)", out.display(), archive.len());
    Ok(())
}

pub fn run_diag(resolved: &ResolvedConfig, args: DiagArgs) -> Result<()> {
    let report = diag::collect(&open_generator(resolved)?)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("data dir:      {}", report.data_dir);
    println!("documents:     {} in {}", report.document_count, report.documents_dir);
    println!("staging slot:  {}", report.staging_path);
    println!("bundles:       {} in {}", report.bundle_count, report.bundles_dir);
    let present = if report.resources_present { "" } else { " (missing)" };
    println!("resources:     {}{present}", report.resources_dir);
    println!("step timeout:  {}s", report.timeout_secs);
    for check in &report.engine {
        match &check.resolved {
            Some(path) => println!("engine step {}: {} -> {path}", check.step, check.program),
            None => println!("engine step {}: {} (not found)", check.step, check.program),
        }
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    if report.violations.is_empty() && report.warnings.is_empty() {
        println!("valid");
        return;
    }
    for violation in &report.violations {
        println!("violation: {}: {}", violation.path, violation.message);
    }
    for warning in &report.warnings {
        println!("warning: {}", warning.message);
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
