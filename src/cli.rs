//! CLI argument parsing for the shift configuration service.
//!
//! Every command that touches documents goes through the same store the HTTP
//! server uses, so edits made here are visible to a running server.
use crate::model::{OrderList, RoleType, Tier, WorkerType};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "shiftdesk",
    version,
    about = "Shift schedule configuration store, validator, and engine runner",
    after_help = "Examples:\n  shiftdesk init --example main\n  shiftdesk edit main role add 清掃 --type part_timer\n  shiftdesk validate main\n  shiftdesk generate main\n  shiftdesk serve --bind 127.0.0.1:3001",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Service config file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory holding documents, the staging slot, and bundles
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Serve(ServeArgs),
    Init(InitArgs),
    List(ListArgs),
    Show(ShowArgs),
    Import(ImportArgs),
    #[command(name = "export-doc")]
    ExportDoc(ExportArgs),
    Delete(DeleteArgs),
    Validate(ValidateArgs),
    Edit(EditArgs),
    Generate(GenerateArgs),
    Bundles(BundlesArgs),
    Fetch(FetchArgs),
    Diag(DiagArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Serve the HTTP API")]
pub struct ServeArgs {
    /// Listen address, overriding the config file and SHIFTDESK_BIND
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

#[derive(Parser, Debug)]
#[command(about = "Create the data directory layout")]
pub struct InitArgs {
    /// Also store the built-in example document under this name
    #[arg(long, value_name = "NAME")]
    pub example: Option<String>,

    /// Overwrite an existing document of the same name
    #[arg(long)]
    pub force: bool,

    /// Write the effective service config to this path
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "List stored documents")]
pub struct ListArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print a stored document as JSON")]
pub struct ShowArgs {
    pub name: String,
}

#[derive(Parser, Debug)]
#[command(about = "Store a document from a JSON file")]
pub struct ImportArgs {
    /// Name to store the document under
    pub name: String,

    /// Document JSON to read
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Overwrite an existing document of the same name
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a stored document to a file or stdout")]
pub struct ExportArgs {
    pub name: String,

    /// Destination path (stdout when omitted)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Delete a stored document")]
pub struct DeleteArgs {
    pub name: String,
}

#[derive(Parser, Debug)]
#[command(about = "Check a document and report violations and warnings")]
pub struct ValidateArgs {
    /// Stored document name
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub name: Option<String>,

    /// Validate a JSON file instead of a stored document
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Apply one structural edit to a stored document")]
pub struct EditArgs {
    /// Stored document name
    pub name: String,

    #[command(subcommand)]
    pub op: EditOp,
}

#[derive(Subcommand, Debug)]
pub enum EditOp {
    /// Add, remove, rename, or update a role
    #[command(subcommand)]
    Role(RoleOp),
    /// Add, remove, rename, or re-band a daily requirement
    #[command(subcommand)]
    Requirement(RequirementOp),
    /// Edit the capability tiers of a requirement
    #[command(subcommand)]
    Capability(CapabilityOp),
    /// Replace an ordering list with a permutation of its keys
    Reorder(ReorderArgs),
    /// Replace the work-constraint row of a worker type
    Constraint(ConstraintArgs),
    /// Set the fiscal year and months
    Scope(ScopeArgs),
    /// Set or clear the headcount optimization flag
    Headcount(HeadcountArgs),
}

#[derive(Subcommand, Debug)]
pub enum RoleOp {
    Add {
        role: String,
        #[arg(long = "type", value_name = "TYPE", default_value = "employee")]
        role_type: RoleType,
    },
    Remove {
        role: String,
    },
    Rename {
        old: String,
        new: String,
    },
    Set {
        role: String,
        #[arg(long = "type", value_name = "TYPE")]
        role_type: Option<RoleType>,
        #[arg(long)]
        count: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RequirementOp {
    Add {
        key: String,
    },
    Remove {
        key: String,
    },
    Rename {
        old: String,
        new: String,
    },
    Set(BandArgs),
}

#[derive(Args, Debug)]
pub struct BandArgs {
    pub key: String,
    #[arg(long)]
    pub normal_min: Option<u32>,
    #[arg(long)]
    pub normal_max: Option<u32>,
    #[arg(long)]
    pub friend_min: Option<u32>,
    #[arg(long)]
    pub friend_max: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum CapabilityOp {
    Add {
        key: String,
        role: String,
        #[arg(long, default_value = "primary")]
        tier: Tier,
    },
    Remove {
        key: String,
        role: String,
        #[arg(long, default_value = "primary")]
        tier: Tier,
    },
    /// Replace a tier with the given roles, in order
    SetTier {
        key: String,
        #[arg(long)]
        tier: Tier,
        roles: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct ReorderArgs {
    /// rolesOrder (or roles) / requirementOrder (or requirements)
    pub list: OrderList,
    /// Every key of the list, in the new order
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ConstraintArgs {
    pub worker_type: WorkerType,
    #[arg(long)]
    pub weekly_days_off: Option<u32>,
    #[arg(long)]
    pub max_consecutive_days: Option<u32>,
    #[arg(long)]
    pub min_monthly_workdays: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ScopeArgs {
    #[arg(long)]
    pub year: i64,
    /// Month tokens (YYYYMM, bare month numbers, or 2025年1月)
    pub months: Vec<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct HeadcountArgs {
    #[arg(long)]
    pub on: bool,
    #[arg(long)]
    pub off: bool,
    /// Drop the field from the document
    #[arg(long)]
    pub unset: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Stage a document and run the scheduling engine")]
pub struct GenerateArgs {
    /// Stored document to generate from
    pub name: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "List generated bundles, newest first")]
pub struct BundlesArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a bundle archive (.tar.gz)")]
pub struct FetchArgs {
    pub bundle_id: String,

    /// Destination path (defaults to <bundle_id>.tar.gz)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Show resolved paths and engine availability")]
pub struct DiagArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn parses_nested_edit_ops() {
        let args = RootArgs::try_parse_from([
            "shiftdesk",
            "--data-dir",
            "/tmp/d",
            "edit",
            "main",
            "capability",
            "add",
            "売店",
            "店長",
            "--tier",
            "secondary",
        ])
        .expect("parse");
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/d")));
        let Command::Edit(edit) = args.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.name, "main");
        match edit.op {
            EditOp::Capability(CapabilityOp::Add { key, role, tier }) => {
                assert_eq!(key, "売店");
                assert_eq!(role, "店長");
                assert_eq!(tier, Tier::Secondary);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_role_type() {
        let err = RootArgs::try_parse_from([
            "shiftdesk", "edit", "main", "role", "add", "x", "--type", "contractor",
        ])
        .expect_err("bad type");
        assert!(err.to_string().contains("contractor"));
    }
}
