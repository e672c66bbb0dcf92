use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arca",
    about = "Arca: versioned objects with inline and file-store content",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to arca.toml
    #[arg(long, global = true, default_value = "arca.toml")]
    pub config: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage file stores
    #[command(subcommand)]
    Store(StoreAction),
    /// Manage versioned objects
    #[command(subcommand, alias = "doc")]
    Object(ObjectAction),
    /// Manage content and renditions
    #[command(subcommand)]
    Content(ContentAction),
}

#[derive(Subcommand)]
pub enum StoreAction {
    /// Register a new file store
    Add {
        name: String,
        root: PathBuf,
        #[arg(long)]
        inactive: bool,
    },
    /// List file stores
    List,
    /// Allow writes to a store
    Activate { name: String },
    /// Stop writes to a store
    Deactivate { name: String },
    /// Show free space on a store
    Space { name: String },
    /// Remove an unreferenced store
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum ObjectAction {
    /// Create a new object at version 1.0
    Create(CreateArgs),
    /// List the latest version of every lineage
    List {
        #[arg(long, default_value = "document")]
        kind: String,
    },
    /// Show one version
    Show { id: String },
    /// Show a version and its ancestors
    History { id: String },
    /// Branch a new major version
    Major { id: String },
    /// Branch a new minor version
    Minor { id: String },
    /// Delete a version and its content
    Delete { id: String },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long, default_value = "document")]
    pub kind: String,
    pub name: String,
    /// Id of the user the object is attributed to
    #[arg(long)]
    pub owner: Option<String>,
    /// File to attach as primary content
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = "application/octet-stream")]
    pub mime: String,
    /// Folder path (folders only)
    #[arg(long)]
    pub path: Option<String>,
    /// Email address (users only)
    #[arg(long)]
    pub email: Option<String>,
    /// Query (reports only)
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Store the bytes in this file store
    #[arg(long, conflicts_with = "inline")]
    pub store: Option<String>,
    /// Store the bytes inline
    #[arg(long)]
    pub inline: bool,
}

#[derive(Subcommand)]
pub enum ContentAction {
    /// Attach a file as primary content of an object
    Add {
        owner: String,
        file: PathBuf,
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Attach a secondary rendition to a primary content
    Rendition {
        primary: String,
        file: PathBuf,
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        no_index: bool,
        #[arg(long)]
        store: Option<String>,
    },
    /// List content owned by an object
    List { owner: String },
    /// Write content bytes to a file or stdout
    Get {
        id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace a primary's bytes (drops its renditions)
    Update { id: String, file: PathBuf },
    /// Move content between backends
    Move {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Delete content (a primary takes its renditions with it)
    Delete { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_store_add() {
        let cli = Cli::try_parse_from(["arca", "store", "add", "bulk", "/srv/bulk"]).unwrap();
        if let Command::Store(StoreAction::Add { name, root, inactive }) = cli.command {
            assert_eq!(name, "bulk");
            assert_eq!(root, PathBuf::from("/srv/bulk"));
            assert!(!inactive);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_doc_alias() {
        let cli = Cli::try_parse_from(["arca", "doc", "create", "plan", "--file", "plan.pdf"]).unwrap();
        if let Command::Object(ObjectAction::Create(args)) = cli.command {
            assert_eq!(args.kind, "document");
            assert_eq!(args.name, "plan");
            assert_eq!(args.file, Some(PathBuf::from("plan.pdf")));
            assert!(args.owner.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_create_owner() {
        let cli = Cli::try_parse_from([
            "arca", "object", "create", "plan", "--kind", "report", "--query", "q",
            "--owner", "0190f1a2-0000-7000-8000-000000000001",
        ])
        .unwrap();
        if let Command::Object(ObjectAction::Create(args)) = cli.command {
            assert_eq!(args.kind, "report");
            assert_eq!(args.owner.as_deref(), Some("0190f1a2-0000-7000-8000-000000000001"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["arca", "object", "list", "--format", "json", "-v", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn move_targets_conflict() {
        assert!(Cli::try_parse_from(["arca", "content", "move", "id", "--inline", "--store", "bulk"]).is_err());
        let cli = Cli::try_parse_from(["arca", "content", "move", "id", "--store", "bulk"]).unwrap();
        if let Command::Content(ContentAction::Move { target, .. }) = cli.command {
            assert_eq!(target.store.as_deref(), Some("bulk"));
            assert!(!target.inline);
        } else { panic!("wrong command"); }
    }
}
