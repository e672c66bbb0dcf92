use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use arca_sdk::{
    Arca, ArcaConfig, Content, ContentId, Document, FileStore, Folder, ManagedKind, ObjectId,
    ObjectSummary, OwnerId, Report, StorageTarget, Upload, User, Versioned,
};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ArcaConfig::load(&cli.config)?;
    let arca = Arca::open(config)?;
    let out = Output(cli.format);

    let mutated = match cli.command {
        Command::Store(action) => cmd_store(&arca, out, action)?,
        Command::Object(action) => cmd_object(&arca, out, action)?,
        Command::Content(action) => cmd_content(&arca, out, action)?,
    };
    if mutated {
        arca.flush()?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    fn json(&self) -> bool {
        self.0 == OutputFormat::Json
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        if self.json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

/// Content row without its inline bytes.
#[derive(Serialize)]
struct ContentView {
    id: ContentId,
    name: String,
    mime_type: String,
    location: String,
    size: u64,
    is_primary: bool,
    is_indexable: bool,
    rendition_parent: Option<ContentId>,
    file_store: Option<String>,
    shard_path: Option<String>,
}

impl From<&Content> for ContentView {
    fn from(c: &Content) -> Self {
        let external = c.payload.external();
        Self {
            id: c.id,
            name: c.name.clone(),
            mime_type: c.mime_type.clone(),
            location: c.location().to_string(),
            size: c.size,
            is_primary: c.is_primary,
            is_indexable: c.is_indexable,
            rendition_parent: c.rendition_parent,
            file_store: external.map(|(s, _)| s.to_string()),
            shard_path: external.map(|(_, p)| p.to_string()),
        }
    }
}

fn parse_object(id: &str) -> anyhow::Result<ObjectId> {
    id.parse().with_context(|| format!("invalid object id {id:?}"))
}

fn parse_owner(id: &str) -> anyhow::Result<OwnerId> {
    id.parse().with_context(|| format!("invalid owner id {id:?}"))
}

fn parse_content(id: &str) -> anyhow::Result<ContentId> {
    id.parse().with_context(|| format!("invalid content id {id:?}"))
}

fn read_upload(path: &Path, mime: &str) -> anyhow::Result<Upload> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(Upload::from_reader(filename, mime, file)?)
}

fn target(arca: &Arca, args: &TargetArgs) -> anyhow::Result<Option<StorageTarget>> {
    if args.inline {
        return Ok(Some(StorageTarget::Inline));
    }
    match &args.store {
        Some(name) => Ok(Some(StorageTarget::FileStore(
            arca.file_stores().find_by_name(name)?.id,
        ))),
        None => Ok(None),
    }
}

fn print_summary(s: &ObjectSummary) {
    let parent = s
        .parent_version
        .map(|p| p.short_id())
        .unwrap_or_else(|| "-".into());
    println!(
        "{}  {} {}  {}  parent {}",
        s.id.to_string().dimmed(),
        s.name.bold(),
        format!("v{}", s.version).yellow(),
        s.kind.cyan(),
        parent
    );
}

fn print_content(c: &ContentView) {
    let role = if c.is_primary { "primary".green() } else { "rendition".blue() };
    println!(
        "{}  {}  {}  {} bytes  {}  {}",
        c.id.to_string().dimmed(),
        c.name.bold(),
        role,
        c.size,
        c.location.cyan(),
        c.mime_type
    );
}

fn print_store(s: &FileStore) {
    let status = if s.is_active() {
        s.status.to_string().green()
    } else {
        s.status.to_string().red()
    };
    println!("{}  {}  {}", s.name.bold(), status, s.root_path.display());
}

// ---- Stores ----

fn cmd_store(arca: &Arca, out: Output, action: StoreAction) -> anyhow::Result<bool> {
    let stores = arca.file_stores();
    match action {
        StoreAction::Add {
            name,
            root,
            inactive,
        } => {
            let store = if inactive {
                FileStore::new_inactive(name, root)
            } else {
                FileStore::new(name, root)
            };
            let store = stores.save(store)?;
            out.emit(&store, || {
                println!("{} Registered file store {}", "✓".green().bold(), store.name.bold())
            })?;
            Ok(true)
        }
        StoreAction::List => {
            let all = stores.find_all()?;
            out.emit(&all, || {
                if all.is_empty() {
                    println!("No file stores registered.");
                }
                all.iter().for_each(print_store);
            })?;
            Ok(false)
        }
        StoreAction::Activate { name } => {
            let store = stores.activate(&stores.find_by_name(&name)?.id)?;
            out.emit(&store, || println!("{} Activated {}", "✓".green().bold(), name.bold()))?;
            Ok(true)
        }
        StoreAction::Deactivate { name } => {
            let store = stores.deactivate(&stores.find_by_name(&name)?.id)?;
            out.emit(&store, || println!("{} Deactivated {}", "✓".green().bold(), name.bold()))?;
            Ok(true)
        }
        StoreAction::Space { name } => {
            let available = stores.get_available_space(&stores.find_by_name(&name)?.id)?;
            out.emit(&serde_json::json!({ "store": name, "available": available }), || {
                println!("{}: {} bytes available", name.bold(), available)
            })?;
            Ok(false)
        }
        StoreAction::Delete { name } => {
            stores.delete(&stores.find_by_name(&name)?.id)?;
            out.emit(&serde_json::json!({ "deleted": name }), || {
                println!("{} Deleted file store {}", "✓".green().bold(), name.bold())
            })?;
            Ok(true)
        }
    }
}

// ---- Objects ----

/// Per-invocation options shared by every kind of `object create`.
struct CreateOptions {
    out: Output,
    owner: Option<OwnerId>,
    upload: Option<Upload>,
}

fn create<K: ManagedKind>(arca: &Arca, options: CreateOptions, object: K) -> anyhow::Result<()> {
    let CreateOptions { out, owner, upload } = options;
    let object = match owner {
        Some(owner) => object.with_owner(owner),
        None => object,
    };
    let (object, content) = arca.create(object, upload)?;
    let summary = ObjectSummary::of(&object);
    let content = content.as_ref().map(ContentView::from);
    out.emit(
        &serde_json::json!({ "object": summary, "content": content }),
        || {
            println!("{} Created {}", "✓".green().bold(), K::LABEL.to_lowercase());
            print_summary(&summary);
            if let Some(c) = &content {
                print_content(c);
            }
        },
    )
}

fn branch(arca: &Arca, id: &ObjectId, major: bool) -> anyhow::Result<ObjectSummary> {
    fn run<K: ManagedKind>(arca: &Arca, id: &ObjectId, major: bool) -> anyhow::Result<ObjectSummary> {
        let created: K = if major {
            arca.create_major_version(id)?
        } else {
            arca.create_minor_version(id)?
        };
        Ok(ObjectSummary::of(&created))
    }

    match arca.kinds().locate(id)?.kind() {
        Document::KIND => run::<Document>(arca, id, major),
        Folder::KIND => run::<Folder>(arca, id, major),
        User::KIND => run::<User>(arca, id, major),
        Report::KIND => run::<Report>(arca, id, major),
        other => bail!("unsupported kind {other}"),
    }
}

fn cmd_object(arca: &Arca, out: Output, action: ObjectAction) -> anyhow::Result<bool> {
    match action {
        ObjectAction::Create(args) => {
            let upload = match &args.file {
                Some(path) => Some(read_upload(path, &args.mime)?),
                None => None,
            };
            let owner = match &args.owner {
                Some(id) => Some(parse_owner(id)?),
                None => None,
            };
            let options = CreateOptions { out, owner, upload };
            match args.kind.as_str() {
                Document::KIND => create(arca, options, Document::new(args.name))?,
                Folder::KIND => {
                    let path = args.path.unwrap_or_else(|| "/".into());
                    create(arca, options, Folder::new(args.name, path))?
                }
                User::KIND => {
                    let email = args.email.context("--email is required for users")?;
                    create(arca, options, User::new(args.name, email))?
                }
                Report::KIND => {
                    let query = args.query.context("--query is required for reports")?;
                    create(arca, options, Report::new(args.name, query))?
                }
                other => bail!("unknown kind {other:?}"),
            }
            Ok(true)
        }
        ObjectAction::List { kind } => {
            let latest = arca.kinds().get(&kind)?.latest_summaries()?;
            out.emit(&latest, || {
                if latest.is_empty() {
                    println!("No {kind} objects.");
                }
                latest.iter().for_each(print_summary);
            })?;
            Ok(false)
        }
        ObjectAction::Show { id } => {
            let id = parse_object(&id)?;
            let summary = arca.kinds().locate(&id)?.summary(&id)?;
            let contents: Vec<ContentView> = arca
                .content()
                .find_by_owner(&id)?
                .iter()
                .map(ContentView::from)
                .collect();
            out.emit(
                &serde_json::json!({ "object": summary, "contents": contents }),
                || {
                    print_summary(&summary);
                    contents.iter().for_each(print_content);
                },
            )?;
            Ok(false)
        }
        ObjectAction::History { id } => {
            let id = parse_object(&id)?;
            let history = arca.kinds().locate(&id)?.history(&id)?;
            out.emit(&history, || history.iter().for_each(print_summary))?;
            Ok(false)
        }
        ObjectAction::Major { id } => {
            let summary = branch(arca, &parse_object(&id)?, true)?;
            out.emit(&summary, || {
                println!("{} Created major version", "✓".green().bold());
                print_summary(&summary);
            })?;
            Ok(true)
        }
        ObjectAction::Minor { id } => {
            let summary = branch(arca, &parse_object(&id)?, false)?;
            out.emit(&summary, || {
                println!("{} Created minor version", "✓".green().bold());
                print_summary(&summary);
            })?;
            Ok(true)
        }
        ObjectAction::Delete { id } => {
            let id = parse_object(&id)?;
            arca.delete_any(&id)?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                println!("{} Deleted {}", "✓".green().bold(), id.to_string().dimmed())
            })?;
            Ok(true)
        }
    }
}

// ---- Content ----

fn cmd_content(arca: &Arca, out: Output, action: ContentAction) -> anyhow::Result<bool> {
    let store = arca.content();
    match action {
        ContentAction::Add {
            owner,
            file,
            mime,
            target: target_args,
        } => {
            let owner = parse_object(&owner)?;
            let upload = read_upload(&file, &mime)?;
            let content = match target(arca, &target_args)? {
                Some(t) => arca.attach_to(&owner, upload, t)?,
                None => arca.attach(&owner, upload)?,
            };
            let view = ContentView::from(&content);
            out.emit(&view, || {
                println!("{} Added content", "✓".green().bold());
                print_content(&view);
            })?;
            Ok(true)
        }
        ContentAction::Rendition {
            primary,
            file,
            mime,
            name,
            no_index,
            store: store_name,
        } => {
            let primary = parse_content(&primary)?;
            let upload = read_upload(&file, &mime)?;
            let name = name.unwrap_or_else(|| upload.filename.clone());
            let rendition = match store_name {
                Some(s) => {
                    let fs_id = arca.file_stores().find_by_name(&s)?.id;
                    store.add_rendition_external(
                        &primary,
                        &name,
                        &upload.data,
                        &upload.mime_type,
                        !no_index,
                        &fs_id,
                    )?
                }
                None => store.add_rendition(&primary, &name, upload.data, &upload.mime_type, !no_index)?,
            };
            let view = ContentView::from(&rendition);
            out.emit(&view, || {
                println!("{} Added rendition", "✓".green().bold());
                print_content(&view);
            })?;
            Ok(true)
        }
        ContentAction::List { owner } => {
            let owner = parse_object(&owner)?;
            let views: Vec<ContentView> = store
                .find_by_owner(&owner)?
                .iter()
                .map(ContentView::from)
                .collect();
            out.emit(&views, || {
                if views.is_empty() {
                    println!("No content.");
                }
                views.iter().for_each(print_content);
            })?;
            Ok(false)
        }
        ContentAction::Get { id, output } => {
            let bytes = store.get_bytes(&parse_content(&id)?)?;
            match output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    eprintln!("{} Wrote {} bytes to {}", "✓".green().bold(), bytes.len(), path.display());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
            Ok(false)
        }
        ContentAction::Update { id, file } => {
            let id = parse_content(&id)?;
            let bytes = fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let updated = store.update_primary_content(&id, bytes)?;
            let view = ContentView::from(&updated);
            out.emit(&view, || {
                println!("{} Replaced content; renditions dropped", "✓".green().bold());
                print_content(&view);
            })?;
            Ok(true)
        }
        ContentAction::Move {
            id,
            target: target_args,
        } => {
            let id = parse_content(&id)?;
            let moved = match target(arca, &target_args)? {
                Some(StorageTarget::Inline) => store.move_to_database(&id)?,
                Some(StorageTarget::FileStore(fs_id)) => store.move_to_file_store(&id, &fs_id)?,
                None => bail!("pass --store <name> or --inline"),
            };
            let view = ContentView::from(&moved);
            out.emit(&view, || {
                println!("{} Moved content", "✓".green().bold());
                print_content(&view);
            })?;
            Ok(true)
        }
        ContentAction::Delete { id } => {
            let id = parse_content(&id)?;
            store.delete(&id)?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                println!("{} Deleted content {}", "✓".green().bold(), id.to_string().dimmed())
            })?;
            Ok(true)
        }
    }
}
