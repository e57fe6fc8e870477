//! vecplane CLI - Command line interface for a vecplane session
//!
//! Each invocation loads the pack file, runs one command against the session
//! and writes the pack back when the command changed anything.

use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use vecplane::{Config, Error, ItemId, Pack, Session};

#[derive(Parser)]
#[command(name = "vecplane")]
#[command(about = "Edit embedding vectors through their 2D principal-component view")]
#[command(version)]
struct Cli {
    /// Path to the pack file holding the session
    #[arg(short, long, default_value = "vecplane.json")]
    pack: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Dimension for a new, empty session
    #[arg(long)]
    dim: Option<usize>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty pack file
    Init {
        /// Overwrite an existing pack
        #[arg(long)]
        force: bool,
    },

    // === Item Commands ===
    /// Add an item with a fresh random unit vector
    Add {
        /// Display text
        text: String,
        /// Item type (word, phrase, token, ...)
        #[arg(short = 't', long = "type", default_value = "word")]
        kind: String,
        /// Associated source token
        #[arg(long, default_value = "")]
        token: String,
    },

    /// List items, optionally filtered by keyword
    List {
        /// Case-insensitive match on text or token
        #[arg(short, long)]
        query: Option<String>,
        /// Maximum number of items to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one item with its vector and 2D point
    Show {
        /// The item ID
        id: String,
    },

    /// Edit an item's text, type or token
    Update {
        /// The item ID
        id: String,
        /// New display text
        text: String,
        /// New item type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// New token
        #[arg(long)]
        token: Option<String>,
    },

    /// Delete an item
    Delete {
        /// The item ID
        id: String,
    },

    // === Vector Commands ===
    /// Replace an item's vector with comma or space separated numbers
    SetVector {
        /// The item ID
        id: String,
        /// Components, e.g. "0.1, -0.4, 0.9"
        #[arg(allow_hyphen_values = true)]
        values: String,
    },

    /// Give an item a new random unit vector
    Randomize {
        /// The item ID
        id: String,
    },

    /// Rescale an item's vector to unit length
    Normalize {
        /// The item ID
        id: String,
    },

    /// Change the session dimension (clamped to 2..=256)
    Resize {
        /// New dimension
        dim: usize,
    },

    /// Subtract the mean from every vector and renormalize
    Center,

    /// Append the demo item set
    SeedDemo,

    /// Remove every item
    Clear,

    // === View Commands ===
    /// Show the PCA basis and every item's 2D point
    Project,

    /// Similarity of other items to a focal item
    Neighbors {
        /// The focal item ID
        id: String,
        /// Maximum number of neighbors
        #[arg(short, long)]
        limit: Option<usize>,
    },

    // === Manipulation Commands ===
    /// Rotate the focal item so its cosine with another item equals a target
    SetCosine {
        /// Item to rotate
        focal: String,
        /// Item to measure against (unchanged)
        other: String,
        /// Target cosine in [-1, 1]
        #[arg(allow_negative_numbers = true)]
        target: f64,
    },

    /// Move an item's 2D point and rewrite its vector to match
    Drag {
        /// The item ID
        id: String,
        /// New x coordinate
        #[arg(allow_negative_numbers = true)]
        x: f64,
        /// New y coordinate
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    // === Exchange Commands ===
    /// Merge pack files into the session
    Import {
        /// Pack files to merge, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write the session as a pack
    Export {
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("{}, using defaults", e);
        Config::default()
    });
    if let Some(dim) = cli.dim {
        config.default_dim = dim;
    }

    if let Commands::Init { force } = cli.command {
        if cli.pack.exists() && !force {
            fail(
                cli.format,
                &format!("Pack already exists at {}", cli.pack.display()),
            )?;
        }
        let session = match cli.dim {
            Some(dim) => Session::with_dim(dim)?,
            None => Session::with_config(config),
        };
        session.export_pack().write_to(&cli.pack)?;
        return output(
            cli.format,
            &serde_json::json!({
                "status": "ok",
                "dim": session.dim(),
                "message": format!("Created pack at {}", cli.pack.display())
            }),
        );
    }

    let mut session = open_session(&cli.pack, config)?;
    let format = cli.format;

    let mutated = match cli.command {
        Commands::Init { .. } => false,

        Commands::Add { text, kind, token } => {
            let id = session.add_item(text, kind, token);
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "id": id,
                    "point": session.point_of(&id)
                }),
            )?;
            true
        }

        Commands::List { query, limit } => {
            let mut items = session.filter(query.as_deref().unwrap_or(""));
            if let Some(limit) = limit {
                items.truncate(limit);
            }
            let rows: Vec<_> = items
                .iter()
                .map(|it| {
                    serde_json::json!({
                        "id": it.id,
                        "text": it.text,
                        "type": it.kind,
                        "token": it.token,
                        "point": session.point_of(&it.id)
                    })
                })
                .collect();
            output(
                format,
                &serde_json::json!({
                    "count": rows.len(),
                    "items": rows
                }),
            )?;
            false
        }

        Commands::Show { id } => {
            let id = ItemId::new(id);
            let Some(item) = session.item(&id) else {
                return not_found(format, &id);
            };
            output(
                format,
                &serde_json::json!({
                    "id": item.id,
                    "text": item.text,
                    "type": item.kind,
                    "token": item.token,
                    "vector": item.vector,
                    "point": session.point_of(&id),
                    "source": item.source
                }),
            )?;
            false
        }

        Commands::Update {
            id,
            text,
            kind,
            token,
        } => {
            let id = ItemId::new(id);
            let Some(item) = session.item(&id) else {
                return not_found(format, &id);
            };
            let kind = kind.unwrap_or_else(|| item.kind.to_string());
            let token = token.unwrap_or_else(|| item.token.clone());
            session.update_item(&id, text, kind, token);
            status(format, &id)?;
            true
        }

        Commands::Delete { id } => {
            let id = ItemId::new(id);
            if !session.delete_item(&id) {
                return not_found(format, &id);
            }
            status(format, &id)?;
            true
        }

        Commands::SetVector { id, values } => {
            let id = ItemId::new(id);
            match session.set_vector_text(&id, &values) {
                Ok(true) => {
                    status(format, &id)?;
                    true
                }
                Ok(false) => return not_found(format, &id),
                Err(e) => return fail(format, &e.to_string()),
            }
        }

        Commands::Randomize { id } => {
            let id = ItemId::new(id);
            if !session.randomize(&id) {
                return not_found(format, &id);
            }
            status(format, &id)?;
            true
        }

        Commands::Normalize { id } => {
            let id = ItemId::new(id);
            if !session.normalize_item(&id) {
                return not_found(format, &id);
            }
            status(format, &id)?;
            true
        }

        Commands::Resize { dim } => {
            let applied = session.resize(dim);
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "dim": applied
                }),
            )?;
            true
        }

        Commands::Center => {
            let changed = session.center_all();
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "count": session.len()
                }),
            )?;
            changed
        }

        Commands::SeedDemo => {
            let added = session.seed_demo();
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "added": added
                }),
            )?;
            true
        }

        Commands::Clear => {
            session.clear();
            output(format, &serde_json::json!({ "status": "ok" }))?;
            true
        }

        Commands::Project => {
            let points: Vec<_> = session
                .items()
                .iter()
                .zip(session.points())
                .map(|(it, p)| {
                    serde_json::json!({
                        "id": it.id,
                        "text": it.text,
                        "x": p[0],
                        "y": p[1]
                    })
                })
                .collect();
            let basis = session.basis().map(|b| {
                serde_json::json!({
                    "fingerprint": b.fingerprint().to_hex(),
                    "lambdas": b.lambdas,
                    "variance_split": b.variance_split(),
                    "axes": b.axes
                })
            });
            output(
                format,
                &serde_json::json!({
                    "dim": session.dim(),
                    "count": points.len(),
                    "basis": basis,
                    "points": points
                }),
            )?;
            false
        }

        Commands::Neighbors { id, limit } => {
            let id = ItemId::new(id);
            if !session.select(Some(&id)) {
                return not_found(format, &id);
            }
            let rows = session.neighbors(limit);
            output(
                format,
                &serde_json::json!({
                    "focal": id,
                    "count": rows.len(),
                    "neighbors": rows
                }),
            )?;
            false
        }

        Commands::SetCosine {
            focal,
            other,
            target,
        } => {
            let (focal, other) = (ItemId::new(focal), ItemId::new(other));
            for id in [&focal, &other] {
                if session.item(id).is_none() {
                    return not_found(format, id);
                }
            }
            let applied = session.set_target_cosine_for(&focal, &other, target);
            let cosine = match (session.item(&focal), session.item(&other)) {
                (Some(a), Some(b)) => vecplane::math::cosine(&a.vector, &b.vector),
                _ => f64::NAN,
            };
            output(
                format,
                &serde_json::json!({
                    "status": if applied { "ok" } else { "unchanged" },
                    "focal": focal,
                    "other": other,
                    "cosine": cosine,
                    "point": session.point_of(&focal)
                }),
            )?;
            applied
        }

        Commands::Drag { id, x, y } => {
            let id = ItemId::new(id);
            if session.item(&id).is_none() {
                return not_found(format, &id);
            }
            if !session.drag_start(&id) {
                return fail(format, "Need at least two items to drag");
            }
            session.drag_step(x, y);
            let moved = session.drag_end();
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "id": id,
                    "point": session.point_of(&id),
                    "locked": session.is_locked()
                }),
            )?;
            moved
        }

        Commands::Import { files } => {
            let mut results = Vec::with_capacity(files.len());
            let mut total = 0;
            for file in &files {
                let label = file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                match Pack::read_from(file) {
                    Ok(pack) => {
                        let added = session.import_pack(&pack, &label);
                        total += added;
                        results.push(serde_json::json!({ "file": label, "added": added }));
                    }
                    Err(e) => {
                        warn!("skipping {}: {}", file.display(), e);
                        results.push(serde_json::json!({ "file": label, "error": e.to_string() }));
                    }
                }
            }
            output(
                format,
                &serde_json::json!({
                    "status": "ok",
                    "added": total,
                    "dim": session.dim(),
                    "files": results
                }),
            )?;
            total > 0
        }

        Commands::Export { out } => {
            let pack = session.export_pack();
            match out {
                Some(path) => {
                    pack.write_to(&path)?;
                    output(
                        format,
                        &serde_json::json!({
                            "status": "ok",
                            "count": pack.items.len(),
                            "path": path.display().to_string()
                        }),
                    )?;
                }
                None => println!("{}", pack.to_json_pretty()?),
            }
            false
        }
    };

    if mutated {
        session.export_pack().write_to(&cli.pack)?;
        debug!("saved {} items to {}", session.len(), cli.pack.display());
    }

    Ok(())
}

fn open_session(path: &Path, config: Config) -> anyhow::Result<Session> {
    let mut session = Session::with_config(config);
    if path.exists() {
        let pack = Pack::read_from(path)?;
        session.import_pack(&pack, "");
        debug!("loaded {} items from {}", session.len(), path.display());
    }
    Ok(session)
}

fn output(format: OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn status(format: OutputFormat, id: &ItemId) -> anyhow::Result<()> {
    output(format, &serde_json::json!({ "status": "ok", "id": id }))
}

fn fail(format: OutputFormat, message: &str) -> anyhow::Result<()> {
    output(
        format,
        &serde_json::json!({
            "status": "error",
            "message": message
        }),
    )?;
    std::process::exit(1);
}

fn not_found(format: OutputFormat, id: &ItemId) -> anyhow::Result<()> {
    fail(format, &Error::NotFound(id.to_string()).to_string())
}
