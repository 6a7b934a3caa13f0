//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backends::fs_loader::FsLoader;
use crate::backends::replay::ReplayProvider;
use crate::backends::rg::RgProvider;
use crate::core::file_reader::{EncodingStrategy, FileReadConfig};
use crate::core::location::{Position, QueryKind};
use crate::core::model::{ItemError, ResultItem, ResultSet};
use crate::core::paths::file_id_for;
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::tree::{preview, DocumentLoader, EntryId, LocationProvider, MatchEntry, MatchTree, TreeItem};

/// refnav - turn find-references / find-implementations results into a navigable tree.
#[derive(Parser, Debug)]
#[command(name = "refnav")]
#[command(
    author,
    version,
    about,
    long_about = r#"refnav queries the locations that reference (or implement) the identifier
under a cursor, groups them by file, and prints the resulting tree.

Each command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (file rows followed by their match rows)
- json: a single JSON array
- md: human-friendly Markdown
- raw: plain "path / line, col: preview" listing

Examples:
    refnav tree src/lib.rs --line 12 --col 8
    refnav tree src/lib.rs --line 12 --col 8 --kind implementations
    refnav first src/lib.rs --line 12 --col 8
    refnav walk src/lib.rs --line 12 --col 8 --steps 3 --backward
    refnav copy src/lib.rs --line 12 --col 8
"#
)]
pub struct Cli {
    /// Root directory for all operations.
    #[arg(
        long,
        global = true,
        default_value = ".",
        env = "REFNAV_ROOT",
        value_name = "ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
File identities in results are paths relative to this root, and FILE arguments are\n\
interpreted relative to it."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        env = "REFNAV_FORMAT",
        value_name = "FORMAT"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logs on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug logging on stderr. RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    /// Maximum bytes of each file loaded for previews.
    #[arg(long, global = true, default_value = "1048576", value_name = "BYTES")]
    pub max_bytes: usize,

    /// Refuse binary and non-UTF-8 files instead of decoding them lossily.
    #[arg(long, global = true)]
    pub skip_binary: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to query from
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// File the cursor is in (relative to ROOT unless absolute).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Cursor line (1-indexed).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub line: u32,

    /// Cursor column (1-indexed, in characters).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub col: u32,

    /// Which locations to query.
    #[arg(
        long,
        default_value = "references",
        value_parser = ["references", "implementations"],
        value_name = "KIND"
    )]
    pub kind: String,

    /// Answer the query from a recorded JSON file instead of running rg.
    #[arg(
        long,
        value_name = "PATH",
        long_help = "Answer the query from a recorded JSON file instead of running ripgrep.\n\n\
Format: {\"locations\": [{\"file\": \"src/a.rs\", \"range\": {\"start\": {\"line\": 0,\n\
\"character\": 4}, \"end\": {\"line\": 0, \"character\": 8}}}]} with zero-based\n\
positions, or {\"unsupported\": true}."
    )]
    pub replay: Option<PathBuf>,
}

impl QueryArgs {
    fn position(&self) -> Position {
        Position::new(self.line - 1, self.col - 1)
    }

    fn kind(&self) -> Result<QueryKind> {
        self.kind.parse().map_err(anyhow::Error::msg)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the whole file/match tree.
    #[command(
        long_about = "Build the tree for the identifier under the cursor and print one row per\n\
file followed by one row per match. The match navigation starts at is flagged\n\
with meta.nearest.\n\n\
Examples:\n\
  refnav tree src/lib.rs --line 12 --col 8\n\
  refnav tree src/lib.rs --line 12 --col 8 --exclude tests/fixtures.rs\n"
    )]
    Tree {
        #[command(flatten)]
        query: QueryArgs,

        /// Drop a file from the tree before printing (repeatable).
        #[arg(long, value_name = "PATH")]
        exclude: Vec<PathBuf>,
    },

    /// Print only the match navigation starts at.
    First {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Step through matches from the starting match, wrapping around.
    Walk {
        #[command(flatten)]
        query: QueryArgs,

        /// Number of moves to make.
        #[arg(long, default_value_t = 1)]
        steps: usize,

        /// Move backwards instead of forwards.
        #[arg(long)]
        backward: bool,

        /// Move by file instead of by match.
        #[arg(long)]
        by_file: bool,
    },

    /// Print a plain-text listing of the tree, ready to paste.
    #[command(
        long_about = "Print every file followed by \"  line, col: preview\" for each match.\n\
Output is plain text regardless of --format.\n"
    )]
    Copy {
        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Run the CLI on a single-threaded runtime
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let mut read_config = FileReadConfig::with_truncate_size(cli.max_bytes);
    if cli.skip_binary {
        read_config.encoding_strategy = EncodingStrategy::Skip;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let output = runtime.block_on(async {
        match cli.command {
            Commands::Tree { query, exclude } => run_tree(&root, &query, &exclude, read_config)
                .await
                .map(Output::Rows),
            Commands::First { query } => run_first(&root, &query, read_config)
                .await
                .map(Output::Rows),
            Commands::Walk {
                query,
                steps,
                backward,
                by_file,
            } => run_walk(&root, &query, steps, !backward, by_file, read_config)
                .await
                .map(Output::Rows),
            Commands::Copy { query } => run_copy(&root, &query, read_config)
                .await
                .map(Output::Text),
        }
    })?;

    let mut stdout = std::io::stdout().lock();
    match output {
        Output::Rows(result_set) => {
            Renderer::with_config(render_config).render_to(&result_set, &mut stdout)?
        }
        Output::Text(text) => stdout.write_all(text.as_bytes())?,
    }
    stdout.flush()?;
    Ok(())
}

/// What a command prints
enum Output {
    Rows(ResultSet),
    Text(String),
}

/// Query and build the tree; `None` when the provider has no answer
async fn build_tree(
    root: &Path,
    query: &QueryArgs,
    read_config: FileReadConfig,
) -> Result<Option<MatchTree>> {
    let file = file_id_for(root, &query.file);
    let kind = query.kind()?;
    let loader: Arc<dyn DocumentLoader> = Arc::new(FsLoader::new(root, read_config));

    let provider: Box<dyn LocationProvider> = match &query.replay {
        Some(path) => Box::new(
            ReplayProvider::from_path(path)
                .with_context(|| format!("Failed to load replay file: {:?}", path))?,
        ),
        None => Box::new(RgProvider::new(root)),
    };

    let mut tree = match MatchTree::create(
        provider.as_ref(),
        loader,
        file.clone(),
        query.position(),
        kind,
    )
    .await
    .with_context(|| format!("Failed to query {} for {}", kind, file))?
    {
        Some(tree) => tree,
        None => return Ok(None),
    };

    debug!(
        kind = %tree.kind(),
        origin = %tree.origin(),
        position = %tree.position(),
        summary = %tree.summary(),
        "tree ready"
    );
    tree.on_change(|change| debug!(?change, "tree changed"));
    Ok(Some(tree))
}

fn no_result(query: &QueryArgs, root: &Path) -> ResultSet {
    let mut set = ResultSet::with_summary("No results.");
    set.push(ResultItem::error(ItemError::new(
        "NO_RESULT",
        format!(
            "No {} available for {} at {}",
            query.kind,
            file_id_for(root, &query.file),
            query.position()
        ),
    )));
    set
}

/// Row for one match, with a preview when its file can be loaded
async fn entry_row(tree: &MatchTree, entry: &MatchEntry, nearest: Option<EntryId>) -> ResultItem {
    let location = entry.location();
    let mut row = ResultItem::match_result(location.file.as_str(), location.range).with_id(entry.id());
    if nearest == Some(entry.id()) {
        row = row.nearest();
    }
    match tree.document(entry.group(), true).await {
        Ok(document) => {
            row.meta.truncated = document.truncated;
            row.with_excerpt(preview(&document, &location.range).to_string())
        }
        Err(err) => {
            debug!(file = %location.file, error = %err, "no preview");
            row
        }
    }
}

async fn run_tree(
    root: &Path,
    query: &QueryArgs,
    exclude: &[PathBuf],
    read_config: FileReadConfig,
) -> Result<ResultSet> {
    let Some(mut tree) = build_tree(root, query, read_config).await? else {
        return Ok(no_result(query, root));
    };

    for path in exclude {
        let file = file_id_for(root, path);
        match tree.group_of(&file).map(|g| g.item()) {
            Some(item) => {
                tree.remove(item);
            }
            None => warn!(%file, "excluded file has no matches"),
        }
    }

    let nearest = tree.first().map(|e| e.id());
    let mut set = ResultSet::with_summary(tree.summary());

    for group in tree.groups() {
        let mut row = ResultItem::file(group.file().as_str(), group.len()).with_id(group.id());
        match tree.document(group.id(), true).await {
            Ok(document) => {
                row.meta.hash = Some(document.hash());
                row.meta.truncated = document.truncated;
                if document.lossy {
                    row = row.with_error(ItemError::new(
                        "LOSSY_DECODE",
                        "Invalid UTF-8 replaced in previews",
                    ));
                }
            }
            Err(err) => {
                row = row.with_error(ItemError::new("LOAD_FAILED", err.to_string()));
            }
        }
        set.push(row);

        for entry in group.entries() {
            set.push(entry_row(&tree, entry, nearest).await);
        }
    }

    Ok(set)
}

async fn run_first(root: &Path, query: &QueryArgs, read_config: FileReadConfig) -> Result<ResultSet> {
    let Some(tree) = build_tree(root, query, read_config).await? else {
        return Ok(no_result(query, root));
    };

    let mut set = ResultSet::with_summary(tree.summary());
    if let Some(entry) = tree.first() {
        set.push(entry_row(&tree, entry, Some(entry.id())).await);
    }
    Ok(set)
}

async fn run_walk(
    root: &Path,
    query: &QueryArgs,
    steps: usize,
    forward: bool,
    by_file: bool,
    read_config: FileReadConfig,
) -> Result<ResultSet> {
    let Some(tree) = build_tree(root, query, read_config).await? else {
        return Ok(no_result(query, root));
    };

    let mut set = ResultSet::with_summary(tree.summary());
    let Some(start) = tree.first() else {
        return Ok(set);
    };

    set.push(entry_row(&tree, start, Some(start.id())).await);
    let mut current = start;
    for _ in 0..steps {
        let item = if by_file {
            TreeItem::Group(current.group())
        } else {
            current.item()
        };
        let Some(next) = tree.move_from(item, forward) else {
            break;
        };
        set.push(entry_row(&tree, next, Some(start.id())).await);
        current = next;
    }
    Ok(set)
}

async fn run_copy(root: &Path, query: &QueryArgs, read_config: FileReadConfig) -> Result<String> {
    let Some(tree) = build_tree(root, query, read_config).await? else {
        warn!(kind = %query.kind, "no result for this position");
        return Ok(String::new());
    };
    if tree.is_empty() {
        return Ok(format!("{}\n", tree.summary()));
    }

    let mut documents = HashMap::new();
    for group in tree.groups() {
        match tree.document(group.id(), true).await {
            Ok(document) => {
                documents.insert(group.id(), document);
            }
            Err(err) => warn!(file = %group.file(), error = %err, "copying without previews"),
        }
    }
    Ok(tree.copy_text(&documents))
}
