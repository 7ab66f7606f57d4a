use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};

use batch_note::{Compositor, Config, Entry, HistoryStore, WorkingSet, raster};

/// Stack screenshots and notes into one tall image and keep a history of the results.
#[derive(Debug, Parser)]
#[command(name = "batch-note", version)]
struct Cli {
    /// JSON config file
    #[arg(long, env = "BATCH_NOTE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the history folder from the config
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compose entries into one image and record it in the history
    Compose(ComposeArgs),
    /// List saved records, newest first
    List,
    /// Print the entries of a record
    Show { id: String },
    /// Rebuild the entries of a record and compose them again
    Restore {
        id: String,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Delete a record
    Delete { id: String },
}

#[derive(Debug, Args)]
struct ComposeArgs {
    /// Where to write the composite
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Do not save a history record
    #[arg(long)]
    no_history: bool,

    /// Leave the entry with this 1-based index out of the composite
    #[arg(long = "uncheck", value_name = "INDEX")]
    unchecked: Vec<usize>,

    /// `IMAGE[=COMMENT]` for a screenshot, `:TEXT` for a text-only note
    #[arg(required = true, value_name = "ITEM")]
    items: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.history_dir {
        config.history.root = dir;
    }

    match cli.command {
        Command::Compose(args) => compose(&config, args),
        Command::List => list(&config),
        Command::Show { id } => show(&config, &id),
        Command::Restore { id, out } => restore(&config, &id, &out),
        Command::Delete { id } => {
            let store = HistoryStore::open(&config.history)?;
            if !store.delete(&id) {
                bail!("could not delete record {id}");
            }
            println!("Deleted {id}");
            Ok(())
        }
    }
}

fn compose(config: &Config, args: ComposeArgs) -> Result<()> {
    let mut set = WorkingSet::new();
    for item in &args.items {
        set.push(parse_item(item, set.next_index())?);
    }
    for index in &args.unchecked {
        let Some(id) = set.iter().find(|e| e.index() == *index).map(Entry::id) else {
            bail!("there is no entry {index}");
        };
        if let Some(entry) = set.get_mut(id) {
            entry.set_checked(false);
        }
    }

    let compositor = Compositor::new(config.layout.clone())?;
    let Some(image) = compositor.composite(set.entries()) else {
        bail!("nothing selected to compose");
    };

    if let Some(out) = &args.out {
        raster::save(&image, out).with_context(|| format!("writing {}", out.display()))?;
        println!("Wrote {} ({}x{})", out.display(), image.width(), image.height());
    }

    if !args.no_history {
        let store = HistoryStore::open(&config.history)?;
        let record = store.save(&image, set.entries())?;
        println!("Saved record {} ({} entries)", record.id, record.entry_count);
    }
    Ok(())
}

fn parse_item(item: &str, index: usize) -> Result<Entry> {
    if let Some(text) = item.strip_prefix(':') {
        return Ok(Entry::text(index).with_comment(text));
    }

    let (path, comment) = split_item(item);
    let image = raster::load(Path::new(path)).with_context(|| format!("loading {path}"))?;
    Ok(Entry::image(index, Some(image)).with_comment(comment))
}

/// Split `IMAGE[=COMMENT]`. Image paths may contain `=` themselves, so the split is
/// made at the first `=` whose left side is an existing file.
fn split_item(item: &str) -> (&str, &str) {
    if Path::new(item).is_file() {
        return (item, "");
    }
    item.match_indices('=')
        .map(|(at, _)| (&item[..at], &item[at + 1..]))
        .find(|(path, _)| Path::new(path).is_file())
        .or_else(|| item.split_once('='))
        .unwrap_or((item, ""))
}

fn list(config: &Config) -> Result<()> {
    let store = HistoryStore::open(&config.history)?;
    let records = store.list()?;
    if records.is_empty() {
        println!("No history yet");
    }
    for record in records {
        println!(
            "{}  {}  {} entries",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.entry_count
        );
    }
    Ok(())
}

fn show(config: &Config, id: &str) -> Result<()> {
    let store = HistoryStore::open(&config.history)?;
    let record = find_record(&store, id)?;
    print!("{}", batch_note::history::summary::render(&record));
    Ok(())
}

fn restore(config: &Config, id: &str, out: &Path) -> Result<()> {
    let store = HistoryStore::open(&config.history)?;
    let record = find_record(&store, id)?;

    let mut set = WorkingSet::new();
    set.replace_with(store.restore(&record));

    let compositor = Compositor::new(config.layout.clone())?;
    let Some(image) = compositor.composite(set.entries()) else {
        bail!("record {id} has nothing to compose");
    };
    raster::save(&image, out).with_context(|| format!("writing {}", out.display()))?;
    println!("Restored {} entries into {}", set.len(), out.display());
    Ok(())
}

fn find_record(store: &HistoryStore, id: &str) -> Result<batch_note::HistoryRecord> {
    store
        .list()?
        .into_iter()
        .find(|record| record.id == id)
        .with_context(|| format!("no record {id}"))
}
