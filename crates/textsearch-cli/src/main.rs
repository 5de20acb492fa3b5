//! textsearch - fuzzy search over a JSON collection from the command line
//!
//! Usage:
//!     textsearch --items books.json -k title:2 -k tags "rust"
//!     cat names.json | textsearch --items - --limit 5 alice bob

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::{Map, Value};
use textsearch_core::{KeySpec, Options, SortBy, TextSearch};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "textsearch")]
#[command(about = "Fuzzy search over a JSON array of strings or records")]
#[command(version)]
struct Args {
    /// Queries to run against the collection
    #[arg(required = true)]
    queries: Vec<String>,

    /// JSON array of items to search ("-" reads stdin)
    #[arg(long)]
    items: PathBuf,

    /// JSON options document (command line flags override it)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Key path to search, with an optional weight (PATH[:WEIGHT])
    #[arg(short, long = "key", value_name = "PATH[:WEIGHT]")]
    keys: Vec<String>,

    /// Path to a child collection searched recursively
    #[arg(long, value_name = "PATH")]
    recursive_by: Option<String>,

    /// Score above which a match is rejected (0-1)
    #[arg(long)]
    threshold: Option<f64>,

    /// Positional penalty scale
    #[arg(long)]
    distance: Option<f64>,

    /// Shortest reportable contiguous match run
    #[arg(long)]
    min_match: Option<usize>,

    /// Case sensitive matching
    #[arg(long)]
    sensitive: bool,

    /// Keep results in collection order
    #[arg(long)]
    no_sort: bool,

    /// Maximum number of results per query
    #[arg(short, long)]
    limit: Option<usize>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    /// Options set on the command line. Unset flags leave the field empty so
    /// that they do not shadow an options file.
    fn overrides(&self) -> Options {
        let mut options = Options::new();

        if !self.keys.is_empty() {
            options = options.keys(self.keys.iter().map(|key| parse_key(key)));
        }
        if let Some(path) = &self.recursive_by {
            options = options.recursive_by(path.clone());
        }
        if let Some(threshold) = self.threshold {
            options = options.threshold(threshold);
        }
        if let Some(distance) = self.distance {
            options = options.distance(distance);
        }
        if let Some(min_match) = self.min_match {
            options = options.min_match(min_match);
        }
        if self.sensitive {
            options = options.sensitive(true);
        }
        if self.no_sort {
            options = options.sort_by(SortBy::Disabled);
        }

        options
    }
}

/// Parse `PATH[:WEIGHT]`. A suffix that is not a number stays part of the path.
fn parse_key(raw: &str) -> KeySpec {
    match raw.rsplit_once(':') {
        Some((path, weight)) => match weight.parse::<f64>() {
            Ok(weight) => KeySpec::Weighted {
                path: path.to_string(),
                weight: Some(weight),
            },
            Err(_) => KeySpec::Path(raw.to_string()),
        },
        None => KeySpec::Path(raw.to_string()),
    }
}

fn read_input(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let items: Vec<Value> = serde_json::from_str(&read_input(&args.items)?)?;

    let options = match &args.options {
        Some(path) => Options::from_json(&fs::read_to_string(path)?)?,
        None => Options::new(),
    };
    let options = options.merge(args.overrides());
    debug!(?options, "resolved options");

    let search = TextSearch::new(&items, options)?;
    info!(items = items.len(), queries = args.queries.len(), "searching");

    let mut output = Map::new();
    for query in &args.queries {
        let results = search.search(query, args.limit);
        output.insert(query.clone(), serde_json::to_value(&results)?);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
