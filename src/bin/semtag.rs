//! CLI entry point for the `semtag` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use semantic_tags::cli::commands::{self, QueryOptions, SortField};
use semantic_tags::{TagConfig, TagError};

#[derive(Parser)]
#[command(
    name = "semtag",
    about = "Semantic tags: controlled-vocabulary descriptors, schema validation, and filtering"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text", global = true)]
    format: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema root (overrides the config file)
    #[arg(long, global = true)]
    schema_root: Option<PathBuf>,

    /// Schema version (overrides the config file)
    #[arg(long, global = true)]
    schema_version: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint the registry and every field document under a schema root
    Lint {
        /// Schema root directory
        root: PathBuf,
    },
    /// Validate a descriptor JSON file
    Validate {
        /// Schema root directory
        root: PathBuf,
        /// Descriptor JSON object
        descriptor: PathBuf,
        /// Only check the fields present
        #[arg(long)]
        partial: bool,
    },
    /// Add a text to an index file
    Add {
        /// Index file (.json or .ndjson)
        index: PathBuf,
        /// The text content
        text: String,
        /// Descriptor field, as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        /// Metadata entry, as key=value (repeatable; JSON values allowed)
        #[arg(long = "meta", value_parser = parse_key_value)]
        meta: Vec<(String, String)>,
        /// Explicit item id
        #[arg(long)]
        id: Option<String>,
        /// Accept text that is already indexed
        #[arg(long)]
        allow_duplicates: bool,
    },
    /// Print one item
    Get {
        /// Index file
        index: PathBuf,
        /// Item id
        id: String,
    },
    /// Remove one item
    Remove {
        /// Index file
        index: PathBuf,
        /// Item id
        id: String,
    },
    /// Filter, order, and page through an index
    Query {
        /// Index file
        index: PathBuf,
        /// Domain path; descendants match too
        #[arg(long)]
        domain: Option<String>,
        /// Intent path; descendants match too
        #[arg(long)]
        intent: Option<String>,
        /// Exact field match, as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        /// Case-insensitive text substring
        #[arg(long)]
        text: Option<String>,
        /// Metadata match, as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_key_value)]
        meta: Vec<(String, String)>,
        /// Sort by: created, updated
        #[arg(long)]
        sort: Option<String>,
        /// Sort oldest first
        #[arg(long)]
        asc: bool,
        /// Skip this many matches
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Return at most this many matches
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the distinct values of a field
    Values {
        /// Index file
        index: PathBuf,
        /// Field name
        field: String,
    },
    /// Show index statistics
    Stats {
        /// Index file
        index: PathBuf,
    },
    /// Rename descriptor fields and validate against another version
    Migrate {
        /// Descriptor JSON object
        descriptor: PathBuf,
        /// Source schema version
        from_version: String,
        /// Target schema version
        to_version: String,
        /// JSON object mapping old field names to new ones
        mapping: PathBuf,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn usage_error(message: String) -> ! {
    eprintln!("Error: {message}");
    process::exit(3);
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 3 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let json = cli.format == "json";

    let mut config = match &cli.config {
        Some(path) => match TagConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {err}");
                process::exit(2);
            }
        },
        None => TagConfig::default(),
    };
    if let Some(root) = cli.schema_root {
        config.schema_root = Some(root);
    }
    if let Some(version) = cli.schema_version {
        config.schema_version = version;
    }

    let result = match cli.command {
        Commands::Lint { root } => commands::cmd_lint(&root, json),
        Commands::Validate {
            root,
            descriptor,
            partial,
        } => commands::cmd_validate(&root, &config.schema_version, &descriptor, partial, json),
        Commands::Add {
            index,
            text,
            fields,
            meta,
            id,
            allow_duplicates,
        } => commands::cmd_add(&config, &index, &text, &fields, &meta, id, allow_duplicates, json),
        Commands::Get { index, id } => commands::cmd_get(&config, &index, &id, json),
        Commands::Remove { index, id } => commands::cmd_remove(&config, &index, &id, json),
        Commands::Query {
            index,
            domain,
            intent,
            fields,
            text,
            meta,
            sort,
            asc,
            offset,
            limit,
        } => {
            let sort = match sort.as_deref().map(|name| (name, SortField::from_name(name))) {
                None => None,
                Some((_, Some(field))) => Some(field),
                Some((name, None)) => usage_error(format!("Invalid sort key: {name}")),
            };
            let options = QueryOptions {
                domain,
                intent,
                fields,
                text,
                meta,
                sort,
                ascending: asc,
                offset,
                limit,
            };
            commands::cmd_query(&config, &index, &options, json)
        }
        Commands::Values { index, field } => commands::cmd_values(&config, &index, &field, json),
        Commands::Stats { index } => commands::cmd_stats(&config, &index, json),
        Commands::Migrate {
            descriptor,
            from_version,
            to_version,
            mapping,
        } => match &config.schema_root {
            Some(root) => commands::cmd_migrate(root, &descriptor, &from_version, &to_version, &mapping),
            None => usage_error("migrate requires --schema-root or schema_root in the config".to_string()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            TagError::Io(_) => 1,
            TagError::Schema { .. }
            | TagError::SchemaVersion { .. }
            | TagError::UnknownSchemaVersion(_)
            | TagError::Config(_) => 2,
            TagError::Validation { .. } | TagError::Normalization(_) => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
