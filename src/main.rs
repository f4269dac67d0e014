use chrono::Local;
use clap::{Parser, ValueEnum};
use querybuilder::{compile, store, values, FieldCatalog, IdentityResolver, SampleMode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const ENV_LOG: &str = "QB_LOG";

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    All,
    Sample,
    Used,
}

#[derive(Parser)]
#[command(name = "qb", about = "Compile saved attribute filters into filter expressions")]
struct Cli {
    #[arg(long, env = "QB_CATALOG", help = "Field catalog (YAML)")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "QB_RECORDS", help = "Attribute records (YAML sequence)")]
    records: Option<PathBuf>,

    #[arg(long, help = "List candidate values for a field")]
    values: Option<String>,

    #[arg(long, value_enum, default_value = "all", help = "Which values to list (use with --values)")]
    mode: Mode,

    #[arg(long, default_value_t = 10, help = "Number of values drawn by --mode sample")]
    sample_size: usize,

    #[arg(long, help = "Show usage count for each value (use with --values)")]
    count: bool,

    #[arg(long, help = "List saved filters below a directory")]
    list: Option<PathBuf>,

    #[arg(long, help = "Save the loaded filter again to this path")]
    write: Option<PathBuf>,

    #[arg(help = "Saved filter document (JSON)")]
    filter: Option<PathBuf>,
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    if let Some(dir) = &cli.list {
        return run_list_mode(dir);
    }

    let records = match &cli.records {
        Some(path) => match store::read_records(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => Vec::new(),
    };

    let catalog = match &cli.catalog {
        Some(path) => match store::read_catalog(path) {
            Ok(mut c) => {
                c.resolve_relations(&records);
                Some(c)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    if let Some(field) = &cli.values {
        return run_values_mode(&cli, catalog.as_ref(), &records, field);
    }

    let Some(filter_path) = &cli.filter else {
        eprintln!("Error: No filter document provided");
        return ExitCode::from(2);
    };

    run_compile_mode(filter_path, catalog.as_ref(), cli.write.as_deref())
}

fn run_list_mode(dir: &Path) -> ExitCode {
    let mut found = false;

    for path in store::collect_filter_files(dir) {
        match store::read_document(&path) {
            Ok(doc) => {
                found = true;
                let display_path = path.strip_prefix(dir).unwrap_or(&path).display();
                let version = if doc.version.is_empty() { "-" } else { doc.version.as_str() };
                println!("{}\t{}\t{} group(s)", display_path, version, doc.groups.len());
            }
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping file"),
        }
    }

    if found {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}

fn run_values_mode(
    cli: &Cli,
    catalog: Option<&FieldCatalog>,
    records: &[serde_yaml::Value],
    field: &str,
) -> ExitCode {
    if cli.count {
        let counts = values::collect_values(records, field);
        if counts.is_empty() {
            return ExitCode::from(1);
        }
        for line in values::format_values(counts, true) {
            println!("{}", line);
        }
        return ExitCode::from(0);
    }

    let info = catalog
        .and_then(|c| c.field(field))
        .cloned()
        .unwrap_or_else(|| querybuilder::FieldInfo::new(field));
    let mode = match cli.mode {
        Mode::All => SampleMode::All,
        Mode::Sample => SampleMode::Sample(cli.sample_size),
        Mode::Used => SampleMode::UsedOnly,
    };

    let lines = values::sample_values(&info, mode, records, &mut rand::thread_rng());
    if lines.is_empty() {
        return ExitCode::from(1);
    }
    for line in lines {
        println!("{}", line);
    }

    ExitCode::from(0)
}

fn run_compile_mode(path: &Path, catalog: Option<&FieldCatalog>, write: Option<&Path>) -> ExitCode {
    let mut model = match store::read_document(path) {
        Ok(doc) => doc.to_model(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let expr = match catalog {
        Some(catalog) => {
            catalog.bind(&mut model, Local::now().date_naive());
            compile(&model, catalog)
        }
        None => compile(&model, &IdentityResolver),
    };

    if model.all_groups_anded() {
        eprintln!(
            "Warning: all groups are joined with AND; only records matching every group remain."
        );
    }

    if let Some(out) = write {
        if let Err(e) = store::write_document(out, &model) {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    }

    println!("{}", expr);
    ExitCode::from(0)
}
