//! revql CLI - SQL over addressed Git repositories

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use revql::cli::output::OutputWriter;
use revql::cli::{Args, Command, OutputFormat};
use revql::context::{build_address, ContextResolver, ResolvedSummary};
use revql::sql::{get_table_info, QuerySource, TABLES};
use revql::SqlEngine;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match &args.command {
        Some(Command::Tables) => print_tables(),
        Some(Command::Schema { table }) => print_schema(table)?,
        Some(Command::Resolve { address }) => resolve(&args, address)?,
        Some(Command::Uri {
            repo,
            file,
            revision,
        }) => println!("{}", build_address(repo, file, revision)),
        None => match &args.query {
            Some(query) => run_query(&args, query)?,
            None => Args::command().print_help()?,
        },
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("revql=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_query(args: &Args, query: &str) -> anyhow::Result<()> {
    let mut engine = SqlEngine::new(args.engine_config())?;
    let source = QuerySource::new(&args.repo)
        .with_revision(args.revision.clone())
        .with_input(args.input.clone())
        .with_against(args.against.clone());

    engine.load_tables_for_query(query, &source)?;
    let result = engine
        .execute(query)
        .with_context(|| format!("failed to execute query: {query}"))?;

    OutputWriter::new(io::stdout().lock(), args.format).write_result(&result)?;
    Ok(())
}

fn resolve(args: &Args, address: &str) -> anyhow::Result<()> {
    let context =
        ContextResolver::global().resolve_with_revision(address, args.revision.as_deref())?;
    let summary = ResolvedSummary::from(&context);

    let mut out = OutputWriter::new(io::stdout().lock(), args.format);
    match args.format {
        OutputFormat::Json => out.writeln(&serde_json::to_string_pretty(&summary)?)?,
        OutputFormat::Jsonl => out.writeln(&serde_json::to_string(&summary)?)?,
        OutputFormat::Table | OutputFormat::Csv => {
            out.writeln(&format!("repository_root  {}", summary.repository_root))?;
            out.writeln(&format!("relative_path    {}", summary.relative_path))?;
            out.writeln(&format!("revision         {}", summary.revision))?;
            out.writeln(&format!("object           {} {}", summary.object_kind, summary.object_id))?;
        }
    }
    Ok(())
}

fn print_tables() {
    for table in TABLES {
        println!("{:<20} {}", table.name, table.description);
    }
}

fn print_schema(name: &str) -> anyhow::Result<()> {
    let Some(table) = get_table_info(name) else {
        bail!("Table not found: {name}");
    };
    println!("{} - {}", table.name, table.description);
    for column in table.columns {
        println!("  {:<16} {:<8} {}", column.name, column.sql_type, column.description);
    }
    Ok(())
}
