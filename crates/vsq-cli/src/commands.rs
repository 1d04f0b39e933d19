use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use vsq_filter::Filter;
use vsq_query::{AdapterConfig, Capabilities, QueryRequest, SortBy};
use vsq_reader::VersionedFeatureSource;
use vsq_repo::Repository;
use vsq_types::{ChangeType, Feature, ReferencedEnvelope};

use crate::cli::*;
use crate::dataset::Dataset;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => AdapterConfig::load(path)?,
        None => AdapterConfig::default(),
    };
    match cli.command {
        Command::Features(args) => cmd_features(args, config, &cli.format),
        Command::Count(args) => cmd_count(args, config, &cli.format),
        Command::Bounds(args) => cmd_bounds(args, config, &cli.format),
        Command::Capabilities => cmd_capabilities(config, &cli.format),
    }
}

fn open_source(args: &QueryArgs, config: AdapterConfig) -> anyhow::Result<VersionedFeatureSource> {
    let repo: Arc<dyn Repository> = Dataset::load(&args.dataset)?.build()?;
    Ok(VersionedFeatureSource::new(repo, args.type_name.clone(), config))
}

fn build_request(args: &QueryArgs) -> anyhow::Result<QueryRequest> {
    let mut request = match &args.request {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content).context("invalid request")?
        }
        None => QueryRequest::new(),
    };
    if let Some(filter) = &args.filter {
        let filter: Filter = serde_json::from_str(filter).context("invalid filter")?;
        request = request.with_filter(filter);
    }
    if let Some(properties) = &args.properties {
        request = request.with_properties(
            properties
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        );
    }
    if !args.sort.is_empty() {
        request = request.with_sort(args.sort.iter().map(|key| parse_sort_key(key)).collect());
    }
    if let Some(offset) = args.offset {
        request = request.with_offset(offset);
    }
    if let Some(limit) = args.limit {
        request = request.with_max_features(limit);
    }
    if let Some(root) = &args.root {
        request = request.with_root(root.clone());
    }
    if let Some(old_root) = &args.old_root {
        request = request.with_old_root(old_root.clone());
    }
    if !args.change_types.is_empty() {
        let types = args
            .change_types
            .iter()
            .map(|t| t.parse::<ChangeType>())
            .collect::<Result<Vec<_>, _>>()?;
        request = request.with_change_types(types);
    }
    if let Some(tolerance) = args.decimate {
        request = request.with_decimation(tolerance);
    }
    Ok(request)
}

fn parse_sort_key(key: &str) -> SortBy {
    match key {
        "@natural" => SortBy::Natural,
        "@reverse" => SortBy::Reverse,
        _ => match key.strip_prefix('-') {
            Some(name) => SortBy::desc(name),
            None => SortBy::asc(key.trim_start_matches('+')),
        },
    }
}

fn cmd_features(args: QueryArgs, config: AdapterConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let source = open_source(&args, config)?;
    let request = build_request(&args)?;
    let features = source.query(&request)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&features)?),
        OutputFormat::Text => {
            for feature in &features {
                print_feature(feature);
            }
            println!("{} {} feature(s)", "✓".green().bold(), features.len());
        }
    }
    Ok(())
}

fn print_feature(feature: &Feature) {
    let change = match feature.change_type {
        ChangeType::Added => "ADDED".green(),
        ChangeType::Modified => "MODIFIED".yellow(),
        ChangeType::Removed => "REMOVED".red(),
    };
    println!("{} {}", feature.id.bold(), change);
    for (name, value) in &feature.attributes {
        println!("  {}: {}", name.cyan(), value);
    }
}

fn cmd_count(args: QueryArgs, config: AdapterConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let source = open_source(&args, config)?;
    let count = source.count(&build_request(&args)?)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "count": count })),
        OutputFormat::Text => println!("{}", count.to_string().bold()),
    }
    Ok(())
}

fn cmd_bounds(args: QueryArgs, config: AdapterConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let source = open_source(&args, config)?;
    let bounds = source.bounds(&build_request(&args)?)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bounds)?),
        OutputFormat::Text => print_bounds(&bounds),
    }
    Ok(())
}

fn print_bounds(bounds: &ReferencedEnvelope) {
    let crs = bounds.crs.as_deref().unwrap_or("unknown CRS");
    match &bounds.envelope {
        Some(env) => println!(
            "[{}, {}] - [{}, {}] ({})",
            env.min_x,
            env.min_y,
            env.max_x,
            env.max_y,
            crs.dimmed()
        ),
        None => println!("{} ({})", "empty".yellow(), crs.dimmed()),
    }
}

fn cmd_capabilities(config: AdapterConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let caps = Capabilities::from_config(&config);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&caps)?),
        OutputFormat::Text => {
            println!("Root ref: {}", config.root_ref.yellow());
            let flags = [
                ("filter", caps.filter),
                ("sort", caps.sort),
                ("limit", caps.limit),
                ("offset", caps.offset),
                ("retype", caps.retype),
                ("transactions", caps.transactions),
                ("provided fid", caps.provided_fid),
                ("version", caps.version),
                ("visitor", caps.visitor),
            ];
            for (name, supported) in flags {
                let mark = if supported { "✓".green() } else { "✗".red() };
                println!("  {mark} {name}");
            }
            let hints: Vec<_> = caps.hints.iter().map(|h| format!("{h:?}")).collect();
            println!("  Hints: {}", hints.join(", ").cyan());
        }
    }
    Ok(())
}
