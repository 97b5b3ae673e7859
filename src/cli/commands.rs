// Mon Jul 27 2026 - Alex

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cli::args::{CheckArgs, CompareArgs, DumpArgs, LayoutArgs};
use crate::config::Config;
use crate::decl::DeclFeed;
use crate::equiv::engine::EquivalenceEngine;
use crate::equiv::flags::CompareFlags;
use crate::graph::arena::TypeGraph;
use crate::graph::builder::GraphBuilder;
use crate::graph::error::BuildError;
use crate::layout::engine::LayoutEngine;
use crate::layout::target::TargetModel;
use crate::report::comparison::ComparisonReport;
use crate::report::listing::LayoutListing;
use crate::utils::logging::ScopedTimer;

/// Exit code for a run that completed but found divergences or errors.
pub const EXIT_FINDINGS: i32 = 2;

/// Loads one comparison side. A single `*.graph.json` file is taken as a
/// pre-built arena dump (the debug-info interface); anything else is a set
/// of declaration feeds run through the builder.
fn load_side(paths: &[PathBuf]) -> Result<(TypeGraph, Vec<BuildError>)> {
    if let [only] = paths {
        let name = only.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".graph.json") {
            let graph = TypeGraph::from_json_path(only)
                .with_context(|| format!("loading graph dump {}", only.display()))?;
            debug!("loaded graph dump {} ({} nodes)", only.display(), graph.len());
            return Ok((graph, Vec::new()));
        }
    }
    let mut feeds = Vec::with_capacity(paths.len());
    for path in paths {
        let feed = DeclFeed::from_path(path)
            .with_context(|| format!("loading feed {}", path.display()))?;
        feeds.push(feed);
    }
    let outcome = GraphBuilder::from_feeds(&feeds).build();
    Ok((outcome.graph, outcome.errors))
}

fn load_target(path: Option<&PathBuf>, packed: bool) -> Result<TargetModel> {
    let mut target = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading target model {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing target model {}", path.display()))?
        }
        None => TargetModel::lp64(),
    };
    if packed {
        target = target.packed();
    }
    if let Err(problem) = target.validate() {
        bail!("invalid target model: {}", problem);
    }
    Ok(target)
}

/// Root names declared on both sides, in the left side's declaration order.
fn shared_roots(left: &TypeGraph, right: &TypeGraph) -> Vec<String> {
    left.declared_roots()
        .into_iter()
        .filter(|(name, _)| right.lookup(name).is_some())
        .map(|(name, _)| name.to_string())
        .collect()
}

fn compare_sides(
    label: &str,
    left: &TypeGraph,
    left_errors: &[BuildError],
    right: &TypeGraph,
    right_errors: &[BuildError],
    roots: &[String],
    target: TargetModel,
    flags: CompareFlags,
) -> ComparisonReport {
    let engine = EquivalenceEngine::new(left, right, target, flags);
    let mut report = ComparisonReport::new(label);
    report.left_errors = left_errors.iter().map(|e| e.to_string()).collect();
    report.right_errors = right_errors.iter().map(|e| e.to_string()).collect();
    for root in roots {
        report.record(root, engine.compare_named(root));
    }
    report
}

pub fn run_layout(args: &LayoutArgs, quiet: bool) -> Result<i32> {
    if let Err(problem) = args.validate() {
        bail!(problem);
    }
    let _timer = ScopedTimer::new("layout");
    let target = load_target(args.target.as_ref(), args.packed)?;
    let (graph, errors) = load_side(&args.feeds)?;
    for error in &errors {
        eprintln!("{} {}", "[!]".red(), error);
    }

    let engine = LayoutEngine::new(&graph, target);
    let mut listing = LayoutListing::from_engine(&engine);
    if !args.types.is_empty() {
        listing.entries.retain(|e| args.types.iter().any(|t| t == &e.name));
        for wanted in &args.types {
            if graph.lookup(wanted).is_none() {
                eprintln!("{} No type named '{}'", "[!]".red(), wanted);
            }
        }
    }

    if !quiet {
        print!("{}", listing);
    }
    if let Some(output) = &args.output {
        listing.save_json(output)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{} Layout listing saved to: {}", "[+]".green(), output.display());
    }

    let findings = listing.errored() + errors.len();
    Ok(if findings == 0 { 0 } else { EXIT_FINDINGS })
}

pub fn run_compare(args: &CompareArgs, quiet: bool) -> Result<i32> {
    if let Err(problem) = args.validate() {
        bail!(problem);
    }
    let _timer = ScopedTimer::new("compare");
    let config = Config::default()
        .with_strict_names(args.strict_names)
        .with_layout_check(args.check_layout)
        .with_target(load_target(args.target.as_ref(), false)?);
    let flags = config.flags();
    let target = config.target;

    let (left, left_errors) = load_side(&args.left)?;
    let (right, right_errors) = load_side(&args.right)?;
    let roots = if args.root.is_empty() {
        shared_roots(&left, &right)
    } else {
        args.root.clone()
    };
    info!("comparing {} root(s)", roots.len());

    let report = compare_sides(
        "compare",
        &left,
        &left_errors,
        &right,
        &right_errors,
        &roots,
        target,
        flags,
    );

    if !quiet {
        print_report(&report);
    }
    if let Some(output) = &args.output {
        report.save_json(output)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{} Report saved to: {}", "[+]".green(), output.display());
    }
    Ok(if report.is_clean() { 0 } else { EXIT_FINDINGS })
}

pub fn run_check(args: &CheckArgs, quiet: bool) -> Result<i32> {
    if let Err(problem) = args.validate() {
        bail!(problem);
    }
    let _timer = ScopedTimer::new("check");
    let mut config = Config::default()
        .with_strict_names(args.strict_names)
        .with_layout_check(args.check_layout)
        .with_target(load_target(args.target.as_ref(), false)?);
    if args.threads > 0 {
        config = config.with_threads(args.threads);
    }
    if let Err(problem) = config.validate() {
        bail!(problem);
    }
    let flags = config.flags();
    let target = config.target;

    let fixtures = discover_fixtures(&args.corpus)?;
    if fixtures.is_empty() {
        bail!("no fixture directories under {}", args.corpus.display());
    }
    info!("checking {} fixture(s)", fixtures.len());

    let progress = if args.no_progress || quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(fixtures.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let reports: Mutex<Vec<ComparisonReport>> = Mutex::new(Vec::with_capacity(fixtures.len()));
    let check_one = |fixture: &Fixture| {
        progress.set_message(fixture.name.clone());
        let report = match check_fixture(fixture, target, flags) {
            Ok(report) => report,
            Err(err) => {
                // A fixture that cannot even load still gets a row.
                let mut report = ComparisonReport::new(&fixture.name);
                report.left_errors.push(err.to_string());
                report
            }
        };
        reports.lock().push(report);
        progress.inc(1);
    };

    if args.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .context("building worker pool")?;
        pool.install(|| fixtures.par_iter().for_each(check_one));
    } else {
        fixtures.par_iter().for_each(check_one);
    }
    progress.finish_and_clear();

    let mut reports = reports.into_inner();
    reports.sort_by(|a, b| a.label.cmp(&b.label));

    let mut clean = 0usize;
    for report in &reports {
        if report.is_clean() {
            clean += 1;
            if !quiet {
                println!("{} {}: {}", "[+]".green(), report.label, report.tally());
            }
        } else if !quiet {
            println!("{} {}: {}", "[!]".red(), report.label, report.tally());
            print!("{}", report);
        }
    }
    if !quiet {
        println!();
        println!("{} {}/{} fixtures clean", "[*]".blue(), clean, reports.len());
    }

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&reports)?;
        fs::write(output, json)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{} Corpus report saved to: {}", "[+]".green(), output.display());
    }
    Ok(if clean == reports.len() { 0 } else { EXIT_FINDINGS })
}

pub fn run_dump(args: &DumpArgs, quiet: bool) -> Result<i32> {
    let _timer = ScopedTimer::new("dump");
    let (graph, errors) = load_side(&args.feeds)?;
    for error in &errors {
        eprintln!("{} {}", "[!]".red(), error);
    }

    let mut text = String::new();
    for (idx, node) in graph.iter() {
        let name = node.name.as_deref().unwrap_or("<anon>");
        text.push_str(&format!(
            "{:>5}  {:<12} {:<24} {}\n",
            idx.to_string(),
            node.kind.kind_name(),
            name,
            graph.display_name(idx)
        ));
    }

    if let Some(output) = &args.output {
        fs::write(output, &text)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("{} Arena dump saved to: {}", "[+]".green(), output.display());
    } else if !quiet {
        print!("{}", text);
    }
    Ok(if errors.is_empty() { 0 } else { EXIT_FINDINGS })
}

struct Fixture {
    name: String,
    source: Vec<PathBuf>,
    debug: Vec<PathBuf>,
}

/// A fixture is any subdirectory holding at least one source*.json and one
/// debug*.json. Sorted so runs are reproducible.
fn discover_fixtures(corpus: &Path) -> Result<Vec<Fixture>> {
    let mut fixtures = Vec::new();
    for entry in fs::read_dir(corpus)
        .with_context(|| format!("reading corpus {}", corpus.display()))?
    {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        let mut source = Vec::new();
        let mut debug = Vec::new();
        for file in fs::read_dir(&dir)? {
            let path = file?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.starts_with("source") && name.ends_with(".json") {
                source.push(path);
            } else if name.starts_with("debug") && name.ends_with(".json") {
                debug.push(path);
            }
        }
        if source.is_empty() || debug.is_empty() {
            debug!("skipping {}: missing source or debug feeds", dir.display());
            continue;
        }
        source.sort();
        debug.sort();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("fixture")
            .to_string();
        fixtures.push(Fixture { name, source, debug });
    }
    fixtures.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(fixtures)
}

fn check_fixture(
    fixture: &Fixture,
    target: TargetModel,
    flags: CompareFlags,
) -> Result<ComparisonReport> {
    let (left, left_errors) = load_side(&fixture.source)?;
    let (right, right_errors) = load_side(&fixture.debug)?;
    let roots = shared_roots(&left, &right);
    Ok(compare_sides(
        &fixture.name,
        &left,
        &left_errors,
        &right,
        &right_errors,
        &roots,
        target,
        flags,
    ))
}

fn print_report(report: &ComparisonReport) {
    let tally = report.tally();
    let status = if report.is_clean() { "[+]".green() } else { "[!]".red() };
    println!("{} {}: {}", status, report.label, tally);
    if !report.is_clean() {
        print!("{}", report);
    }
}
