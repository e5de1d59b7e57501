//! rnadiff command-line interface

use std::path::Path;

use clap::Parser;
use log::{info, LevelFilter};

use rnadiff::cli::{Cli, Commands};
use rnadiff::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["normalize", "test", "actionable", "run", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        // No subcommand — handle top-level help/version manually
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help" || a == "-h") {
            print_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("rnadiff {}", VERSION);
            return;
        }
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Normalize {
            counts,
            metadata,
            annotations,
            output,
        }) => run_normalize(&counts, &metadata, annotations.as_deref(), &output),
        Some(Commands::Test {
            counts,
            metadata,
            output,
            threads,
        }) => run_test(&counts, &metadata, &output, threads),
        Some(Commands::Actionable {
            differential,
            actionable,
            output,
            summary,
            p_cutoff,
            lfc_cutoff,
        }) => run_actionable(
            &differential,
            &actionable,
            &output,
            &summary,
            SignificancePolicy {
                p_value_cutoff: p_cutoff,
                log2_fc_cutoff: lfc_cutoff,
            },
        ),
        Some(Commands::Run {
            counts,
            metadata,
            actionable,
            annotations,
            output,
            p_cutoff,
            lfc_cutoff,
            threads,
        }) => run_full(
            &counts,
            &metadata,
            &actionable,
            annotations.as_deref(),
            &output,
            SignificancePolicy {
                p_value_cutoff: p_cutoff,
                log2_fc_cutoff: lfc_cutoff,
            },
            threads,
        ),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_no_args() {
    println!("rnadiff v{}", VERSION);
    println!("Run `rnadiff --help` for usage.");
}

fn print_help() {
    println!("rnadiff v{}", VERSION);
    println!("Two-group differential expression with Welch's t-test");
    println!();
    println!("Usage: rnadiff <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  normalize   Normalize raw counts to log2(CPM+1)");
    println!("  test        Welch t-test per gene with BH correction");
    println!("  actionable  Intersect significant genes with a reference list");
    println!("  run         All three stages in sequence");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h, --help       Print help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  rnadiff run -c counts.csv -m metadata.csv -a actionable.csv -o results/");
    println!();
    println!("  rnadiff normalize -c counts.csv -m metadata.csv -o normalized.csv");
    println!("  rnadiff test -c normalized.csv -m metadata.csv -o differential.csv");
    println!("  rnadiff actionable -d differential.csv -a actionable.csv \\");
    println!("    -o hits.csv -s summary.json");
}

fn configure_threads(threads: usize) {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }
}

fn run_normalize(
    counts_path: &str,
    metadata_path: &str,
    annotations_path: Option<&str>,
    output_path: &str,
) -> Result<()> {
    info!("Loading count matrix from: {}", counts_path);
    let counts = read_count_matrix(counts_path)?;
    info!("  {} genes, {} samples", counts.n_genes(), counts.n_samples());

    info!("Loading metadata from: {}", metadata_path);
    let metadata = read_metadata(metadata_path)?;

    let annotation = match annotations_path {
        Some(path) => {
            info!("Loading annotations from: {}", path);
            Some(read_annotation_map(path)?)
        }
        None => None,
    };

    let normalized = normalize(&counts, &metadata, annotation.as_ref())?;

    info!("Writing normalized counts to: {}", output_path);
    write_matrix(output_path, &normalized)?;
    Ok(())
}

fn run_test(
    counts_path: &str,
    metadata_path: &str,
    output_path: &str,
    threads: usize,
) -> Result<()> {
    configure_threads(threads);

    info!("Loading normalized counts from: {}", counts_path);
    let normalized = read_count_matrix(counts_path)?;
    info!(
        "  {} genes, {} samples",
        normalized.n_genes(),
        normalized.n_samples()
    );

    info!("Loading metadata from: {}", metadata_path);
    let metadata = read_metadata(metadata_path)?;

    let results = differential_test(&normalized, &metadata)?;

    let top = results.top_by_pvalue(5);
    if !top.is_empty() {
        info!("Top genes by raw p-value:");
        for &i in &top {
            info!("  {}: p = {:.6e}", results.gene_ids[i], results.pvalues[i]);
        }
    }

    info!("Writing differential results to: {}", output_path);
    write_results(output_path, &results)?;
    Ok(())
}

fn run_actionable(
    differential_path: &str,
    actionable_path: &str,
    output_path: &str,
    summary_path: &str,
    policy: SignificancePolicy,
) -> Result<()> {
    info!("Loading differential results from: {}", differential_path);
    let results = read_results(differential_path)?;

    info!("Loading actionable list from: {}", actionable_path);
    let actionable = read_actionable_list(actionable_path)?;

    let (hits, summary) = actionable_report(&results, &actionable, &policy);

    info!("Writing actionable hits to: {}", output_path);
    write_actionable_hits(
        output_path,
        &hits,
        &results.group1_label,
        &results.group2_label,
        actionable.extra_columns(),
    )?;

    info!("Writing summary to: {}", summary_path);
    write_summary(summary_path, &summary)?;

    println!("\n{}", summary);
    Ok(())
}

fn run_full(
    counts_path: &str,
    metadata_path: &str,
    actionable_path: &str,
    annotations_path: Option<&str>,
    output_dir: &str,
    policy: SignificancePolicy,
    threads: usize,
) -> Result<()> {
    configure_threads(threads);

    std::fs::create_dir_all(Path::new(output_dir))?;

    let normalized_path = format!("{}/normalized_counts.csv", output_dir);
    let results_path = format!("{}/differential_results.csv", output_dir);
    let hits_path = format!("{}/actionable_hits.csv", output_dir);
    let summary_path = format!("{}/summary.json", output_dir);

    run_normalize(counts_path, metadata_path, annotations_path, &normalized_path)?;
    run_test(&normalized_path, metadata_path, &results_path, 0)?;
    run_actionable(&results_path, actionable_path, &hits_path, &summary_path, policy)?;

    info!("Pipeline complete; artifacts in {}", output_dir);
    Ok(())
}
