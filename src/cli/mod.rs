//! Command-line interface for rnadiff

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rnadiff")]
#[command(version)]
#[command(about = "Two-group differential expression with Welch's t-test")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize raw counts to log2(CPM+1)
    #[command(
        long_about = "Normalize raw counts to log2(CPM+1).\n\n\
            Counts-per-million are computed per sample column from the raw\n\
            library sizes, then log2(x+1) transformed. An optional annotation\n\
            table rewrites gene identifiers to symbols before normalization;\n\
            colliding identifiers are merged by summing raw counts.",
        after_long_help = "\
Examples:
  rnadiff normalize -c counts.csv -m metadata.csv -o normalized.csv
  rnadiff normalize -c counts.csv -m metadata.csv -a annotations.tsv -o normalized.csv"
    )]
    Normalize {
        /// Path to raw counts CSV (gene_id + one column per sample)
        #[arg(short, long)]
        counts: String,

        /// Path to sample metadata CSV (sample_id, condition)
        #[arg(short, long)]
        metadata: String,

        /// Optional gene annotation table (gene id and symbol columns
        /// auto-detected among common header synonyms)
        #[arg(short, long)]
        annotations: Option<String>,

        /// Output path for the normalized matrix
        #[arg(short, long)]
        output: String,
    },

    /// Run the two-group Welch t-test with BH correction
    #[command(
        long_about = "Run the two-group Welch t-test with BH correction.\n\n\
            Expects log2-scale normalized counts. The first condition label\n\
            seen in metadata order becomes group 1; log2 fold-change is\n\
            mean(group 2) - mean(group 1). Output rows keep the input order.",
        after_long_help = "\
Examples:
  rnadiff test -c normalized.csv -m metadata.csv -o differential.csv
  rnadiff test -c normalized.csv -m metadata.csv -o differential.csv -t 8"
    )]
    Test {
        /// Path to normalized counts CSV
        #[arg(short, long)]
        counts: String,

        /// Path to sample metadata CSV (sample_id, condition)
        #[arg(short, long)]
        metadata: String,

        /// Output path for differential results
        #[arg(short, long)]
        output: String,

        /// Number of threads (0 = auto)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Intersect significant genes with an actionable reference list
    #[command(
        long_about = "Intersect significant genes with an actionable list.\n\n\
            A gene is significant when raw p-value <= --p-cutoff and\n\
            |log2FC| >= --lfc-cutoff. The join is case-insensitive with\n\
            whitespace trimmed on both sides. Writes matched hits as CSV and\n\
            run summary counts as JSON.",
        after_long_help = "\
Examples:
  rnadiff actionable -d differential.csv -a actionable.csv -o hits.csv -s summary.json
  rnadiff actionable -d differential.csv -a actionable.csv -o hits.csv -s summary.json \\
    --p-cutoff 0.01 --lfc-cutoff 2"
    )]
    Actionable {
        /// Path to differential results CSV (from `rnadiff test`)
        #[arg(short, long)]
        differential: String,

        /// Path to the actionable gene list CSV (gene_id + extra columns)
        #[arg(short, long)]
        actionable: String,

        /// Output path for the actionable hits CSV
        #[arg(short, long)]
        output: String,

        /// Output path for the summary JSON
        #[arg(short, long)]
        summary: String,

        /// Raw p-value cutoff [default: 0.05]
        #[arg(long, default_value = "0.05")]
        p_cutoff: f64,

        /// Absolute log2 fold-change cutoff [default: 1.0]
        #[arg(long, default_value = "1")]
        lfc_cutoff: f64,
    },

    /// Run all three stages in sequence
    #[command(
        long_about = "Run all three stages in sequence: normalize, test,\n\
            actionable intersection. Each stage's output file is written\n\
            before the next stage starts.",
        after_long_help = "\
Examples:
  rnadiff run -c counts.csv -m metadata.csv -a actionable.csv -o results/
  rnadiff run -c counts.csv -m metadata.csv -a actionable.csv -o results/ \\
    --annotations annotations.tsv --p-cutoff 0.01"
    )]
    Run {
        /// Path to raw counts CSV
        #[arg(short, long)]
        counts: String,

        /// Path to sample metadata CSV
        #[arg(short, long)]
        metadata: String,

        /// Path to the actionable gene list CSV
        #[arg(short, long)]
        actionable: String,

        /// Optional gene annotation table
        #[arg(long)]
        annotations: Option<String>,

        /// Output directory for all stage artifacts
        #[arg(short, long, default_value = "rnadiff_out")]
        output: String,

        /// Raw p-value cutoff [default: 0.05]
        #[arg(long, default_value = "0.05")]
        p_cutoff: f64,

        /// Absolute log2 fold-change cutoff [default: 1.0]
        #[arg(long, default_value = "1")]
        lfc_cutoff: f64,

        /// Number of threads (0 = auto)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },
}
