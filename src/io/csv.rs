//! CSV reading and writing for the pipeline tables

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ndarray::Array2;

use crate::actionable::{ActionableHit, SummaryStats};
use crate::data::{ActionableEntry, ActionableList, AnnotationMap, CountMatrix, SampleMetadata};
use crate::error::{PipelineError, Result};
use crate::io::DifferentialResults;

/// Accepted annotation headers for the gene id column, after normalization
const ANNOTATION_ID_HEADERS: &[&str] = &["gene_id", "geneid", "id"];
/// Accepted annotation headers for the symbol column, after normalization
const ANNOTATION_SYMBOL_HEADERS: &[&str] =
    &["gene_symbol", "symbol", "associated_gene_name", "gene_name"];

/// Strip surrounding quotes from a string
fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Normalize a header name: lowercase, spaces to underscores
fn normalize_header(name: &str) -> String {
    strip_quotes(name).to_lowercase().replace(' ', "_")
}

/// Quote a field for CSV output when it contains a comma, a quote, or a
/// newline; embedded quotes are doubled
fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Detect comma vs tab delimiter from the header line
fn detect_delimiter(header_line: &str) -> char {
    if header_line.contains('\t') {
        '\t'
    } else {
        ','
    }
}

/// Read a count matrix from a CSV/TSV file.
/// Expected format: `gene_id` header followed by one column per sample.
pub fn read_count_matrix<P: AsRef<Path>>(path: P) -> Result<CountMatrix> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| PipelineError::EmptyInput {
        reason: "Empty counts file".to_string(),
    })??;

    let delimiter = detect_delimiter(&header_line);
    let header: Vec<String> = header_line.split(delimiter).map(|s| strip_quotes(s)).collect();

    if header.len() < 2 {
        return Err(PipelineError::Schema {
            reason: "Counts file needs a gene_id column and at least one sample column".to_string(),
        });
    }
    if normalize_header(&header[0]) != "gene_id" {
        return Err(PipelineError::Schema {
            reason: format!(
                "Counts file must contain a 'gene_id' column, found '{}'",
                header[0]
            ),
        });
    }

    let sample_ids: Vec<String> = header[1..].to_vec();
    let n_samples = sample_ids.len();

    let mut gene_ids: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != n_samples + 1 {
            return Err(PipelineError::Schema {
                reason: format!(
                    "Counts row has {} columns, expected {}",
                    fields.len(),
                    n_samples + 1
                ),
            });
        }

        gene_ids.push(strip_quotes(fields[0]));

        let row: Result<Vec<f64>> = fields[1..]
            .iter()
            .map(|s| {
                let val = strip_quotes(s);
                val.parse::<f64>().map_err(|_| PipelineError::Schema {
                    reason: format!("Invalid count value: '{}'", val),
                })
            })
            .collect();
        rows.push(row?);
    }

    if gene_ids.is_empty() {
        return Err(PipelineError::EmptyInput {
            reason: "No genes found in counts file".to_string(),
        });
    }

    let mut values = Array2::zeros((gene_ids.len(), n_samples));
    for (i, row) in rows.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            values[[i, j]] = val;
        }
    }

    CountMatrix::new(values, gene_ids, sample_ids)
}

/// Read sample metadata from a CSV/TSV file.
/// Requires `sample_id` and `condition` columns; extra columns are ignored.
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<SampleMetadata> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| PipelineError::EmptyInput {
        reason: "Empty metadata file".to_string(),
    })??;

    let delimiter = detect_delimiter(&header_line);
    let header: Vec<String> = header_line
        .split(delimiter)
        .map(|s| normalize_header(s))
        .collect();

    let sample_col = header.iter().position(|h| h == "sample_id");
    let condition_col = header.iter().position(|h| h == "condition");
    let (sample_col, condition_col) = match (sample_col, condition_col) {
        (Some(s), Some(c)) => (s, c),
        _ => {
            return Err(PipelineError::Schema {
                reason: "Metadata must contain 'sample_id' and 'condition' columns".to_string(),
            })
        }
    };

    let mut sample_ids = Vec::new();
    let mut conditions = Vec::new();

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != header.len() {
            return Err(PipelineError::Schema {
                reason: format!(
                    "Metadata row has {} columns, expected {}",
                    fields.len(),
                    header.len()
                ),
            });
        }

        sample_ids.push(strip_quotes(fields[sample_col]));
        conditions.push(strip_quotes(fields[condition_col]));
    }

    SampleMetadata::new(sample_ids, conditions)
}

/// Read a gene annotation table, auto-detecting the id and symbol columns
/// among common header synonyms. Rows with an empty symbol are skipped.
pub fn read_annotation_map<P: AsRef<Path>>(path: P) -> Result<AnnotationMap> {
    let delimiter = sniff_file_delimiter(&path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    let id_col = headers
        .iter()
        .position(|h| ANNOTATION_ID_HEADERS.contains(&h.as_str()));
    let symbol_col = headers
        .iter()
        .position(|h| ANNOTATION_SYMBOL_HEADERS.contains(&h.as_str()));

    let (id_col, symbol_col) = match (id_col, symbol_col) {
        (Some(i), Some(s)) => (i, s),
        _ => {
            return Err(PipelineError::Schema {
                reason: format!(
                    "Annotation table needs a gene id column (one of {:?}) and a symbol column (one of {:?})",
                    ANNOTATION_ID_HEADERS, ANNOTATION_SYMBOL_HEADERS
                ),
            })
        }
    };

    let mut map = AnnotationMap::new();
    for record in reader.records() {
        let record = record?;
        let gene_id = record.get(id_col).unwrap_or("");
        let symbol = record.get(symbol_col).unwrap_or("");
        if gene_id.is_empty() || symbol.is_empty() {
            continue;
        }
        map.insert(gene_id, symbol);
    }

    log::info!("Loaded {} annotation entries", map.len());
    Ok(map)
}

/// Read the actionable reference table. Requires a `gene_id` column; all
/// other columns are carried through as annotation attributes.
pub fn read_actionable_list<P: AsRef<Path>>(path: P) -> Result<ActionableList> {
    let delimiter = sniff_file_delimiter(&path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let id_col = headers
        .iter()
        .position(|h| normalize_header(h) == "gene_id")
        .ok_or_else(|| PipelineError::Schema {
            reason: "Actionable list must include a 'gene_id' column".to_string(),
        })?;

    let extra_columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != id_col)
        .map(|(_, h)| h.clone())
        .collect();

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let gene_id = record.get(id_col).unwrap_or("").to_string();
        if gene_id.is_empty() {
            continue;
        }
        let extra: Vec<String> = record
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != id_col)
            .map(|(_, v)| v.to_string())
            .collect();
        entries.push(ActionableEntry { gene_id, extra });
    }

    ActionableList::new(extra_columns, entries)
}

/// Sniff comma vs tab from the first line of a file
fn sniff_file_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;
    Ok(if first_line.contains('\t') { b'\t' } else { b',' })
}

/// Write a normalized matrix as CSV: `gene_id` plus one column per sample
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &CountMatrix) -> Result<()> {
    let mut file = File::create(path)?;

    let sample_header: Vec<String> = matrix.sample_ids().iter().map(|s| escape_field(s)).collect();
    writeln!(file, "gene_id,{}", sample_header.join(","))?;
    let values = matrix.values();
    for (i, gene_id) in matrix.gene_ids().iter().enumerate() {
        let row: Vec<String> = (0..matrix.n_samples())
            .map(|j| format!("{:.6}", values[[i, j]]))
            .collect();
        writeln!(file, "{},{}", escape_field(gene_id), row.join(","))?;
    }

    Ok(())
}

/// Write differential results as CSV, one row per gene in input order
pub fn write_results<P: AsRef<Path>>(path: P, results: &DifferentialResults) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "gene_id,{}_mean,{}_mean,log2_fc,p_value,p_adj,degenerate",
        escape_field(&results.group1_label),
        escape_field(&results.group2_label)
    )?;

    for i in 0..results.n_genes() {
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6e},{:.6e},{}",
            escape_field(&results.gene_ids[i]),
            results.group1_means[i],
            results.group2_means[i],
            results.log2_fold_changes[i],
            results.pvalues[i],
            results.padj[i],
            results.degenerate[i],
        )?;
    }

    Ok(())
}

/// Read differential results back from CSV (as written by `write_results`).
/// Group labels are recovered from the `<label>_mean` header columns.
pub fn read_results<P: AsRef<Path>>(path: P) -> Result<DifferentialResults> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| PipelineError::EmptyInput {
        reason: "Empty differential results file".to_string(),
    })??;

    let delimiter = detect_delimiter(&header_line);
    let header: Vec<String> = header_line.split(delimiter).map(|s| strip_quotes(s)).collect();

    let expected_tail = ["log2_fc", "p_value", "p_adj"];
    let valid = header.len() >= 6
        && normalize_header(&header[0]) == "gene_id"
        && header[1].ends_with("_mean")
        && header[2].ends_with("_mean")
        && expected_tail
            .iter()
            .zip(&header[3..6])
            .all(|(want, got)| normalize_header(got) == *want);
    if !valid {
        return Err(PipelineError::Schema {
            reason: format!(
                "Unexpected differential results header: expected \
                 gene_id,<g1>_mean,<g2>_mean,log2_fc,p_value,p_adj[,degenerate], got '{}'",
                header_line
            ),
        });
    }
    let has_flag = header.len() > 6 && normalize_header(&header[6]) == "degenerate";

    let group1_label = header[1].trim_end_matches("_mean").to_string();
    let group2_label = header[2].trim_end_matches("_mean").to_string();

    let mut results = DifferentialResults {
        gene_ids: Vec::new(),
        group1_label,
        group2_label,
        group1_means: Vec::new(),
        group2_means: Vec::new(),
        log2_fold_changes: Vec::new(),
        pvalues: Vec::new(),
        padj: Vec::new(),
        degenerate: Vec::new(),
    };

    let parse = |s: &str| -> Result<f64> {
        let val = strip_quotes(s);
        val.parse::<f64>().map_err(|_| PipelineError::Schema {
            reason: format!("Invalid numeric value in results: '{}'", val),
        })
    };

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != header.len() {
            return Err(PipelineError::Schema {
                reason: format!(
                    "Results row has {} columns, expected {}",
                    fields.len(),
                    header.len()
                ),
            });
        }

        results.gene_ids.push(strip_quotes(fields[0]));
        results.group1_means.push(parse(fields[1])?);
        results.group2_means.push(parse(fields[2])?);
        results.log2_fold_changes.push(parse(fields[3])?);
        results.pvalues.push(parse(fields[4])?);
        results.padj.push(parse(fields[5])?);
        results
            .degenerate
            .push(has_flag && strip_quotes(fields[6]) == "true");
    }

    if results.gene_ids.is_empty() {
        return Err(PipelineError::EmptyInput {
            reason: "No genes found in differential results file".to_string(),
        });
    }

    Ok(results)
}

/// Write actionable hits as CSV: differential fields plus the actionable
/// list's extra columns
pub fn write_actionable_hits<P: AsRef<Path>>(
    path: P,
    hits: &[ActionableHit],
    group1_label: &str,
    group2_label: &str,
    extra_columns: &[String],
) -> Result<()> {
    let mut file = File::create(path)?;

    let mut header = format!(
        "gene_id,{}_mean,{}_mean,log2_fc,p_value,p_adj",
        escape_field(group1_label),
        escape_field(group2_label)
    );
    for col in extra_columns {
        header.push(',');
        header.push_str(&escape_field(col));
    }
    writeln!(file, "{}", header)?;

    for hit in hits {
        let mut row = format!(
            "{},{:.6},{:.6},{:.6},{:.6e},{:.6e}",
            escape_field(&hit.gene_id),
            hit.group1_mean,
            hit.group2_mean,
            hit.log2_fold_change,
            hit.p_value,
            hit.p_adj,
        );
        for value in &hit.annotations {
            row.push(',');
            row.push_str(&escape_field(value));
        }
        writeln!(file, "{}", row)?;
    }

    Ok(())
}

/// Write the run summary as pretty-printed JSON
pub fn write_summary<P: AsRef<Path>>(path: P, summary: &SummaryStats) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
