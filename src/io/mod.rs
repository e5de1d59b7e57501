//! Input/Output for the pipeline tables

mod csv;
mod results;

pub use self::csv::{
    read_actionable_list, read_annotation_map, read_count_matrix, read_metadata, read_results,
    write_actionable_hits, write_matrix, write_results, write_summary,
};
pub use results::DifferentialResults;
