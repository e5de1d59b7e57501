//! Data structures for the differential expression pipeline

mod annotation;
mod count_matrix;
mod metadata;

pub use annotation::{normalize_gene_id, ActionableEntry, ActionableList, AnnotationMap};
pub use count_matrix::CountMatrix;
pub use metadata::{SampleMetadata, TwoGroupDesign};
