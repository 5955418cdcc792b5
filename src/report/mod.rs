//! Report aggregation over many files.

mod aggregate;

pub use aggregate::{
    aggregate, compare_batch_ids, group, sorted_reports, GroupBy, GroupSummary, MajorityFailure,
    ValidationSummary,
};
