//! Read-only operations over a completed design model: search, retrieval,
//! generation-context assembly and constraint-conformance scoring.

mod context;
mod search;
mod validate;

pub use context::{
    assemble_generation_context, GenerationContext, GenerationRequest, MAX_EXEMPLARS,
};
pub use search::{retrieve, search, SearchQuery, DEFAULT_LIMIT};
pub use validate::{validate, IssueKind, ValidationIssue, ValidationReport, ISSUE_PENALTY};
