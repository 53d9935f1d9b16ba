pub mod engine;
pub mod search;
pub mod tree;
pub mod vector;

mod error;

pub use engine::{AssignmentEngine, BranchOutcome, BranchTrace, Classification, Winner, WinnerKind};
pub use error::{Error, Result};
pub use search::{BranchResult, BranchSearcher, Candidate};
pub use tree::{NodeRow, TaxonomyNode, TaxonomyTree};
