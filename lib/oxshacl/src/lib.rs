#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod comparator;
mod connections;
mod constraint;
mod error;
mod memory;
mod path;
pub mod plan;
mod planner;
mod reasoner;
mod report;
mod settings;
mod shape;
mod sparql;
mod target;
mod target_chain;
mod tuple;
mod validator;
pub mod vocab;

pub use comparator::{cmp_terms, compare_values};
pub use connections::{
    ConnectionsGroup, PlanKey, QuadIter, SolutionIter, StatementPattern, StatementSource,
    StatementView,
};
pub use constraint::{
    ConstraintComponent, NodeKind, SourceConstraintComponent, ValidationApproach,
};
pub use error::{ShaclError, ShapeError, ValidationFailed};
pub use memory::{MemoryStore, MemoryTransaction};
pub use path::PropertyPath;
pub use planner::MAX_RECURSION_DEPTH;
pub use reasoner::RdfsSubClassOfReasoner;
pub use report::{Severity, ValidationReport, ValidationResult};
pub use settings::{ApproachOverride, ValidationSettings};
pub use shape::{Shape, ShapeId, ShapeIndex, ShapeKind, Shapes};
pub use target::Target;
pub use target_chain::TargetChain;
pub use tuple::{Scope, ValidationTuple};
pub use validator::ShaclValidator;
