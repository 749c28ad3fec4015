//! Schema reconciliation across brand datasets.
//!
//! Every brand's JSON yields its own inferred schema. Before the datasets can
//! be unioned they are conformed to a common superset schema: columns missing
//! from one dataset are filled with nulls, nested objects are merged by child
//! name and conflicting scalar types are widened.

pub mod compatibility;
pub mod union;

pub use compatibility::{TypeCompatibility, check_type_compatibility, is_numeric, unify_types};
pub use union::{
    ColumnAdaptation, SchemaConformReport, check_conformance, conform_array, conform_batch,
    superset_schema, union_by_name,
};
