//! Arrow utilities
//!
//! Helpers for pulling columns out of record batches and rebuilding them.

pub mod array_utils;

pub use array_utils::{
    constant_string_array, contains_empty_struct, drop_column, get_column,
    mask_with_parent_nulls, prune_empty_structs, struct_child, upsert_column,
};
