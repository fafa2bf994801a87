//! CLI subcommand implementations.

pub mod call;
pub mod data;
pub mod links;
pub mod metadata;
pub mod subjects;
pub mod tools;
