//! File-format glue for the demo binary.

pub mod csv;
pub mod seed;
