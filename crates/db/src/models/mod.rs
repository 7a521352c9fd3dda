//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the table plus the
//! create DTO used for inserts.

pub mod report;
