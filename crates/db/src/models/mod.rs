//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct per table it covers and, where
//! the table is written by this service, a DTO for inserts. Rows convert into
//! the core domain types with `TryFrom`, rejecting unknown cabin names.

pub mod flight;
pub mod reference;
pub mod search;
