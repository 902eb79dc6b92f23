//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts where the insert takes more than a couple
//!   of scalars

pub mod actor;
pub mod document;
pub mod material;
pub mod transfer_session;
pub mod work_cell;
