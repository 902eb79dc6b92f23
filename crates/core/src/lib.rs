//! Domain logic for the cellworks workflow engine.
//!
//! This crate is pure: no database access and no I/O. It provides:
//!
//! - The shared error taxonomy ([`error::WorkflowError`])
//! - Access-rank computation for the approval workflow ([`rights`])
//! - The document lifecycle states ([`document`])
//! - Argon2id credential helpers for approval re-authentication ([`password`])
//! - The transfer saga ledger and step dispatch types ([`ledger`])
//! - Bill-of-materials checks and input contracts ([`validation`])
//! - Collaborator traits consumed by the engine crate ([`store`], [`notify`])
//!
//! All data access is done through the repository layer in `cellworks-db`,
//! behind the traits defined here.

pub mod document;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod password;
pub mod rights;
pub mod store;
pub mod types;
pub mod validation;
