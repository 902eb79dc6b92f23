//! Workflow engine for the cellworks plant-floor system.
//!
//! Two workflows live here: the document approval state machine
//! ([`approval::ApprovalWorkflow`]) and the multi-step cell transfer saga
//! ([`transfer::TransferSaga`], with [`transfer::TransferBatchQueue`] for
//! batches). Both are generic over the collaborator traits declared in
//! `cellworks-core`; the [`postgres`] module binds them to the
//! `cellworks-db` repositories and [`notify`] provides SMTP delivery.

pub mod approval;
pub mod notify;
pub mod postgres;
pub mod transfer;
