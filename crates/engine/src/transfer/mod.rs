//! Cell transfer saga and its batch queue wrapper.

mod batch;
mod saga;

pub use batch::{BatchAdvance, TransferBatchQueue};
pub use saga::TransferSaga;
