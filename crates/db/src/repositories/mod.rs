//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Atomic multi-statement units
//! (the approve swap, the compensation delete sequence) run inside a
//! single transaction.

pub mod actor_repo;
pub mod capability_repo;
pub mod document_repo;
pub mod material_repo;
pub mod session_repo;
pub mod tooling_repo;
pub mod work_cell_repo;

pub use actor_repo::ActorRepo;
pub use capability_repo::CapabilityRepo;
pub use document_repo::DocumentRepo;
pub use material_repo::MaterialRepo;
pub use session_repo::SessionRepo;
pub use tooling_repo::ToolingRepo;
pub use work_cell_repo::WorkCellRepo;
