//! Bill-of-materials checks and transfer input contracts.
//!
//! BOM mismatches are a reportable outcome, not a halting condition: the
//! check functions return [`Discrepancy`] data instead of errors, and the
//! material step records them in the session ledger.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::types::DbId;

/// Maximum length accepted for a target cell name.
pub const MAX_CELL_NAME_LEN: usize = 120;

/// One material line: a part and the quantity requested for a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub part_number: String,
    pub quantity: i64,
}

/// The target BOM's allowance for one part: the authorized quantity and
/// how much of it is already committed on other cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BomQuota {
    pub bom_quantity: i64,
    pub committed: i64,
}

impl BomQuota {
    /// Quantity still available on this BOM line.
    pub fn available(self) -> i64 {
        self.bom_quantity - self.committed
    }
}

/// Why a material line was skipped during transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyReason {
    /// The part does not exist on the target's bill of materials.
    NotOnBom,
    /// The requested quantity exceeds what the BOM line still allows.
    QuantityExceeded { available: i64 },
}

/// A material-validation fault, recorded in order of discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub part_number: String,
    pub requested: i64,
    pub reason: DiscrepancyReason,
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            DiscrepancyReason::NotOnBom => write!(
                f,
                "part {}: not on the target bill of materials",
                self.part_number
            ),
            DiscrepancyReason::QuantityExceeded { available } => write!(
                f,
                "part {}: requested {} but only {} available on the bill of materials",
                self.part_number, self.requested, available
            ),
        }
    }
}

/// Check one material line against the target BOM.
///
/// `quota` is `None` when the part is absent from the target BOM.
/// Returns `None` when the line may be transferred, or the discrepancy
/// to record when it must be skipped. Never an error.
pub fn check_material_line(
    line: &MaterialLine,
    quota: Option<&BomQuota>,
) -> Option<Discrepancy> {
    let Some(quota) = quota else {
        return Some(Discrepancy {
            part_number: line.part_number.clone(),
            requested: line.quantity,
            reason: DiscrepancyReason::NotOnBom,
        });
    };
    if line.quantity > quota.available() {
        return Some(Discrepancy {
            part_number: line.part_number.clone(),
            requested: line.quantity,
            reason: DiscrepancyReason::QuantityExceeded {
                available: quota.available(),
            },
        });
    }
    None
}

/// Input contract for one cell transfer.
///
/// `extra_material` holds the single manually attached material line a
/// request may carry — the field being an `Option` is what enforces the
/// one-line-per-request rule, so there is nothing to count at runtime.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source_cell_id: DbId,
    pub target_name: String,
    pub extra_material: Option<MaterialLine>,
}

impl TransferRequest {
    /// Validate the request before any step runs.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        validate_target_name(&self.target_name)?;
        if let Some(line) = &self.extra_material {
            validate_material_line_input(line)?;
        }
        Ok(())
    }
}

/// Validate a target cell name: non-blank and within length limits.
pub fn validate_target_name(name: &str) -> Result<(), WorkflowError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::Validation(
            "Target cell name must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_CELL_NAME_LEN {
        return Err(WorkflowError::Validation(format!(
            "Target cell name exceeds {MAX_CELL_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a manually supplied material line.
pub fn validate_material_line_input(line: &MaterialLine) -> Result<(), WorkflowError> {
    if line.part_number.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "Material line must name a part".to_string(),
        ));
    }
    if line.quantity <= 0 {
        return Err(WorkflowError::Validation(format!(
            "Material quantity must be positive, got {}",
            line.quantity
        )));
    }
    Ok(())
}

/// Validate the source set for a batch transfer: at least one cell,
/// no duplicates.
pub fn validate_batch_sources(source_ids: &[DbId]) -> Result<(), WorkflowError> {
    if source_ids.is_empty() {
        return Err(WorkflowError::Validation(
            "No cells found to transfer".to_string(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for id in source_ids {
        if !seen.insert(*id) {
            return Err(WorkflowError::Validation(format!(
                "Cell {id} is queued more than once"
            )));
        }
    }
    Ok(())
}
