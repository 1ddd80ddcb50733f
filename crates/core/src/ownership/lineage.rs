//! Parent chains of split fractions.

use std::collections::HashSet;

use shareslice_shared::types::FractionId;

use crate::ownership::error::OwnershipError;

/// Walks parent links from `start` to the root.
///
/// The result starts with `start` itself. `parent_of` returns `None` at the
/// root (a fraction issued directly from supply).
pub fn lineage<F>(start: FractionId, mut parent_of: F) -> Result<Vec<FractionId>, OwnershipError>
where
    F: FnMut(FractionId) -> Option<FractionId>,
{
    let mut chain = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;

    while let Some(parent) = parent_of(current) {
        if !seen.insert(parent) {
            return Err(OwnershipError::LineageCycle {
                fraction_id: parent,
            });
        }
        chain.push(parent);
        current = parent;
    }

    Ok(chain)
}
