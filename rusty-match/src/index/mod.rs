mod edge_index;
pub use edge_index::*;
mod buffer;
pub use buffer::*;

use crate::Id;

/// Spatial lookup of the ids of lines near a query line.
pub trait CandidateSearch {
    /// Ids of the indexed lines within `buffer`, sorted and without duplicates.
    fn candidates(&self, buffer: &Buffer<'_>) -> Vec<Id>;
}
