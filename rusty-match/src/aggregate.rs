use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::{
    length, EdgeKey, Id, Match, Meter, Network, NetworkMatch, SegmentKey, Segments, Value,
};

/// The value with the greatest total length.
///
/// Ties go to the smallest value, `None` only when `values` is empty.
pub fn resolve_majority(values: impl IntoIterator<Item = (Value, Meter)>) -> Option<Value> {
    let mut totals: BTreeMap<Value, Meter> = BTreeMap::new();
    for (value, length) in values {
        *totals.entry(value).or_insert(0.0) += length;
    }

    totals
        .into_iter()
        .fold(None, |best: Option<(Value, Meter)>, (value, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((value, total)),
        })
        .map(|(value, _)| value)
}

/// Carries a reference attribute over to the target edges it was matched to.
///
/// Each target segment takes the value of the references matched onto it,
/// a segment nothing was matched onto counts as [`Value::Null`]. A target
/// edge then gets the value covering most of its length.
pub struct AttributeAggregator<'a> {
    reference: &'a Network,
    reference_segments: &'a Segments,
    target_segments: &'a Segments,
    attribute: &'a str,
}

impl<'a> AttributeAggregator<'a> {
    pub fn new(reference: &'a Network, result: &'a NetworkMatch, attribute: &'a str) -> Self {
        Self {
            reference,
            reference_segments: &result.reference_segments,
            target_segments: &result.target_segments,
            attribute,
        }
    }

    fn transferred(&self, matched: &Match) -> Value {
        self.reference_segments
            .get(&SegmentKey(matched.reference_id))
            .and_then(|s| self.reference.attribute(&EdgeKey(s.parent_id), self.attribute))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolved value per target edge id.
    pub fn resolve(&self, matches: &[Match]) -> BTreeMap<Id, Value> {
        let mut per_segment: HashMap<Id, Vec<(Value, Meter)>> = HashMap::new();
        for matched in matches {
            per_segment
                .entry(matched.target_id)
                .or_default()
                .push((self.transferred(matched), length(&matched.clipped_geometry)));
        }

        let mut per_parent: BTreeMap<Id, Vec<(Value, Meter)>> = BTreeMap::new();
        for segment in self.target_segments.iter() {
            let value = per_segment
                .remove(&segment.id)
                .and_then(resolve_majority)
                .unwrap_or_default();
            per_parent
                .entry(segment.parent_id)
                .or_default()
                .push((value, length(segment.geom)));
        }

        let resolved: BTreeMap<Id, Value> = per_parent
            .into_iter()
            .filter_map(|(parent, values)| Some((parent, resolve_majority(values)?)))
            .collect();
        debug!(
            "resolved {} for {} target edges",
            self.attribute,
            resolved.len()
        );
        resolved
    }
}

/// Removes the edges that resolved to "none".
pub fn drop_none(assignments: BTreeMap<Id, Value>) -> BTreeMap<Id, Value> {
    assignments
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect()
}

/// Writes the resolved values onto `target`, returns how many edges were updated.
pub fn apply_assignments(
    target: &mut Network,
    attribute: &str,
    assignments: &BTreeMap<Id, Value>,
) -> usize {
    let mut updated = 0;
    for (&id, value) in assignments {
        if target.set_attribute(&EdgeKey(id), attribute, value.clone()) {
            updated += 1;
        }
    }
    updated
}
