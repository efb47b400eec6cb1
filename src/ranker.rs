use crate::models::CatalogItem;
use std::collections::{BTreeMap, HashMap};

/// Assign each item its 1-based rank inside its score-type partition.
///
/// Within a partition items are ordered by score descending; equal scores
/// keep their relative catalog order. Returns the size of every partition.
pub fn derive_ranks(items: &mut [CatalogItem]) -> BTreeMap<String, usize> {
    let mut partitions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        partitions.entry(item.score_type.as_str()).or_default().push(index);
    }

    let mut ranks = vec![0u32; items.len()];
    let mut sizes = BTreeMap::new();

    for (score_type, mut members) in partitions {
        // stable: ties stay in catalog order
        members.sort_by(|&a, &b| items[b].score.total_cmp(&items[a].score));
        for (position, &index) in members.iter().enumerate() {
            ranks[index] = position as u32 + 1;
        }
        sizes.insert(score_type.to_string(), members.len());
    }

    for (item, rank) in items.iter_mut().zip(ranks) {
        item.rank = rank;
    }

    sizes
}
