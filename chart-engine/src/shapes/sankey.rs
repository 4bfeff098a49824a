//! FILENAME: chart-engine/src/shapes/sankey.rs
//! PURPOSE: Flow diagram between two dimensions.

use crate::plan::SankeySpec;
use crate::view::{SankeyDiagram, SankeyLink, SankeyNode};
use engine::{KeyValue, Record};
use rustc_hash::{FxHashMap, FxHashSet};

/// Nodes are the distinct source values followed by the distinct target
/// values not already seen. One link per (source, target) pair, in first
/// appearance order, carrying the sum of the measure.
pub fn build_sankey(records: &[Record], spec: &SankeySpec) -> SankeyDiagram {
    let mut seen: FxHashSet<KeyValue> = FxHashSet::default();
    let nodes: Vec<SankeyNode> = records
        .iter()
        .map(|r| r.value(&spec.source_field))
        .chain(records.iter().map(|r| r.value(&spec.target_field)))
        .filter(|v| seen.insert(KeyValue::from(*v)))
        .map(|v| SankeyNode { name: v.clone() })
        .collect();

    let mut link_index: FxHashMap<(KeyValue, KeyValue), usize> = FxHashMap::default();
    let mut links: Vec<SankeyLink> = Vec::new();
    for record in records {
        let source = record.value(&spec.source_field);
        let target = record.value(&spec.target_field);
        let value = record.value(&spec.value_field).as_number().unwrap_or(0.0);

        let key = (KeyValue::from(source), KeyValue::from(target));
        match link_index.get(&key) {
            Some(&position) => links[position].value += value,
            None => {
                link_index.insert(key, links.len());
                links.push(SankeyLink {
                    source: source.clone(),
                    target: target.clone(),
                    value,
                });
            }
        }
    }

    SankeyDiagram { nodes, links }
}
