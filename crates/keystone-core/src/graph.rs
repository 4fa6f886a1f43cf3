use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constraints::ForeignKeyEdge;
use crate::schema::ResourceName;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub self_references: usize,
}

/// Load-order report for the derived FK graph.
///
/// `load_order` lists parents before their children; when the graph has a
/// cycle it is `None` and `cycle` holds every resource that could not be
/// ordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyReport {
    pub summary: FkGraphSummary,
    pub load_order: Option<Vec<ResourceName>>,
    pub cycle: Option<Vec<ResourceName>>,
}

/// Build a deterministic dependency report over `resources` and `edges`.
pub fn build_dependency_report<'a>(
    resources: impl IntoIterator<Item = &'a ResourceName>,
    edges: &[ForeignKeyEdge],
) -> DependencyReport {
    let graph = build_adjacency(resources, edges);
    let summary = FkGraphSummary {
        nodes: graph.len(),
        edges: edges.len(),
        self_references: edges.iter().filter(|edge| edge.is_self_reference()).count(),
    };

    match toposort(&graph) {
        Ok(order) => DependencyReport {
            summary,
            load_order: Some(order),
            cycle: None,
        },
        Err(cycle) => DependencyReport {
            summary,
            load_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency<'a>(
    resources: impl IntoIterator<Item = &'a ResourceName>,
    edges: &[ForeignKeyEdge],
) -> BTreeMap<ResourceName, BTreeSet<ResourceName>> {
    let mut graph: BTreeMap<ResourceName, BTreeSet<ResourceName>> = BTreeMap::new();

    for resource in resources {
        graph.entry(resource.clone()).or_default();
    }

    for edge in edges {
        graph.entry(edge.child.clone()).or_default();
        let targets = graph.entry(edge.parent.clone()).or_default();
        // Self-references never block loading.
        if !edge.is_self_reference() {
            targets.insert(edge.child.clone());
        }
    }

    graph
}

fn toposort(
    graph: &BTreeMap<ResourceName, BTreeSet<ResourceName>>,
) -> Result<Vec<ResourceName>, Vec<ResourceName>> {
    let mut indegree: BTreeMap<&ResourceName, usize> =
        graph.keys().map(|node| (node, 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&ResourceName> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(*node) } else { None })
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node.clone()) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(child: &str, parent: &str, field: &str) -> ForeignKeyEdge {
        ForeignKeyEdge {
            child: child.into(),
            child_fields: vec![field.to_string()],
            parent: parent.into(),
            parent_fields: vec![field.to_string()],
        }
    }

    #[test]
    fn orders_parents_before_children() {
        let names: Vec<ResourceName> = ["plants_eia", "plants_pudl", "utilities_pudl"]
            .into_iter()
            .map(ResourceName::from)
            .collect();
        let edges = vec![edge("plants_eia", "plants_pudl", "plant_id_pudl")];

        let report = build_dependency_report(&names, &edges);
        let order = report.load_order.expect("expected load order");
        let parent_idx = order.iter().position(|n| n.as_str() == "plants_pudl").unwrap();
        let child_idx = order.iter().position(|n| n.as_str() == "plants_eia").unwrap();
        assert!(parent_idx < child_idx);
        assert_eq!(report.summary.nodes, 3);
    }

    #[test]
    fn reports_cycle() {
        let names: Vec<ResourceName> = vec!["a".into(), "b".into()];
        let edges = vec![edge("a", "b", "x"), edge("b", "a", "y")];

        let report = build_dependency_report(&names, &edges);
        assert!(report.load_order.is_none());
        let cycle = report.cycle.unwrap();
        assert!(cycle.contains(&ResourceName::from("a")));
        assert!(cycle.contains(&ResourceName::from("b")));
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let names: Vec<ResourceName> = vec!["plants_pudl".into()];
        let edges = vec![ForeignKeyEdge {
            child: "plants_pudl".into(),
            child_fields: vec!["parent_plant_id_pudl".to_string()],
            parent: "plants_pudl".into(),
            parent_fields: vec!["plant_id_pudl".to_string()],
        }];

        let report = build_dependency_report(&names, &edges);
        assert_eq!(report.load_order, Some(vec!["plants_pudl".into()]));
        assert_eq!(report.summary.self_references, 1);
    }
}
