use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constraints::ForeignKeyRef;
use crate::schema::Schema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering between tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    /// Parents before children; `None` when a cycle exists.
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a schema.
///
/// Self references do not count as edges: a table can draw foreign keys from
/// its own primary key pool. References to tables outside the schema are
/// ignored here and reported by validation instead.
pub fn build_fk_graph_report(schema: &Schema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(schema: &Schema) -> BTreeMap<String, BTreeSet<String>> {
    let known: BTreeSet<&str> = schema.models.iter().map(|t| t.name.as_str()).collect();
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in &schema.models {
        graph.entry(table.name.clone()).or_default();

        for column in &table.columns {
            let Some(fk) = column.foreign_key().and_then(ForeignKeyRef::parse) else {
                continue;
            };
            if fk.table == table.name || !known.contains(fk.table.as_str()) {
                continue;
            }
            graph
                .entry(fk.table.clone())
                .or_default()
                .insert(table.name.clone());
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> =
        graph.keys().map(|node| (node.clone(), 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| node.clone())
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Table};
    use crate::types::DataType;

    fn id(name: &str) -> Column {
        Column::new(name, DataType::Integer).primary_key()
    }

    #[test]
    fn toposort_orders_dependencies() {
        let schema = Schema {
            models: vec![
                Table::new(
                    "orders",
                    vec![
                        id("order_id"),
                        Column::new("customer_id", DataType::Integer)
                            .references("customers.customer_id"),
                    ],
                ),
                Table::new("customers", vec![id("customer_id")]),
            ],
        };

        let report = build_fk_graph_report(&schema);
        let order = report.topo_order.expect("expected toposort");
        let customers = order.iter().position(|t| t == "customers").unwrap();
        let orders = order.iter().position(|t| t == "orders").unwrap();
        assert!(customers < orders);
        assert_eq!(report.summary.edges, 1);
    }

    #[test]
    fn toposort_reports_cycle() {
        let schema = Schema {
            models: vec![
                Table::new(
                    "a",
                    vec![id("id"), Column::new("b_id", DataType::Integer).references("b.id")],
                ),
                Table::new(
                    "b",
                    vec![id("id"), Column::new("a_id", DataType::Integer).references("a.id")],
                ),
            ],
        };

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        let cycle = report.cycle.unwrap();
        assert!(cycle.contains(&"a".to_string()));
        assert!(cycle.contains(&"b".to_string()));
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let schema = Schema {
            models: vec![Table::new(
                "employees",
                vec![
                    id("employee_id"),
                    Column::new("manager_id", DataType::Integer)
                        .references("employees.employee_id"),
                ],
            )],
        };

        let report = build_fk_graph_report(&schema);
        assert_eq!(report.topo_order, Some(vec!["employees".to_string()]));
    }
}
