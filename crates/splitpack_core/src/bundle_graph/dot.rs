use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::visit::IntoEdgeReferences;

use super::bundle_graph::{BundleGraph, BundleGraphEdgeType, BundleGraphNode};

fn node_label(node: &BundleGraphNode) -> String {
  match node {
    BundleGraphNode::Root => "Root".to_string(),
    BundleGraphNode::Asset(asset) => format!("Asset({})", asset.file_path.display()),
    BundleGraphNode::Dependency(dependency) => format!("Dependency({})", dependency.specifier),
    BundleGraphNode::BundleGroup(bundle_group) => {
      format!("BundleGroup({})", bundle_group.target.name)
    }
    BundleGraphNode::Bundle(bundle) => {
      let entry = if bundle.is_entry { ", entry" } else { "" };
      format!("Bundle({}, {}{})", bundle.bundle_type, bundle.id, entry)
    }
  }
}

fn edge_label(edge_type: &BundleGraphEdgeType) -> String {
  match edge_type {
    BundleGraphEdgeType::Null => String::new(),
    BundleGraphEdgeType::Contains => "contains".to_string(),
    BundleGraphEdgeType::Bundle => "bundle".to_string(),
    BundleGraphEdgeType::References => "references".to_string(),
  }
}

impl BundleGraph {
  /// Renders the graph in Graphviz DOT format, for debugging
  pub fn to_dot(&self) -> String {
    let mut dot_graph: StableDiGraph<String, String> = StableDiGraph::new();
    let mut indexes = HashMap::new();

    for (node_id, node) in self.nodes().enumerate() {
      indexes.insert(node_id, dot_graph.add_node(node_label(node)));
    }

    let mut edges = self
      .graph
      .edge_references()
      .map(|edge| {
        (
          edge.id().index(),
          self.graph[edge.source()],
          self.graph[edge.target()],
          *edge.weight(),
        )
      })
      .collect::<Vec<_>>();
    edges.sort_by_key(|(edge_index, ..)| *edge_index);

    for (_, from, to, edge_type) in edges {
      if let (Some(from), Some(to)) = (indexes.get(&from), indexes.get(&to)) {
        dot_graph.add_edge(*from, *to, edge_label(&edge_type));
      }
    }

    format!("{}", Dot::new(&dot_graph))
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::sync::Arc;

  use super::*;
  use crate::asset_graph::AssetGraph;
  use crate::bundle_graph::CreateBundleOptions;
  use crate::types::{Asset, Dependency, Environment, Target};

  #[test]
  fn test_to_dot_labels_nodes_and_edges() {
    let mut graph = AssetGraph::new();
    let entry_dep =
      graph.add_entry_dependency(Dependency::entry(String::from("index.js"), Target::default()));
    let index = graph.add_asset(Arc::new(Asset::new(
      PathBuf::from("index.js"),
      Arc::new(Environment::default()),
      10,
    )));
    graph.add_edge(&entry_dep, &index);

    let mut bundle_graph = BundleGraph::from_asset_graph(&graph);
    let bundle_group = bundle_graph
      .create_bundle_group(&entry_dep, Target::default(), None)
      .unwrap();
    let bundle = bundle_graph
      .create_bundle(CreateBundleOptions {
        entry_asset: Some(index),
        is_entry: true,
        ..CreateBundleOptions::default()
      })
      .unwrap();
    bundle_graph
      .add_bundle_to_bundle_group(&bundle, &bundle_group)
      .unwrap();

    let dot = bundle_graph.to_dot();
    let bundle_id = &bundle_graph.get_bundle(&bundle).unwrap().id;

    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("[ label = \"Root\" ]"));
    assert!(dot.contains("[ label = \"Dependency(index.js)\" ]"));
    assert!(dot.contains("[ label = \"Asset(index.js)\" ]"));
    assert!(dot.contains("[ label = \"BundleGroup(default)\" ]"));
    assert!(dot.contains(&format!("[ label = \"Bundle(js, {bundle_id}, entry)\" ]")));
    assert!(dot.contains(&format!("{bundle} -> {index} [ label = \"contains\" ]")));
    assert!(dot.contains(&format!("{bundle_group} -> {bundle} [ label = \"bundle\" ]")));
  }
}
