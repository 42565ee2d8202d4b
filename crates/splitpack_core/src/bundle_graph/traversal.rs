use std::collections::HashSet;
use std::hash::Hash;

use petgraph::Direction;

use super::bundle_graph::{BundleGraph, BundleGraphEdgeType, BundleGraphNode};
use crate::asset_graph::NodeId;

/// What a traversal should do after a visitor has seen a node
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TraversalAction {
  #[default]
  Continue,
  /// Do not descend below the current node. Its exit event still fires.
  SkipChildren,
  /// End the traversal immediately
  Stop,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraversalEvent {
  Enter(NodeId),
  Exit(NodeId),
}

enum Frame {
  Enter(NodeId),
  Exit(NodeId),
}

impl BundleGraph {
  /// Depth-first walk over the dependency graph, starting below the root.
  ///
  /// The visitor returns the context its children receive, so every path carries its own
  /// context. Entry dependencies receive `None`. A node is visited once per distinct context,
  /// which keeps cycles finite while letting a shared module be seen from every bundle group
  /// that reaches it. The visitor may mutate the graph.
  pub fn traverse<C, E, F>(&mut self, mut visit: F) -> Result<(), E>
  where
    C: Clone + Eq + Hash,
    F: FnMut(&mut BundleGraph, NodeId, Option<&C>) -> Result<C, E>,
  {
    let mut visited: HashSet<(NodeId, Option<C>)> = HashSet::new();
    let mut stack: Vec<(NodeId, Option<C>)> = self
      .dependency_graph_children(&self.root_node())
      .into_iter()
      .rev()
      .map(|child| (child, None))
      .collect();

    while let Some((node_id, context)) = stack.pop() {
      if !visited.insert((node_id, context.clone())) {
        continue;
      }

      let child_context = visit(self, node_id, context.as_ref())?;

      for child in self.dependency_graph_children(&node_id).into_iter().rev() {
        stack.push((child, Some(child_context.clone())));
      }
    }

    Ok(())
  }

  /// Walks every bundle, depth first through the bundle group tree.
  ///
  /// Bundles in a group are children of the bundles that load the group. Every bundle is
  /// entered once and exited after all of its children, so `Exit` events arrive in post-order.
  pub fn traverse_bundles<E, F>(&mut self, mut visit: F) -> Result<(), E>
  where
    F: FnMut(&mut BundleGraph, TraversalEvent) -> Result<TraversalAction, E>,
  {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();

    for bundle_group in self.get_root_bundle_groups().into_iter().rev() {
      for bundle in self.get_bundles_in_bundle_group(&bundle_group).into_iter().rev() {
        stack.push(Frame::Enter(bundle));
      }
    }

    while let Some(frame) = stack.pop() {
      match frame {
        Frame::Enter(bundle) => {
          if !visited.insert(bundle) {
            continue;
          }

          let action = visit(self, TraversalEvent::Enter(bundle))?;
          if action == TraversalAction::Stop {
            return Ok(());
          }

          stack.push(Frame::Exit(bundle));
          if action == TraversalAction::SkipChildren {
            continue;
          }

          for child in self.get_child_bundles(&bundle).into_iter().rev() {
            if !visited.contains(&child) {
              stack.push(Frame::Enter(child));
            }
          }
        }
        Frame::Exit(bundle) => {
          if visit(self, TraversalEvent::Exit(bundle))? == TraversalAction::Stop {
            return Ok(());
          }
        }
      }
    }

    Ok(())
  }

  /// Walks the assets and dependencies held by every bundle, in bundle traversal order.
  ///
  /// Each bundle is walked from its root assets through its own members. A node is visited at
  /// most once across all bundles.
  pub fn traverse_contents<F>(&self, mut visit: F)
  where
    F: FnMut(TraversalEvent) -> TraversalAction,
  {
    let mut visited = HashSet::new();

    for bundle in self.bundle_traversal_order() {
      let mut stack = self
        .get_bundle_root_assets(&bundle)
        .into_iter()
        .rev()
        .map(Frame::Enter)
        .collect::<Vec<_>>();

      while let Some(frame) = stack.pop() {
        match frame {
          Frame::Enter(node_id) => {
            if !visited.insert(node_id) {
              continue;
            }

            match visit(TraversalEvent::Enter(node_id)) {
              TraversalAction::Stop => return,
              TraversalAction::SkipChildren => {
                stack.push(Frame::Exit(node_id));
                continue;
              }
              TraversalAction::Continue => stack.push(Frame::Exit(node_id)),
            }

            for child in self.bundle_contents_children(&bundle, &node_id).into_iter().rev() {
              if !visited.contains(&child) {
                stack.push(Frame::Enter(child));
              }
            }
          }
          Frame::Exit(node_id) => {
            if visit(TraversalEvent::Exit(node_id)) == TraversalAction::Stop {
              return;
            }
          }
        }
      }
    }
  }

  /// Bundles in the order `traverse_bundles` enters them
  pub fn bundle_traversal_order(&self) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = Vec::new();

    for bundle_group in self.get_root_bundle_groups().into_iter().rev() {
      for bundle in self.get_bundles_in_bundle_group(&bundle_group).into_iter().rev() {
        stack.push(bundle);
      }
    }

    while let Some(bundle) = stack.pop() {
      if !visited.insert(bundle) {
        continue;
      }

      order.push(bundle);
      for child in self.get_child_bundles(&bundle).into_iter().rev() {
        if !visited.contains(&child) {
          stack.push(child);
        }
      }
    }

    order
  }

  /// Bundles in the groups `bundle` loads
  fn get_child_bundles(&self, bundle: &NodeId) -> Vec<NodeId> {
    self
      .get_child_bundle_groups(bundle)
      .iter()
      .flat_map(|bundle_group| self.get_bundles_in_bundle_group(bundle_group))
      .collect()
  }

  /// Dependency and asset children of a node in the dependency graph
  fn dependency_graph_children(&self, node_id: &NodeId) -> Vec<NodeId> {
    self
      .neighbors(node_id, Direction::Outgoing, BundleGraphEdgeType::Null)
      .into_iter()
      .filter(|child| {
        matches!(
          self.get_node(child),
          Some(BundleGraphNode::Asset(_)) | Some(BundleGraphNode::Dependency(_))
        )
      })
      .collect()
  }

  /// Children of a node while walking the contents of `bundle`. Assets lead to all of their
  /// dependencies; dependencies lead to resolved assets that the bundle holds.
  fn bundle_contents_children(&self, bundle: &NodeId, node_id: &NodeId) -> Vec<NodeId> {
    match self.get_node(node_id) {
      Some(BundleGraphNode::Asset(_)) => self.get_asset_dependencies(node_id),
      Some(BundleGraphNode::Dependency(dependency)) if !dependency.is_split_point() => self
        .get_dependency_assets(node_id)
        .into_iter()
        .filter(|asset| self.bundle_has_asset(bundle, asset))
        .collect(),
      _ => Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::sync::Arc;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::asset_graph::AssetGraph;
  use crate::bundle_graph::CreateBundleOptions;
  use crate::types::{Asset, Dependency, DependencyBuilder, Environment, Priority, Target};

  /// index.js -> a.js -> c.js
  ///          -> b.js -> c.js
  ///          -> lazy.js (lazy)
  struct Fixture {
    graph: AssetGraph,
    entry_dep: NodeId,
    index: NodeId,
    a: NodeId,
    b: NodeId,
    c: NodeId,
    lazy_dep: NodeId,
    lazy: NodeId,
  }

  fn add_asset(graph: &mut AssetGraph, file_path: &str) -> NodeId {
    graph.add_asset(Arc::new(Asset::new(
      PathBuf::from(file_path),
      Arc::new(Environment::default()),
      10,
    )))
  }

  fn import(graph: &mut AssetGraph, from: NodeId, to: NodeId, priority: Priority) -> NodeId {
    let specifier = graph.get_asset(&to).unwrap().file_path.display().to_string();
    let source_asset_id = graph.get_asset(&from).unwrap().id.clone();
    let dependency = graph.add_dependency(
      DependencyBuilder::default()
        .specifier(specifier)
        .source_asset_id(source_asset_id)
        .priority(priority)
        .build(),
    );
    graph.add_edge(&from, &dependency);
    graph.add_edge(&dependency, &to);
    dependency
  }

  fn fixture() -> Fixture {
    let mut graph = AssetGraph::new();
    let entry_dep = graph.add_entry_dependency(Dependency::entry(
      String::from("index.js"),
      Target::default(),
    ));
    let index = add_asset(&mut graph, "index.js");
    graph.add_edge(&entry_dep, &index);
    let a = add_asset(&mut graph, "a.js");
    let b = add_asset(&mut graph, "b.js");
    let c = add_asset(&mut graph, "c.js");
    let lazy = add_asset(&mut graph, "lazy.js");
    import(&mut graph, index, a, Priority::Sync);
    import(&mut graph, index, b, Priority::Sync);
    import(&mut graph, a, c, Priority::Sync);
    import(&mut graph, b, c, Priority::Sync);
    let lazy_dep = import(&mut graph, index, lazy, Priority::Lazy);

    Fixture {
      graph,
      entry_dep,
      index,
      a,
      b,
      c,
      lazy_dep,
      lazy,
    }
  }

  /// Entry bundle for index.js and a lazy bundle loaded from it
  fn bundled(fixture: &Fixture) -> (BundleGraph, NodeId, NodeId) {
    let mut bundle_graph = BundleGraph::from_asset_graph(&fixture.graph);

    let entry_group = bundle_graph
      .create_bundle_group(&fixture.entry_dep, Target::default(), None)
      .unwrap();
    let entry_bundle = bundle_graph
      .create_bundle(CreateBundleOptions {
        entry_asset: Some(fixture.index),
        is_entry: true,
        ..CreateBundleOptions::default()
      })
      .unwrap();
    bundle_graph
      .add_bundle_to_bundle_group(&entry_bundle, &entry_group)
      .unwrap();
    bundle_graph
      .add_asset_graph_to_bundle(&fixture.index, &entry_bundle, &[])
      .unwrap();

    let lazy_group = bundle_graph
      .create_bundle_group(&fixture.lazy_dep, Target::default(), Some(&entry_bundle))
      .unwrap();
    let lazy_bundle = bundle_graph
      .create_bundle(CreateBundleOptions {
        entry_asset: Some(fixture.lazy),
        ..CreateBundleOptions::default()
      })
      .unwrap();
    bundle_graph
      .add_bundle_to_bundle_group(&lazy_bundle, &lazy_group)
      .unwrap();

    (bundle_graph, entry_bundle, lazy_bundle)
  }

  #[test]
  fn test_traverse_visits_in_declaration_order_with_per_path_context() {
    let fixture = fixture();
    let mut bundle_graph = BundleGraph::from_asset_graph(&fixture.graph);
    let mut visits = vec![];

    bundle_graph
      .traverse(|_, node_id, depth: Option<&usize>| {
        let depth = depth.map_or(0, |depth| depth + 1);
        visits.push((node_id, depth));
        Ok::<_, ()>(depth)
      })
      .unwrap();

    let assets = visits
      .iter()
      .filter(|(node_id, _)| fixture.graph.get_asset(node_id).is_some())
      .copied()
      .collect::<Vec<_>>();

    // c.js is reached at the same depth through a.js and b.js, so it is only visited once
    assert_eq!(
      assets,
      vec![
        (fixture.index, 1),
        (fixture.a, 3),
        (fixture.c, 5),
        (fixture.b, 3),
        (fixture.lazy, 3),
      ]
    );
    assert_eq!(visits[0], (fixture.entry_dep, 0));
  }

  #[test]
  fn test_traverse_propagates_visitor_errors() {
    let fixture = fixture();
    let mut bundle_graph = BundleGraph::from_asset_graph(&fixture.graph);

    let result = bundle_graph.traverse(|_, node_id, _: Option<&()>| {
      if node_id == fixture.a {
        Err("failed")
      } else {
        Ok(())
      }
    });

    assert_eq!(result, Err("failed"));
  }

  #[test]
  fn test_traverse_bundles_exits_children_first() {
    let fixture = fixture();
    let (mut bundle_graph, entry_bundle, lazy_bundle) = bundled(&fixture);
    let mut events = vec![];

    bundle_graph
      .traverse_bundles(|_, event| {
        events.push(event);
        Ok::<_, ()>(TraversalAction::Continue)
      })
      .unwrap();

    assert_eq!(
      events,
      vec![
        TraversalEvent::Enter(entry_bundle),
        TraversalEvent::Enter(lazy_bundle),
        TraversalEvent::Exit(lazy_bundle),
        TraversalEvent::Exit(entry_bundle),
      ]
    );
    assert_eq!(
      bundle_graph.bundle_traversal_order(),
      vec![entry_bundle, lazy_bundle]
    );
  }

  #[test]
  fn test_traverse_bundles_skip_children() {
    let fixture = fixture();
    let (mut bundle_graph, entry_bundle, _) = bundled(&fixture);
    let mut events = vec![];

    bundle_graph
      .traverse_bundles(|_, event| {
        events.push(event);
        Ok::<_, ()>(TraversalAction::SkipChildren)
      })
      .unwrap();

    assert_eq!(
      events,
      vec![
        TraversalEvent::Enter(entry_bundle),
        TraversalEvent::Exit(entry_bundle),
      ]
    );
  }

  #[test]
  fn test_traverse_contents_visits_each_node_once() {
    let fixture = fixture();
    let (bundle_graph, _, _) = bundled(&fixture);
    let mut entered = vec![];
    let mut exited = vec![];

    bundle_graph.traverse_contents(|event| {
      match event {
        TraversalEvent::Enter(node_id) => entered.push(node_id),
        TraversalEvent::Exit(node_id) => exited.push(node_id),
      }
      TraversalAction::Continue
    });

    let entered_assets = entered
      .iter()
      .filter(|node_id| fixture.graph.get_asset(node_id).is_some())
      .copied()
      .collect::<Vec<_>>();

    assert_eq!(
      entered_assets,
      vec![fixture.index, fixture.a, fixture.c, fixture.b, fixture.lazy]
    );
    assert_eq!(entered.len(), exited.len());
    assert_eq!(exited.last(), Some(&fixture.lazy));
  }

  #[test]
  fn test_traverse_contents_skip_children() {
    let fixture = fixture();
    let (bundle_graph, _, _) = bundled(&fixture);
    let mut entered = vec![];

    bundle_graph.traverse_contents(|event| {
      let TraversalEvent::Enter(node_id) = event else {
        return TraversalAction::Continue;
      };
      entered.push(node_id);

      if node_id == fixture.a {
        TraversalAction::SkipChildren
      } else {
        TraversalAction::Continue
      }
    });

    // c.js is skipped below a.js but still reached through b.js
    let entered_assets = entered
      .iter()
      .filter(|node_id| fixture.graph.get_asset(node_id).is_some())
      .copied()
      .collect::<Vec<_>>();

    assert_eq!(
      entered_assets,
      vec![fixture.index, fixture.a, fixture.b, fixture.c, fixture.lazy]
    );
  }
}
