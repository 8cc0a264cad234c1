use std::collections::{BTreeMap, BTreeSet, VecDeque, btree_set};

/// Graph structure for traversal and analysis.
///
/// Built from a dependency map that has already been checked for unknown
/// references and cycles. All listings are sorted by component name.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: component -> components that depend on it.
  adjacency: BTreeMap<String, Vec<String>>,
  /// Reverse adjacency: component -> components it depends on.
  reverse_adjacency: BTreeMap<String, Vec<String>>,
  /// Components with no dependencies.
  entry_points: Vec<String>,
  /// Components with more than one dependency (join points).
  join_points: BTreeSet<String>,
  /// Topological levels. Every component only depends on earlier waves.
  waves: Vec<Vec<String>>,
}

impl Graph {
  /// Build a graph from a component -> dependencies map.
  pub fn new(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Self {
    let mut adjacency: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut reverse_adjacency: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for name in dependencies.keys() {
      adjacency.entry(name.clone()).or_default();
      reverse_adjacency.entry(name.clone()).or_default();
    }

    for (name, deps) in dependencies {
      for dep in deps {
        adjacency.entry(dep.clone()).or_default().push(name.clone());
        reverse_adjacency
          .entry(name.clone())
          .or_default()
          .push(dep.clone());
      }
    }

    let entry_points: Vec<String> = reverse_adjacency
      .iter()
      .filter(|(_, upstream)| upstream.is_empty())
      .map(|(name, _)| name.clone())
      .collect();

    let join_points: BTreeSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, upstream)| upstream.len() > 1)
      .map(|(name, _)| name.clone())
      .collect();

    let waves = compute_waves(&adjacency, &reverse_adjacency);

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
      waves,
    }
  }

  /// Get entry points (components with no dependencies).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get the components that depend directly on `name`.
  pub fn downstream(&self, name: &str) -> &[String] {
    self
      .adjacency
      .get(name)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get the components `name` depends on directly.
  pub fn upstream(&self, name: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(name)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a component is a join point (has multiple dependencies).
  pub fn is_join_point(&self, name: &str) -> bool {
    self.join_points.contains(name)
  }

  /// Get all join points.
  pub fn join_points(&self) -> &BTreeSet<String> {
    &self.join_points
  }

  pub fn contains(&self, name: &str) -> bool {
    self.adjacency.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.adjacency.len()
  }

  pub fn is_empty(&self) -> bool {
    self.adjacency.is_empty()
  }

  /// Component names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.adjacency.keys().map(String::as_str)
  }

  /// Execution waves: components in wave `n` only depend on waves `< n`.
  pub fn waves(&self) -> &[Vec<String>] {
    &self.waves
  }

  /// A topological order of all components (waves flattened).
  pub fn execution_order(&self) -> Vec<String> {
    self.waves.iter().flatten().cloned().collect()
  }

  /// Every component that depends on `name`, directly or transitively.
  pub fn transitive_dependents(&self, name: &str) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([name]);

    while let Some(current) = queue.pop_front() {
      for dependent in self.downstream(current) {
        if seen.insert(dependent.clone()) {
          queue.push_back(dependent);
        }
      }
    }

    seen
  }
}

/// Kahn's algorithm, one level at a time.
fn compute_waves(
  adjacency: &BTreeMap<String, Vec<String>>,
  reverse_adjacency: &BTreeMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
  let mut remaining: BTreeMap<&str, usize> = reverse_adjacency
    .iter()
    .map(|(name, upstream)| (name.as_str(), upstream.len()))
    .collect();

  let mut waves = Vec::new();
  let mut current: Vec<String> = remaining
    .iter()
    .filter(|(_, count)| **count == 0)
    .map(|(name, _)| name.to_string())
    .collect();

  while !current.is_empty() {
    let mut next = BTreeSet::new();
    for name in &current {
      remaining.remove(name.as_str());
      for dependent in adjacency.get(name).into_iter().flatten() {
        if let Some(count) = remaining.get_mut(dependent.as_str()) {
          *count -= 1;
          if *count == 0 {
            next.insert(dependent.clone());
          }
        }
      }
    }
    waves.push(std::mem::take(&mut current));
    current = next.into_iter().collect();
  }

  waves
}

/// Find a dependency cycle with a depth-first traversal.
///
/// Components are visited in sorted order. A component is "visiting" while its
/// dependencies are being explored; reaching a visiting component again closes
/// a cycle. The returned names are in traversal order, starting at the
/// component the cycle was entered through. Dependencies that are not keys of
/// the map are ignored.
///
/// The traversal keeps its own stack, so arbitrarily long chains are fine.
pub(crate) fn find_cycle(dependencies: &BTreeMap<String, BTreeSet<String>>) -> Option<Vec<String>> {
  let mut visited: BTreeSet<&str> = BTreeSet::new();
  let mut visiting: BTreeSet<&str> = BTreeSet::new();

  for (root, root_deps) in dependencies {
    if visited.contains(root.as_str()) {
      continue;
    }

    // Current path, each entry with the dependencies it has left to explore.
    let mut path: Vec<(&str, btree_set::Iter<'_, String>)> = vec![(root.as_str(), root_deps.iter())];
    visiting.insert(root);

    loop {
      let Some((_, remaining)) = path.last_mut() else {
        break;
      };

      match remaining.next() {
        Some(dep) => match dependencies.get_key_value(dep.as_str()) {
          None => {}
          Some((dep, _)) if visited.contains(dep.as_str()) => {}
          Some((dep, _)) if visiting.contains(dep.as_str()) => {
            let start = path.iter().position(|(name, _)| *name == dep.as_str())?;
            return Some(path[start..].iter().map(|(name, _)| name.to_string()).collect());
          }
          Some((dep, next)) => {
            visiting.insert(dep);
            path.push((dep.as_str(), next.iter()));
          }
        },
        None => {
          if let Some((name, _)) = path.pop() {
            visiting.remove(name);
            visited.insert(name);
          }
        }
      }
    }
  }

  None
}
