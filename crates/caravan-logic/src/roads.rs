//! Road network between settlements.
//!
//! `SettlementGraph` holds a symmetric adjacency list built once from road
//! definitions and answers hop-count distance and route queries by BFS.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// A two-way road between two settlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    pub a: String,
    pub b: String,
}

impl Road {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

/// Static road graph keyed by settlement name.
#[derive(Debug, Clone, Default)]
pub struct SettlementGraph {
    adj: BTreeMap<String, Vec<String>>,
}

impl SettlementGraph {
    pub fn from_roads(roads: &[Road]) -> Self {
        let mut adj: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for road in roads {
            if road.a == road.b {
                log::warn!("Ignoring road from '{}' to itself", road.a);
                continue;
            }
            let from_a = adj.entry(road.a.clone()).or_default();
            if from_a.contains(&road.b) {
                log::warn!("Duplicate road '{}' <-> '{}'", road.a, road.b);
                continue;
            }
            from_a.push(road.b.clone());
            adj.entry(road.b.clone()).or_default().push(road.a.clone());
        }
        Self { adj }
    }

    pub fn neighbors(&self, name: &str) -> &[String] {
        self.adj.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adj.contains_key(name)
    }

    pub fn settlement_count(&self) -> usize {
        self.adj.len()
    }

    /// Number of roads on the shortest path, `None` if unreachable.
    ///
    /// Expands one BFS level at a time and stops as soon as `to` turns up.
    pub fn distance(&self, from: &str, to: &str) -> Option<u32> {
        if from == to {
            return Some(0);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut frontier: Vec<&str> = vec![from];
        visited.insert(from);
        let mut depth = 0;

        while !frontier.is_empty() {
            depth += 1;
            let mut next = Vec::new();
            for current in frontier {
                for neighbor in self.neighbors(current) {
                    if neighbor == to {
                        return Some(depth);
                    }
                    if visited.insert(neighbor.as_str()) {
                        next.push(neighbor.as_str());
                    }
                }
            }
            frontier = next;
        }

        None
    }

    /// Settlements passed through from `from` to `to`, excluding `from`.
    /// Empty if already there, `None` if unreachable.
    pub fn route(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![]);
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        parent.insert(from, from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if parent.contains_key(neighbor.as_str()) {
                    continue;
                }
                parent.insert(neighbor.as_str(), current);
                if neighbor == to {
                    let mut path = vec![to.to_string()];
                    let mut step = current;
                    while step != from {
                        path.push(step.to_string());
                        step = parent[step];
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor.as_str());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> SettlementGraph {
        // Ashford - Brook - Caldera - Dunmere, plus isolated pair Eyre - Fallow
        SettlementGraph::from_roads(&[
            Road::new("Ashford", "Brook"),
            Road::new("Brook", "Caldera"),
            Road::new("Caldera", "Dunmere"),
            Road::new("Eyre", "Fallow"),
        ])
    }

    #[test]
    fn test_same_settlement() {
        let g = line_graph();
        assert_eq!(g.distance("Ashford", "Ashford"), Some(0));
        assert_eq!(g.route("Ashford", "Ashford"), Some(vec![]));
    }

    #[test]
    fn test_adjacent() {
        let g = line_graph();
        assert_eq!(g.distance("Ashford", "Brook"), Some(1));
        assert_eq!(g.distance("Brook", "Ashford"), Some(1));
    }

    #[test]
    fn test_multi_hop() {
        let g = line_graph();
        assert_eq!(g.distance("Ashford", "Dunmere"), Some(3));
        assert_eq!(
            g.route("Ashford", "Dunmere").unwrap(),
            vec!["Brook", "Caldera", "Dunmere"]
        );
        assert_eq!(g.route("Dunmere", "Brook").unwrap(), vec!["Caldera", "Brook"]);
    }

    #[test]
    fn test_unreachable() {
        let g = line_graph();
        assert_eq!(g.distance("Ashford", "Eyre"), None);
        assert_eq!(g.route("Ashford", "Fallow"), None);
        assert_eq!(g.distance("Ashford", "Nowhere"), None);
    }

    #[test]
    fn test_shortest_of_two_paths() {
        let g = SettlementGraph::from_roads(&[
            Road::new("A", "B"),
            Road::new("B", "C"),
            Road::new("C", "D"),
            Road::new("A", "D"),
        ]);
        assert_eq!(g.distance("A", "C"), Some(2));
        assert_eq!(g.distance("B", "D"), Some(2));
        assert_eq!(g.route("A", "D").unwrap(), vec!["D"]);
    }

    #[test]
    fn test_duplicate_roads_ignored() {
        let g = SettlementGraph::from_roads(&[
            Road::new("A", "B"),
            Road::new("B", "A"),
            Road::new("A", "A"),
        ]);
        assert_eq!(g.neighbors("A").len(), 1);
        assert_eq!(g.neighbors("B").len(), 1);
        assert_eq!(g.settlement_count(), 2);
    }
}
