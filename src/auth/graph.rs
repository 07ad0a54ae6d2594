//! The group management graph.
//!
//! One edge set observed from both ends: `can_manage` follows edges forward,
//! `is_managed_by` follows them backward. Cycles and self-loops are legal.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::types::ManagementEdge;

#[derive(Debug, Clone, Default)]
pub struct GroupGraph {
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl GroupGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = ManagementEdge>,
    {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.manager, &edge.managed);
        }
        graph
    }

    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, manager: &str, managed: &str) -> bool {
        let inserted = self
            .forward
            .entry(manager.to_string())
            .or_default()
            .insert(managed.to_string());
        self.reverse
            .entry(managed.to_string())
            .or_default()
            .insert(manager.to_string());
        inserted
    }

    /// Returns false if there was no such edge.
    pub fn remove_edge(&mut self, manager: &str, managed: &str) -> bool {
        let removed = detach(&mut self.forward, manager, managed);
        detach(&mut self.reverse, managed, manager);
        removed
    }

    /// Drops every edge touching `group`.
    pub fn remove_group(&mut self, group: &str) {
        if let Some(managed) = self.forward.remove(group) {
            for target in managed {
                detach(&mut self.reverse, &target, group);
            }
        }
        if let Some(managers) = self.reverse.remove(group) {
            for source in managers {
                detach(&mut self.forward, &source, group);
            }
        }
    }

    #[must_use]
    pub fn contains_edge(&self, manager: &str, managed: &str) -> bool {
        self.forward
            .get(manager)
            .is_some_and(|targets| targets.contains(managed))
    }

    /// Groups `group` administers directly.
    pub fn can_manage<'a>(&'a self, group: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.forward
            .get(group)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Groups that administer `group` directly.
    pub fn is_managed_by<'a>(&'a self, group: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.reverse
            .get(group)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = ManagementEdge> + '_ {
        self.forward.iter().flat_map(|(manager, targets)| {
            targets
                .iter()
                .map(move |managed| ManagementEdge::new(manager.as_str(), managed.as_str()))
        })
    }

    /// True if `target` is `source` or is reachable by following zero or more
    /// management edges. Each group is expanded at most once.
    #[must_use]
    pub fn can_reach(&self, source: &str, target: &str) -> bool {
        if source == target {
            return true;
        }

        let mut visited = BTreeSet::from([source]);
        let mut queue = VecDeque::from([source]);

        while let Some(current) = queue.pop_front() {
            for next in self.can_manage(current) {
                if next == target {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Every group `source` can reach, including itself.
    #[must_use]
    pub fn reachable_from(&self, source: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::from([source.to_string()]);
        let mut queue = VecDeque::from([source]);

        while let Some(current) = queue.pop_front() {
            for next in self.can_manage(current) {
                if visited.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// True if `group` manages itself through at least one edge, either a
    /// self-loop or a longer cycle.
    #[must_use]
    pub fn on_cycle(&self, group: &str) -> bool {
        self.can_manage(group)
            .any(|next| self.can_reach(next, group))
    }
}

fn detach(index: &mut BTreeMap<String, BTreeSet<String>>, key: &str, value: &str) -> bool {
    let Some(values) = index.get_mut(key) else {
        return false;
    };
    let removed = values.remove(value);
    if values.is_empty() {
        index.remove(key);
    }
    removed
}
