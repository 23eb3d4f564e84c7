// src/dag/graph.rs

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::dag::complexity;
use crate::dag::task_info::TaskRecord;
use crate::errors::{Result, SchedulerError};
use crate::types::TaskId;

/// Traversal colour for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Validated dependency graph over a set of task records.
///
/// Records live in an id-keyed map and own their `depends_on` sets. Edges are
/// mirrored into a petgraph `DiGraph` with direction dependency -> dependent,
/// so dependents are looked up from the graph instead of being stored on the
/// records.
///
/// Tiers (longest dependency chain ending at a task) are only available after
/// a successful [`validate`](Self::validate); adding a record through
/// [`add`](Self::add) invalidates them again.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    records: BTreeMap<TaskId, TaskRecord>,
    graph: DiGraph<TaskId, ()>,
    nodes: HashMap<TaskId, NodeIndex>,
    // Dependents waiting on ids that have not been added yet.
    waiting: HashMap<TaskId, Vec<NodeIndex>>,
    tiers: BTreeMap<TaskId, usize>,
    validated: bool,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Empty graph; trivially valid.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            waiting: HashMap::new(),
            tiers: BTreeMap::new(),
            validated: true,
        }
    }

    /// Add every task and validate the result.
    pub fn build<I>(tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = TaskRecord>,
    {
        let mut graph = Self::new();
        for task in tasks {
            graph.add(task)?;
        }
        graph.validate()?;
        Ok(graph)
    }

    /// Add a record. Dependencies may reference tasks that are added later;
    /// they are only resolved by [`validate`](Self::validate).
    pub fn add(&mut self, task: TaskRecord) -> Result<()> {
        if self.records.contains_key(&task.id) {
            return Err(SchedulerError::DuplicateId(task.id));
        }
        check_override(&task)?;

        let id = task.id.clone();
        let node = self.graph.add_node(id.clone());
        self.nodes.insert(id.clone(), node);

        for dep in &task.depends_on {
            match self.nodes.get(dep) {
                Some(&dep_node) => {
                    self.graph.add_edge(dep_node, node, ());
                }
                None => self.waiting.entry(dep.clone()).or_default().push(node),
            }
        }

        // Earlier records that referenced this id before it existed.
        for dependent in self.waiting.remove(&id).unwrap_or_default() {
            self.graph.add_edge(node, dependent, ());
        }

        debug!(task = %id, deps = ?task.depends_on, "added task to dependency graph");
        self.records.insert(id, task);
        self.validated = false;
        Ok(())
    }

    /// Check references and acyclicity, then compute tiers.
    pub fn validate(&mut self) -> Result<()> {
        for record in self.records.values() {
            for dep in &record.depends_on {
                if !self.records.contains_key(dep) {
                    return Err(SchedulerError::UnknownDependency {
                        task: record.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.find_cycle() {
            return Err(SchedulerError::CircularDependency { cycle });
        }

        self.tiers = self.compute_tiers()?;
        self.validated = true;
        Ok(())
    }

    /// Add a record to an already validated graph, keeping it validated.
    ///
    /// Every check runs before anything is mutated, so on error the graph is
    /// unchanged.
    pub fn insert_validated(&mut self, task: TaskRecord) -> Result<()> {
        self.ensure_validated()?;
        if self.records.contains_key(&task.id) {
            return Err(SchedulerError::DuplicateId(task.id));
        }
        for dep in &task.depends_on {
            if dep != &task.id && !self.records.contains_key(dep) {
                return Err(SchedulerError::UnknownDependency {
                    task: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        // Every dependency already exists and the id is new, so only a
        // self-reference can close a cycle.
        if task.depends_on.contains(&task.id) {
            return Err(SchedulerError::CircularDependency {
                cycle: vec![task.id.clone(), task.id.clone()],
            });
        }

        let tier = task
            .depends_on
            .iter()
            .filter_map(|dep| self.tiers.get(dep))
            .map(|t| t + 1)
            .max()
            .unwrap_or(0);
        let id = task.id.clone();

        self.add(task)?;
        self.tiers.insert(id, tier);
        self.validated = true;
        Ok(())
    }

    /// If adding `task` would close a cycle, return the cycle path starting
    /// and ending at the candidate's id.
    pub fn would_close_cycle(&self, task: &TaskRecord) -> Option<Vec<TaskId>> {
        if task.depends_on.contains(&task.id) {
            return Some(vec![task.id.clone(), task.id.clone()]);
        }

        for dep in &task.depends_on {
            if let Some(path) = self.path_to(dep, &task.id) {
                let mut cycle = Vec::with_capacity(path.len() + 1);
                cycle.push(task.id.clone());
                cycle.extend(path);
                return Some(cycle);
            }
        }
        None
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        self.records.get_mut(id)
    }

    /// All records in id order.
    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> impl Iterator<Item = TaskRecord> {
        self.records.into_values()
    }

    /// Immediate dependencies of a task, in id order.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.records
            .get(id)
            .map(|r| r.depends_on.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Immediate dependents of a task (tasks listing it in `depends_on`), in
    /// id order.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Topological depth of a task; `None` if unknown or not yet validated.
    pub fn tier_of(&self, id: &str) -> Option<usize> {
        if !self.validated {
            return None;
        }
        self.tiers.get(id).copied()
    }

    /// Scheduling order between two records: tier, then score, then id.
    pub fn compare_tasks(&self, a: &TaskRecord, b: &TaskRecord) -> Ordering {
        let tier_a = self.tiers.get(&a.id).copied().unwrap_or(0);
        let tier_b = self.tiers.get(&b.id).copied().unwrap_or(0);
        tier_a
            .cmp(&tier_b)
            .then_with(|| complexity::compare(a.complexity_score(), b.complexity_score()))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Records grouped by tier (index = tier), each tier sorted by score then
    /// id.
    pub fn tiers(&self) -> Result<Vec<Vec<&TaskRecord>>> {
        self.ensure_validated()?;

        let depth = self.tiers.values().copied().max().map_or(0, |t| t + 1);
        let mut grouped: Vec<Vec<&TaskRecord>> = vec![Vec::new(); depth];
        for record in self.records.values() {
            grouped[self.tiers[&record.id]].push(record);
        }
        for tier in grouped.iter_mut() {
            tier.sort_by(|a, b| {
                complexity::compare(a.complexity_score(), b.complexity_score())
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        Ok(grouped)
    }

    fn ensure_validated(&self) -> Result<()> {
        if self.validated {
            Ok(())
        } else {
            Err(SchedulerError::InvalidConfiguration(
                "dependency graph must be validated before it is ordered".to_string(),
            ))
        }
    }

    /// Three-colour depth-first search over `depends_on`. Returns the first
    /// cycle found, as a path that starts and ends on the same id.
    fn find_cycle(&self) -> Option<Vec<TaskId>> {
        let mut colors: HashMap<&str, Color> = self
            .records
            .keys()
            .map(|id| (id.as_str(), Color::Unvisited))
            .collect();

        for root in self.records.keys() {
            if colors[root.as_str()] == Color::Unvisited {
                if let Some(cycle) = self.visit(root, &mut colors) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Iterative DFS from `root`; the frame stack doubles as the current
    /// path.
    fn visit<'a>(
        &'a self,
        root: &'a str,
        colors: &mut HashMap<&'a str, Color>,
    ) -> Option<Vec<TaskId>> {
        colors.insert(root, Color::InProgress);
        let mut stack = vec![(root, self.deps_iter(root))];

        while let Some(frame) = stack.last_mut() {
            let id = frame.0;
            let Some(dep) = frame.1.next() else {
                colors.insert(id, Color::Done);
                stack.pop();
                continue;
            };

            match colors.get(dep.as_str()).copied() {
                Some(Color::Unvisited) => {
                    colors.insert(dep.as_str(), Color::InProgress);
                    stack.push((dep.as_str(), self.deps_iter(dep)));
                }
                Some(Color::InProgress) => {
                    let start = stack
                        .iter()
                        .position(|(p, _)| *p == dep.as_str())
                        .unwrap_or(0);
                    let mut cycle: Vec<TaskId> =
                        stack[start..].iter().map(|(p, _)| p.to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Color::Done) | None => {}
            }
        }
        None
    }

    /// Path of ids from `from` to `target` following `depends_on`, inclusive
    /// of both ends.
    fn path_to<'a>(&'a self, from: &'a str, target: &str) -> Option<Vec<TaskId>> {
        if from == target {
            return Some(vec![from.to_string()]);
        }

        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut stack = vec![(from, self.deps_iter(from))];

        while let Some(frame) = stack.last_mut() {
            let Some(dep) = frame.1.next() else {
                stack.pop();
                continue;
            };

            if dep.as_str() == target {
                let mut path: Vec<TaskId> = stack.iter().map(|(p, _)| p.to_string()).collect();
                path.push(dep.clone());
                return Some(path);
            }
            if visited.insert(dep.as_str()) {
                stack.push((dep.as_str(), self.deps_iter(dep)));
            }
        }
        None
    }

    fn deps_iter<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a TaskId> + 'a {
        self.records
            .get(id)
            .into_iter()
            .flat_map(|r| r.depends_on.iter())
    }

    /// Longest-path depth for every node, relaxed in topological order.
    fn compute_tiers(&self) -> Result<BTreeMap<TaskId, usize>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()].clone();
            SchedulerError::CircularDependency {
                cycle: vec![id.clone(), id],
            }
        })?;

        let mut depth: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
        for node in order {
            let tier = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .filter_map(|dep| depth.get(&dep))
                .map(|t| t + 1)
                .max()
                .unwrap_or(0);
            depth.insert(node, tier);
        }

        Ok(depth
            .into_iter()
            .map(|(node, tier)| (self.graph[node].clone(), tier))
            .collect())
    }
}

fn check_override(task: &TaskRecord) -> Result<()> {
    match task.complexity_override {
        Some(score) if !score.is_finite() => Err(SchedulerError::InvalidConfiguration(format!(
            "task '{}' has a non-finite complexity score ({score})",
            task.id
        ))),
        _ => Ok(()),
    }
}
