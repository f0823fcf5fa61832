use crate::ir::{Classifier, Compartment, Relation};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

const PAD_TOP: f32 = 20.0;
const PAD_RIGHT: f32 = 10.0;
/// Distance of a connector elbow below the top edge of its node.
const ELBOW_OFFSET: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreeExtent {
    /// Lowest node bottom reached, plus top padding.
    pub deepest: f32,
    /// Rightmost node edge reached, plus right padding.
    pub widest: f32,
}

type Nodes = IndexMap<String, Classifier>;

/// Re-derives a strict single-root hierarchy from the relations of one
/// compartment and overrides the vertical placement chosen by the graph
/// layout. Returns `None` when no classifier qualifies as the root (every
/// relation start is also an end).
///
/// The set of moved ancestors is shared by the whole pass. An ancestor reached
/// by ascents from several leaves is positioned only by the first one; later
/// ascents treat it as settled, which can under-space the later subtrees.
pub fn tree_relayout(compartment: &mut Compartment) -> Option<TreeExtent> {
    let mut pass = TreeRelayout::new(&compartment.relations);
    let root = pass.find_root(&compartment.nodes)?;
    log::debug!(root = root.as_str(); "tree relayout");
    pass.place_from(&root, &mut compartment.nodes);
    for relation in &mut compartment.relations {
        rewrite_path(relation, &compartment.nodes);
    }
    Some(TreeExtent {
        deepest: pass.deepest,
        widest: pass.widest,
    })
}

struct TreeRelayout {
    children: HashMap<String, Vec<String>>,
    parents: HashMap<String, String>,
    moved: HashSet<String>,
    columns: HashMap<String, usize>,
    /// Running maximum bottom per column.
    depths: Vec<f32>,
    deepest: f32,
    widest: f32,
}

impl TreeRelayout {
    fn new(relations: &[Relation]) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut parents = HashMap::new();
        for relation in relations {
            children
                .entry(relation.start.clone())
                .or_default()
                .push(relation.end.clone());
            parents.insert(relation.end.clone(), relation.start.clone());
        }
        Self {
            children,
            parents,
            moved: HashSet::new(),
            columns: HashMap::new(),
            depths: Vec::new(),
            deepest: 0.0,
            widest: 0.0,
        }
    }

    fn find_root(&self, nodes: &Nodes) -> Option<String> {
        let candidates: Vec<&String> = nodes
            .keys()
            .filter(|name| self.children.contains_key(*name) && !self.parents.contains_key(*name))
            .collect();
        if candidates.len() > 1 {
            log::warn!(
                candidates = candidates.len();
                "tree relayout found several roots, using the last one"
            );
        }
        candidates.last().map(|name| name.to_string())
    }

    /// Depth-first walk from the root; every leaf starts an ascent.
    fn place_from(&mut self, root: &str, nodes: &mut Nodes) {
        let mut stack: Vec<(String, usize)> = vec![(root.to_string(), 0)];
        let mut path: Vec<String> = Vec::new();
        while let Some((name, depth)) = stack.pop() {
            path.truncate(depth);
            path.push(name.clone());
            let kids = self.children.get(&name).cloned().unwrap_or_default();
            if kids.is_empty() {
                self.ascend(&name, nodes);
                continue;
            }
            for child in kids.iter().rev() {
                if nodes.contains_key(child) && !path.contains(child) {
                    stack.push((child.clone(), depth + 1));
                }
            }
        }
    }

    fn ascend(&mut self, leaf: &str, nodes: &mut Nodes) {
        let mut current = leaf.to_string();
        let mut descendants: Vec<String> = Vec::new();
        loop {
            let Some(parent) = self.parents.get(&current).cloned() else {
                self.settle_root(&current, &descendants, nodes);
                return;
            };
            if !nodes.contains_key(&parent) {
                return;
            }
            if self.moved.contains(&parent) {
                self.settle_branch(&current, &parent, &descendants, nodes);
                return;
            }
            align(&parent, &current, nodes);
            descendants.push(current);
            self.moved.insert(parent.clone());
            current = parent;
        }
    }

    fn settle_root(&mut self, root: &str, descendants: &[String], nodes: &mut Nodes) {
        self.columns.insert(root.to_string(), 0);
        if let Some(node) = nodes.get_mut(root) {
            node.y = node.height / 2.0;
        }
        let count = descendants.len();
        for (idx, child) in descendants.iter().enumerate() {
            align(child, root, nodes);
            self.columns.insert(child.clone(), count - idx);
            self.record_depth(child, nodes);
        }
    }

    /// Starts a new branch below an already placed parent.
    fn settle_branch(
        &mut self,
        branch: &str,
        parent: &str,
        descendants: &[String],
        nodes: &mut Nodes,
    ) {
        let column = self.columns.get(parent).copied().unwrap_or(0) + 1;
        self.columns.insert(branch.to_string(), column);
        let top = self.max_depth(column, descendants.len());
        if let Some(node) = nodes.get_mut(branch) {
            node.y = top + node.height / 2.0;
        }
        self.record_depth(branch, nodes);
        let count = descendants.len();
        for (idx, child) in descendants.iter().enumerate() {
            align(child, branch, nodes);
            self.columns.insert(child.clone(), count - idx + column);
            self.record_depth(child, nodes);
        }
    }

    fn record_depth(&mut self, name: &str, nodes: &Nodes) {
        let Some(node) = nodes.get(name) else {
            return;
        };
        let column = self.columns.get(name).copied().unwrap_or(0);
        let depth = node.bottom() + PAD_TOP;
        let width = node.right() + PAD_RIGHT;
        log::trace!(node = name, column = column, depth = depth; "tree node placed");
        self.deepest = self.deepest.max(depth);
        self.widest = self.widest.max(width);
        if self.depths.len() <= column {
            self.depths.resize(column + 1, 0.0);
        }
        self.depths[column] = self.depths[column].max(depth);
    }

    /// Deepest recorded bottom across `column..=column + span`.
    fn max_depth(&self, column: usize, span: usize) -> f32 {
        let end = (column + span + 1).min(self.depths.len());
        self.depths
            .get(column..end)
            .unwrap_or_default()
            .iter()
            .copied()
            .fold(0.0, f32::max)
    }
}

/// Moves `name` so its vertical center matches `reference`.
fn align(name: &str, reference: &str, nodes: &mut Nodes) {
    let Some(target_y) = nodes.get(reference).map(|r| r.y) else {
        return;
    };
    if let Some(node) = nodes.get_mut(name) {
        node.y = target_y;
    }
}

/// Re-anchors the connector elbows to the tops of the relocated nodes.
fn rewrite_path(relation: &mut Relation, nodes: &Nodes) {
    let Some(end) = nodes.get(&relation.end) else {
        return;
    };
    let len = relation.path.len();
    if len < 2 {
        return;
    }
    let end_y = end.top() + ELBOW_OFFSET;
    relation.path[len - 1] = end.center();
    for point in relation.path.iter_mut().take(len - 1).skip(2) {
        point.y = end_y;
    }

    let Some(start) = nodes.get(&relation.start) else {
        return;
    };
    relation.path[0] = start.center();
    if len < 3 {
        return;
    }
    relation.path[1].y = start.top() + ELBOW_OFFSET;
    if len > 3 && relation.path[1].y < relation.path[2].y {
        relation.path[1].x = relation.path[2].x;
    }
}
