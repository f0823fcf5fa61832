use super::LayoutError;
use crate::config::Direction;
use crate::ir::Point;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRequest {
    pub id: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRequest {
    /// Relation id; keys the routed points in `GraphGeometry::edges`.
    pub id: usize,
    pub from: String,
    pub to: String,
    pub min_len: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphOptions {
    pub direction: Direction,
    pub node_sep: f32,
    pub edge_sep: f32,
    pub rank_sep: f32,
    pub acyclicer: String,
    pub ranker: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub nodes: Vec<NodeRequest>,
    pub edges: Vec<EdgeRequest>,
    pub options: GraphOptions,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphGeometry {
    pub nodes: HashMap<String, Point>,
    /// Routing points between the two node centers, keyed by relation id.
    /// Parallel relations between the same pair share one route.
    pub edges: HashMap<usize, Vec<Point>>,
    pub width: f32,
    pub height: f32,
}

pub trait GraphLayoutEngine {
    fn layout(&self, request: &GraphRequest) -> Result<GraphGeometry, LayoutError>;
}

/// Production engine backed by `dagre_rust`.
///
/// The dagre graph is a simple digraph: only the first relation of each
/// `(from, to)` pair becomes an edge, and its `min_len` applies to the pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreEngine;

impl GraphLayoutEngine for DagreEngine {
    fn layout(&self, request: &GraphRequest) -> Result<GraphGeometry, LayoutError> {
        if request.nodes.is_empty() {
            return Ok(GraphGeometry::default());
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let options = &request.options;
        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(dagre_rankdir(options.direction).to_string());
        graph_config.nodesep = Some(options.node_sep);
        graph_config.edgesep = Some(options.edge_sep);
        graph_config.ranksep = Some(options.rank_sep);
        graph_config.marginx = Some(0.0);
        graph_config.marginy = Some(0.0);
        graph_config.acyclicer = Some(dagre_acyclicer(&options.acyclicer).to_string());
        graph_config.ranker = Some(options.ranker.clone());
        dagre_graph.set_graph(graph_config);

        for node in &request.nodes {
            let mut dagre_node = DagreNode::default();
            dagre_node.width = node.width;
            dagre_node.height = node.height;
            dagre_graph.set_node(node.id.clone(), Some(dagre_node));
        }

        let mut edge_set: HashSet<(&str, &str)> = HashSet::new();
        for edge in &request.edges {
            if !edge_set.insert((edge.from.as_str(), edge.to.as_str())) {
                continue;
            }
            let mut edge_label = DagreEdge::default();
            edge_label.minlen = edge.min_len;
            let _ = dagre_graph.set_edge(&edge.from, &edge.to, Some(edge_label), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        let mut geometry = GraphGeometry::default();
        let mut min = Point::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for node in &request.nodes {
            let Some(dagre_node) = dagre_graph.node(&node.id) else {
                return Err(LayoutError::MissingNode(node.id.clone()));
            };
            if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
                return Err(LayoutError::Engine(format!(
                    "non-finite position for node `{}`",
                    node.id
                )));
            }
            min.x = min.x.min(dagre_node.x - node.width / 2.0);
            min.y = min.y.min(dagre_node.y - node.height / 2.0);
            max.x = max.x.max(dagre_node.x + node.width / 2.0);
            max.y = max.y.max(dagre_node.y + node.height / 2.0);
            geometry
                .nodes
                .insert(node.id.clone(), Point::new(dagre_node.x, dagre_node.y));
        }

        for edge in &request.edges {
            let points = dagre_graph
                .edge(&edge.from, &edge.to, None)
                .and_then(|label| label.points.as_ref())
                .map(|points| points.iter().map(|p| Point::new(p.x, p.y)).collect())
                .unwrap_or_default();
            geometry.edges.insert(edge.id, points);
        }

        // Dagre already translates to the origin; this keeps the contract
        // when it does not.
        translate(&mut geometry, -min.x, -min.y);
        geometry.width = max.x - min.x;
        geometry.height = max.y - min.y;
        Ok(geometry)
    }
}

fn translate(geometry: &mut GraphGeometry, dx: f32, dy: f32) {
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    for point in geometry
        .nodes
        .values_mut()
        .chain(geometry.edges.values_mut().flatten())
    {
        point.x += dx;
        point.y += dy;
    }
}

/// Cycle breaker handed to dagre. `dagre_rust` only implements the
/// depth-first variant; `greedy` is accepted and runs as `dfs`.
fn dagre_acyclicer(name: &str) -> &'static str {
    match name {
        "dfs" | "greedy" => "dfs",
        other => {
            log::debug!(acyclicer = other; "unknown acyclicer, using dfs");
            "dfs"
        }
    }
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopBottom => "tb",
        Direction::BottomTop => "bt",
        Direction::LeftRight => "lr",
        Direction::RightLeft => "rl",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GraphOptions {
        GraphOptions {
            direction: Direction::TopBottom,
            node_sep: 40.0,
            edge_sep: 40.0,
            rank_sep: 40.0,
            acyclicer: "greedy".to_string(),
            ranker: "network-simplex".to_string(),
        }
    }

    #[test]
    fn empty_request_is_empty_geometry() {
        let request = GraphRequest {
            nodes: Vec::new(),
            edges: Vec::new(),
            options: options(),
        };
        let geometry = DagreEngine.layout(&request).expect("layout");
        assert_eq!(geometry, GraphGeometry::default());
    }

    #[test]
    fn chain_is_ranked_top_to_bottom() {
        let request = GraphRequest {
            nodes: vec![
                NodeRequest {
                    id: "a".to_string(),
                    width: 30.0,
                    height: 20.0,
                },
                NodeRequest {
                    id: "b".to_string(),
                    width: 30.0,
                    height: 20.0,
                },
            ],
            edges: vec![EdgeRequest {
                id: 7,
                from: "a".to_string(),
                to: "b".to_string(),
                min_len: None,
            }],
            options: options(),
        };
        let geometry = DagreEngine.layout(&request).expect("layout");
        let a = geometry.nodes["a"];
        let b = geometry.nodes["b"];
        assert!(b.y - a.y >= 20.0 + 40.0 - 0.5);
        assert!(geometry.edges.contains_key(&7));
        assert!(geometry.height >= 80.0 - 0.5);
        assert!(geometry.width >= 30.0 - 0.5);
    }

    fn request(nodes: &[&str], edges: &[(usize, &str, &str)]) -> GraphRequest {
        GraphRequest {
            nodes: nodes
                .iter()
                .map(|id| NodeRequest {
                    id: id.to_string(),
                    width: 30.0,
                    height: 20.0,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(id, from, to)| EdgeRequest {
                    id: *id,
                    from: from.to_string(),
                    to: to.to_string(),
                    min_len: None,
                })
                .collect(),
            options: options(),
        }
    }

    #[test]
    fn parallel_relations_share_one_route() {
        let geometry = DagreEngine
            .layout(&request(&["a", "b"], &[(1, "a", "b"), (2, "a", "b")]))
            .expect("layout");
        assert!(!geometry.edges[&1].is_empty());
        assert_eq!(geometry.edges[&1], geometry.edges[&2]);
    }

    #[test]
    fn three_cycle_reverses_closing_edge() {
        let geometry = DagreEngine
            .layout(&request(
                &["a", "b", "c"],
                &[(0, "a", "b"), (1, "b", "c"), (2, "c", "a")],
            ))
            .expect("layout");
        let (a, b, c) = (geometry.nodes["a"], geometry.nodes["b"], geometry.nodes["c"]);
        assert!(a.y < b.y && b.y < c.y, "cycle broken into three ranks");
        // The closing edge is routed across the ranks between c and a.
        let back = &geometry.edges[&2];
        assert!(!back.is_empty());
        for point in back {
            assert!(point.y >= a.y - 10.5 && point.y <= c.y + 10.5, "{point:?}");
        }
    }

    #[test]
    fn acyclicer_names_map_to_dfs() {
        assert_eq!(dagre_acyclicer("greedy"), "dfs");
        assert_eq!(dagre_acyclicer("dfs"), "dfs");
        assert_eq!(dagre_acyclicer("bogus"), "dfs");
    }

    #[test]
    fn rankdir_tokens() {
        assert_eq!(dagre_rankdir(Direction::LeftRight), "lr");
        assert_eq!(dagre_rankdir(Direction::BottomTop), "bt");
    }
}
