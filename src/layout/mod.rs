mod error;
mod graph;
mod label_placement;
mod text;
mod tree;
mod visuals;

pub use error::LayoutError;
pub use graph::{
    DagreEngine, EdgeRequest, GraphGeometry, GraphLayoutEngine, GraphOptions, GraphRequest,
    NodeRequest,
};
pub use label_placement::{Quadrant, adjust_quadrant, quadrant};
pub use text::{TextBox, measure_lines};
pub use tree::{TreeExtent, tree_relayout};

use crate::config::{Config, Direction, LayoutConfig};
use crate::ir::{Classifier, Compartment, Point, RelationLabel};
use crate::text_metrics::{FontWeight, TextMeasurer};
use crate::theme::{Style, Theme};
use label_placement::place_relation_labels;
use std::iter;
use visuals::{VisualContext, layouter_for};

/// Extra height below the deepest node after a tree relayout.
const TREE_BOTTOM_MARGIN: f32 = 30.0;
/// Deepest classifier nesting a layout run accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Lays out a whole diagram tree in place.
pub fn layout(
    root: &mut Compartment,
    measurer: &mut dyn TextMeasurer,
    engine: &dyn GraphLayoutEngine,
    config: &Config,
) -> Result<(), LayoutError> {
    Layouter::new(measurer, engine, config).layout(root)
}

/// Bundles the collaborators one layout run needs.
///
/// Compartment and classifier layout recurse into each other once per
/// nesting level. Trees nested deeper than [`MAX_NESTING_DEPTH`] classifiers
/// fail with [`LayoutError::NestingTooDeep`].
pub struct Layouter<'a> {
    measurer: &'a mut dyn TextMeasurer,
    engine: &'a dyn GraphLayoutEngine,
    config: &'a Config,
    depth: usize,
}

impl<'a> Layouter<'a> {
    pub fn new(
        measurer: &'a mut dyn TextMeasurer,
        engine: &'a dyn GraphLayoutEngine,
        config: &'a Config,
    ) -> Self {
        Self {
            measurer,
            engine,
            config,
            depth: 0,
        }
    }

    pub fn layout(&mut self, root: &mut Compartment) -> Result<(), LayoutError> {
        self.layout_compartment(root, 0, Theme::class_style())?;
        if self.config.layout.align_top
            && let Some(extent) = tree_relayout(root)
        {
            root.height = extent.deepest + TREE_BOTTOM_MARGIN;
        }
        Ok(())
    }

    /// Sizes one compartment. Child classifiers are laid out first and then
    /// arranged by the graph engine; relations get their paths and labels.
    pub fn layout_compartment(
        &mut self,
        compartment: &mut Compartment,
        index: usize,
        style: &Style,
    ) -> Result<(), LayoutError> {
        let config: &'a LayoutConfig = &self.config.layout;
        let weight = if index == 0 {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        let text = measure_lines(&compartment.lines, weight, &mut *self.measurer, config);

        if compartment.is_leaf() {
            compartment.width = text.width;
            compartment.height = text.height;
            compartment.offset = Point::new(config.padding, config.padding);
            return Ok(());
        }

        let direction = style.direction.unwrap_or(config.direction);
        for child in compartment.nodes.values_mut() {
            self.layout_classifier(child, direction)?;
        }

        let request = graph_request(compartment, direction, config);
        let geometry = self.engine.layout(&request)?;
        log::debug!(
            nodes = request.nodes.len(),
            edges = request.edges.len(),
            width = geometry.width,
            height = geometry.height;
            "compartment graph laid out"
        );

        for (name, node) in compartment.nodes.iter_mut() {
            if let Some(center) = geometry.nodes.get(name) {
                node.x = center.x;
                node.y = center.y;
            }
        }

        let mut bounds = Bounds::default();
        for relation in &mut compartment.relations {
            let Some(points) = geometry.edges.get(&relation.id) else {
                continue;
            };
            let (Some(start), Some(end)) = (
                compartment.nodes.get(&relation.start),
                compartment.nodes.get(&relation.end),
            ) else {
                continue;
            };
            let (start, end) = (start.center(), end.center());
            relation.path = iter::once(start)
                .chain(points.iter().copied())
                .chain(iter::once(end))
                .collect();
            place_relation_labels(relation, start, end, &mut *self.measurer, config);
            points.iter().for_each(|point| bounds.include(*point));
            bounds.include_label(&relation.start_label);
            bounds.include_label(&relation.end_label);
        }

        let width = geometry.width.max(bounds.right - bounds.left);
        let height = geometry.height.max(bounds.bottom - bounds.top);
        let graph_width = if width > 0.0 {
            width + 2.0 * config.gutter
        } else {
            0.0
        };
        let graph_height = if height > 0.0 {
            height + 2.0 * config.gutter
        } else {
            0.0
        };
        compartment.width = text.width.max(graph_width) + 2.0 * config.padding;
        compartment.height = text.height + graph_height + config.padding;
        compartment.offset = Point::new(
            config.padding - bounds.left,
            config.padding - bounds.top,
        );
        Ok(())
    }

    /// Sizes one classifier from its compartments and its style's visual.
    pub fn layout_classifier(
        &mut self,
        classifier: &mut Classifier,
        direction: Direction,
    ) -> Result<(), LayoutError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(LayoutError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let config = self.config;
        let style = config.theme.style_for(&classifier.kind);
        self.depth += 1;
        let nested = classifier
            .compartments
            .iter_mut()
            .enumerate()
            .try_for_each(|(index, compartment)| {
                self.layout_compartment(compartment, index, style)
            });
        self.depth -= 1;
        nested?;
        let ctx = VisualContext {
            config: &config.layout,
            direction,
        };
        layouter_for(style.visual).layout(&ctx, classifier);
        classifier.layout_width = classifier.width + 2.0 * config.layout.edge_margin;
        classifier.layout_height = classifier.height + 2.0 * config.layout.edge_margin;
        Ok(())
    }
}

fn graph_request(
    compartment: &Compartment,
    direction: Direction,
    config: &LayoutConfig,
) -> GraphRequest {
    let nodes = compartment
        .nodes
        .values()
        .map(|node| NodeRequest {
            id: node.name.clone(),
            width: node.layout_width,
            height: node.layout_height,
        })
        .collect();

    let mut edges = Vec::with_capacity(compartment.relations.len());
    for relation in &compartment.relations {
        if !compartment.nodes.contains_key(&relation.start)
            || !compartment.nodes.contains_key(&relation.end)
        {
            log::debug!(
                start = relation.start.as_str(),
                end = relation.end.as_str();
                "skipping relation with unknown endpoint"
            );
            continue;
        }
        let min_len = if relation.association().same_rank {
            Some(0.0)
        } else if config.gravity != 1.0 {
            Some(config.gravity)
        } else {
            None
        };
        edges.push(EdgeRequest {
            id: relation.id,
            from: relation.start.clone(),
            to: relation.end.clone(),
            min_len,
        });
    }

    GraphRequest {
        nodes,
        edges,
        options: GraphOptions {
            direction,
            node_sep: config.spacing,
            edge_sep: config.spacing,
            rank_sep: config.spacing,
            acyclicer: config.acyclicer.clone(),
            ranker: config.ranker.clone(),
        },
    }
}

/// Running extent of routing points and labels; always contains the origin.
#[derive(Debug, Default)]
struct Bounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Bounds {
    fn include(&mut self, point: Point) {
        self.left = self.left.min(point.x);
        self.top = self.top.min(point.y);
        self.right = self.right.max(point.x);
        self.bottom = self.bottom.max(point.y);
    }

    fn include_label(&mut self, label: &RelationLabel) {
        self.include(Point::new(label.x, label.y));
        self.include(Point::new(label.x + label.width, label.y + label.height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Relation;
    use crate::text_metrics::FixedWidthMeasurer;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Stacks nodes in one column and routes every edge through one midpoint.
    #[derive(Default)]
    struct ColumnEngine {
        requests: RefCell<Vec<GraphRequest>>,
    }

    impl GraphLayoutEngine for ColumnEngine {
        fn layout(&self, request: &GraphRequest) -> Result<GraphGeometry, LayoutError> {
            self.requests.borrow_mut().push(request.clone());
            let mut nodes = HashMap::new();
            let mut y = 0.0;
            let mut width: f32 = 0.0;
            for node in &request.nodes {
                nodes.insert(node.id.clone(), Point::new(node.width / 2.0, y + node.height / 2.0));
                y += node.height + request.options.rank_sep;
                width = width.max(node.width);
            }
            let edges = request
                .edges
                .iter()
                .map(|edge| {
                    let a = nodes[&edge.from];
                    let b = nodes[&edge.to];
                    (edge.id, vec![Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)])
                })
                .collect();
            Ok(GraphGeometry {
                nodes,
                edges,
                width,
                height: (y - request.options.rank_sep).max(0.0),
            })
        }
    }

    struct FailingEngine;

    impl GraphLayoutEngine for FailingEngine {
        fn layout(&self, _request: &GraphRequest) -> Result<GraphGeometry, LayoutError> {
            Err(LayoutError::Engine("boom".to_string()))
        }
    }

    fn class(name: &str) -> Classifier {
        Classifier::new("CLASS", name, vec![Compartment::new([name])])
    }

    fn pair(assoc: &str) -> Compartment {
        Compartment::new(Vec::<String>::new())
            .with_node(class("A"))
            .with_node(class("B"))
            .with_relation(Relation::new(0, "A", assoc, "B").with_labels(Some("1"), Some("*")))
    }

    fn run(root: &mut Compartment, engine: &dyn GraphLayoutEngine, config: &Config) {
        let mut measurer = FixedWidthMeasurer::new(1.0);
        layout(root, &mut measurer, engine, config).expect("layout");
    }

    #[test]
    fn leaf_compartment_is_text_box() {
        let config = Config::default();
        let mut root = Compartment::new(["hello"]);
        run(&mut root, &ColumnEngine::default(), &config);
        let mut measurer = FixedWidthMeasurer::new(1.0);
        let expected = measure_lines(
            &root.lines,
            FontWeight::Bold,
            &mut measurer,
            &config.layout,
        );
        assert_eq!((root.width, root.height), (expected.width, expected.height));
        assert_eq!(root.offset, Point::new(8.0, 8.0));
    }

    #[test]
    fn nested_graph_places_nodes_and_paths() {
        let config = Config::default();
        let engine = ColumnEngine::default();
        let mut root = pair("->");
        run(&mut root, &engine, &config);

        let requests = engine.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].nodes.len(), 2);
        assert_eq!(requests[0].edges[0].min_len, None);

        let a = &root.nodes["A"];
        let b = &root.nodes["B"];
        assert!(a.width > 0.0 && a.height > 0.0);
        assert_eq!(a.layout_width, a.width);
        assert_eq!(b.y, a.height + config.layout.spacing + b.height / 2.0);

        let path = &root.relations[0].path;
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], a.center());
        assert_eq!(path[2], b.center());
        assert!(root.height > a.height + b.height + config.layout.spacing);
        assert!(root.relations[0].start_label.width > 0.0);
    }

    #[test]
    fn same_rank_and_gravity_set_min_len() {
        let engine = ColumnEngine::default();
        run(&mut pair("_>"), &engine, &Config::default());
        let mut config = Config::default();
        config.layout.gravity = 2.0;
        run(&mut pair("->"), &engine, &config);
        run(&mut pair("-_>"), &engine, &config);

        let requests = engine.requests.borrow();
        let min_lens: Vec<_> = requests.iter().map(|r| r.edges[0].min_len).collect();
        assert_eq!(min_lens, vec![Some(0.0), Some(2.0), Some(0.0)]);
    }

    #[test]
    fn unknown_endpoint_is_skipped() {
        let engine = ColumnEngine::default();
        let mut root = pair("->").with_relation(Relation::new(1, "A", "->", "Ghost"));
        run(&mut root, &engine, &Config::default());
        assert_eq!(engine.requests.borrow()[0].edges.len(), 1);
        assert!(root.relations[1].path.is_empty());
        assert_eq!(root.relations[0].path.len(), 3);
    }

    #[test]
    fn relayout_is_idempotent() {
        let config = Config::default();
        let engine = ColumnEngine::default();
        let mut root = pair("->");
        run(&mut root, &engine, &config);
        let first = (root.width, root.height, root.offset, root.relations[0].path.clone());
        let first_b = root.nodes["B"].clone();
        run(&mut root, &engine, &config);
        assert_eq!(
            first,
            (root.width, root.height, root.offset, root.relations[0].path.clone())
        );
        let b = &root.nodes["B"];
        assert_eq!((b.x, b.y, b.width, b.height), (first_b.x, first_b.y, first_b.width, first_b.height));
        let requests = engine.requests.borrow();
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn engine_failure_propagates() {
        let mut measurer = FixedWidthMeasurer::default();
        let result = layout(&mut pair("->"), &mut measurer, &FailingEngine, &Config::default());
        assert!(matches!(result, Err(LayoutError::Engine(_))));
    }

    #[test]
    fn edge_margin_grows_layout_size() {
        let mut config = Config::default();
        config.layout.edge_margin = 3.0;
        let mut root = pair("->");
        run(&mut root, &ColumnEngine::default(), &config);
        let a = &root.nodes["A"];
        assert_eq!(a.layout_width, a.width + 6.0);
        assert_eq!(a.layout_height, a.height + 6.0);
    }

    #[test]
    fn style_direction_reaches_the_engine() {
        let engine = ColumnEngine::default();
        let config = Config::default();
        let package = Classifier::new(
            "PACKAGE",
            "P",
            vec![Compartment::new(["P"]), pair("->")],
        );
        let mut root = Compartment::new(Vec::<String>::new()).with_node(package);
        let config = Config {
            theme: config.theme.with_style(
                "PACKAGE",
                Style {
                    direction: Some(Direction::LeftRight),
                    ..Style::new(crate::theme::Visual::Package)
                },
            ),
            ..config
        };
        run(&mut root, &engine, &config);
        let requests = engine.requests.borrow();
        // Inner graph first, then the root.
        assert_eq!(requests[0].options.direction, Direction::LeftRight);
        assert_eq!(requests[1].options.direction, Direction::TopBottom);
    }

    fn nested(levels: usize) -> Compartment {
        let mut inner = Compartment::new(["leaf"]);
        for level in 0..levels {
            let name = format!("N{level}");
            let node = Classifier::new("PACKAGE", name.clone(), vec![Compartment::new([name]), inner]);
            inner = Compartment::new(Vec::<String>::new()).with_node(node);
        }
        inner
    }

    #[test]
    fn nesting_within_limit_is_laid_out() {
        let mut root = nested(MAX_NESTING_DEPTH);
        run(&mut root, &ColumnEngine::default(), &Config::default());
        assert!(root.nodes["N127"].width > 0.0);
    }

    #[test]
    fn nesting_past_limit_is_rejected() {
        let mut measurer = FixedWidthMeasurer::default();
        let mut root = nested(MAX_NESTING_DEPTH + 1);
        let result = layout(&mut root, &mut measurer, &ColumnEngine::default(), &Config::default());
        assert!(matches!(result, Err(LayoutError::NestingTooDeep(MAX_NESTING_DEPTH))));
    }

    #[test]
    fn align_top_resizes_root() {
        let mut config = Config::default();
        config.layout.align_top = true;
        let mut root = pair("->");
        run(&mut root, &ColumnEngine::default(), &config);
        let a = &root.nodes["A"];
        let b = &root.nodes["B"];
        assert_eq!(a.y, b.y);
        assert_eq!(root.height, a.height + 20.0 + TREE_BOTTOM_MARGIN);
    }
}
