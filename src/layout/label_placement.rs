use crate::config::{Direction, LayoutConfig};
use crate::ir::{Point, Relation, RelationLabel};
use crate::text_metrics::{FontStyle, FontWeight, TextMeasurer};

/// Zone around an anchor. In label terms Q1 is above-right, Q2 above-left,
/// Q3 below-left and Q4 below-right of the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    /// Mirror across the horizontal axis (above <-> below).
    pub fn flip_horizontally(self) -> Self {
        match self {
            Self::Q1 => Self::Q4,
            Self::Q2 => Self::Q3,
            Self::Q3 => Self::Q2,
            Self::Q4 => Self::Q1,
        }
    }

    /// Mirror across the vertical axis (left <-> right).
    pub fn flip_vertically(self) -> Self {
        match self {
            Self::Q1 => Self::Q2,
            Self::Q2 => Self::Q1,
            Self::Q3 => Self::Q4,
            Self::Q4 => Self::Q3,
        }
    }

    fn right_of_anchor(self) -> bool {
        matches!(self, Self::Q1 | Self::Q4)
    }

    fn below_anchor(self) -> bool {
        matches!(self, Self::Q3 | Self::Q4)
    }
}

/// Classifies `point` against a node center by the signs of both offsets.
/// A point level with the center on either axis resolves to `fallback`.
pub fn quadrant(point: Point, center: Point, fallback: Quadrant) -> Quadrant {
    if point.x < center.x && point.y < center.y {
        return Quadrant::Q1;
    }
    if point.x > center.x && point.y < center.y {
        return Quadrant::Q2;
    }
    if point.x > center.x && point.y > center.y {
        return Quadrant::Q3;
    }
    if point.x < center.x && point.y > center.y {
        return Quadrant::Q4;
    }
    fallback
}

/// Flips a label quadrant that points along a bent connector.
///
/// `point` is the center of the label's own node and `opposite` the center of
/// the node at the other end. Straight connectors never flip.
pub fn adjust_quadrant(
    quadrant: Quadrant,
    point: Point,
    opposite: Point,
    direction: Direction,
) -> Quadrant {
    if opposite.x == point.x || opposite.y == point.y {
        return quadrant;
    }
    let opposite_quadrant = if opposite.y < point.y {
        if opposite.x < point.x {
            Quadrant::Q2
        } else {
            Quadrant::Q1
        }
    } else if opposite.x < point.x {
        Quadrant::Q3
    } else {
        Quadrant::Q4
    };
    if opposite_quadrant != quadrant {
        return quadrant;
    }
    match direction {
        Direction::LeftRight => quadrant.flip_horizontally(),
        Direction::TopBottom => quadrant.flip_vertically(),
        Direction::BottomTop | Direction::RightLeft => quadrant,
    }
}

pub(super) fn layout_label(
    label: &mut RelationLabel,
    anchor: Point,
    quadrant: Quadrant,
    measurer: &mut dyn TextMeasurer,
    config: &LayoutConfig,
) {
    let lines = label.lines();
    if lines.is_empty() {
        label.width = 0.0;
        label.height = 0.0;
        label.x = anchor.x;
        label.y = anchor.y;
        return;
    }
    measurer.set_font(config, FontWeight::Normal, FontStyle::Normal);
    let width = lines
        .iter()
        .map(|line| measurer.text_width(line))
        .fold(0.0, f32::max);
    let height = config.font_size * lines.len() as f32;
    label.width = width;
    label.height = height;
    label.x = if quadrant.right_of_anchor() {
        anchor.x + config.padding
    } else {
        anchor.x - width - config.padding
    };
    label.y = if quadrant.below_anchor() {
        anchor.y + config.padding
    } else {
        anchor.y - height - config.padding
    };
}

/// Places both end labels of a routed relation, each in the quadrant around
/// its anchor that the connector does not already occupy.
pub(super) fn place_relation_labels(
    relation: &mut Relation,
    start: Point,
    end: Point,
    measurer: &mut dyn TextMeasurer,
    config: &LayoutConfig,
) {
    let len = relation.path.len();
    if len < 2 {
        return;
    }
    let start_anchor = relation.path[1];
    let end_anchor = relation.path[len - 2];
    let direction = config.direction;
    let start_quadrant = adjust_quadrant(
        quadrant(start_anchor, start, Quadrant::Q4),
        start,
        end,
        direction,
    );
    let end_quadrant = adjust_quadrant(
        quadrant(end_anchor, end, Quadrant::Q2),
        end,
        start,
        direction,
    );
    layout_label(&mut relation.start_label, start_anchor, start_quadrant, measurer, config);
    layout_label(&mut relation.end_label, end_anchor, end_quadrant, measurer, config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::FixedWidthMeasurer;
    use proptest::prelude::*;

    const ALL: [Quadrant; 4] = [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4];

    fn config() -> LayoutConfig {
        LayoutConfig {
            padding: 4.0,
            font_size: 10.0,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn quadrant_by_sign() {
        let c = Point::new(10.0, 10.0);
        assert_eq!(quadrant(Point::new(5.0, 5.0), c, Quadrant::Q4), Quadrant::Q1);
        assert_eq!(quadrant(Point::new(15.0, 5.0), c, Quadrant::Q4), Quadrant::Q2);
        assert_eq!(quadrant(Point::new(15.0, 15.0), c, Quadrant::Q4), Quadrant::Q3);
        assert_eq!(quadrant(Point::new(5.0, 15.0), c, Quadrant::Q2), Quadrant::Q4);
    }

    #[test]
    fn aligned_point_uses_fallback() {
        let c = Point::new(10.0, 10.0);
        assert_eq!(quadrant(Point::new(10.0, 30.0), c, Quadrant::Q4), Quadrant::Q4);
        assert_eq!(quadrant(Point::new(2.0, 10.0), c, Quadrant::Q2), Quadrant::Q2);
        assert_eq!(quadrant(c, c, Quadrant::Q3), Quadrant::Q3);
    }

    #[test]
    fn bent_connector_flips_for_top_bottom() {
        // Opposite node is below-right: label space Q4.
        let q = adjust_quadrant(
            Quadrant::Q4,
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Direction::TopBottom,
        );
        assert_eq!(q, Quadrant::Q3);
    }

    #[test]
    fn bent_connector_flips_for_left_right() {
        let q = adjust_quadrant(
            Quadrant::Q4,
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Direction::LeftRight,
        );
        assert_eq!(q, Quadrant::Q1);
    }

    #[test]
    fn other_directions_keep_quadrant() {
        let q = adjust_quadrant(
            Quadrant::Q4,
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Direction::RightLeft,
        );
        assert_eq!(q, Quadrant::Q4);
    }

    #[test]
    fn different_quadrant_is_kept() {
        let q = adjust_quadrant(
            Quadrant::Q1,
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Direction::TopBottom,
        );
        assert_eq!(q, Quadrant::Q1);
    }

    #[test]
    fn flips_are_involutions() {
        for q in ALL {
            assert_eq!(q.flip_horizontally().flip_horizontally(), q);
            assert_eq!(q.flip_vertically().flip_vertically(), q);
            assert_ne!(q.flip_vertically(), q);
        }
    }

    #[test]
    fn empty_label_sits_on_anchor() {
        let mut label = RelationLabel::new(None);
        let mut measurer = FixedWidthMeasurer::new(1.0);
        layout_label(&mut label, Point::new(3.0, 4.0), Quadrant::Q1, &mut measurer, &config());
        assert_eq!((label.x, label.y, label.width, label.height), (3.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn label_offsets_follow_quadrant() {
        let mut measurer = FixedWidthMeasurer::new(1.0);
        let anchor = Point::new(100.0, 100.0);
        let cfg = config();

        let mut label = RelationLabel::new(Some("ab`abcd"));
        layout_label(&mut label, anchor, Quadrant::Q4, &mut measurer, &cfg);
        assert_eq!(label.width, 40.0);
        assert_eq!(label.height, 20.0);
        assert_eq!((label.x, label.y), (104.0, 104.0));

        layout_label(&mut label, anchor, Quadrant::Q2, &mut measurer, &cfg);
        assert_eq!((label.x, label.y), (100.0 - 40.0 - 4.0, 100.0 - 20.0 - 4.0));

        layout_label(&mut label, anchor, Quadrant::Q1, &mut measurer, &cfg);
        assert_eq!((label.x, label.y), (104.0, 76.0));

        layout_label(&mut label, anchor, Quadrant::Q3, &mut measurer, &cfg);
        assert_eq!((label.x, label.y), (56.0, 104.0));
    }

    #[test]
    fn relation_labels_use_path_anchors() {
        let mut measurer = FixedWidthMeasurer::new(1.0);
        let start = Point::new(0.0, 0.0);
        let end = Point::new(0.0, 100.0);
        let mut relation = crate::ir::Relation::new(1, "a", "->", "b")
            .with_labels(Some("s"), Some("e"));
        relation.path = vec![start, Point::new(0.0, 30.0), Point::new(0.0, 70.0), end];
        place_relation_labels(&mut relation, start, end, &mut measurer, &config());
        // Start anchor is straight below: fallback Q4 puts it below-right.
        assert_eq!((relation.start_label.x, relation.start_label.y), (4.0, 34.0));
        // End anchor is straight above: fallback Q2 puts it above-left.
        assert_eq!(
            (relation.end_label.x, relation.end_label.y),
            (-10.0 - 4.0, 70.0 - 10.0 - 4.0)
        );
    }

    fn any_quadrant() -> impl Strategy<Value = Quadrant> {
        prop::sample::select(ALL.to_vec())
    }

    proptest! {
        #[test]
        fn shared_axis_always_falls_back(
            cx in -500i32..500, cy in -500i32..500, d in -500i32..500,
            fallback in any_quadrant(),
        ) {
            let center = Point::new(cx as f32, cy as f32);
            let same_x = Point::new(cx as f32, (cy + d) as f32);
            let same_y = Point::new((cx + d) as f32, cy as f32);
            prop_assert_eq!(quadrant(same_x, center, fallback), fallback);
            prop_assert_eq!(quadrant(same_y, center, fallback), fallback);
        }

        #[test]
        fn quadrant_matches_signs(
            px in -500i32..500, py in -500i32..500,
            cx in -500i32..500, cy in -500i32..500,
        ) {
            prop_assume!(px != cx && py != cy);
            let q = quadrant(
                Point::new(px as f32, py as f32),
                Point::new(cx as f32, cy as f32),
                Quadrant::Q4,
            );
            let expected = match (px < cx, py < cy) {
                (true, true) => Quadrant::Q1,
                (false, true) => Quadrant::Q2,
                (false, false) => Quadrant::Q3,
                (true, false) => Quadrant::Q4,
            };
            prop_assert_eq!(q, expected);
        }

        #[test]
        fn straight_connectors_never_flip(
            x in -500i32..500, y in -500i32..500, d in -500i32..500,
            q in any_quadrant(), horizontal in any::<bool>(),
        ) {
            let point = Point::new(x as f32, y as f32);
            let opposite = if horizontal {
                Point::new((x + d) as f32, y as f32)
            } else {
                Point::new(x as f32, (y + d) as f32)
            };
            for direction in [
                Direction::TopBottom,
                Direction::LeftRight,
                Direction::BottomTop,
                Direction::RightLeft,
            ] {
                prop_assert_eq!(adjust_quadrant(q, point, opposite, direction), q);
            }
        }
    }
}
