use crate::config::{Direction, LayoutConfig};
use crate::ir::{Classifier, Compartment, Point};
use crate::theme::Visual;

pub(super) struct VisualContext<'a> {
    pub config: &'a LayoutConfig,
    pub direction: Direction,
}

/// Turns a classifier's measured compartments into its final size, places the
/// compartments inside it and records divider segments.
pub(super) trait VisualLayouter: Sync {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier);
}

pub(super) fn layouter_for(visual: Visual) -> &'static dyn VisualLayouter {
    match visual {
        Visual::Actor => &ActorLayout,
        Visual::Database => &DatabaseLayout,
        Visual::Ellipse => &EllipseLayout,
        Visual::Start | Visual::End => &IconLayout,
        Visual::Hidden => &HiddenLayout,
        Visual::Lollipop | Visual::Socket => &LabelledIconLayout,
        Visual::Rhomb => &RhombLayout,
        Visual::Sync => &SyncLayout,
        Visual::Table => &TableLayout,
        Visual::Class
        | Visual::Frame
        | Visual::Input
        | Visual::None
        | Visual::Note
        | Visual::Package
        | Visual::Receiver
        | Visual::Roundrect
        | Visual::Sender
        | Visual::State
        | Visual::Transceiver => &BoxLayout,
    }
}

fn max_width(compartments: &[Compartment]) -> f32 {
    compartments.iter().map(|c| c.width).fold(0.0, f32::max)
}

fn total_height(compartments: &[Compartment]) -> f32 {
    compartments.iter().map(|c| c.height).sum()
}

/// Stacks compartments downward from `top`, each at column `x` with `width`,
/// adding a divider between neighbours.
fn stack(
    classifier: &mut Classifier,
    top: f32,
    x: f32,
    width: f32,
    divider: impl Fn(f32) -> [Point; 2],
) {
    let count = classifier.compartments.len();
    let mut y = top;
    let mut dividers = Vec::new();
    for (idx, comp) in classifier.compartments.iter_mut().enumerate() {
        comp.x = x;
        comp.y = y;
        comp.width = width;
        y += comp.height;
        if idx + 1 < count {
            dividers.push(divider(y));
        }
    }
    classifier.dividers = dividers;
}

fn full_width_divider(width: f32) -> impl Fn(f32) -> [Point; 2] {
    move |y| [Point::new(0.0, y), Point::new(width, y)]
}

struct BoxLayout;

impl VisualLayouter for BoxLayout {
    fn layout(&self, _ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        layout_box(classifier);
    }
}

fn layout_box(classifier: &mut Classifier) {
    let width = max_width(&classifier.compartments);
    classifier.width = width;
    classifier.height = total_height(&classifier.compartments);
    stack(classifier, 0.0, 0.0, width, full_width_divider(width));
}

struct ActorLayout;

impl VisualLayouter for ActorLayout {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        let padding = ctx.config.padding;
        let width = (2.0 * padding).max(max_width(&classifier.compartments));
        classifier.width = width;
        classifier.height = 3.0 * padding + total_height(&classifier.compartments);
        stack(classifier, 3.0 * padding, 0.0, width, move |y| {
            [Point::new(padding, y), Point::new(width - padding, y)]
        });
    }
}

struct DatabaseLayout;

impl VisualLayouter for DatabaseLayout {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        let padding = ctx.config.padding;
        let width = max_width(&classifier.compartments);
        classifier.width = width;
        classifier.height = total_height(&classifier.compartments) + 2.0 * padding;
        stack(classifier, 1.5 * padding, 0.0, width, full_width_divider(width));
    }
}

struct EllipseLayout;

impl VisualLayouter for EllipseLayout {
    fn layout(&self, _ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        let inner_width = max_width(&classifier.compartments);
        let inner_height = total_height(&classifier.compartments);
        let width = inner_width * 1.25;
        let height = inner_height * 1.25;
        classifier.width = width;
        classifier.height = height;
        let rim = move |y: f32| {
            if height <= 0.0 {
                return 0.0;
            }
            let t = y / height - 0.5;
            (0.25 - t * t).max(0.0).sqrt() * width
        };
        stack(
            classifier,
            inner_height * 0.125,
            inner_width * 0.125,
            inner_width,
            move |y| {
                [
                    Point::new(width / 2.0 + rim(y) - 1.0, y),
                    Point::new(width / 2.0 - rim(y) + 1.0, y),
                ]
            },
        );
    }
}

struct RhombLayout;

impl VisualLayouter for RhombLayout {
    fn layout(&self, _ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        let inner_width = max_width(&classifier.compartments);
        let inner_height = total_height(&classifier.compartments);
        let width = inner_width * 1.5;
        let height = inner_height * 1.5;
        classifier.width = width;
        classifier.height = height;
        let slope = if height > 0.0 { width / height } else { 0.0 };
        stack(
            classifier,
            inner_height * 0.25,
            inner_width * 0.25,
            inner_width,
            move |y| {
                let half = if y < height / 2.0 {
                    y * slope
                } else {
                    (height - y) * slope
                };
                [
                    Point::new(width / 2.0 + half, y),
                    Point::new(width / 2.0 - half, y),
                ]
            },
        );
    }
}

struct IconLayout;

impl VisualLayouter for IconLayout {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        classifier.compartments.clear();
        classifier.dividers.clear();
        classifier.width = ctx.config.font_size * 2.5;
        classifier.height = ctx.config.font_size * 2.5;
    }
}

struct HiddenLayout;

impl VisualLayouter for HiddenLayout {
    fn layout(&self, _ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        classifier.compartments.clear();
        classifier.dividers.clear();
        classifier.width = 1.0;
        classifier.height = 1.0;
    }
}

/// Small icon with its compartments hanging beside it (TB) or below it (LR).
struct LabelledIconLayout;

impl VisualLayouter for LabelledIconLayout {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        let padding = ctx.config.padding;
        let size = ctx.config.font_size * 1.5;
        classifier.width = size;
        classifier.height = size;
        classifier.dividers.clear();
        let beneath = ctx.direction == Direction::LeftRight;
        let mut y = if beneath { size - padding } else { -size / 2.0 };
        for comp in &mut classifier.compartments {
            comp.x = if beneath {
                size / 2.0 - comp.width / 2.0
            } else {
                size / 2.0 + padding / 2.0
            };
            comp.y = y;
            y += comp.height;
        }
    }
}

struct SyncLayout;

impl VisualLayouter for SyncLayout {
    fn layout(&self, ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        classifier.compartments.clear();
        classifier.dividers.clear();
        let thin = ctx.config.line_width * 3.0;
        let long = ctx.config.font_size * 5.0;
        if ctx.direction == Direction::LeftRight {
            classifier.width = thin;
            classifier.height = long;
        } else {
            classifier.width = long;
            classifier.height = thin;
        }
    }
}

/// Title compartment on top, remaining compartments in a grid. An empty
/// compartment starts a new row and is collapsed to zero size.
struct TableLayout;

fn is_row_break(comp: &Compartment) -> bool {
    comp.lines.is_empty() && comp.nodes.is_empty()
}

impl VisualLayouter for TableLayout {
    fn layout(&self, _ctx: &VisualContext<'_>, classifier: &mut Classifier) {
        if classifier.compartments.len() <= 1 {
            layout_box(classifier);
            return;
        }

        let cells = &classifier.compartments[1..];
        let last = cells.len() - 1;
        let mut rows: Vec<Vec<usize>> = vec![Vec::new()];
        for (idx, cell) in cells.iter().enumerate() {
            let current_len = rows.last().map_or(0, Vec::len);
            if is_row_break(cell) {
                if idx != last && current_len > 0 {
                    rows.push(Vec::new());
                }
                continue;
            }
            let row_full = rows.len() > 1 && rows[0].len() == current_len;
            if row_full {
                rows.push(vec![idx + 1]);
            } else if let Some(row) = rows.last_mut() {
                row.push(idx + 1);
            }
        }
        rows.retain(|row| !row.is_empty());
        let columns = rows.first().map_or(0, Vec::len);
        if columns == 0 {
            layout_box(classifier);
            return;
        }

        let header_width = classifier.compartments[0].width;
        let header_height = classifier.compartments[0].height;
        let grid: Vec<&Compartment> = rows
            .iter()
            .flatten()
            .map(|&idx| &classifier.compartments[idx])
            .collect();
        let cell_width = grid
            .iter()
            .map(|c| c.width)
            .fold(header_width / columns as f32, f32::max);
        let cell_height = grid.iter().map(|c| c.height).fold(0.0, f32::max);
        let width = cell_width * columns as f32;
        let height = header_height + cell_height * rows.len() as f32;
        classifier.width = width;
        classifier.height = height;

        let mut dividers: Vec<[Point; 2]> = (0..rows.len())
            .map(|row| {
                let y = header_height + row as f32 * cell_height;
                [Point::new(0.0, y), Point::new(width, y)]
            })
            .collect();
        dividers.extend((1..columns).map(|col| {
            let x = col as f32 * cell_width;
            [Point::new(x, header_height), Point::new(x, height)]
        }));
        classifier.dividers = dividers;

        for comp in classifier.compartments.iter_mut().skip(1) {
            if is_row_break(comp) {
                comp.x = 0.0;
                comp.y = 0.0;
                comp.width = 0.0;
                comp.height = 0.0;
            }
        }
        let header = &mut classifier.compartments[0];
        header.x = 0.0;
        header.y = 0.0;
        header.width = width;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, &idx) in row.iter().enumerate() {
                let cell = &mut classifier.compartments[idx];
                cell.x = col_idx as f32 * cell_width;
                cell.y = header_height + row_idx as f32 * cell_height;
                cell.width = cell_width;
            }
        }
    }
}
