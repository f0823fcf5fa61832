pub mod config;
pub mod ir;
pub mod layout;
pub mod text_metrics;
pub mod theme;

pub use config::{Config, Direction, LayoutConfig, load_config};
pub use ir::{Classifier, Compartment, Point, Relation, RelationLabel};
pub use layout::{DagreEngine, GraphLayoutEngine, LayoutError, Layouter, layout};
pub use text_metrics::{FixedWidthMeasurer, FontMeasurer, TextMeasurer};
pub use theme::{Style, Theme, Visual};
