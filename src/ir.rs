use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static ASSOC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<start>[^-_/]*)(?P<line>[-_]+(?:/[-_]+)?)(?P<end>[^-_/]*)$")
        .expect("association pattern is valid")
});

/// Sub-line delimiter inside relation label text.
pub const LABEL_LINE_DELIMITER: char = '`';

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A horizontal band of a classifier (or the diagram root) holding text lines
/// and, optionally, a nested graph of classifiers and relations.
///
/// Nodes are keyed by classifier name in insertion order; relations refer to
/// them by that name.
#[derive(Debug, Clone, Default)]
pub struct Compartment {
    pub lines: Vec<String>,
    pub nodes: IndexMap<String, Classifier>,
    pub relations: Vec<Relation>,
    /// Position inside the owning classifier, written by its visual strategy.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Translation applied before drawing child geometry.
    pub offset: Point,
}

impl Compartment {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_node(mut self, node: Classifier) -> Self {
        self.insert_node(node);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Inserts a classifier under its name. A classifier with the same name is
    /// replaced in place and returned.
    pub fn insert_node(&mut self, node: Classifier) -> Option<Classifier> {
        self.nodes.insert(node.name.clone(), node)
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty() && self.relations.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    pub name: String,
    /// Type tag, e.g. `CLASS` or `PACKAGE`; selects the visual style.
    pub kind: String,
    pub compartments: Vec<Compartment>,
    /// Center of the classifier in its parent compartment's graph space.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub layout_width: f32,
    pub layout_height: f32,
    /// Divider segments relative to the classifier's top-left corner.
    pub dividers: Vec<[Point; 2]>,
}

impl Classifier {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, compartments: Vec<Compartment>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            compartments,
            ..Self::default()
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationLabel {
    pub text: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RelationLabel {
    pub fn new(text: Option<&str>) -> Self {
        Self {
            text: text.filter(|t| !t.is_empty()).map(str::to_string),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        match self.text.as_deref() {
            Some(text) => text.split(LABEL_LINE_DELIMITER).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Relation {
    pub id: usize,
    pub start: String,
    pub end: String,
    pub assoc: String,
    /// `[start center, bend points.., end center]` once laid out.
    pub path: Vec<Point>,
    pub start_label: RelationLabel,
    pub end_label: RelationLabel,
}

impl Relation {
    pub fn new(
        id: usize,
        start: impl Into<String>,
        assoc: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            id,
            start: start.into(),
            end: end.into(),
            assoc: assoc.into(),
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start_label = RelationLabel::new(start);
        self.end_label = RelationLabel::new(end);
        self
    }

    pub fn association(&self) -> Association {
        Association::parse(&self.assoc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Hidden,
}

/// Decoded association token such as `<:-`, `o->` or `_>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub start: String,
    pub line: LineStyle,
    pub end: String,
    /// Both ends should share a rank (`_` in the token).
    pub same_rank: bool,
}

impl Association {
    pub fn parse(token: &str) -> Self {
        let same_rank = token.contains('_');
        let Some(caps) = ASSOC_RE.captures(token) else {
            return Self {
                start: String::new(),
                line: LineStyle::Solid,
                end: String::new(),
                same_rank,
            };
        };
        let line_part = &caps["line"];
        let line = if line_part.contains('/') {
            LineStyle::Hidden
        } else if line_part.chars().count() > 1 {
            LineStyle::Dashed
        } else {
            LineStyle::Solid
        };
        Self {
            start: caps["start"].to_string(),
            line,
            end: caps["end"].to_string(),
            same_rank,
        }
    }
}
