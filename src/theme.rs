use crate::config::Direction;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named sizing strategy selected by a classifier's style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visual {
    Actor,
    Class,
    Database,
    Ellipse,
    End,
    Frame,
    Hidden,
    Input,
    Lollipop,
    None,
    Note,
    Package,
    Receiver,
    Rhomb,
    Roundrect,
    Sender,
    Socket,
    Start,
    State,
    Sync,
    Table,
    Transceiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub center: bool,
    pub underline: bool,
}

impl TextStyle {
    const TITLE: Self = Self {
        bold: true,
        italic: false,
        center: true,
        underline: false,
    };
    const BODY: Self = Self {
        bold: false,
        italic: false,
        center: false,
        underline: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub visual: Visual,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default = "default_title_style")]
    pub title: TextStyle,
    #[serde(default = "default_body_style")]
    pub body: TextStyle,
}

fn default_title_style() -> TextStyle {
    TextStyle::TITLE
}

fn default_body_style() -> TextStyle {
    TextStyle::BODY
}

impl Style {
    pub fn new(visual: Visual) -> Self {
        Self {
            visual,
            direction: None,
            title: TextStyle::TITLE,
            body: TextStyle::BODY,
        }
    }

    fn with_title(mut self, title: TextStyle) -> Self {
        self.title = title;
        self
    }
}

static CLASS_STYLE: Lazy<Style> = Lazy::new(|| Style::new(Visual::Class));

static BUILTIN_STYLES: Lazy<HashMap<&'static str, Style>> = Lazy::new(|| {
    let italic_title = TextStyle {
        italic: true,
        ..TextStyle::TITLE
    };
    let underlined_title = TextStyle {
        underline: true,
        ..TextStyle::TITLE
    };
    let plain = TextStyle {
        center: true,
        ..TextStyle::BODY
    };
    HashMap::from([
        ("ABSTRACT", Style::new(Visual::Class).with_title(italic_title)),
        ("ACTOR", Style::new(Visual::Actor).with_title(plain)),
        ("CHOICE", Style::new(Visual::Rhomb).with_title(plain)),
        ("CLASS", Style::new(Visual::Class)),
        ("DATABASE", Style::new(Visual::Database)),
        ("END", Style::new(Visual::End)),
        ("FRAME", Style::new(Visual::Frame)),
        ("HIDDEN", Style::new(Visual::Hidden)),
        ("INPUT", Style::new(Visual::Input).with_title(plain)),
        ("INSTANCE", Style::new(Visual::Class).with_title(underlined_title)),
        ("LABEL", Style::new(Visual::None).with_title(plain)),
        ("LOLLIPOP", Style::new(Visual::Lollipop).with_title(plain)),
        ("NOTE", Style::new(Visual::Note).with_title(TextStyle::BODY)),
        ("PACKAGE", Style::new(Visual::Package)),
        ("RECEIVER", Style::new(Visual::Receiver)),
        ("REFERENCE", Style::new(Visual::Class)),
        ("SENDER", Style::new(Visual::Sender)),
        ("SOCKET", Style::new(Visual::Socket).with_title(plain)),
        ("START", Style::new(Visual::Start)),
        ("STATE", Style::new(Visual::Roundrect).with_title(plain)),
        ("SYNC", Style::new(Visual::Sync)),
        ("TABLE", Style::new(Visual::Table)),
        ("TRANSCEIVER", Style::new(Visual::Transceiver)),
        ("USECASE", Style::new(Visual::Ellipse).with_title(plain)),
    ])
});

/// Per-type style table consulted by classifier layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Theme {
    /// Entries layered on top of the built-in table, keyed by upper-case type tag.
    pub styles: HashMap<String, Style>,
}

impl Theme {
    pub fn with_style(mut self, kind: &str, style: Style) -> Self {
        self.styles.insert(kind.to_ascii_uppercase(), style);
        self
    }

    /// Resolves the style for a type tag, falling back to the class box.
    pub fn style_for(&self, kind: &str) -> &Style {
        self.styles
            .get(kind)
            .or_else(|| BUILTIN_STYLES.get(kind))
            .unwrap_or(&CLASS_STYLE)
    }

    pub fn class_style() -> &'static Style {
        &CLASS_STYLE
    }
}
