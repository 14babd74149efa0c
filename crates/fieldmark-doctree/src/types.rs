//! The typed document tree.
//!
//! This is the abstract element tree the field compiler operates on: blocks
//! (paragraphs and tables), formatting runs, and the uniform field containers
//! produced by normalization. Formatting properties (`pPr`/`rPr`) are carried
//! as opaque markup strings — the compiler never interprets them, it only
//! clones them onto split fragments and compares them byte-for-byte when
//! coalescing adjacent runs.

/// A parsed document: a flat body of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub body: Vec<Block>,
}

impl Document {
    pub fn new(body: Vec<Block>) -> Self {
        Document { body }
    }
}

/// A block-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// A table: rows of cells, each cell holding nested blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

/// A paragraph: optional opaque properties plus a sequence of inlines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    /// Raw `<pPr>…</pPr>` markup, round-tripped verbatim.
    pub props: Option<String>,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn new(inlines: Vec<Inline>) -> Self {
        Paragraph {
            props: None,
            inlines,
        }
    }

    /// Iterate the paragraph's direct runs (field-container content excluded).
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Field(_) => None,
        })
    }
}

/// An inline element within a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    /// A field container produced by normalization.
    Field(FieldContainer),
}

/// A uniform wrapper holding one recognized field plus its stable numeric ID.
///
/// The ID is carried as an attribute in the XML rendition so later stages can
/// locate fields without re-scanning text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldContainer {
    pub id: u32,
    pub runs: Vec<Run>,
}

/// A formatting run: optional opaque properties, a tracked-deletion flag, and
/// ordered content items.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    /// Raw `<rPr>…</rPr>` markup, round-tripped verbatim.
    pub props: Option<String>,
    /// True when the run sits inside a tracked-change deletion.
    pub deleted: bool,
    pub content: Vec<RunContent>,
}

impl Run {
    /// A plain text run with no properties.
    pub fn text(text: impl Into<String>) -> Self {
        Run {
            props: None,
            deleted: false,
            content: vec![RunContent::Text(text.into())],
        }
    }

    /// A text run carrying the given raw properties.
    pub fn styled_text(text: impl Into<String>, props: Option<String>) -> Self {
        Run {
            props,
            deleted: false,
            content: vec![RunContent::Text(text.into())],
        }
    }

    /// True when the run holds more than one content item.
    pub fn is_mixed(&self) -> bool {
        self.content.len() > 1
    }

    /// True when any content item is an alternate-content container.
    pub fn has_text_box(&self) -> bool {
        self.content
            .iter()
            .any(|item| matches!(item, RunContent::TextBox(_)))
    }
}

/// One content item inside a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// Literal text.
    Text(String),
    /// A tab marker.
    Tab,
    /// A line/column break marker.
    Break,
    /// A rendering pagination hint; dropped during normalization.
    PageHint,
    /// An alternate-content container (text box) holding nested blocks.
    TextBox(Vec<Block>),
}
