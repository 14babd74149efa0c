//! Writer producing the flat XML rendition of a document tree.
//!
//! Output mirrors what [`crate::reader::parse_document`] accepts. Captured
//! property slices are emitted verbatim; text is escaped and tagged with
//! `xml:space="preserve"` when it carries leading or trailing whitespace, so
//! a read/write cycle does not lose spacing.

use crate::{
    Block, Document, Error, FieldContainer, Inline, Paragraph, Result, Run, RunContent, Table,
};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Serialize a document to its XML rendition.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_document(doc: &Document) -> Result<String> {
    let mut writer = DocWriter::new();
    writer.write(doc)?;
    writer.finish()
}

struct DocWriter {
    writer: Writer<Vec<u8>>,
}

impl DocWriter {
    fn new() -> Self {
        DocWriter {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, doc: &Document) -> Result<()> {
        self.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.start("document")?;
        if doc.body.is_empty() {
            self.empty("body")?;
        } else {
            self.start("body")?;
            self.write_blocks(&doc.body)?;
            self.end("body")?;
        }
        self.end("document")
    }

    fn write_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            match block {
                Block::Paragraph(para) => self.write_paragraph(para)?,
                Block::Table(table) => self.write_table(table)?,
            }
        }
        Ok(())
    }

    fn write_table(&mut self, table: &Table) -> Result<()> {
        self.start("table")?;
        for row in &table.rows {
            self.start("row")?;
            for cell in &row.cells {
                if cell.blocks.is_empty() {
                    self.empty("cell")?;
                } else {
                    self.start("cell")?;
                    self.write_blocks(&cell.blocks)?;
                    self.end("cell")?;
                }
            }
            self.end("row")?;
        }
        self.end("table")
    }

    fn write_paragraph(&mut self, para: &Paragraph) -> Result<()> {
        if para.props.is_none() && para.inlines.is_empty() {
            return self.empty("p");
        }
        self.start("p")?;
        if let Some(props) = &para.props {
            self.raw(props)?;
        }
        // Consecutive deleted runs share one wrapping del element.
        let mut index = 0;
        while index < para.inlines.len() {
            match &para.inlines[index] {
                Inline::Field(field) => {
                    self.write_field(field)?;
                    index += 1;
                }
                Inline::Run(run) if !run.deleted => {
                    self.write_run(run)?;
                    index += 1;
                }
                Inline::Run(_) => {
                    self.start("del")?;
                    while let Some(Inline::Run(run)) = para.inlines.get(index) {
                        if !run.deleted {
                            break;
                        }
                        self.write_run(run)?;
                        index += 1;
                    }
                    self.end("del")?;
                }
            }
        }
        self.end("p")
    }

    fn write_field(&mut self, field: &FieldContainer) -> Result<()> {
        let mut start = BytesStart::new("field");
        let id = field.id.to_string();
        start.push_attribute(("id", id.as_str()));
        if field.runs.is_empty() {
            return self.emit(Event::Empty(start));
        }
        self.emit(Event::Start(start))?;
        for run in &field.runs {
            self.write_run(run)?;
        }
        self.end("field")
    }

    fn write_run(&mut self, run: &Run) -> Result<()> {
        if run.props.is_none() && run.content.is_empty() {
            return self.empty("r");
        }
        self.start("r")?;
        if let Some(props) = &run.props {
            self.raw(props)?;
        }
        for item in &run.content {
            match item {
                RunContent::Text(text) => self.write_text(text)?,
                RunContent::Tab => self.empty("tab")?,
                RunContent::Break => self.empty("br")?,
                RunContent::PageHint => self.empty("pageHint")?,
                RunContent::TextBox(blocks) => {
                    if blocks.is_empty() {
                        self.empty("textbox")?;
                    } else {
                        self.start("textbox")?;
                        self.write_blocks(blocks)?;
                        self.end("textbox")?;
                    }
                }
            }
        }
        self.end("r")
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty("t");
        }
        let mut start = BytesStart::new("t");
        if has_edge_whitespace(text) {
            start.push_attribute(("xml:space", "preserve"));
        }
        self.emit(Event::Start(start))?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.end("t")
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.emit(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<()> {
        self.emit(Event::Empty(BytesStart::new(name)))
    }

    /// Emit an already-serialized fragment without re-escaping.
    fn raw(&mut self, source: &str) -> Result<()> {
        self.emit(Event::Text(BytesText::from_escaped(source)))
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(|e| Error::Write {
            message: e.to_string(),
        })
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| Error::Write {
            message: e.to_string(),
        })
    }
}

fn has_edge_whitespace(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_whitespace)
        || text.chars().next_back().is_some_and(char::is_whitespace)
}
