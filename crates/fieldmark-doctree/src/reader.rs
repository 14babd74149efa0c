//! Reader building the typed tree from its flat XML rendition.
//!
//! The dialect is small and fixed: `<document><body>` holds `<p>` and
//! `<table>` blocks; paragraphs hold `<pPr>`, `<r>`, `<del>` and
//! `<field id="N">`; runs hold `<rPr>`, `<t>`, `<tab/>`, `<br/>`,
//! `<pageHint/>` and `<textbox>`. Property elements (`pPr`/`rPr`) are not
//! interpreted: their raw source slices are captured verbatim so the writer
//! can reproduce them byte-for-byte.

use crate::{
    Block, Document, Error, FieldContainer, Inline, Paragraph, Result, Run, RunContent, Table,
    TableCell, TableRow,
};
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Parse a document from its XML rendition.
///
/// # Errors
///
/// Returns an error if the markup is malformed, if an element appears where
/// the dialect does not allow it, or if a `<field>` lacks a numeric `id`.
pub fn parse_document(source: &str) -> Result<Document> {
    let mut reader = DocReader::new(source);
    reader.parse()
}

/// Internal reader state.
struct DocReader<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> DocReader<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        DocReader { source, reader }
    }

    fn parse(&mut self) -> Result<Document> {
        loop {
            match self.next_event()? {
                Event::Start(e) => {
                    if e.name().as_ref() == b"document" {
                        return self.read_document();
                    }
                    return Err(self.unexpected(&e, "document root"));
                }
                Event::Empty(e) => {
                    if e.name().as_ref() == b"document" {
                        return Ok(Document::default());
                    }
                    return Err(self.unexpected(&e, "document root"));
                }
                Event::Text(e) => self.expect_blank(&e, "document root")?,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => return Err(Error::MissingRoot),
                Event::End(e) => return Err(self.unexpected_end(&e, "document root")),
                Event::CData(_) => {
                    return Err(Error::UnexpectedText {
                        context: "document root".to_string(),
                    });
                }
            }
        }
    }

    fn read_document(&mut self) -> Result<Document> {
        let mut body = Vec::new();
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"body" => body = self.read_blocks("body")?,
                    _ => return Err(self.unexpected(&e, "document")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"body" => {}
                    _ => return Err(self.unexpected(&e, "document")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "document")?;
                    return Ok(Document { body });
                }
                Event::Text(e) => self.expect_blank(&e, "document")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("document")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "document".to_string(),
                    });
                }
            }
        }
    }

    /// Read block children until the named closing tag.
    fn read_blocks(&mut self, end: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(self.read_paragraph()?)),
                    b"table" => blocks.push(Block::Table(self.read_table()?)),
                    _ => return Err(self.unexpected(&e, end)),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"p" => blocks.push(Block::Paragraph(Paragraph::default())),
                    b"table" => blocks.push(Block::Table(Table::default())),
                    _ => return Err(self.unexpected(&e, end)),
                },
                Event::End(e) => {
                    self.expect_end(&e, end)?;
                    return Ok(blocks);
                }
                Event::Text(e) => self.expect_blank(&e, end)?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof(end)),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: end.to_string(),
                    });
                }
            }
        }
    }

    fn read_table(&mut self) -> Result<Table> {
        let mut table = Table::default();
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"row" => table.rows.push(self.read_row()?),
                    _ => return Err(self.unexpected(&e, "table")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"row" => table.rows.push(TableRow::default()),
                    _ => return Err(self.unexpected(&e, "table")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "table")?;
                    return Ok(table);
                }
                Event::Text(e) => self.expect_blank(&e, "table")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("table")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "table".to_string(),
                    });
                }
            }
        }
    }

    fn read_row(&mut self) -> Result<TableRow> {
        let mut row = TableRow::default();
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"cell" => row.cells.push(TableCell {
                        blocks: self.read_blocks("cell")?,
                    }),
                    _ => return Err(self.unexpected(&e, "row")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"cell" => row.cells.push(TableCell::default()),
                    _ => return Err(self.unexpected(&e, "row")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "row")?;
                    return Ok(row);
                }
                Event::Text(e) => self.expect_blank(&e, "row")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("row")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "row".to_string(),
                    });
                }
            }
        }
    }

    fn read_paragraph(&mut self) -> Result<Paragraph> {
        let mut para = Paragraph::default();
        loop {
            let event_start = self.reader.buffer_position();
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"pPr" => para.props = Some(self.capture_raw(&e, event_start)?),
                    b"r" => para.inlines.push(Inline::Run(self.read_run(false)?)),
                    b"del" => self.read_deleted_runs(&mut para.inlines)?,
                    b"field" => {
                        let id = self.field_id(&e)?;
                        para.inlines
                            .push(Inline::Field(self.read_field_content(id)?));
                    }
                    _ => return Err(self.unexpected(&e, "p")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"pPr" => para.props = Some(self.raw_slice(event_start)),
                    b"r" => para.inlines.push(Inline::Run(Run::default())),
                    b"del" => {}
                    b"field" => {
                        let id = self.field_id(&e)?;
                        para.inlines
                            .push(Inline::Field(FieldContainer { id, runs: vec![] }));
                    }
                    _ => return Err(self.unexpected(&e, "p")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "p")?;
                    return Ok(para);
                }
                Event::Text(e) => self.expect_blank(&e, "p")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("p")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "p".to_string(),
                    });
                }
            }
        }
    }

    fn read_field_content(&mut self, id: u32) -> Result<FieldContainer> {
        let mut runs = Vec::new();
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"r" => runs.push(self.read_run(false)?),
                    _ => return Err(self.unexpected(&e, "field")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"r" => runs.push(Run::default()),
                    _ => return Err(self.unexpected(&e, "field")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "field")?;
                    return Ok(FieldContainer { id, runs });
                }
                Event::Text(e) => self.expect_blank(&e, "field")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("field")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "field".to_string(),
                    });
                }
            }
        }
    }

    fn read_deleted_runs(&mut self, inlines: &mut Vec<Inline>) -> Result<()> {
        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"r" => inlines.push(Inline::Run(self.read_run(true)?)),
                    _ => return Err(self.unexpected(&e, "del")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"r" => inlines.push(Inline::Run(Run {
                        deleted: true,
                        ..Run::default()
                    })),
                    _ => return Err(self.unexpected(&e, "del")),
                },
                Event::End(e) => {
                    self.expect_end(&e, "del")?;
                    return Ok(());
                }
                Event::Text(e) => self.expect_blank(&e, "del")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("del")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "del".to_string(),
                    });
                }
            }
        }
    }

    fn read_run(&mut self, deleted: bool) -> Result<Run> {
        let mut run = Run {
            deleted,
            ..Run::default()
        };
        loop {
            let event_start = self.reader.buffer_position();
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"rPr" => run.props = Some(self.capture_raw(&e, event_start)?),
                    b"t" => run.content.push(RunContent::Text(self.read_text()?)),
                    b"textbox" => run
                        .content
                        .push(RunContent::TextBox(self.read_blocks("textbox")?)),
                    b"tab" | b"br" | b"pageHint" => {
                        // Tolerate non-self-closed marker elements.
                        let marker = marker_content(e.name().as_ref());
                        self.skip_to_end(&e)?;
                        if let Some(item) = marker {
                            run.content.push(item);
                        }
                    }
                    _ => return Err(self.unexpected(&e, "r")),
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"rPr" => run.props = Some(self.raw_slice(event_start)),
                    b"t" => run.content.push(RunContent::Text(String::new())),
                    b"textbox" => run.content.push(RunContent::TextBox(vec![])),
                    other => match marker_content(other) {
                        Some(item) => run.content.push(item),
                        None => return Err(self.unexpected(&e, "r")),
                    },
                },
                Event::End(e) => {
                    self.expect_end(&e, "r")?;
                    return Ok(run);
                }
                Event::Text(e) => self.expect_blank(&e, "r")?,
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("r")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "r".to_string(),
                    });
                }
            }
        }
    }

    fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(e) => {
                    let piece = e.unescape().map_err(|err| self.syntax(err))?;
                    text.push_str(&piece);
                }
                Event::CData(e) => {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Event::End(e) => {
                    self.expect_end(&e, "t")?;
                    return Ok(text);
                }
                Event::Comment(_) => {}
                Event::Eof => return Err(eof("t")),
                Event::Start(e) | Event::Empty(e) => return Err(self.unexpected(&e, "t")),
                _ => {
                    return Err(Error::UnexpectedText {
                        context: "t".to_string(),
                    });
                }
            }
        }
    }

    /// Consume through the matching end tag, returning the raw source slice
    /// of the whole element (opening tag included).
    fn capture_raw(&mut self, e: &BytesStart<'a>, start: u64) -> Result<String> {
        self.reader
            .read_to_end(e.name())
            .map_err(|err| self.syntax(err))?;
        Ok(self.raw_slice(start))
    }

    fn raw_slice(&self, start: u64) -> String {
        let end = self.reader.buffer_position();
        self.source[start as usize..end as usize].to_string()
    }

    fn skip_to_end(&mut self, e: &BytesStart<'a>) -> Result<()> {
        self.reader
            .read_to_end(e.name())
            .map_err(|err| self.syntax(err))?;
        Ok(())
    }

    fn field_id(&self, e: &BytesStart<'_>) -> Result<u32> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::Syntax {
                message: err.to_string(),
                position: self.reader.error_position(),
            })?;
            if attr.key.as_ref() == b"id" {
                let value = attr.unescape_value().map_err(|err| self.syntax(err))?;
                return value.parse::<u32>().map_err(|_| Error::InvalidAttribute {
                    element: "field".to_string(),
                    name: "id".to_string(),
                    value: value.into_owned(),
                });
            }
        }
        Err(Error::MissingAttribute {
            element: "field".to_string(),
            name: "id".to_string(),
        })
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        self.reader.read_event().map_err(|err| self.syntax(err))
    }

    fn syntax(&self, err: quick_xml::Error) -> Error {
        Error::Syntax {
            message: err.to_string(),
            position: self.reader.error_position(),
        }
    }

    fn unexpected(&self, e: &BytesStart<'_>, context: &str) -> Error {
        Error::UnexpectedElement {
            found: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            context: context.to_string(),
        }
    }

    fn unexpected_end(&self, e: &BytesEnd<'_>, context: &str) -> Error {
        Error::UnexpectedElement {
            found: format!("/{}", String::from_utf8_lossy(e.name().as_ref())),
            context: context.to_string(),
        }
    }

    fn expect_end(&self, e: &BytesEnd<'_>, expected: &str) -> Result<()> {
        if e.name().as_ref() == expected.as_bytes() {
            Ok(())
        } else {
            Err(self.unexpected_end(e, expected))
        }
    }

    fn expect_blank(&self, e: &BytesText<'_>, context: &str) -> Result<()> {
        let text = e.unescape().map_err(|err| self.syntax(err))?;
        if text.trim().is_empty() {
            Ok(())
        } else {
            Err(Error::UnexpectedText {
                context: context.to_string(),
            })
        }
    }
}

fn marker_content(name: &[u8]) -> Option<RunContent> {
    match name {
        b"tab" => Some(RunContent::Tab),
        b"br" => Some(RunContent::Break),
        b"pageHint" => Some(RunContent::PageHint),
        _ => None,
    }
}

fn eof(expected: &str) -> Error {
    Error::UnexpectedEof {
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_document() {
        let doc = parse_document("<document><body/></document>").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_parse_paragraph_with_text() {
        let doc =
            parse_document("<document><body><p><r><t>Hello</t></r></p></body></document>").unwrap();
        assert_eq!(
            doc.body,
            vec![Block::Paragraph(Paragraph::new(vec![Inline::Run(
                Run::text("Hello")
            )]))]
        );
    }

    #[test]
    fn test_parse_preserves_raw_properties() {
        let source = concat!(
            "<document><body><p><pPr><align val=\"center\"/></pPr>",
            "<r><rPr><b/><i/></rPr><t>x</t></r></p></body></document>",
        );
        let doc = parse_document(source).unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            para.props.as_deref(),
            Some("<pPr><align val=\"center\"/></pPr>")
        );
        let Inline::Run(run) = &para.inlines[0] else {
            panic!("expected run");
        };
        assert_eq!(run.props.as_deref(), Some("<rPr><b/><i/></rPr>"));
    }

    #[test]
    fn test_parse_run_markers() {
        let doc = parse_document(
            "<document><body><p><r><t>a</t><tab/><t>b</t><br/><pageHint/></r></p></body></document>",
        )
        .unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        let Inline::Run(run) = &para.inlines[0] else {
            panic!("expected run");
        };
        assert_eq!(
            run.content,
            vec![
                RunContent::Text("a".to_string()),
                RunContent::Tab,
                RunContent::Text("b".to_string()),
                RunContent::Break,
                RunContent::PageHint,
            ]
        );
    }

    #[test]
    fn test_parse_field_container() {
        let doc = parse_document(
            "<document><body><p><field id=\"7\"><r><t>[Name]</t></r></field></p></body></document>",
        )
        .unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            para.inlines,
            vec![Inline::Field(FieldContainer {
                id: 7,
                runs: vec![Run::text("[Name]")],
            })]
        );
    }

    #[test]
    fn test_parse_field_requires_id() {
        let err = parse_document("<document><body><p><field><r/></field></p></body></document>")
            .unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn test_parse_deleted_runs() {
        let doc = parse_document(
            "<document><body><p><del><r><t>gone</t></r></del><r><t>kept</t></r></p></body></document>",
        )
        .unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        let Inline::Run(first) = &para.inlines[0] else {
            panic!("expected run");
        };
        assert!(first.deleted);
        let Inline::Run(second) = &para.inlines[1] else {
            panic!("expected run");
        };
        assert!(!second.deleted);
    }

    #[test]
    fn test_parse_textbox_nesting() {
        let doc = parse_document(
            "<document><body><p><r><textbox><p><r><t>inner</t></r></p></textbox></r></p></body></document>",
        )
        .unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        let Inline::Run(run) = &para.inlines[0] else {
            panic!("expected run");
        };
        let RunContent::TextBox(blocks) = &run.content[0] else {
            panic!("expected textbox");
        };
        assert_eq!(
            blocks[0],
            Block::Paragraph(Paragraph::new(vec![Inline::Run(Run::text("inner"))]))
        );
    }

    #[test]
    fn test_parse_table() {
        let doc = parse_document(
            "<document><body><table><row><cell><p><r><t>c1</t></r></p></cell><cell/></row></table></body></document>",
        )
        .unwrap();
        let Block::Table(table) = &doc.body[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert!(table.rows[0].cells[1].blocks.is_empty());
    }

    #[test]
    fn test_parse_whitespace_between_blocks_ignored() {
        let doc = parse_document(
            "<document>\n  <body>\n    <p>\n      <r><t>x</t></r>\n    </p>\n  </body>\n</document>",
        )
        .unwrap();
        assert_eq!(doc.body.len(), 1);
    }

    #[test]
    fn test_parse_text_preserves_whitespace_and_entities() {
        let doc = parse_document(
            "<document><body><p><r><t xml:space=\"preserve\">  a &amp; b </t></r></p></body></document>",
        )
        .unwrap();
        let Block::Paragraph(para) = &doc.body[0] else {
            panic!("expected paragraph");
        };
        let Inline::Run(run) = &para.inlines[0] else {
            panic!("expected run");
        };
        assert_eq!(run.content, vec![RunContent::Text("  a & b ".to_string())]);
    }

    #[test]
    fn test_parse_rejects_unknown_element() {
        let err =
            parse_document("<document><body><p><bogus/></p></body></document>").unwrap_err();
        assert!(matches!(err, Error::UnexpectedElement { .. }));
    }

    #[test]
    fn test_parse_rejects_missing_root() {
        let err = parse_document("").unwrap_err();
        assert!(matches!(err, Error::MissingRoot));
    }

    #[test]
    fn test_parse_rejects_unclosed_document() {
        let err = parse_document("<document><body><p>").unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof { .. } | Error::Syntax { .. }
        ));
    }
}
