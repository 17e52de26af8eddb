//! Job summary builder.
//!
//! Elements are buffered in order and rendered to an HTML fragment with
//! Handlebars when the summary is written. Cell and text content is inserted
//! verbatim, the runner renders the file as markdown with inline HTML.

use crate::error::{Result, ToolkitError};
use handlebars::Handlebars;
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

const HEADING: &str = "<h{{level}}>{{{text}}}</h{{level}}>";
const TABLE: &str = concat!(
    "<table>",
    "{{#each rows}}<tr>{{#each this}}",
    "<{{tag}}{{#if colspan}} colspan=\"{{colspan}}\"{{/if}}{{#if rowspan}} rowspan=\"{{rowspan}}\"{{/if}}>{{{data}}}</{{tag}}>",
    "{{/each}}</tr>{{/each}}",
    "</table>"
);
const LIST: &str = "<{{tag}}>{{#each items}}<li>{{{this}}}</li>{{/each}}</{{tag}}>";
const CODE_BLOCK: &str = "<pre{{#if lang}} lang=\"{{{lang}}}\"{{/if}}><code>{{{code}}}</code></pre>";
const DETAILS: &str = "<details><summary>{{{label}}}</summary>{{{content}}}</details>";
const QUOTE: &str = "<blockquote{{#if cite}} cite=\"{{{cite}}}\"{{/if}}>{{{text}}}</blockquote>";
const LINK: &str = "<a href=\"{{{href}}}\">{{{text}}}</a>";

/// Attribute values are inserted raw; only the quote delimiting them needs
/// escaping.
fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub data: String,
    pub header: bool,
    pub colspan: Option<u32>,
    pub rowspan: Option<u32>,
}

impl TableCell {
    /// A data cell.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            header: false,
            colspan: None,
            rowspan: None,
        }
    }

    /// A header cell.
    pub fn header(data: impl Into<String>) -> Self {
        Self {
            header: true,
            ..Self::new(data)
        }
    }

    pub fn colspan(mut self, n: u32) -> Self {
        self.colspan = Some(n);
        self
    }

    pub fn rowspan(mut self, n: u32) -> Self {
        self.rowspan = Some(n);
        self
    }

    fn view(&self) -> Value {
        json!({
            "tag": if self.header { "th" } else { "td" },
            "data": self.data,
            "colspan": self.colspan,
            "rowspan": self.rowspan,
        })
    }
}

impl From<&str> for TableCell {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

impl From<String> for TableCell {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Raw(String),
    Heading { text: String, level: u8 },
    Table(Vec<Vec<TableCell>>),
    List { items: Vec<String>, ordered: bool },
    CodeBlock { code: String, lang: Option<String> },
    Details { label: String, content: String },
    Quote { text: String, cite: Option<String> },
    Link { text: String, href: String },
}

impl Block {
    fn render(&self, hb: &Handlebars<'_>) -> Result<String, handlebars::RenderError> {
        match self {
            Block::Raw(text) => Ok(text.clone()),
            Block::Heading { text, level } => {
                let level = if (1..=6).contains(level) { *level } else { 1 };
                hb.render_template(HEADING, &json!({ "level": level, "text": text }))
            }
            Block::Table(rows) => {
                let rows: Vec<Vec<Value>> = rows
                    .iter()
                    .map(|row| row.iter().map(TableCell::view).collect())
                    .collect();
                hb.render_template(TABLE, &json!({ "rows": rows }))
            }
            Block::List { items, ordered } => {
                let tag = if *ordered { "ol" } else { "ul" };
                hb.render_template(LIST, &json!({ "tag": tag, "items": items }))
            }
            Block::CodeBlock { code, lang } => {
                let lang = lang.as_deref().map(escape_attribute);
                hb.render_template(CODE_BLOCK, &json!({ "code": code, "lang": lang }))
            }
            Block::Details { label, content } => {
                hb.render_template(DETAILS, &json!({ "label": label, "content": content }))
            }
            Block::Quote { text, cite } => {
                let cite = cite.as_deref().map(escape_attribute);
                hb.render_template(QUOTE, &json!({ "text": text, "cite": cite }))
            }
            Block::Link { text, href } => {
                let href = escape_attribute(href);
                hb.render_template(LINK, &json!({ "text": text, "href": href }))
            }
        }
    }
}

/// Buffered job summary.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    blocks: Vec<Block>,
}

impl Summary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw text, optionally followed by a line break.
    pub fn add_raw(&mut self, text: impl Into<String>, add_eol: bool) -> &mut Self {
        self.blocks.push(Block::Raw(text.into()));
        if add_eol {
            self.add_eol();
        }
        self
    }

    /// Append a line break.
    pub fn add_eol(&mut self) -> &mut Self {
        self.blocks.push(Block::Raw("\n".to_string()));
        self
    }

    /// Append a heading. Levels outside 1..=6 render as `h1`.
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) -> &mut Self {
        self.push_line(Block::Heading {
            text: text.into(),
            level,
        })
    }

    /// Append a table.
    pub fn add_table<R, C>(&mut self, rows: R) -> &mut Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<TableCell>,
    {
        let rows: Vec<Vec<TableCell>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.push_line(Block::Table(rows))
    }

    /// Append an ordered or unordered list.
    pub fn add_list<I, S>(&mut self, items: I, ordered: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        self.push_line(Block::List { items, ordered })
    }

    pub fn add_code_block(&mut self, code: impl Into<String>, lang: Option<&str>) -> &mut Self {
        self.push_line(Block::CodeBlock {
            code: code.into(),
            lang: lang.map(str::to_string),
        })
    }

    /// Append a collapsible section.
    pub fn add_details(&mut self, label: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.push_line(Block::Details {
            label: label.into(),
            content: content.into(),
        })
    }

    pub fn add_quote(&mut self, text: impl Into<String>, cite: Option<&str>) -> &mut Self {
        self.push_line(Block::Quote {
            text: text.into(),
            cite: cite.map(str::to_string),
        })
    }

    pub fn add_link(&mut self, text: impl Into<String>, href: impl Into<String>) -> &mut Self {
        self.push_line(Block::Link {
            text: text.into(),
            href: href.into(),
        })
    }

    /// Append a horizontal rule.
    pub fn add_separator(&mut self) -> &mut Self {
        self.push_line(Block::Raw("<hr>".to_string()))
    }

    pub fn add_break(&mut self) -> &mut Self {
        self.push_line(Block::Raw("<br>".to_string()))
    }

    fn push_line(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self.add_eol()
    }

    /// Whether nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop the buffer without writing.
    pub fn empty_buffer(&mut self) -> &mut Self {
        self.blocks.clear();
        self
    }

    /// Render the buffer.
    pub fn stringify(&self) -> Result<String> {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(false);

        let mut out = String::new();
        for block in &self.blocks {
            out.push_str(&block.render(&hb)?);
        }
        Ok(out)
    }

    /// Render the buffer into `path`, appending unless `overwrite` is set,
    /// then empty the buffer. The file must already exist.
    pub fn write(&mut self, path: &Path, overwrite: bool) -> Result<()> {
        let rendered = self.stringify()?;

        let mut file = OpenOptions::new()
            .write(true)
            .append(!overwrite)
            .truncate(overwrite)
            .open(path)
            .map_err(|e| ToolkitError::io(path, e))?;
        file.write_all(rendered.as_bytes())
            .map_err(|e| ToolkitError::io(path, e))?;

        tracing::debug!(path = %path.display(), bytes = rendered.len(), "Wrote job summary");

        self.empty_buffer();
        Ok(())
    }

    /// Empty the buffer and the summary file.
    pub fn clear(&mut self, path: &Path) -> Result<()> {
        self.empty_buffer();
        self.write(path, true)
    }
}
