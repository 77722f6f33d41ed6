//! Indented markup writer

use crate::document::{Document, ElementRef, NodeId};
use crate::error::Result;

/// Declaration line written before the root element
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Writer configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level
    pub indent: usize,
    /// Whether to start with [`DECLARATION`]
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

impl WriteOptions {
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub const fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// Writes a subtree as text
///
/// Elements go on their own lines. An element with only text is written
/// inline, an element with neither text nor children self-closes. When an
/// element has both, the text follows its last child directly so that it
/// parses back as the element's value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Writer {
    options: WriteOptions,
}

impl Writer {
    pub const fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    pub fn write(&self, doc: &Document, id: NodeId) -> Result<String> {
        let element = doc.element(id)?;
        let mut output = String::new();
        if self.options.declaration {
            output.push_str(DECLARATION);
            output.push('\n');
        }
        self.write_element(element, 0, &mut output);
        Ok(output)
    }

    fn write_element(&self, element: ElementRef<'_>, level: usize, output: &mut String) {
        let indent = " ".repeat(level * self.options.indent);
        output.push_str(&indent);
        output.push('<');
        output.push_str(element.name());

        // namespace declaration first, then authored order
        let (namespaces, plain): (Vec<_>, Vec<_>) = element
            .attributes()
            .iter()
            .partition(|attr| attr.is_namespace_declaration());
        for attr in namespaces.into_iter().chain(plain) {
            output.push(' ');
            output.push_str(&attr.name);
            output.push_str("=\"");
            output.push_str(&escape_attribute(&attr.value));
            output.push('"');
        }

        if element.child_count() == 0 {
            match element.value() {
                Some(value) => {
                    output.push('>');
                    push_text(value, output);
                    close_tag(element.name(), output);
                }
                None => output.push_str(" />"),
            }
            return;
        }

        output.push('>');
        for child in element.children() {
            output.push('\n');
            self.write_element(child, level + 1, output);
        }
        match element.value() {
            Some(value) => push_text(value, output),
            None => {
                output.push('\n');
                output.push_str(&indent);
            }
        }
        close_tag(element.name(), output);
    }
}

fn close_tag(name: &str, output: &mut String) {
    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

/// Empty and whitespace-only text is wrapped in CDATA, which the parser keeps
/// even when it drops insignificant whitespace
fn push_text(value: &str, output: &mut String) {
    if value.trim().is_empty() {
        output.push_str("<![CDATA[");
        output.push_str(value);
        output.push_str("]]>");
    } else {
        output.push_str(&escape_text(value));
    }
}

fn escape_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_attribute(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(xml: &str, options: WriteOptions) -> Result<String> {
        let doc = Document::parse(xml)?;
        Writer::new(options).write(&doc, doc.root())
    }

    #[test]
    fn test_declaration_and_indentation() -> Result<()> {
        let out = write("<a><b>x</b><c/></a>", WriteOptions::default())?;
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<a>\n  <b>x</b>\n  <c />\n</a>"
        );
        Ok(())
    }

    #[test]
    fn test_custom_indent_without_declaration() -> Result<()> {
        let options = WriteOptions::default()
            .with_declaration(false)
            .with_indent(4);
        let out = write("<a><b><c/></b></a>", options)?;
        assert_eq!(out, "<a>\n    <b>\n        <c />\n    </b>\n</a>");
        Ok(())
    }

    #[test]
    fn test_namespace_attribute_written_first() -> Result<()> {
        let options = WriteOptions::default().with_declaration(false);
        let out = write(r#"<a id="1" XMLNS="urn:x" z="2"/>"#, options)?;
        assert_eq!(out, r#"<a XMLNS="urn:x" id="1" z="2" />"#);
        Ok(())
    }

    #[test]
    fn test_escaping() -> Result<()> {
        let options = WriteOptions::default().with_declaration(false);
        let out = write(r#"<a k="&quot;&lt;&amp;">1 &lt; 2 &amp;&amp; 3 &gt; 2</a>"#, options)?;
        assert_eq!(out, r#"<a k="&quot;&lt;&amp;">1 &lt; 2 &amp;&amp; 3 &gt; 2</a>"#);
        assert_eq!(escape_attribute("a\tb\nc"), "a&#9;b&#10;c");
        Ok(())
    }

    #[test]
    fn test_blank_text_survives_reparse() -> Result<()> {
        let options = WriteOptions::default().with_declaration(false);
        let doc = Document::parse("<a><![CDATA[  ]]></a>")?;
        assert_eq!(doc.root_element()?.value(), Some("  "));
        let out = Writer::new(options).write(&doc, doc.root())?;
        assert_eq!(out, "<a><![CDATA[  ]]></a>");
        let again = Document::parse(&out)?;
        assert_eq!(again.root_element()?.value(), Some("  "));

        let doc = Document::parse("<a><b/><![CDATA[]]></a>")?;
        let out = Writer::new(options).write(&doc, doc.root())?;
        assert!(out.ends_with("<b /><![CDATA[]]></a>"));
        let again = Document::parse(&out)?;
        assert_eq!(again.root_element()?.value(), Some(""));
        Ok(())
    }

    #[test]
    fn test_value_after_children_round_trips() -> Result<()> {
        let doc = Document::parse("<a><b/>tail</a>")?;
        let out = Writer::new(WriteOptions::default()).write(&doc, doc.root())?;
        assert!(out.ends_with("<b />tail</a>"));
        let again = Document::parse(&out)?;
        assert_eq!(again.export(again.root())?, doc.export(doc.root())?);
        Ok(())
    }
}
