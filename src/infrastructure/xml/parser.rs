use crate::domain::document::{XmlDocument, XmlElement};
use crate::domain::validation::{ValidationError, ValidationErrorSet};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// An element whose end tag has not been seen yet.
struct OpenElement {
    element: XmlElement,
    child_counts: HashMap<String, usize>,
}

impl OpenElement {
    fn new(element: XmlElement) -> Self {
        Self {
            element,
            child_counts: HashMap::new(),
        }
    }

    fn child_path(&mut self, name: &str) -> String {
        let count = self.child_counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        format!("{}/{}[{}]", self.element.path(), name, count)
    }
}

/// Parses `text` into a document tree.
///
/// The first well-formedness problem stops parsing and is reported as a
/// single lexical error.
pub fn parse(text: &str) -> Result<XmlDocument, ValidationErrorSet> {
    parse_document(text).map_err(ValidationErrorSet::from)
}

fn parse_document(text: &str) -> Result<XmlDocument, ValidationError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut open: Vec<OpenElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let start = token_start(text, offset(reader.buffer_position()));
        let event = reader
            .read_event()
            .map_err(|e| lexical(text, offset(reader.error_position()), &e.to_string()))?;

        match event {
            Event::Decl(_) if !at_document_start(text, start) => {
                return Err(lexical(
                    text,
                    start,
                    "XML declaration is only allowed at the start of the document",
                ));
            }
            Event::DocType(_) if root.is_some() || !open.is_empty() => {
                return Err(lexical(
                    text,
                    start,
                    "document type declaration must come before the root element",
                ));
            }
            Event::Start(tag) => {
                let element = start_element(text, start, &tag, &mut open, root.is_some())?;
                open.push(OpenElement::new(element));
            }
            Event::Empty(tag) => {
                let element = start_element(text, start, &tag, &mut open, root.is_some())?;
                attach(element, &mut open, &mut root);
            }
            Event::End(_) => match open.pop() {
                Some(finished) => attach(finished.element, &mut open, &mut root),
                None => {
                    return Err(lexical(
                        text,
                        start,
                        "closing tag without a matching opening tag",
                    ));
                }
            },
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .map_err(|e| lexical(text, start, &e.to_string()))?;
                append_text(text, start, &mut open, &content)?;
            }
            Event::CData(content) => {
                let content = String::from_utf8_lossy(&content).into_owned();
                append_text(text, start, &mut open, &content)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(lexical(
            text,
            text.len(),
            &format!("element <{}> is never closed", unclosed.element.name()),
        ));
    }

    root.map(XmlDocument::new)
        .ok_or_else(|| lexical(text, text.len(), "document has no root element"))
}

fn start_element(
    text: &str,
    start: usize,
    tag: &BytesStart<'_>,
    open: &mut [OpenElement],
    root_seen: bool,
) -> Result<XmlElement, ValidationError> {
    let at = |description: &str| lexical(text, start, description);

    let name = std::str::from_utf8(tag.name().as_ref())
        .map_err(|_| at("element name is not valid UTF-8"))?
        .to_string();
    if !is_name(&name) {
        return Err(at(&format!("<{name}> is not a valid element name")));
    }
    let path = match open.last_mut() {
        Some(parent) => parent.child_path(&name),
        None if root_seen => return Err(at("document has more than one root element")),
        None => format!("/{name}[1]"),
    };

    let mut element = XmlElement::new(name, path);
    for attribute in tag.attributes() {
        let attribute = attribute.map_err(|e| at(&e.to_string()))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|_| at("attribute name is not valid UTF-8"))?;
        if !is_name(key) {
            return Err(at(&format!("{key:?} is not a valid attribute name")));
        }
        if attribute.value.contains(&b'<') {
            return Err(at(&format!("attribute {key} contains a raw '<'")));
        }
        let value = attribute
            .unescape_value()
            .map_err(|e| at(&e.to_string()))?;
        element.push_attribute(key, value.into_owned());
    }
    Ok(element)
}

fn attach(element: XmlElement, open: &mut [OpenElement], root: &mut Option<XmlElement>) {
    match open.last_mut() {
        Some(parent) => parent.element.push_child(element),
        None => *root = Some(element),
    }
}

fn append_text(
    text: &str,
    start: usize,
    open: &mut [OpenElement],
    content: &str,
) -> Result<(), ValidationError> {
    match open.last_mut() {
        Some(current) => {
            current.element.push_text(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(lexical(
            text,
            start,
            "text is not allowed outside the root element",
        )),
    }
}

/// Checks `name` against the XML 1.0 `Name` production.
fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Only a byte order mark may precede the XML declaration.
fn at_document_start(text: &str, offset: usize) -> bool {
    text.get(..offset)
        .is_some_and(|before| before.trim_start_matches('\u{feff}').is_empty())
}

/// Skips the whitespace `trim_text` drops, so `offset` lands on the token.
fn token_start(text: &str, offset: usize) -> usize {
    let rest = text.get(offset..).unwrap_or_default();
    offset + rest.len()
        - rest
            .trim_start_matches([' ', '\t', '\r', '\n'])
            .len()
}

fn offset(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}

/// Converts a byte offset into a 1-based line and column.
fn lexical(text: &str, offset: usize, description: &str) -> ValidationError {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let consumed = &text[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    ValidationError::lexical(line, column, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::ErrorLocation;

    fn first_error(text: &str) -> ValidationError {
        let errors = parse(text).unwrap_err();
        assert_eq!(errors.len(), 1);
        errors.iter().next().unwrap().clone()
    }

    #[test]
    fn test_parse_builds_indexed_paths() {
        let document = parse(
            r#"<?xml version="1.0"?>
<root a="1">
  <item>one</item>
  <item>two &amp; three</item>
  <other/>
</root>"#,
        )
        .unwrap();

        let root = document.root();
        assert_eq!(root.path(), "/root[1]");
        assert_eq!(root.attribute("a"), Some("1"));

        let paths: Vec<_> = root.children().iter().map(|c| c.path()).collect();
        assert_eq!(paths, ["/root[1]/item[1]", "/root[1]/item[2]", "/root[1]/other[1]"]);
        assert_eq!(root.children()[1].text(), "two & three");
    }

    #[test]
    fn test_unclosed_element_is_lexical() {
        let error = first_error("<root>\n  <header>\n</root>");
        assert!(error.is_lexical());
        assert!(matches!(error.location, ErrorLocation::Lexical { .. }));
    }

    #[test]
    fn test_missing_end_tag_at_eof_is_lexical() {
        let error = first_error("<root><header></header>");
        assert!(error.is_lexical());
        assert_eq!(error.code, crate::domain::validation::reason_code::SYNTAX);
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let error = first_error("<a/><b/>");
        assert_eq!(error.description.as_deref(), Some("document has more than one root element"));
    }

    #[test]
    fn test_empty_document_rejected() {
        let error = first_error("   ");
        assert_eq!(error.description.as_deref(), Some("document has no root element"));
        assert_eq!(error.location, ErrorLocation::Lexical { line: 1, column: 4 });
    }

    #[test]
    fn test_declaration_after_root_rejected() {
        let error = first_error(r#"<a/><?xml version="1.0"?>"#);
        assert_eq!(
            error.description.as_deref(),
            Some("XML declaration is only allowed at the start of the document")
        );
        assert_eq!(error.location, ErrorLocation::Lexical { line: 1, column: 5 });
    }

    #[test]
    fn test_declaration_after_whitespace_rejected() {
        let error = first_error("\n<?xml version=\"1.0\"?>\n<a/>");
        assert!(error.is_lexical());
        assert_eq!(error.location, ErrorLocation::Lexical { line: 2, column: 1 });
    }

    #[test]
    fn test_doctype_after_root_rejected() {
        let error = first_error("<a/><!DOCTYPE a>");
        assert!(error.is_lexical());
    }

    #[test]
    fn test_doctype_before_root_allowed() {
        let document = parse("<?xml version=\"1.0\"?>\n<!DOCTYPE a>\n<a/>").unwrap();
        assert_eq!(document.root().name(), "a");
    }

    #[test]
    fn test_invalid_element_name_rejected() {
        let error = first_error("<1a/>");
        assert!(error.is_lexical());
        assert_eq!(error.description.as_deref(), Some("<1a> is not a valid element name"));
        assert_eq!(error.location, ErrorLocation::Lexical { line: 1, column: 1 });
    }

    #[test]
    fn test_invalid_nested_element_name_rejected() {
        let error = first_error("<root>\n  <-x>text</-x>\n</root>");
        assert!(error.is_lexical());
        assert_eq!(error.location, ErrorLocation::Lexical { line: 2, column: 3 });
    }

    #[test]
    fn test_raw_less_than_in_attribute_rejected() {
        let error = first_error(r#"<a x="<"/>"#);
        assert!(error.is_lexical());
        assert_eq!(error.description.as_deref(), Some("attribute x contains a raw '<'"));
    }

    #[test]
    fn test_prefixed_and_unicode_names_accepted() {
        let document = parse(r#"<fpml:trade xmlns:fpml="urn:x" fpml:id="t1"><état-1.b/></fpml:trade>"#)
            .unwrap();
        assert_eq!(document.root().attribute("fpml:id"), Some("t1"));
        assert_eq!(document.root().children()[0].name(), "état-1.b");
    }

    #[test]
    fn test_mismatched_end_tag_points_at_the_tag() {
        let error = first_error("<a><b></a>");
        let ErrorLocation::Lexical { line, column } = error.location else {
            panic!("expected a lexical location");
        };
        assert_eq!(line, 1);
        assert!(column < 11, "column {column} is past the failing tag");
    }

    #[test]
    fn test_name_production() {
        assert!(is_name("requestConfirmation"));
        assert!(is_name("_x:y-z.1"));
        assert!(!is_name(""));
        assert!(!is_name("1a"));
        assert!(!is_name("a b"));
        assert!(!is_name("-a"));
    }

    #[test]
    fn test_lexical_position() {
        let error = lexical("ab\ncde\nf", 5, "x");
        assert_eq!(error.location, ErrorLocation::Lexical { line: 2, column: 3 });
    }
}
