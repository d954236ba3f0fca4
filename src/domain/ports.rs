use super::document::XmlDocument;
use super::release::SchemaRelease;
use super::validation::ValidationErrorSet;

/// Parses and checks submitted documents.
///
/// Failures are data, never faults: a document that does not parse comes
/// back as a set of lexical errors, a document that breaks the rules of its
/// release comes back as a set of semantic errors.
pub trait DocumentValidator: Send + Sync {
    /// Parses raw text into a document tree.
    fn parse(&self, text: &str) -> Result<XmlDocument, ValidationErrorSet>;

    /// Works out which release a parsed document is written against.
    fn release_for(&self, document: &XmlDocument) -> Option<SchemaRelease>;

    /// Checks a parsed document against the rules of a release. An empty set
    /// means the document is valid.
    fn validate(&self, document: &XmlDocument, release: &SchemaRelease) -> ValidationErrorSet;
}

/// Streaming construction of an outbound document.
///
/// Calls mirror the nesting of the produced document: `append_element`
/// opens a child of the current element, `set_attribute` and `append_text`
/// apply to the current element, `close_element` returns to its parent.
pub trait DocumentBuilder: Send {
    fn append_element(&mut self, name: &str);

    fn set_attribute(&mut self, name: &str, value: &str);

    fn append_text(&mut self, text: &str);

    fn close_element(&mut self);

    fn append_element_and_text(&mut self, name: &str, text: &str) {
        self.append_element(name);
        self.append_text(text);
        self.close_element();
    }

    /// Renders the document built so far, implicitly closing anything still
    /// open.
    fn serialize(&self) -> String;
}

pub type DocumentValidatorBox = Box<dyn DocumentValidator>;
pub type DocumentBuilderBox = Box<dyn DocumentBuilder>;

/// Creates a new builder whose root element has the given name and belongs
/// to the given release.
pub type BuilderFactory = Box<dyn Fn(&SchemaRelease, &str) -> DocumentBuilderBox + Send + Sync>;
