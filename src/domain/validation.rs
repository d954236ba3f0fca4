use std::fmt;

/// Reason codes reported in `messageRejected` replies.
pub mod reason_code {
    /// The document is not well-formed XML.
    pub const SYNTAX: &str = "301";
    /// A required element is missing.
    pub const STRUCTURE: &str = "302";
    /// A business rule was violated.
    pub const RULE: &str = "305";
}

/// Where in the submitted document an error was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// A position in the raw text, for documents that did not parse.
    Lexical { line: usize, column: usize },
    /// An absolute element path, for documents that parsed.
    Path(String),
}

impl ErrorLocation {
    /// The `locationType` attribute value used in reason blocks.
    pub fn location_type(&self) -> &'static str {
        match self {
            ErrorLocation::Lexical { .. } => "lexical",
            ErrorLocation::Path(_) => "xpath",
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::Lexical { line, column } => write!(f, "line {line}, column {column}"),
            ErrorLocation::Path(path) => f.write_str(path),
        }
    }
}

/// A single lexical or semantic problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: String,
    pub location: ErrorLocation,
    pub description: Option<String>,
    pub rule_id: Option<String>,
    pub additional_data: Option<String>,
}

impl ValidationError {
    /// A well-formedness error at the given 1-based line and column.
    pub fn lexical(line: usize, column: usize, description: impl Into<String>) -> Self {
        Self {
            code: reason_code::SYNTAX.to_string(),
            location: ErrorLocation::Lexical { line, column },
            description: Some(description.into()),
            rule_id: None,
            additional_data: None,
        }
    }

    /// A rule violation located at an element path.
    pub fn semantic(code: &str, path: impl Into<String>, rule_id: &str) -> Self {
        Self {
            code: code.to_string(),
            location: ErrorLocation::Path(path.into()),
            description: None,
            rule_id: Some(rule_id.to_string()),
            additional_data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_additional_data(mut self, data: impl Into<String>) -> Self {
        self.additional_data = Some(data.into());
        self
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self.location, ErrorLocation::Lexical { .. })
    }
}

/// Ordered collection of the errors found while checking one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrorSet {
    errors: Vec<ValidationError>,
}

impl ValidationErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }
}

impl From<ValidationError> for ValidationErrorSet {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl FromIterator<ValidationError> for ValidationErrorSet {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<ValidationError> for ValidationErrorSet {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ValidationErrorSet {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
