use super::{parser, rules};
use crate::domain::document::XmlDocument;
use crate::domain::ports::DocumentValidator;
use crate::domain::release::SchemaRelease;
use crate::domain::validation::ValidationErrorSet;

/// [`DocumentValidator`] for FpML 5 documents.
///
/// Parsing is done with `quick-xml`; the release is taken from the root
/// element's namespace and `fpmlVersion` attribute; semantic checks are the
/// rules in [`rules::RULES`].
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlValidator;

impl XmlValidator {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentValidator for XmlValidator {
    fn parse(&self, text: &str) -> Result<XmlDocument, ValidationErrorSet> {
        parser::parse(text)
    }

    fn release_for(&self, document: &XmlDocument) -> Option<SchemaRelease> {
        let root = document.root();
        let namespace = match root.prefix() {
            Some(prefix) => root.attribute(&format!("xmlns:{prefix}")),
            None => root.attribute("xmlns"),
        }?;
        let version = root.attribute("fpmlVersion")?;
        SchemaRelease::from_namespace(namespace, version)
    }

    fn validate(&self, document: &XmlDocument, release: &SchemaRelease) -> ValidationErrorSet {
        rules::validate(document.root(), release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::release::View;

    fn release_of(text: &str) -> Option<SchemaRelease> {
        let validator = XmlValidator::new();
        let document = validator.parse(text).unwrap();
        validator.release_for(&document)
    }

    #[test]
    fn test_release_from_default_namespace() {
        let release = release_of(
            r#"<requestClearing xmlns="http://www.fpml.org/FpML-5/reporting" fpmlVersion="5-10"/>"#,
        )
        .unwrap();
        assert_eq!(release.version(), "5-10");
        assert_eq!(release.view(), View::Reporting);
    }

    #[test]
    fn test_release_from_prefixed_namespace() {
        let release = release_of(
            r#"<fpml:requestConfirmation xmlns:fpml="http://www.fpml.org/FpML-5/confirmation" fpmlVersion="5-11"/>"#,
        )
        .unwrap();
        assert_eq!(release.version(), "5-11");
    }

    #[test]
    fn test_release_undeterminable() {
        assert!(release_of("<requestConfirmation/>").is_none());
        assert!(
            release_of(
                r#"<requestConfirmation xmlns="http://www.fpml.org/FpML-5/confirmation" fpmlVersion="9-9"/>"#
            )
            .is_none()
        );
    }
}
