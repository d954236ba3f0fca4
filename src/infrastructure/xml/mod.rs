//! XML support backed by `quick-xml`: parsing, release detection, the
//! semantic rule set and reply construction.

pub mod builder;
pub mod parser;
pub mod rules;
pub mod validator;

pub use builder::XmlBuilder;
pub use validator::XmlValidator;
