use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(#[source] std::io::Error),

    #[error("Unable to get document from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Undeclared namespace prefix '{0}'")]
    UndeclaredPrefix(String),

    #[error("No target namespace is in scope")]
    MissingTargetNamespace,

    #[error("Unexpected document structure at <{0}>")]
    UnexpectedStructure(String),

    #[error("Cannot resolve import '{0}' without a base URL")]
    ImportWithoutBase(String),

    #[error("Serialized document was not valid UTF-8")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}
