/// Error types for package inspection and editing operations.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid part name: {0}")]
    InvalidPartName(String),

    #[error("No node at path: {0}")]
    NodeNotFound(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("Package is open read-only: {0}")]
    AccessDenied(String),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("XML parsing error: {0}")]
    XmlError(String),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Quick-XML error: {0}")]
    QuickXmlError(#[from] quick_xml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Attribute error: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for PackageError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        PackageError::AttrError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
