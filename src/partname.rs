/// Provides the PartName value type for identifying parts within a package.
///
/// A PartName is a part identifier following the URI format defined by the
/// Open Packaging Conventions specification.
use crate::error::{PackageError, Result};

/// A normalized part name within an OPC package.
///
/// Part names always begin with a forward slash and use forward slashes as
/// path separators (e.g. "/word/document.xml"). Backslashes, trailing
/// slashes, and empty segments are rejected on construction, so a PartName
/// held anywhere in the crate is known to be well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartName {
    /// The full part name string (e.g. "/word/document.xml")
    name: String,
}

impl PartName {
    /// Create a new PartName from a string.
    ///
    /// # Returns
    /// * `Ok(PartName)` if the name is a valid part identifier
    /// * `Err(InvalidPartName)` otherwise
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if !name.starts_with('/') {
            return Err(PackageError::InvalidPartName(format!(
                "part name must begin with a slash, got '{name}'"
            )));
        }
        if name.contains('\\') {
            return Err(PackageError::InvalidPartName(format!(
                "part name may not contain backslashes, got '{name}'"
            )));
        }
        if name == "/" {
            return Err(PackageError::InvalidPartName(
                "part name must have at least one segment".to_string(),
            ));
        }
        if name.ends_with('/') {
            return Err(PackageError::InvalidPartName(format!(
                "part name may not end with a slash, got '{name}'"
            )));
        }
        if name[1..].split('/').any(|segment| segment.is_empty()) {
            return Err(PackageError::InvalidPartName(format!(
                "part name may not contain empty segments, got '{name}'"
            )));
        }
        Ok(PartName { name })
    }

    /// Create a PartName by resolving a relationship target reference
    /// against a base URI.
    ///
    /// Translates a relative reference (like "../styles.xml") onto a base
    /// URI (like "/word") to produce an absolute PartName (like
    /// "/styles.xml"). An already-absolute reference is normalized as-is.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{base_uri}{relative_ref}")
        } else {
            format!("{base_uri}/{relative_ref}")
        };
        Self::new(normalize_path(&joined))
    }

    /// Get the full part name string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Iterate over the path segments, root excluded.
    ///
    /// For "/word/document.xml" this yields "word", then "document.xml".
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name[1..].split('/')
    }

    /// Get the base URI (directory portion) of this PartName.
    ///
    /// For example, "/ppt/slides" for "/ppt/slides/slide1.xml", and "/"
    /// for a part directly under the package root.
    pub fn base_uri(&self) -> &str {
        match self.name.rfind('/') {
            Some(0) => "/",
            Some(pos) => &self.name[..pos],
            None => "/",
        }
    }

    /// Get the filename portion of this PartName.
    ///
    /// For example, "slide1.xml" for "/ppt/slides/slide1.xml".
    pub fn filename(&self) -> &str {
        match self.name.rfind('/') {
            Some(pos) => &self.name[pos + 1..],
            None => "",
        }
    }

    /// Get the extension portion of this PartName, without the leading
    /// period. Empty when the filename has no extension.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Get the member name (part name with leading slash stripped).
    ///
    /// This is the form used as the ZIP member name for the part.
    #[inline]
    pub fn membername(&self) -> &str {
        &self.name[1..]
    }

    /// Get the PartName of the .rels stream corresponding to this part.
    ///
    /// For example, "/word/_rels/document.xml.rels" for
    /// "/word/document.xml".
    pub fn rels_uri(&self) -> PartName {
        let base_uri = self.base_uri();
        let name = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        // Built from an already-validated name, so it cannot be rejected.
        PartName { name }
    }
}

impl std::fmt::Display for PartName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl AsRef<str> for PartName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Normalize a slash-delimited path, resolving "." and ".." segments.
fn normalize_path(path: &str) -> String {
    let mut parts = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {
                if parts.is_empty() {
                    // Keep leading slash
                    parts.push("");
                }
            }
            ".." => {
                if parts.len() > 1 {
                    parts.pop();
                }
            }
            _ => {
                parts.push(part);
            }
        }
    }

    if parts.is_empty() || (parts.len() == 1 && parts[0].is_empty()) {
        return "/".to_string();
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partname_new() {
        assert!(PartName::new("/word/document.xml").is_ok());
        assert!(PartName::new("word/document.xml").is_err());
        assert!(PartName::new("/word\\document.xml").is_err());
        assert!(PartName::new("/word/").is_err());
        assert!(PartName::new("/word//document.xml").is_err());
        assert!(PartName::new("/").is_err());
        assert!(PartName::new("").is_err());
    }

    #[test]
    fn test_segments() {
        let name = PartName::new("/ppt/slides/slide1.xml").unwrap();
        let segments: Vec<&str> = name.segments().collect();
        assert_eq!(segments, vec!["ppt", "slides", "slide1.xml"]);
    }

    #[test]
    fn test_base_uri() {
        let name = PartName::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(name.base_uri(), "/ppt/slides");

        let root_level = PartName::new("/styles.xml").unwrap();
        assert_eq!(root_level.base_uri(), "/");
    }

    #[test]
    fn test_filename_and_ext() {
        let name = PartName::new("/word/document.xml").unwrap();
        assert_eq!(name.filename(), "document.xml");
        assert_eq!(name.ext(), "xml");

        let bare = PartName::new("/word/LICENSE").unwrap();
        assert_eq!(bare.ext(), "");
    }

    #[test]
    fn test_membername() {
        let name = PartName::new("/word/document.xml").unwrap();
        assert_eq!(name.membername(), "word/document.xml");
    }

    #[test]
    fn test_rels_uri() {
        let name = PartName::new("/word/document.xml").unwrap();
        assert_eq!(name.rels_uri().as_str(), "/word/_rels/document.xml.rels");

        let root_level = PartName::new("/styles.xml").unwrap();
        assert_eq!(root_level.rels_uri().as_str(), "/_rels/styles.xml.rels");
    }

    #[test]
    fn test_from_rel_ref() {
        let resolved = PartName::from_rel_ref("/word", "media/image1.png").unwrap();
        assert_eq!(resolved.as_str(), "/word/media/image1.png");

        let upward = PartName::from_rel_ref("/word", "../docProps/core.xml").unwrap();
        assert_eq!(upward.as_str(), "/docProps/core.xml");

        let absolute = PartName::from_rel_ref("/word", "/word/styles.xml").unwrap();
        assert_eq!(absolute.as_str(), "/word/styles.xml");

        let from_root = PartName::from_rel_ref("/", "word/document.xml").unwrap();
        assert_eq!(from_root.as_str(), "/word/document.xml");
    }

    #[test]
    fn test_from_rel_ref_rejects_root() {
        assert!(PartName::from_rel_ref("/word", "..").is_err());
    }
}
