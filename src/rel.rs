use crate::error::Result;
use crate::partname::PartName;
/// Relationship-related objects for OPC packages.
///
/// This module provides types for managing relationship records between
/// parts in an OPC package, including parsing and rewriting the .rels
/// streams that hold them.
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// The scope owning a set of relationship records: the package root or a
/// single part. Each scope owns at most one .rels stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelScope {
    /// The package root, whose records live in "_rels/.rels"
    Package,

    /// A part, whose records live in its companion .rels stream
    Part(PartName),
}

impl RelScope {
    /// Get the base URI used to resolve this scope's relative target
    /// references.
    pub fn base_uri(&self) -> &str {
        match self {
            RelScope::Package => "/",
            RelScope::Part(name) => name.base_uri(),
        }
    }

    /// Get the ZIP member name of this scope's .rels stream.
    pub fn rels_member(&self) -> String {
        match self {
            RelScope::Package => "_rels/.rels".to_string(),
            RelScope::Part(name) => name.rels_uri().membername().to_string(),
        }
    }

    /// Derive the owning scope from the member name of a .rels stream.
    ///
    /// Returns None when the member is not a .rels stream ("word/_rels/
    /// document.xml.rels" maps to the part "/word/document.xml";
    /// "_rels/.rels" maps to the package root).
    pub fn from_rels_member(member: &str) -> Option<RelScope> {
        if member == "_rels/.rels" {
            return Some(RelScope::Package);
        }
        let stripped = member.strip_suffix(".rels")?;
        let (base, file) = if let Some(pos) = stripped.rfind("/_rels/") {
            (&stripped[..pos], &stripped[pos + "/_rels/".len()..])
        } else if let Some(rest) = stripped.strip_prefix("_rels/") {
            ("", rest)
        } else {
            return None;
        };
        if file.is_empty() {
            return None;
        }
        let name = if base.is_empty() {
            format!("/{file}")
        } else {
            format!("/{base}/{file}")
        };
        PartName::new(name).ok().map(RelScope::Part)
    }
}

impl std::fmt::Display for RelScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelScope::Package => write!(f, "/"),
            RelScope::Part(name) => write!(f, "{name}"),
        }
    }
}

/// A single relationship from a source scope to a target.
///
/// Identified by an rId unique within its owning scope. Can be either
/// internal (pointing to another part) or external (pointing to a URL).
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g. "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part reference or an external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships this is a part reference, usually
    /// relative. For external relationships it is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target part name for internal relationships.
    ///
    /// Returns None for external relationships and for target references
    /// that do not resolve to a part.
    pub fn target_partname(&self) -> Option<PartName> {
        if self.is_external {
            return None;
        }
        PartName::from_rel_ref(&self.base_uri, &self.target_ref).ok()
    }
}

/// The relationship records owned by a single scope.
///
/// Backed by a HashMap for O(1) lookup by rId; serialization sorts by rId
/// so rewritten .rels streams are deterministic.
#[derive(Debug)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new<S: Into<String>>(base_uri: S) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: HashMap::new(),
        }
    }

    /// Parse a .rels stream into a relationships collection.
    ///
    /// Uses quick-xml for efficient streaming XML parsing with minimal
    /// allocation. Records missing any of Id, Type, or Target are skipped.
    pub fn from_xml(xml: &[u8], base_uri: &str) -> Result<Self> {
        let mut collection = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target_ref = None;
                        let mut target_mode = None;

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                                b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                                b"TargetMode" => {
                                    target_mode = Some(attr.unescape_value()?.to_string())
                                }
                                _ => {}
                            }
                        }

                        if let (Some(id), Some(rt), Some(tr)) = (r_id, reltype, target_ref) {
                            let is_external = target_mode.as_deref() == Some("External");
                            collection.add(Relationship::new(
                                id,
                                rt,
                                tr,
                                base_uri.to_string(),
                                is_external,
                            ));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(crate::error::PackageError::XmlError(format!(
                        "Rels parse error: {e}"
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(collection)
    }

    /// Add a relationship to the collection, replacing any record with
    /// the same rId.
    pub fn add(&mut self, rel: Relationship) {
        self.rels.insert(rel.r_id.clone(), rel);
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Remove a relationship by its ID.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Get an iterator over all relationships.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Get the base URI this collection resolves targets against.
    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Serialize the collection to .rels XML.
    ///
    /// Relationships are sorted by rId for consistent output.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        xml.push('\n');

        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by_key(|rel| rel.r_id());

        for rel in rels {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"  <Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref()),
                target_mode
            ));
            xml.push('\n');
        }

        xml.push_str("</Relationships>");

        xml
    }
}

/// A relationship record projected for reverse-target queries: which
/// scope owns it, under which rId, and which part it points at.
#[derive(Debug, Clone)]
pub struct RelationshipRecord {
    /// The scope whose .rels stream holds the record
    pub owner: RelScope,

    /// Relationship ID, unique within the owning scope
    pub r_id: String,

    /// The resolved target part
    pub target: PartName,
}

/// Escape XML special characters.
#[inline]
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
