//! The part model: tree navigation and editing operations over one
//! package.
//!
//! The model owns the path tree and a handle factory. Every operation
//! opens a fresh store handle, performs one discrete unit of work, and
//! closes the handle again, so no file lock survives a user interaction.
//! The tree is rebuilt in full on open and mutated incrementally only by
//! the cascading delete; after a crash mid-delete the recovery path is
//! `refresh`, which rebuilds the tree from the store's authoritative
//! content.

use crate::error::{PackageError, Result};
use crate::format::reindent;
use crate::partname::PartName;
use crate::store::{AccessMode, PackageSource, PackageStore, ZipPackageSource};
use crate::tree::{PathNode, PathTree};
use std::path::Path;
use tracing::debug;

/// Broad classification of a part's content, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// XML-bearing parts the host can show and edit as text
    Markup,

    /// Raster or vector image parts
    Image,

    /// Anything else; shown as raw bytes only
    Binary,
}

impl PartKind {
    /// Classify a part by its extension (case-insensitive).
    pub fn classify(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "xml" | "rels" | "vml" => PartKind::Markup,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tiff" | "emf" | "wmf" => PartKind::Image,
            _ => PartKind::Binary,
        }
    }
}

/// The loaded content of one part, ready for display.
#[derive(Debug)]
pub struct PartContent {
    /// The part's name
    pub name: PartName,

    /// Content classification
    pub kind: PartKind,

    /// The raw bytes as stored
    pub raw: Vec<u8>,

    /// Decoded text, present for markup parts
    pub text: Option<String>,

    /// Reindented text for display. Absent when the part is not markup
    /// or does not parse as XML; the host falls back to `text`/`raw`.
    pub formatted: Option<String>,
}

/// Navigable, editable view over one package.
pub struct PartModel<S: PackageSource = ZipPackageSource> {
    source: S,
    tree: PathTree,
}

impl PartModel<ZipPackageSource> {
    /// Open a ZIP-backed package from a file path and build its part
    /// tree.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_source(ZipPackageSource::new(path))
    }
}

impl<S: PackageSource> PartModel<S> {
    /// Build a model over any package source.
    pub fn with_source(source: S) -> Result<Self> {
        let mut model = Self {
            source,
            tree: PathTree::new(),
        };
        model.refresh()?;
        Ok(model)
    }

    /// Rebuild the part tree from the store's current content.
    ///
    /// This is a full rebuild, never a diff, and doubles as the recovery
    /// path after an interrupted delete.
    pub fn refresh(&mut self) -> Result<()> {
        let store = self.source.open(AccessMode::ReadOnly)?;
        let parts = store.list_parts();
        store.close()?;
        debug!(parts = parts.len(), "rebuilt part tree");
        self.tree = PathTree::from_parts(parts);
        Ok(())
    }

    /// Get the root of the part tree.
    pub fn root(&self) -> &PathNode {
        self.tree.root()
    }

    /// Resolve a path to its tree node.
    pub fn find(&self, path: &str) -> Result<&PathNode> {
        self.tree.find(path)
    }

    /// Load a part's content for display.
    ///
    /// Markup parts additionally carry decoded text and, when the text
    /// parses as XML, a reindented variant. A part that fails to
    /// reformat still loads; it just comes back without `formatted`.
    pub fn load_part(&self, path: &str) -> Result<PartContent> {
        let name = self.part_at(path)?;
        let store = self.source.open(AccessMode::ReadOnly)?;
        let raw = store.blob_for(&name)?;
        store.close()?;

        let kind = PartKind::classify(name.ext());
        let (text, formatted) = match kind {
            PartKind::Markup => {
                let text = String::from_utf8_lossy(&raw).into_owned();
                let formatted = match reindent(&text) {
                    Ok(formatted) => Some(formatted),
                    Err(err) => {
                        debug!(part = %name, %err, "content does not reformat; leaving raw");
                        None
                    }
                };
                (Some(text), formatted)
            }
            _ => (None, None),
        };

        Ok(PartContent {
            name,
            kind,
            raw,
            text,
            formatted,
        })
    }

    /// Replace a part's content with the given text, truncating whatever
    /// was stored before.
    pub fn save_part_text(&mut self, path: &str, text: &str) -> Result<()> {
        let name = self.part_at(path)?;
        let mut store = self.source.open(AccessMode::ReadWrite)?;
        store.replace_blob(&name, text.as_bytes())?;
        store.close()?;
        debug!(part = %name, bytes = text.len(), "saved part");
        Ok(())
    }

    /// Copy a part's raw bytes to an external file.
    pub fn export_part<P: AsRef<Path>>(&self, path: &str, dest: P) -> Result<()> {
        let name = self.part_at(path)?;
        let store = self.source.open(AccessMode::ReadOnly)?;
        let blob = store.blob_for(&name)?;
        store.close()?;
        std::fs::write(dest, blob)?;
        Ok(())
    }

    /// Delete the node at the given path together with its whole
    /// subtree: every descendant part, then every relationship record
    /// targeting each part, then the part itself, bottom-up.
    ///
    /// A part already absent from the store is treated as deleted and
    /// its node is still pruned. The first store failure aborts the
    /// cascade, but deletions committed by earlier steps are final;
    /// there is no rollback. After such an abort the tree and store can
    /// be re-synchronized with `refresh`.
    ///
    /// Returns whether the node itself was detached from the tree. The
    /// root is never detached; deleting "/" empties the tree and
    /// returns false.
    pub fn delete_subtree(&mut self, path: &str) -> Result<bool> {
        let full_path = self.tree.find(path)?.full_path().to_string();
        self.delete_node(&full_path)
    }

    fn delete_node(&mut self, path: &str) -> Result<bool> {
        let (is_part, children) = {
            let node = self.tree.find(path)?;
            let children: Vec<String> = node
                .children()
                .map(|child| child.full_path().to_string())
                .collect();
            (node.is_part(), children)
        };

        // Children first: the subtree below this node must be fully gone
        // before the node itself is touched.
        for child in children {
            if !self.delete_node(&child)? {
                return Ok(false);
            }
        }

        if is_part {
            self.delete_part_record(&PartName::new(path)?)?;
        }

        if path == "/" {
            return Ok(false);
        }
        self.tree.remove(path);
        Ok(true)
    }

    /// Remove one part and every relationship record targeting it from
    /// the store, under a single read-write handle.
    fn delete_part_record(&mut self, name: &PartName) -> Result<()> {
        let mut store = self.source.open(AccessMode::ReadWrite)?;
        if store.contains(name) {
            for record in store.relationships_targeting(name)? {
                match store.delete_relationship(&record.owner, &record.r_id) {
                    // The record may already be gone if its owning .rels
                    // stream was rewritten by an earlier step.
                    Ok(()) | Err(PackageError::RelationshipNotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            match store.delete_part(name) {
                Ok(()) => debug!(part = %name, "deleted part"),
                // Already absent counts as deleted.
                Err(PackageError::PartNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        } else {
            debug!(part = %name, "part already absent; treating as deleted");
        }
        store.close()
    }

    fn part_at(&self, path: &str) -> Result<PartName> {
        let node = self.tree.find(path)?;
        if !node.is_part() {
            return Err(PackageError::PartNotFound(node.full_path().to_string()));
        }
        PartName::new(node.full_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rel::Relationships;
    use crate::store::ZipPackageStore;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_fixture() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#,
            )
            .unwrap();

        writer.start_file("_rels/.rels", options).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#,
            )
            .unwrap();

        writer.start_file("word/document.xml", options).unwrap();
        writer
            .write_all(b"<document><body><p>Hello</p></body></document>")
            .unwrap();

        writer
            .start_file("word/_rels/document.xml.rels", options)
            .unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
</Relationships>"#,
            )
            .unwrap();

        writer.start_file("word/styles.xml", options).unwrap();
        writer.write_all(b"<styles/>").unwrap();

        writer.start_file("word/media/image1.png", options).unwrap();
        writer.write_all(&[0x89, 0x50, 0x4E, 0x47]).unwrap();

        writer.start_file("docProps/core.xml", options).unwrap();
        writer
            .write_all(b"<coreProperties><title>Fixture</title></coreProperties>")
            .unwrap();

        writer.finish().unwrap().into_inner()
    }

    fn fixture_on_disk() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.docx");
        std::fs::write(&path, build_fixture()).unwrap();
        (dir, path)
    }

    fn document_rels(path: &PathBuf) -> Option<Relationships> {
        let store = ZipPackageStore::open(path, AccessMode::ReadOnly).unwrap();
        let rels_part = PartName::new("/word/_rels/document.xml.rels").unwrap();
        let blob = store.blob_for(&rels_part).ok()?;
        Some(Relationships::from_xml(&blob, "/word").unwrap())
    }

    #[test]
    fn test_open_builds_tree() {
        let (_dir, path) = fixture_on_disk();
        let model = PartModel::open(&path).unwrap();

        let roots: Vec<&str> = model.root().children().map(|c| c.name()).collect();
        assert_eq!(roots, vec!["_rels", "docProps", "word"]);

        assert!(model.find("/word/document.xml").unwrap().is_part());
        assert!(!model.find("/word").unwrap().is_part());
        assert!(model.find("/[Content_Types].xml").is_err());
    }

    #[test]
    fn test_load_part_reformats_markup() {
        let (_dir, path) = fixture_on_disk();
        let model = PartModel::open(&path).unwrap();

        let content = model.load_part("/word/document.xml").unwrap();
        assert_eq!(content.kind, PartKind::Markup);
        let formatted = content.formatted.unwrap();
        assert!(formatted.contains("\n  <body>"));

        let image = model.load_part("/word/media/image1.png").unwrap();
        assert_eq!(image.kind, PartKind::Image);
        assert_eq!(image.raw, vec![0x89, 0x50, 0x4E, 0x47]);
        assert!(image.text.is_none());
        assert!(image.formatted.is_none());
    }

    #[test]
    fn test_load_part_degrades_on_bad_markup() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        model
            .save_part_text("/word/document.xml", "<document><body></document>")
            .unwrap();

        let content = model.load_part("/word/document.xml").unwrap();
        assert_eq!(content.text.as_deref(), Some("<document><body></document>"));
        assert!(content.formatted.is_none());
    }

    #[test]
    fn test_load_intermediate_node_is_not_a_part() {
        let (_dir, path) = fixture_on_disk();
        let model = PartModel::open(&path).unwrap();
        assert!(matches!(
            model.load_part("/word"),
            Err(PackageError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_save_part_text_round_trips() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        model.save_part_text("/word/styles.xml", "<styles><style/></styles>").unwrap();

        let content = model.load_part("/word/styles.xml").unwrap();
        assert_eq!(content.text.as_deref(), Some("<styles><style/></styles>"));
    }

    #[test]
    fn test_export_part_copies_bytes() {
        let (dir, path) = fixture_on_disk();
        let model = PartModel::open(&path).unwrap();

        let dest = dir.path().join("image1.png");
        model.export_part("/word/media/image1.png", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_delete_leaf_cleans_relationships() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        assert!(model.delete_subtree("/word/media/image1.png").unwrap());
        assert!(model.find("/word/media/image1.png").is_err());

        let store = ZipPackageStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert!(!store.contains(&PartName::new("/word/media/image1.png").unwrap()));

        let rels = document_rels(&path).unwrap();
        assert!(rels.get("rId1").is_none());
        assert!(rels.get("rId2").is_some());
        assert!(rels.get("rId3").is_some());
    }

    #[test]
    fn test_delete_subtree_removes_children_and_parent() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        assert!(model.delete_subtree("/word").unwrap());
        assert!(model.find("/word").is_err());

        let store = ZipPackageStore::open(&path, AccessMode::ReadOnly).unwrap();
        let survivors: Vec<String> = store
            .list_parts()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        assert_eq!(survivors, vec!["/_rels/.rels", "/docProps/core.xml"]);

        let root_rels_blob = store
            .blob_for(&PartName::new("/_rels/.rels").unwrap())
            .unwrap();
        let root_rels = Relationships::from_xml(&root_rels_blob, "/").unwrap();
        assert!(root_rels.get("rId1").is_none());
        assert!(root_rels.get("rId2").is_some());
    }

    #[test]
    fn test_delete_missing_part_is_idempotent() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        // The part disappears behind the model's back.
        let mut store = ZipPackageStore::open(&path, AccessMode::ReadWrite).unwrap();
        store
            .delete_part(&PartName::new("/word/styles.xml").unwrap())
            .unwrap();
        store.close().unwrap();

        assert!(model.delete_subtree("/word/styles.xml").unwrap());
        assert!(model.find("/word/styles.xml").is_err());
    }

    #[test]
    fn test_delete_root_empties_tree_but_keeps_root() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        assert!(!model.delete_subtree("/").unwrap());
        assert_eq!(model.root().child_count(), 0);

        let store = ZipPackageStore::open(&path, AccessMode::ReadOnly).unwrap();
        assert!(store.list_parts().is_empty());
    }

    #[test]
    fn test_refresh_rebuilds_from_store() {
        let (_dir, path) = fixture_on_disk();
        let mut model = PartModel::open(&path).unwrap();

        let mut store = ZipPackageStore::open(&path, AccessMode::ReadWrite).unwrap();
        store
            .delete_part(&PartName::new("/docProps/core.xml").unwrap())
            .unwrap();
        store.close().unwrap();

        model.refresh().unwrap();
        assert!(model.find("/docProps/core.xml").is_err());
        assert!(model.find("/word/document.xml").is_ok());
    }

    #[test]
    fn test_part_kind_classification() {
        assert_eq!(PartKind::classify("XML"), PartKind::Markup);
        assert_eq!(PartKind::classify("rels"), PartKind::Markup);
        assert_eq!(PartKind::classify("vml"), PartKind::Markup);
        assert_eq!(PartKind::classify("png"), PartKind::Image);
        assert_eq!(PartKind::classify("bin"), PartKind::Binary);
        assert_eq!(PartKind::classify(""), PartKind::Binary);
    }
}
