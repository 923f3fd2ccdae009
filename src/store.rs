//! Physical package access: the store contract and its ZIP-backed
//! implementation.
//!
//! A store is a handle onto one open archive, scoped to one discrete
//! operation: it is opened read-only for browsing and export, reopened
//! read-write for delete and save, and committed on close. Handles are
//! synchronous and exclusive; concurrent modification of the underlying
//! archive from outside the handle is undefined behavior.

use crate::error::{PackageError, Result};
use crate::partname::PartName;
use crate::rel::{RelScope, RelationshipRecord, Relationships};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// ZIP member name of the content-types stream. Per OPC it is not a part
/// and is never enumerated or shown in the tree.
pub const CONTENT_TYPES_MEMBER: &str = "[Content_Types].xml";

/// Access mode a store handle was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// A handle onto one open package archive.
///
/// All operations are synchronous and run to completion; there is no
/// retry anywhere. Mutating operations fail with `AccessDenied` on a
/// read-only handle.
pub trait PackageStore: Sized {
    /// Enumerate every part in the package.
    fn list_parts(&self) -> Vec<PartName>;

    /// Check whether a part exists.
    fn contains(&self, name: &PartName) -> bool;

    /// Read the full content of a part.
    fn blob_for(&self, name: &PartName) -> Result<Vec<u8>>;

    /// Truncate a part and rewrite its content.
    fn replace_blob(&mut self, name: &PartName, blob: &[u8]) -> Result<()>;

    /// Delete a part.
    fn delete_part(&mut self, name: &PartName) -> Result<()>;

    /// Collect every relationship record, from any owning scope, whose
    /// resolved target is the given part.
    fn relationships_targeting(
        &self,
        target: &PartName,
    ) -> Result<SmallVec<[RelationshipRecord; 8]>>;

    /// Delete one relationship record from its owning scope.
    fn delete_relationship(&mut self, owner: &RelScope, r_id: &str) -> Result<()>;

    /// Commit any pending changes and release the handle.
    fn close(self) -> Result<()>;
}

/// A factory for store handles onto one underlying archive.
///
/// The part model opens a fresh handle per discrete operation instead of
/// holding one across user interactions, trading re-open cost for the
/// absence of long-lived file locks.
pub trait PackageSource {
    type Store: PackageStore;

    fn open(&self, mode: AccessMode) -> Result<Self::Store>;
}

/// A package source backed by a ZIP archive on disk.
#[derive(Debug, Clone)]
pub struct ZipPackageSource {
    path: PathBuf,
}

impl ZipPackageSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the underlying archive.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageSource for ZipPackageSource {
    type Store = ZipPackageStore;

    fn open(&self, mode: AccessMode) -> Result<ZipPackageStore> {
        ZipPackageStore::open(&self.path, mode)
    }
}

/// A store handle over a ZIP archive.
///
/// The archive is decompressed into an ordered member map on open, so
/// enumeration is deterministic and edits are cheap in-memory mutations.
/// A dirty read-write handle serializes the whole archive back and
/// rewrites the file on close, the only point where the disk is touched
/// again. Dropping a dirty handle without closing it discards the edits.
pub struct ZipPackageStore {
    path: PathBuf,
    mode: AccessMode,
    entries: BTreeMap<String, Vec<u8>>,
    dirty: bool,
}

impl ZipPackageStore {
    /// Open a ZIP package from a file path.
    pub fn open<P: AsRef<Path>>(path: P, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path)?;
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut member = archive.by_index(i)?;
            if member.is_dir() {
                continue;
            }
            let name = member.name().to_string();
            let mut blob = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut blob)?;
            entries.insert(name, blob);
        }

        Ok(Self {
            path,
            mode,
            entries,
            dirty: false,
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.mode == AccessMode::ReadOnly {
            return Err(PackageError::AccessDenied(self.path.display().to_string()));
        }
        Ok(())
    }

    /// Serialize the member map back into a ZIP archive.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, blob) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(blob)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

impl PackageStore for ZipPackageStore {
    fn list_parts(&self) -> Vec<PartName> {
        self.entries
            .keys()
            .filter(|member| member.as_str() != CONTENT_TYPES_MEMBER)
            .filter_map(|member| match PartName::new(format!("/{member}")) {
                Ok(name) => Some(name),
                Err(err) => {
                    warn!(member = %member, %err, "skipping member with unusable name");
                    None
                }
            })
            .collect()
    }

    fn contains(&self, name: &PartName) -> bool {
        self.entries.contains_key(name.membername())
    }

    fn blob_for(&self, name: &PartName) -> Result<Vec<u8>> {
        self.entries
            .get(name.membername())
            .cloned()
            .ok_or_else(|| PackageError::PartNotFound(name.to_string()))
    }

    fn replace_blob(&mut self, name: &PartName, blob: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        let entry = self
            .entries
            .get_mut(name.membername())
            .ok_or_else(|| PackageError::PartNotFound(name.to_string()))?;
        *entry = blob.to_vec();
        self.dirty = true;
        Ok(())
    }

    fn delete_part(&mut self, name: &PartName) -> Result<()> {
        self.ensure_writable()?;
        if self.entries.remove(name.membername()).is_none() {
            return Err(PackageError::PartNotFound(name.to_string()));
        }
        // A part's outgoing relationships must not outlive the part.
        self.entries.remove(name.rels_uri().membername());
        self.dirty = true;
        Ok(())
    }

    fn relationships_targeting(
        &self,
        target: &PartName,
    ) -> Result<SmallVec<[RelationshipRecord; 8]>> {
        let mut records = SmallVec::new();
        for (member, blob) in &self.entries {
            let Some(owner) = RelScope::from_rels_member(member) else {
                continue;
            };
            let rels = Relationships::from_xml(blob, owner.base_uri())?;
            for rel in rels.iter() {
                if let Some(resolved) = rel.target_partname() {
                    if resolved == *target {
                        records.push(RelationshipRecord {
                            owner: owner.clone(),
                            r_id: rel.r_id().to_string(),
                            target: resolved,
                        });
                    }
                }
            }
        }
        Ok(records)
    }

    fn delete_relationship(&mut self, owner: &RelScope, r_id: &str) -> Result<()> {
        self.ensure_writable()?;
        let member = owner.rels_member();
        let blob = self
            .entries
            .get(&member)
            .ok_or_else(|| PackageError::RelationshipNotFound(format!("{r_id} in {owner}")))?;
        let mut rels = Relationships::from_xml(blob, owner.base_uri())?;
        if rels.remove(r_id).is_none() {
            return Err(PackageError::RelationshipNotFound(format!(
                "{r_id} in {owner}"
            )));
        }
        self.entries.insert(member, rels.to_xml().into_bytes());
        self.dirty = true;
        Ok(())
    }

    fn close(self) -> Result<()> {
        if self.dirty {
            let bytes = self.to_bytes()?;
            std::fs::write(&self.path, bytes)?;
        }
        Ok(())
    }
}
