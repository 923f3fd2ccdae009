//! Longan - inspect and edit the internals of OPC packages
//!
//! Office-document file types (.docx, .xlsx, .pptx and friends) are ZIP
//! archives following the Open Packaging Conventions: a flat set of named
//! parts plus relationship records linking them. This library provides
//! the model a package-inspection host needs on top of that physical
//! layer:
//!
//! - **Part tree**: turn the flat part list into a navigable hierarchy
//! - **Content access**: read, rewrite, and export a part's raw content
//! - **Cascading delete**: remove a subtree of parts together with every
//!   relationship record targeting them
//! - **Reindenting**: reformat a part's XML for readable display
//! - **Find-next**: incremental forward text search with wraparound
//!
//! # Example - Browsing and editing a package
//!
//! ```no_run
//! use longan::PartModel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = PartModel::open("report.docx")?;
//!
//! // Walk the tree
//! for node in model.root().children() {
//!     println!("{}", node.full_path());
//! }
//!
//! // Load a part, indented for display
//! let content = model.load_part("/word/document.xml")?;
//! if let Some(formatted) = &content.formatted {
//!     println!("{formatted}");
//! }
//!
//! // Delete a part and every relationship pointing at it
//! model.delete_subtree("/word/media/image1.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Searching loaded text
//!
//! ```
//! use longan::SearchCursor;
//!
//! let mut cursor = SearchCursor::new("<w:p><w:t>hello</w:t></w:p>");
//! while let Some(m) = cursor.find_next("w:t") {
//!     println!("match at byte {}", m.start);
//! }
//! ```

pub mod error;
pub mod format;
pub mod model;
pub mod partname;
pub mod rel;
pub mod search;
pub mod store;
pub mod tree;

// Re-export commonly used types
pub use error::{PackageError, Result};
pub use format::reindent;
pub use model::{PartContent, PartKind, PartModel};
pub use partname::PartName;
pub use rel::{RelScope, Relationship, RelationshipRecord, Relationships};
pub use search::{Match, SearchCursor};
pub use store::{AccessMode, PackageSource, PackageStore, ZipPackageSource, ZipPackageStore};
pub use tree::{PathNode, PathTree};
