//! File/folder match trees
//!
//! The server returns the whole subtree for a module in one call. Nodes form a
//! tree, not a graph: no back-references, no cycles. The subtree is held in
//! memory until the owning module's entry is discarded.

use serde::{Deserialize, Serialize};

/// Node kind in a module's match tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// How closely a local file matches the known vulnerable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Byte-identical match; opening the file is enough
    Exact,
    /// Partial match; a diff against the server-held reference copy is shown
    Partial,
}

/// One node of a module's file/folder match tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Tree node identifier
    pub id: String,
    /// Display name (file or folder basename)
    pub name: String,
    pub kind: NodeKind,
    /// Path relative to the project root
    pub path: String,
    /// Ordered children; empty for files
    #[serde(default)]
    pub children: Vec<FileNode>,
    /// Server-side file identifier used to fetch the reference copy
    pub file_id: Option<String>,
}

impl FileNode {
    /// Depth-first flattened list of file leaves, in server order.
    ///
    /// The view layer presents the flattened list by default and keeps the
    /// hierarchy available through `children`.
    pub fn leaves(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        match self.kind {
            NodeKind::File => out.push(self),
            NodeKind::Folder => {
                for child in &self.children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
