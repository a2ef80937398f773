//! Write-only snapshot export. The stream is self-describing: a reader with
//! the format notes below can walk it, but nothing in this crate loads one
//! back (the tree section is a human-readable rendering, not an encoding).
//!
//! Layout, in order:
//! 1. 8 magic bytes naming the format version.
//! 2. u64-LE length, then a textual rendering of the namespace tree.
//! 3. u64-LE file-entry count; per entry u64-LE identity, byte length and
//!    block count, then every chain block raw and whole, zero padding
//!    included.
//! 4. u64-LE length, then the pool occupancy as one `'0'`/`'1'` per slot
//!    in ascending slot order.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::fs::FileSystem;
use crate::node::NodeIndex;

/// Identifies the snapshot format, trailing NUL included.
pub const SNAPSHOT_MAGIC: &[u8; 8] = b"MYFS_V1\0";

const TREE_HEADER: &str = "FileSystemTree Structure:\n";

/// Serializes the store's full state into `out`. Read-only with respect to
/// the store; safe to call at any point between operations.
pub fn write_snapshot<W: Write>(fs: &FileSystem, out: &mut W) -> io::Result<()> {
    out.write_all(SNAPSHOT_MAGIC)?;

    let tree = render_tree(fs);
    out.write_all(&(tree.len() as u64).to_le_bytes())?;
    out.write_all(tree.as_bytes())?;

    let entries: Vec<_> = fs.chains.iter().collect();
    out.write_all(&(entries.len() as u64).to_le_bytes())?;
    for (id, chain) in entries {
        out.write_all(&id.to_le_bytes())?;
        out.write_all(&file_size(fs, id).to_le_bytes())?;
        out.write_all(&(chain.len() as u64).to_le_bytes())?;
        for &handle in chain {
            out.write_all(fs.pool.block(handle))?;
        }
    }

    let bitmap: String = fs
        .pool
        .occupancy()
        .into_iter()
        .map(|used| if used { '1' } else { '0' })
        .collect();
    out.write_all(&(bitmap.len() as u64).to_le_bytes())?;
    out.write_all(bitmap.as_bytes())?;
    out.flush()
}

/// One line per node, two spaces of indent per level, children in name
/// order. Files carry their byte length alongside the identity.
fn render_tree(fs: &FileSystem) -> String {
    let mut text = String::from(TREE_HEADER);
    render_node(fs, fs.root, 0, &mut text);
    text
}

fn render_node(fs: &FileSystem, ix: NodeIndex, level: usize, text: &mut String) {
    let node = fs.arena.get(ix);
    let indent = "  ".repeat(level);
    let marker = if node.is_directory() { "[D]" } else { "[F]" };
    if node.is_directory() {
        let _ = writeln!(text, "{}{} {} (ID: {})", indent, marker, node.name, node.id);
    } else {
        let _ = writeln!(
            text,
            "{}{} {} (ID: {}, fileSize: {})",
            indent, marker, node.name, node.id, node.size
        );
    }
    for (_, &child) in node.children.iter() {
        render_node(fs, child, level + 1, text);
    }
}

/// Recorded byte length of the file owning `id`, resolved through the tree
/// since the chain index stores only block handles.
fn file_size(fs: &FileSystem, id: u64) -> u64 {
    fs.arena
        .iter()
        .find(|node| node.id == id)
        .map_or(0, |node| node.size)
}
