use std::path::Path;

use log::{debug, info};

use crate::chain::ChainIndex;
use crate::error::FsError;
use crate::ident::IdGenerator;
use crate::node::{Node, NodeArena, NodeIndex, NodeKind};
use crate::pool::BlockPool;
use crate::snapshot;

/// Pool geometry, fixed at construction: 4 KiB blocks backed by a 1 GiB
/// arena by default. Tests shrink both to keep exhaustion reachable.
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    pub block_size: usize,
    pub pool_size: usize,
}

impl FsConfig {
    pub fn block_count(&self) -> usize {
        self.pool_size / self.block_size
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            block_size: 4096,
            pool_size: 1024 * 1024 * 1024,
        }
    }
}

/// A read-only view of one directory entry, as produced by
/// [`FileSystem::list`]. Snapshot of the child at call time, not a live
/// reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub kind: NodeKind,
    pub name: String,
    pub id: u64,
}

const ROOT_NAME: &str = "root";

/// An entirely memory-resident hierarchical file store: a namespace tree of
/// directories and files over a fixed pool of disk-style blocks, plus a
/// current-directory cursor driven by the caller.
///
/// Single actor model: every operation runs to completion before the next
/// begins, so no mutation is ever observed half-done. Callers wanting
/// concurrent access must wrap the whole store in one exclusive section.
pub struct FileSystem {
    pub(crate) arena: NodeArena,
    pub(crate) root: NodeIndex,
    cursor: NodeIndex,
    pub(crate) pool: BlockPool,
    pub(crate) chains: ChainIndex,
    ids: IdGenerator,
}

impl FileSystem {
    pub fn new(config: FsConfig) -> Self {
        Self::with_id_generator(config, IdGenerator::new())
    }

    /// Like [`new`](FileSystem::new) but with a caller-seeded identity
    /// counter, for tests that pin node identities.
    pub fn with_id_generator(config: FsConfig, mut ids: IdGenerator) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::new(
            ids.next_id(),
            ROOT_NAME.to_string(),
            NodeKind::Directory,
            None,
        ));

        Self {
            arena,
            root,
            cursor: root,
            pool: BlockPool::new(config.block_size, config.block_count()),
            chains: ChainIndex::new(),
            ids,
        }
    }

    /// Children of the current directory in ascending name order.
    pub fn list(&self) -> Vec<DirEntry> {
        self.arena
            .get(self.cursor)
            .children
            .iter()
            .map(|(name, &ix)| {
                let child = self.arena.get(ix);
                DirEntry {
                    kind: child.kind,
                    name: name.clone(),
                    id: child.id,
                }
            })
            .collect()
    }

    /// Slash-joined names from the root down to the cursor; the root alone
    /// renders as just its own name.
    pub fn current_path(&self) -> String {
        let mut names = Vec::new();
        let mut ix = Some(self.cursor);
        while let Some(current) = ix {
            let node = self.arena.get(current);
            names.push(node.name.as_str());
            ix = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Moves the cursor. `".."` walks up one level and is a no-op at the
    /// root; any other name must resolve to a child directory.
    pub fn change_directory(&mut self, name: &str) -> Result<(), FsError> {
        if name == ".." {
            if let Some(parent) = self.arena.get(self.cursor).parent {
                self.cursor = parent;
            }
            return Ok(());
        }

        let target = self
            .find_child(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        if !self.arena.get(target).is_directory() {
            return Err(FsError::NotFound(name.to_string()));
        }
        self.cursor = target;
        Ok(())
    }

    pub fn create_directory(&mut self, name: &str) -> Result<(), FsError> {
        self.create_node(name, NodeKind::Directory)?;
        info!("created directory {}", name);
        Ok(())
    }

    /// Creates an empty file under the current directory. Even an empty file
    /// holds one pool block; if the pool cannot supply it the node is rolled
    /// back and the namespace is left exactly as it was.
    pub fn create_file(&mut self, name: &str) -> Result<(), FsError> {
        let ix = self.create_node(name, NodeKind::File)?;
        let id = self.arena.get(ix).id;

        if self.chains.create_empty(&mut self.pool, id).is_none() {
            self.arena.get_mut(self.cursor).children.remove(name);
            self.arena.remove(ix);
            return Err(FsError::Exhausted);
        }
        info!("created file {} (id {})", name, id);
        Ok(())
    }

    /// Removes a child of the current directory, recursively for
    /// directories. Post-order: every contained file's chain goes back to
    /// the pool before its node is destroyed.
    pub fn remove(&mut self, name: &str) -> Result<(), FsError> {
        let target = self
            .find_child(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        self.arena.get_mut(self.cursor).children.remove(name);
        self.destroy_subtree(target);
        info!("removed {}", name);
        Ok(())
    }

    /// Full overwrite of a file's content. Old blocks are released first, so
    /// a shrinking rewrite frees pool space even if a later allocation
    /// fails. On mid-allocation exhaustion the file keeps whatever prefix
    /// landed, its recorded length reflects exactly those bytes, and
    /// `Exhausted` is still returned: fail loud, keep the partial bytes.
    pub fn write(&mut self, name: &str, content: &[u8]) -> Result<(), FsError> {
        let ix = self.resolve_file(name)?;
        let id = self.arena.get(ix).id;

        let outcome = self.chains.replace(&mut self.pool, id, content);
        self.arena.get_mut(ix).size = outcome.bytes_stored as u64;
        if outcome.exhausted {
            return Err(FsError::Exhausted);
        }
        debug!("wrote {} bytes to {}", content.len(), name);
        Ok(())
    }

    /// Appends to a file, filling the unused tail of its last block before
    /// allocating new ones. Same degraded-state contract as [`write`]:
    /// on exhaustion the length grows by the bytes that actually landed.
    ///
    /// [`write`]: FileSystem::write
    pub fn append(&mut self, name: &str, text: &[u8]) -> Result<(), FsError> {
        let ix = self.resolve_file(name)?;
        let (id, current_len) = {
            let node = self.arena.get(ix);
            (node.id, node.size)
        };

        let outcome = self
            .chains
            .extend(&mut self.pool, id, current_len, text)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        self.arena.get_mut(ix).size += outcome.bytes_stored as u64;
        if outcome.exhausted {
            return Err(FsError::Exhausted);
        }
        debug!("appended {} bytes to {}", text.len(), name);
        Ok(())
    }

    /// Reassembles a file's content, exactly `size` bytes regardless of the
    /// zero padding in its final block.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, FsError> {
        let ix = self.resolve_file(name)?;
        let node = self.arena.get(ix);
        self.chains
            .read(&self.pool, node.id, node.size)
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    /// Writes the snapshot stream to `path`. Write-only export: nothing in
    /// this crate reads the format back.
    pub fn snapshot<P: AsRef<Path>>(&self, path: P) -> Result<(), FsError> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut out = std::io::BufWriter::new(file);
        snapshot::write_snapshot(self, &mut out)?;
        info!("snapshot written to {}", path.as_ref().display());
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.pool.block_size()
    }

    /// Pool slots currently marked occupied.
    pub fn occupied_blocks(&self) -> usize {
        self.pool.occupied_blocks()
    }

    /// Blocks referenced across all live file chains. Always equals
    /// [`occupied_blocks`](FileSystem::occupied_blocks) when the store's
    /// invariants hold.
    pub fn indexed_blocks(&self) -> usize {
        self.chains.indexed_blocks()
    }

    fn find_child(&self, name: &str) -> Option<NodeIndex> {
        self.arena.get(self.cursor).children.find(name).copied()
    }

    /// Resolves a name in the current directory to a file node.
    fn resolve_file(&self, name: &str) -> Result<NodeIndex, FsError> {
        let ix = self
            .find_child(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        if self.arena.get(ix).is_directory() {
            return Err(FsError::IsDirectory(name.to_string()));
        }
        Ok(ix)
    }

    fn create_node(&mut self, name: &str, kind: NodeKind) -> Result<NodeIndex, FsError> {
        if self.find_child(name).is_some() {
            return Err(FsError::AlreadyExists(name.to_string()));
        }
        let node = Node::new(self.ids.next_id(), name.to_string(), kind, Some(self.cursor));
        let ix = self.arena.alloc(node);
        self.arena
            .get_mut(self.cursor)
            .children
            .insert(name.to_string(), ix)
            .map_err(|_| FsError::AlreadyExists(name.to_string()))?;
        Ok(ix)
    }

    /// Tears a subtree down post-order, releasing file chains as it goes.
    /// The node must already be unlinked from its parent.
    fn destroy_subtree(&mut self, ix: NodeIndex) {
        let node = self.arena.remove(ix);
        for (_, &child) in node.children.iter() {
            self.destroy_subtree(child);
        }
        if node.kind == NodeKind::File {
            self.chains.release(&mut self.pool, node.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_fs(blocks: usize) -> FileSystem {
        FileSystem::new(FsConfig {
            block_size: 8,
            pool_size: 8 * blocks,
        })
    }

    #[test]
    fn cursor_starts_at_root() {
        let fs = tiny_fs(4);
        assert_eq!(fs.current_path(), "root");
        assert!(fs.list().is_empty());
    }

    #[test]
    fn change_directory_rejects_files_and_missing_names() {
        let mut fs = tiny_fs(4);
        fs.create_file("notes").unwrap();

        match fs.change_directory("notes").unwrap_err() {
            FsError::NotFound(name) => assert_eq!(name, "notes"),
            other => panic!("unexpected error: {:?}", other),
        }
        match fs.change_directory("ghost").unwrap_err() {
            FsError::NotFound(_) => (),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fs.current_path(), "root");
    }

    #[test]
    fn dot_dot_at_root_is_a_no_op() {
        let mut fs = tiny_fs(4);
        fs.change_directory("..").unwrap();
        assert_eq!(fs.current_path(), "root");
    }

    #[test]
    fn create_file_rolls_back_when_the_pool_is_exhausted() {
        let mut fs = tiny_fs(1);
        fs.create_file("a").unwrap();

        match fs.create_file("b").unwrap_err() {
            FsError::Exhausted => (),
            other => panic!("unexpected error: {:?}", other),
        }
        // The half-created node must not survive.
        let names: Vec<_> = fs.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(fs.occupied_blocks(), 1);
    }

    #[test]
    fn listing_is_name_ordered_with_kinds_and_ids() {
        let mut fs = tiny_fs(4);
        fs.create_directory("zoo").unwrap();
        fs.create_file("apple").unwrap();

        let entries = fs.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "apple");
        assert_eq!(entries[0].kind, NodeKind::File);
        assert_eq!(entries[1].name, "zoo");
        assert_eq!(entries[1].kind, NodeKind::Directory);
        // Root took id 1.
        assert_eq!(entries[0].id, 3);
        assert_eq!(entries[1].id, 2);
    }

    #[test]
    fn degraded_write_keeps_the_stored_prefix() {
        let mut fs = tiny_fs(2);
        fs.create_file("big").unwrap();

        // 20 bytes need 3 blocks; the pool holds 2.
        let content = [0xAB; 20];
        match fs.write("big", &content).unwrap_err() {
            FsError::Exhausted => (),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fs.read("big").unwrap(), vec![0xAB; 16]);
        assert_eq!(fs.occupied_blocks(), fs.indexed_blocks());
    }

    #[test]
    fn degraded_append_grows_by_what_landed() {
        let mut fs = tiny_fs(2);
        fs.create_file("log").unwrap();
        fs.write("log", b"12345678").unwrap();

        // Tail is full; 12 more bytes need 2 blocks but only 1 is free.
        match fs.append("log", &[b'x'; 12]).unwrap_err() {
            FsError::Exhausted => (),
            other => panic!("unexpected error: {:?}", other),
        }
        let mut expected = b"12345678".to_vec();
        expected.extend_from_slice(&[b'x'; 8]);
        assert_eq!(fs.read("log").unwrap(), expected);
    }
}
