use crate::dict::Dict;

/// Index of a node's slot in the [`NodeArena`]. Unlike a node's identity,
/// slots are recycled after deletion; an index must never be held across a
/// `remove` of the node it refers to.
pub(crate) type NodeIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// One entry in the namespace tree. Directories own their children by arena
/// index; the parent link is a non-owning back-reference used only for
/// upward navigation and path rendering.
pub(crate) struct Node {
    pub id: u64,
    pub name: String,
    pub kind: NodeKind,
    /// Byte length of the file's content. Always 0 for directories.
    pub size: u64,
    pub parent: Option<NodeIndex>,
    pub children: Dict<String, NodeIndex>,
}

impl Node {
    pub fn new(id: u64, name: String, kind: NodeKind, parent: Option<NodeIndex>) -> Self {
        Self {
            id,
            name,
            kind,
            size: 0,
            parent,
            children: Dict::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Slot-vector arena owning every live node. Freed slots go on a free list
/// and are reused for later creations; identities stay unique regardless.
pub(crate) struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<NodeIndex>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeIndex {
        match self.free.pop() {
            Some(ix) => {
                self.slots[ix] = Some(node);
                ix
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    pub fn get(&self, ix: NodeIndex) -> &Node {
        self.slots[ix].as_ref().expect("stale node index")
    }

    pub fn get_mut(&mut self, ix: NodeIndex) -> &mut Node {
        self.slots[ix].as_mut().expect("stale node index")
    }

    pub fn remove(&mut self, ix: NodeIndex) -> Node {
        let node = self.slots[ix].take().expect("stale node index");
        self.free.push(ix);
        node
    }

    /// Every live node, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Node::new(1, "a".into(), NodeKind::File, None));
        let b = arena.alloc(Node::new(2, "b".into(), NodeKind::File, None));
        assert_ne!(a, b);

        arena.remove(a);
        let c = arena.alloc(Node::new(3, "c".into(), NodeKind::File, None));
        assert_eq!(c, a);
        assert_eq!(arena.get(c).id, 3);
    }

    #[test]
    fn iter_skips_removed_nodes() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(Node::new(1, "a".into(), NodeKind::File, None));
        arena.alloc(Node::new(2, "b".into(), NodeKind::Directory, None));
        arena.remove(a);

        let ids: Vec<_> = arena.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2]);
    }
}
