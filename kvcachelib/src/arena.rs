/// A stable handle to a node in a [NodeArena]
///
/// Handles stay valid until the node is removed, moving a node between lists keeps its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node<T> {
    item: Option<T>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// The two ends of a doubly linked list whose nodes live in a [NodeArena]
///
/// Lists don't own their nodes, so any number of lists can share one arena. This is what lets the
/// LFU policy keep a list per frequency and move nodes between them without reallocating
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeList {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl NodeList {
    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    pub fn back(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Index based storage for linked list nodes
///
/// Links are handles into a single vector rather than pointers, so there are no reference cycles,
/// and all splicing is O(1). Freed slots are recycled, so a cache at capacity stops allocating
///
/// Handles passed in must belong to this arena, and when a list is passed alongside a handle, the
/// node must be linked into that list (or detached, for [NodeArena::link_back]). Breaking that is a
/// bug in the caller, and will either panic or corrupt the lists
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }
}

/// Upper bound on what is reserved up front. Capacities are limits, not sizes, so anything beyond
/// this grows on demand
pub const MAX_RESERVED: usize = 4096;

impl<T> NodeArena<T> {
    /// Reserves room for `capacity` nodes, up to [MAX_RESERVED]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.min(MAX_RESERVED)),
            free: Vec::new(),
        }
    }

    /// Number of live nodes across all lists
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id.0).and_then(|n| n.item.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.0).and_then(|n| n.item.as_mut())
    }

    /// Allocates a node for `item` and appends it to `list`
    pub fn push_back(&mut self, list: &mut NodeList, item: T) -> NodeId {
        let node = Node {
            item: Some(item),
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.link_back(list, id);
        id
    }

    /// Appends a detached node to the back of `list`
    pub fn link_back(&mut self, list: &mut NodeList, id: NodeId) {
        let old_tail = list.tail;
        {
            let node = &mut self.nodes[id.0];
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(tail) => self.nodes[tail.0].next = Some(id),
            None => list.head = Some(id),
        }
        list.tail = Some(id);
        list.len += 1;
    }

    /// Detaches a node from `list`, leaving it allocated so it can be linked elsewhere
    pub fn unlink(&mut self, list: &mut NodeList, id: NodeId) {
        let (prev, next) = {
            let node = &self.nodes[id.0];
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => list.head = next,
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => list.tail = prev,
        }
        let node = &mut self.nodes[id.0];
        node.prev = None;
        node.next = None;
        list.len -= 1;
    }

    pub fn move_to_back(&mut self, list: &mut NodeList, id: NodeId) {
        if list.tail == Some(id) {
            return;
        }
        self.unlink(list, id);
        self.link_back(list, id);
    }

    /// Unlinks a node and frees its slot, returning the item
    pub fn remove(&mut self, list: &mut NodeList, id: NodeId) -> Option<T> {
        self.unlink(list, id);
        self.release(id)
    }

    /// Frees a node which has already been unlinked from its list
    pub fn release(&mut self, id: NodeId) -> Option<T> {
        let item = self.nodes.get_mut(id.0)?.item.take();
        if item.is_some() {
            self.free.push(id.0);
        }
        item
    }

    pub fn pop_front(&mut self, list: &mut NodeList) -> Option<T> {
        let head = list.head?;
        self.remove(list, head)
    }

    /// Iterates over a list from front to back
    pub fn iter<'a>(&'a self, list: &NodeList) -> impl Iterator<Item = &'a T> + 'a {
        let mut cursor = list.head;
        std::iter::from_fn(move || {
            let id = cursor?;
            let node = &self.nodes[id.0];
            cursor = node.next;
            node.item.as_ref()
        })
    }

    /// Frees every node. Any [NodeList] using this arena must be reset by the caller
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
    }
}
