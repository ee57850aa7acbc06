//! Id lookup cache
//!
//! A 16-way trie over the nibbles of a `u32`, filled as records are created
//! during a load so relinking can find them without rescanning chains.
//! Nodes live in one arena; index 0 is the root.

const FANOUT: usize = 16;
const DEPTH: usize = 8;

#[derive(Debug, Clone)]
struct Node<V> {
    children: [u32; FANOUT],
    value: Option<V>,
}

impl<V> Node<V> {
    fn empty() -> Self {
        Self {
            children: [0; FANOUT],
            value: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdTrie<V> {
    nodes: Vec<Node<V>>,
    len: usize,
}

impl<V: Copy> Default for IdTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn nibble(id: u32, level: usize) -> usize {
    ((id >> ((DEPTH - 1 - level) * 4)) & 0xf) as usize
}

impl<V: Copy> IdTrie<V> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::empty()],
            len: 0,
        }
    }

    /// Insert or replace the value for `id`
    pub fn insert(&mut self, id: u32, value: V) {
        let mut node = 0usize;
        for level in 0..DEPTH {
            let slot = nibble(id, level);
            let child = self.nodes[node].children[slot];
            node = if child == 0 {
                self.nodes.push(Node::empty());
                let fresh = self.nodes.len() - 1;
                self.nodes[node].children[slot] = fresh as u32;
                fresh
            } else {
                child as usize
            };
        }
        if self.nodes[node].value.replace(value).is_none() {
            self.len += 1;
        }
    }

    pub fn get(&self, id: u32) -> Option<V> {
        let mut node = 0usize;
        for level in 0..DEPTH {
            let child = self.nodes[node].children[nibble(id, level)];
            if child == 0 {
                return None;
            }
            node = child as usize;
        }
        self.nodes[node].value
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::empty();
        self.len = 0;
    }
}
