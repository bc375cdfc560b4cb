//! Case-insensitive prefix tree over item names, used for autocomplete.
//!
//! Nodes live in an arena and keep their children in insertion order, so
//! the order of search results only depends on the order words were
//! inserted.

/// Default result cap for [`ItemIndex::search`].
pub const DEFAULT_SUGGESTIONS: usize = 5;

/// Vocabulary used when there is no history to learn item names from.
pub const DEFAULT_ITEMS: [&str; 7] = [
    "Rice (1kg)",
    "Rice (5kg)",
    "Sugar (1kg)",
    "Oil (1L)",
    "Dal (1kg)",
    "Soap",
    "Tea",
];

const ROOT: usize = 0;

#[derive(Clone, Debug, Default)]
struct Node {
    children: Vec<(char, usize)>,
    /// Original casing of the first word that ended here.
    word: Option<String>,
}

impl Node {
    fn child(&self, ch: char) -> Option<usize> {
        self.children
            .iter()
            .find_map(|&(key, idx)| (key == ch).then_some(idx))
    }
}

#[derive(Clone, Debug)]
pub struct ItemIndex {
    nodes: Vec<Node>,
    words: usize,
}

impl Default for ItemIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemIndex {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            words: 0,
        }
    }

    /// Builds an index from item names, in iteration order.
    pub fn from_items<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        for name in names {
            index.insert(name.as_ref());
        }
        index
    }

    /// Number of distinct (case-insensitive) words.
    pub fn len(&self) -> usize {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Inserts `word`. Empty words are ignored and the first casing seen for
    /// a lowercase form is kept.
    pub fn insert(&mut self, word: &str) {
        if word.is_empty() {
            return;
        }

        let mut current = ROOT;
        for ch in word.to_lowercase().chars() {
            current = match self.nodes[current].child(ch) {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children.push((ch, next));
                    next
                }
            };
        }

        let node = &mut self.nodes[current];
        if node.word.is_none() {
            node.word = Some(word.to_string());
            self.words += 1;
        }
    }

    /// Returns up to `limit` stored words whose lowercase form starts with
    /// the lowercase `prefix`, in depth-first pre-order.
    pub fn search(&self, prefix: &str, limit: usize) -> Vec<String> {
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut current = ROOT;
        for ch in prefix.to_lowercase().chars() {
            match self.nodes[current].child(ch) {
                Some(next) => current = next,
                None => return Vec::new(),
            }
        }

        let mut results = Vec::with_capacity(limit.min(self.words));
        self.collect(current, limit, &mut results);
        results
    }

    /// [`search`](Self::search) with [`DEFAULT_SUGGESTIONS`].
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        self.search(prefix, DEFAULT_SUGGESTIONS)
    }

    fn collect(&self, start: usize, limit: usize, results: &mut Vec<String>) {
        // Explicit stack instead of recursion; children pushed in reverse so
        // they pop in insertion order.
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if let Some(word) = &node.word {
                results.push(word.clone());
                if results.len() >= limit {
                    return;
                }
            }
            stack.extend(node.children.iter().rev().map(|&(_, child)| child));
        }
    }
}
