// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

/// Split a path into its non-empty segments
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// A trie keyed by path segments
///
/// Each node holds the run of segments leading to it from its parent, so
/// `/var/lib/foo` below `/` is a single node when nothing branches off in
/// between. Siblings never share their first segment; inserting a path that
/// branches inside a run splits the run. The root node stands for `/`.
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    name: Vec<String>,
    paths: Vec<PathTrie<T>>,
    payload: Option<T>,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self {
            name: Vec::new(),
            paths: Vec::new(),
            payload: None,
        }
    }
}

impl<T> PathTrie<T> {
    /// Build a trie from path/payload pairs
    pub fn from_map(entries: BTreeMap<String, T>) -> Self {
        let mut root = Self::default();
        for (path, payload) in entries {
            root.insert(&split_path(&path), payload);
        }
        root
    }

    fn insert(&mut self, segments: &[String], payload: T) {
        if segments.is_empty() {
            self.payload = Some(payload);
            return;
        }
        for index in 0..self.paths.len() {
            let shared = common_prefix_len(&self.paths[index].name, segments);
            if shared == 0 {
                continue;
            }
            if shared < self.paths[index].name.len() {
                self.paths[index].split_at(shared);
            }
            return self.paths[index].insert(&segments[shared..], payload);
        }
        self.paths.push(PathTrie {
            name: segments.to_vec(),
            paths: Vec::new(),
            payload: Some(payload),
        });
    }

    /// Keep the first `at` segments of the run in this node and move the
    /// rest, with the payload and children, into a single child.
    fn split_at(&mut self, at: usize) {
        let tail = PathTrie {
            name: self.name.split_off(at),
            paths: std::mem::take(&mut self.paths),
            payload: self.payload.take(),
        };
        self.paths.push(tail);
    }

    fn lookup_segments<'a, 's>(&'a self, segments: &'s [String]) -> (&'a PathTrie<T>, &'s [String]) {
        let mut found = (self, segments);
        let mut node = self;
        let mut left = segments;
        while let Some(child) = node.paths.iter().find(|child| left.starts_with(&child.name)) {
            node = child;
            left = &left[child.name.len()..];
            if node.payload.is_some() {
                found = (node, left);
            }
        }
        found
    }

    /// Deepest node with a payload matching a prefix of `path`, and the
    /// segments of `path` below it. Falls back to the root node.
    pub fn lookup(&self, path: &str) -> (&PathTrie<T>, Vec<String>) {
        let segments = split_path(path);
        let (node, left) = self.lookup_segments(&segments);
        (node, left.to_vec())
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Segments leading from the parent node to this one
    pub fn name(&self) -> &[String] {
        &self.name
    }
}

fn common_prefix_len(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
