use crate::{ResourceError, ResourceProvider, SharedResourceData};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A resource provider backed by an in-memory name→bytes map, for tests and
/// for embedding templates directly in a binary.
#[derive(Default)]
pub struct InMemoryResourceProvider {
    resources: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.resources.write().unwrap().insert(name.into(), Arc::new(contents.into()));
    }

    pub fn add_shared(&self, name: impl Into<String>, contents: SharedResourceData) {
        self.resources.write().unwrap().insert(name.into(), contents);
    }

    pub fn remove(&self, name: &str) {
        self.resources.write().unwrap().remove(name);
    }

    pub fn clear(&self) {
        self.resources.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.resources.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        self.resources
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.resources.read().unwrap().contains_key(path)
    }

    fn base_path(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_load_roundtrip() {
        let provider = InMemoryResourceProvider::new();
        provider.add("a.txt", "hello".as_bytes().to_vec());
        assert_eq!(&*provider.load("a.txt").unwrap(), b"hello");
    }

    #[test]
    fn remove_clears_a_single_entry() {
        let provider = InMemoryResourceProvider::new();
        provider.add("a.txt", b"x".to_vec());
        provider.add("b.txt", b"y".to_vec());
        provider.remove("a.txt");
        assert!(!provider.exists("a.txt"));
        assert!(provider.exists("b.txt"));
    }

    #[test]
    fn not_found_for_missing_resource() {
        let provider = InMemoryResourceProvider::new();
        assert!(matches!(provider.load("nope"), Err(ResourceError::NotFound(_))));
    }
}
