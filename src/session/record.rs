use serde_json::{Map, Value};

/// Session data bound to one identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRecord {
    id: String,
    data: Map<String, Value>,
}

impl SessionRecord {
    /// Create an empty record
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Map::new(),
        }
    }

    /// Create a record from already-parsed data
    pub fn from_data(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}
