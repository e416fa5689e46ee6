//! # Data Store
//!
//! The mutable backing data for value-bound props. One store per hosting
//! session. Mutation goes through [`DataStore::write`] only, which takes
//! `&mut self`: a write (mutate, then notify every listener) finishes before
//! the next one can start, so no reader ever sees a half-applied write.

use super::path::{BindingPath, Segment};
use crate::error::BindingError;
use serde_json::{Map, Value};
use std::fmt;

/// How far past the end of a sequence a write may land. The gap is padded with `null`.
pub const MAX_SEQUENCE_PADDING: usize = 1024;

/// Result of a read. Absence is distinct from a present `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Present(&'a Value),
    Absent,
}

impl<'a> Lookup<'a> {
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Lookup::Present(v) => Some(v),
            Lookup::Absent => None,
        }
    }

    pub fn cloned(&self) -> Option<Value> {
        self.value().cloned()
    }
}

/// Handle returned by [`DataStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Returns `false` once it wants no further notifications
type Listener = Box<dyn FnMut(&BindingPath, &Value) -> bool + Send>;

pub struct DataStore {
    data: Value,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    revision: u64,
}

impl DataStore {
    pub fn new(initial: Value) -> Self {
        Self {
            data: initial,
            listeners: Vec::new(),
            next_listener: 1,
            revision: 0,
        }
    }

    /// Current contents
    pub fn snapshot(&self) -> &Value {
        &self.data
    }

    /// Number of writes applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read a path. Never fails; missing paths are [`Lookup::Absent`].
    pub fn read(&self, path: &BindingPath) -> Lookup<'_> {
        resolve(&self.data, path)
    }

    /// Parse and read. Only malformed syntax is an error.
    pub fn read_str(&self, path: &str) -> Result<Lookup<'_>, BindingError> {
        let path = BindingPath::parse(path)?;
        Ok(resolve(&self.data, &path))
    }

    /// Write a value, creating missing intermediate containers
    ///
    /// Non-numeric segments create maps, numeric segments create sequences.
    /// Writing past the end of a sequence pads it with `null`, up to
    /// [`MAX_SEQUENCE_PADDING`] slots. A scalar in an
    /// intermediate position is replaced by a fresh container. Every listener
    /// is notified exactly once with `(path, new_value)` after the mutation.
    ///
    /// # Errors
    ///
    /// [`BindingError::KeyOnSequence`] when a non-numeric segment addresses
    /// an existing sequence, [`BindingError::IndexOutOfRange`] when an index
    /// needs more padding than allowed. The store is left untouched in both cases.
    pub fn write(&mut self, path: &BindingPath, value: Value) -> Result<(), BindingError> {
        check_writable(&self.data, path)?;

        let notified = value.clone();
        *slot_mut(&mut self.data, path) = value;
        self.revision += 1;

        tracing::debug!("[STORE] Wrote {} (revision {})", path, self.revision);
        self.listeners.retain_mut(|(_, listener)| listener(path, &notified));
        Ok(())
    }

    /// Parse and write
    pub fn write_str(&mut self, path: &str, value: Value) -> Result<(), BindingError> {
        let path = BindingPath::parse(path)?;
        self.write(&path, value)
    }

    /// Apply a batch of writes as a sequence
    ///
    /// Shorter paths are applied first (stable otherwise), so when one path
    /// is an ancestor of another the more specific write lands last and wins.
    /// Stops at the first failing write; earlier writes stay applied.
    pub fn write_all<I>(&mut self, batch: I) -> Result<(), BindingError>
    where
        I: IntoIterator<Item = (BindingPath, Value)>,
    {
        let mut batch: Vec<_> = batch.into_iter().collect();
        batch.sort_by_key(|(path, _)| path.depth());
        for (path, value) in batch {
            self.write(&path, value)?;
        }
        Ok(())
    }

    /// Register a change listener
    pub fn subscribe<F>(&mut self, mut listener: F) -> ListenerId
    where
        F: FnMut(&BindingPath, &Value) + Send + 'static,
    {
        self.subscribe_while(move |path, value| {
            listener(path, value);
            true
        })
    }

    /// Register a listener that unsubscribes itself by returning `false`
    pub fn subscribe_while<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&BindingPath, &Value) -> bool + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("data", &self.data)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

fn resolve<'a>(root: &'a Value, path: &BindingPath) -> Lookup<'a> {
    let mut current = root;
    for segment in path.segments() {
        let next = match (current, segment) {
            (Value::Object(map), segment) => map.get(&segment.as_key()),
            (Value::Array(items), Segment::Index(index)) => items.get(*index),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Lookup::Absent,
        }
    }
    Lookup::Present(current)
}

/// Walk the path the way `slot_mut` will, failing before anything is mutated
fn check_writable(root: &Value, path: &BindingPath) -> Result<(), BindingError> {
    let mut current = Some(root);
    for segment in path.segments() {
        current = match (current, segment) {
            (Some(Value::Array(items)), Segment::Index(index)) => {
                check_index(path, *index, items.len())?;
                items.get(*index)
            }
            (Some(Value::Array(_)), Segment::Key(key)) => {
                return Err(BindingError::KeyOnSequence {
                    path: path.to_string(),
                    segment: key.clone(),
                })
            }
            (Some(Value::Object(map)), segment) => map.get(&segment.as_key()),
            // Scalars and missing slots are replaced by fresh containers
            (_, Segment::Index(index)) => {
                check_index(path, *index, 0)?;
                None
            }
            (_, Segment::Key(_)) => None,
        };
    }
    Ok(())
}

fn check_index(path: &BindingPath, index: usize, len: usize) -> Result<(), BindingError> {
    if index > len.saturating_add(MAX_SEQUENCE_PADDING) {
        return Err(BindingError::IndexOutOfRange {
            path: path.to_string(),
            index,
            len,
        });
    }
    Ok(())
}

fn slot_mut<'a>(root: &'a mut Value, path: &BindingPath) -> &'a mut Value {
    let mut current = root;
    for segment in path.segments() {
        current = child_mut(current, segment);
    }
    current
}

fn child_mut<'a>(current: &'a mut Value, segment: &Segment) -> &'a mut Value {
    if !matches!(current, Value::Object(_) | Value::Array(_)) {
        *current = match segment {
            Segment::Index(_) => Value::Array(Vec::new()),
            Segment::Key(_) => Value::Object(Map::new()),
        };
    }
    match (current, segment) {
        (Value::Array(items), Segment::Index(index)) => {
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            &mut items[*index]
        }
        (Value::Object(map), segment) => map.entry(segment.as_key()).or_insert(Value::Null),
        // check_writable rejects keys on sequences and far indices before any mutation
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn path(raw: &str) -> BindingPath {
        BindingPath::parse(raw).unwrap()
    }

    #[test]
    fn test_read_absent_vs_null() {
        let store = DataStore::new(json!({ "server": { "cpu": "4核", "gpu": null } }));
        assert_eq!(store.read(&path("/server/cpu")), Lookup::Present(&json!("4核")));
        assert_eq!(store.read(&path("/server/gpu")), Lookup::Present(&Value::Null));
        assert_eq!(store.read(&path("/server/memory")), Lookup::Absent);
        assert_eq!(store.read(&path("/server/cpu/deeper")), Lookup::Absent);
        assert_eq!(store.read(&path("/")), Lookup::Present(store.snapshot()));
    }

    #[test]
    fn test_write_creates_containers() {
        let mut store = DataStore::default();
        store.write(&path("/order/items/1/name"), json!("disk")).unwrap();
        assert_eq!(
            store.snapshot(),
            &json!({ "order": { "items": [null, { "name": "disk" }] } })
        );
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_write_replaces_scalar_intermediate() {
        let mut store = DataStore::new(json!({ "server": "none" }));
        store.write(&path("/server/cpu"), json!("8核")).unwrap();
        assert_eq!(store.snapshot(), &json!({ "server": { "cpu": "8核" } }));
    }

    #[test]
    fn test_key_on_sequence_leaves_store_untouched() {
        let mut store = DataStore::new(json!({ "items": [1, 2] }));
        let err = store.write(&path("/items/name"), json!(3)).unwrap_err();
        assert!(matches!(err, BindingError::KeyOnSequence { .. }));
        assert_eq!(store.snapshot(), &json!({ "items": [1, 2] }));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_far_index_is_rejected_before_mutation() {
        let mut store = DataStore::new(json!({ "items": [1, 2] }));

        let err = store.write_str("/items/18446744073709551615", json!(1)).unwrap_err();
        assert!(matches!(err, BindingError::IndexOutOfRange { len: 2, .. }));
        let err = store.write_str("/items/4000000000", json!(1)).unwrap_err();
        assert!(matches!(err, BindingError::IndexOutOfRange { index: 4000000000, .. }));
        let err = store.write_str("/fresh/5000/name", json!(1)).unwrap_err();
        assert!(matches!(err, BindingError::IndexOutOfRange { len: 0, .. }));
        assert_eq!(store.snapshot(), &json!({ "items": [1, 2] }));
        assert_eq!(store.revision(), 0);

        store.write_str("/items/2", json!(3)).unwrap();
        store.write_str(&format!("/items/{}", 3 + MAX_SEQUENCE_PADDING), json!(4)).unwrap();
        assert_eq!(store.read_str("/items/2").unwrap(), Lookup::Present(&json!(3)));
        assert_eq!(store.read_str("/items/3").unwrap(), Lookup::Present(&Value::Null));
    }

    #[test]
    fn test_self_removing_listener() {
        let mut store = DataStore::default();
        let mut remaining = 2;
        store.subscribe_while(move |_, _| {
            remaining -= 1;
            remaining > 0
        });
        assert_eq!(store.listener_count(), 1);

        store.write_str("/a", json!(1)).unwrap();
        assert_eq!(store.listener_count(), 1);
        store.write_str("/a", json!(2)).unwrap();
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_listeners_notified_once_per_write() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = DataStore::default();
        let sink = seen.clone();
        let id = store.subscribe(move |p, v| sink.lock().unwrap().push((p.to_string(), v.clone())));

        store.write(&path("/server/cpu"), json!("8核")).unwrap();
        store.write(&path("/server/memory"), json!("16GB")).unwrap();
        assert!(store.unsubscribe(id));
        store.write(&path("/server/storage"), json!("1TB SSD")).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("/server/cpu".to_string(), json!("8核")),
                ("/server/memory".to_string(), json!("16GB")),
            ]
        );
    }

    #[test]
    fn test_write_all_more_specific_path_wins() {
        let mut store = DataStore::default();
        store
            .write_all(vec![
                (path("/server/cpu"), json!("16核")),
                (path("/server"), json!({ "cpu": "2核", "memory": "4GB" })),
            ])
            .unwrap();
        assert_eq!(
            store.snapshot(),
            &json!({ "server": { "cpu": "16核", "memory": "4GB" } })
        );
    }

    #[test]
    fn test_root_write_replaces_everything() {
        let mut store = DataStore::new(json!({ "a": 1 }));
        store.write(&BindingPath::root(), json!([1, 2])).unwrap();
        assert_eq!(store.snapshot(), &json!([1, 2]));
        assert_eq!(store.read_str("/1").unwrap(), Lookup::Present(&json!(2)));
    }
}
