use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::debug;

use crate::entry::Entry;
use crate::key::Key;
use crate::sweeper::Purge;

/// Mapa identidade canônica → entrada, atrás de um único lock.
///
/// Todo acesso passa pelo mesmo `RwLock`: `clear` e as enumerações veem a
/// tabela inteira ou nada, e uma remoção é sempre um único `remove`.
pub struct EntryTable<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> EntryTable<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insere ou sobrescreve. Retorna a entrada anterior, se havia.
    pub fn insert(&self, id: String, entry: Entry<V>) -> Option<Entry<V>> {
        self.entries.write().insert(id, entry)
    }

    pub fn get(&self, id: &str) -> Option<V>
    where
        V: Clone,
    {
        {
            let entries = self.entries.read();
            let entry = entries.get(id)?;
            if !entry.is_expired() {
                return Some(entry.value().clone());
            }
        }
        self.evict_if_expired(id);
        None
    }

    pub fn contains(&self, id: &str) -> bool {
        {
            let entries = self.entries.read();
            match entries.get(id) {
                None => return false,
                Some(entry) if !entry.is_expired() => return true,
                Some(_) => {}
            }
        }
        self.evict_if_expired(id);
        false
    }

    /// Remove expirada ou não. Retorna se removeu.
    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Ocupação bruta, incluindo expiradas ainda não varridas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn live_keys(&self) -> Vec<String> {
        self.snapshot(|id, _| id.clone())
    }

    pub fn live_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.snapshot(|_, entry| entry.value().clone())
    }

    pub fn live_origins(&self) -> Vec<Key> {
        self.snapshot(|_, entry| entry.origin().clone())
    }

    /// Remove todas as entradas expiradas numa única passada.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    /// Coleta das entradas vivas sob um único read lock, sem mutar a tabela.
    fn snapshot<T>(&self, mut f: impl FnMut(&String, &Entry<V>) -> T) -> Vec<T> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(id, entry)| f(id, entry))
            .collect()
    }

    fn evict_if_expired(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        // Só remove se continua expirada (pode ter sido re-setada)
        if entries.get(id).is_some_and(Entry::is_expired) {
            entries.remove(id);
            debug!("key expirada removida: {id}");
            true
        } else {
            false
        }
    }
}

impl<V> Default for EntryTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + Sync> Purge for EntryTable<V> {
    fn purge_expired(&self) -> usize {
        EntryTable::purge_expired(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SetOptions;
    use std::thread;
    use std::time::Duration;

    fn permanent(value: i32, id: &str) -> Entry<i32> {
        Entry::new(value, Key::from(id), &SetOptions::default())
    }

    fn expiring(value: i32, id: &str, ttl_ms: u64) -> Entry<i32> {
        Entry::new(value, Key::from(id), &SetOptions::expiring(ttl_ms))
    }

    #[test]
    fn insert_overwrites() {
        let table = EntryTable::new();
        assert!(table.insert("k".into(), permanent(1, "k")).is_none());
        let previous = table.insert("k".into(), permanent(2, "k")).unwrap();
        assert_eq!(*previous.value(), 1);
        assert_eq!(table.get("k"), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn get_evicts_expired_lazily() {
        let table = EntryTable::new();
        table.insert("k".into(), expiring(1, "k", 10));
        assert_eq!(table.get("k"), Some(1));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn eviction_keeps_entry_refreshed_after_expiry() {
        let table = EntryTable::new();
        table.insert("k".into(), expiring(1, "k", 10));
        thread::sleep(Duration::from_millis(20));

        // Re-set entre o read lock do get e a remoção
        table.insert("k".into(), permanent(2, "k"));
        assert!(!table.evict_if_expired("k"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(2));

        table.insert("k".into(), expiring(3, "k", 10));
        thread::sleep(Duration::from_millis(20));
        assert!(table.evict_if_expired("k"));
        assert!(!table.evict_if_expired("missing"));
        assert!(table.is_empty());
    }

    #[test]
    fn contains_evicts_expired_lazily() {
        let table = EntryTable::new();
        table.insert("k".into(), expiring(1, "k", 10));
        assert!(table.contains("k"));

        thread::sleep(Duration::from_millis(20));
        assert!(!table.contains("k"));
        assert!(table.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let table = EntryTable::new();
        table.insert("k".into(), expiring(1, "k", 10));
        thread::sleep(Duration::from_millis(20));
        // expirada ainda conta como presente para remoção
        assert!(table.remove("k"));
        assert!(!table.remove("k"));
    }

    #[test]
    fn snapshots_skip_expired_without_mutating() {
        let table = EntryTable::new();
        table.insert("live".into(), permanent(1, "live"));
        table.insert("dead".into(), expiring(2, "dead", 10));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(table.live_keys(), vec!["live".to_string()]);
        assert_eq!(table.live_values(), vec![1]);
        assert_eq!(table.live_origins(), vec![Key::from("live")]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn purge_removes_only_expired() {
        let table = EntryTable::new();
        table.insert("a".into(), expiring(1, "a", 10));
        table.insert("b".into(), expiring(2, "b", 10));
        table.insert("c".into(), permanent(3, "c"));
        table.insert("d".into(), expiring(4, "d", 60_000));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(table.purge_expired(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.purge_expired(), 0);
    }

    #[test]
    fn clear_empties_table() {
        let table = EntryTable::new();
        table.insert("a".into(), permanent(1, "a"));
        table.insert("b".into(), permanent(2, "b"));
        table.clear();
        assert!(table.is_empty());
        assert!(table.live_keys().is_empty());
    }
}
