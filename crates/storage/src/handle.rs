use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::key::Key;

/// Identificador de handle. Único no processo, nunca reutilizado.
pub type HandleId = u64;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Referência de chave re-associável.
///
/// Clones compartilham o mesmo estado: re-associar um clone afeta todos.
/// A identidade canônica segue o valor corrente, então depois de um
/// [`rebind`](KeyHandle::rebind) as operações seguintes endereçam outro slot.
/// Entradas gravadas sob o valor antigo continuam onde estão.
#[derive(Clone)]
pub struct KeyHandle {
    id: HandleId,
    current: Arc<RwLock<Key>>,
}

impl KeyHandle {
    fn new(initial: Key) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            current: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Snapshot do valor corrente.
    pub fn current(&self) -> Key {
        self.current.read().clone()
    }

    /// Troca o valor corrente, retornando o anterior.
    pub fn rebind(&self, value: impl Into<Key>) -> Key {
        let value = value.into();
        let previous = std::mem::replace(&mut *self.current.write(), value);
        debug!(handle = self.id, "handle re-associado");
        previous
    }
}

impl PartialEq for KeyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("id", &self.id)
            .field("current", &self.current().resolve())
            .finish()
    }
}

/// Tabela lateral id → handle, pertencente a um store.
///
/// Handles nunca são removidos: vivem enquanto o store viver.
#[derive(Default)]
pub struct HandleRegistry {
    handles: DashMap<HandleId, KeyHandle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aloca um handle novo e registra.
    pub fn register(&self, initial: Key) -> KeyHandle {
        let handle = KeyHandle::new(initial);
        self.handles.insert(handle.id(), handle.clone());
        handle
    }

    pub fn get(&self, id: HandleId) -> Option<KeyHandle> {
        self.handles.get(&id).map(|entry| entry.value().clone())
    }

    /// Valor corrente do handle registrado com esse id.
    pub fn current(&self, id: HandleId) -> Option<Key> {
        // Guard do shard é liberado antes de tocar o lock do handle
        let handle = self.get(id)?;
        Some(handle.current())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn register_assigns_distinct_ids() {
        let registry = HandleRegistry::new();
        let a = registry.register(Key::from("a"));
        let b = registry.register(Key::from("a"));
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ids_unique_across_threads_and_registries() {
        let ids: Vec<HandleId> = thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let registry = HandleRegistry::new();
                        (0..500)
                            .map(|i| registry.register(Key::from(i)).id())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn rebind_returns_previous_and_is_shared_by_clones() {
        let registry = HandleRegistry::new();
        let handle = registry.register(Key::from("a"));
        let clone = handle.clone();

        let previous = clone.rebind("b");
        assert_eq!(previous, Key::from("a"));
        assert_eq!(handle.current(), Key::from("b"));
        assert_eq!(registry.current(handle.id()), Some(Key::from("b")));
    }

    #[test]
    fn get_returns_same_handle() {
        let registry = HandleRegistry::new();
        let handle = registry.register(Key::from(1));
        let found = registry.get(handle.id()).unwrap();
        assert_eq!(found, handle);
        found.rebind(2);
        assert_eq!(handle.current(), Key::from(2));
    }

    #[test]
    fn unknown_id_is_absent() {
        let registry = HandleRegistry::new();
        assert!(registry.get(u64::MAX).is_none());
        assert!(registry.current(u64::MAX).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_rebind_and_read_never_tear() {
        let registry = HandleRegistry::new();
        let handle = registry.register(Key::from("left"));

        thread::scope(|s| {
            let writer = handle.clone();
            s.spawn(move || {
                for i in 0..1_000 {
                    writer.rebind(if i % 2 == 0 { "right" } else { "left" });
                }
            });
            for _ in 0..1_000 {
                let seen = handle.current().resolve();
                assert!(seen == "left" || seen == "right");
            }
        });
    }
}
