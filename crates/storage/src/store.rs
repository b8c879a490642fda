use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use memstore_common::{StorageError, StorageResult};

use crate::config::StoreConfig;
use crate::entry::{Entry, SetOptions};
use crate::handle::{HandleId, HandleRegistry, KeyHandle};
use crate::key::Key;
use crate::sweeper::{Purge, Sweeper};
use crate::table::EntryTable;

/// Estado compartilhado entre todos os clones do store.
struct SharedState<V> {
    table: Arc<EntryTable<V>>,
    handles: HandleRegistry,
    // Drop do Sweeper faz join da thread antes da tabela ser liberada
    sweeper: Mutex<Sweeper>,
    cleanup_interval: Duration,
}

/// Store key-value in-memory com TTL e handles re-associáveis.
///
/// Clones compartilham o mesmo estado. O sweeper para (com join) quando o
/// último clone é descartado.
pub struct Store<V = Bytes> {
    shared: Arc<SharedState<V>>,
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V> Store<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> StorageResult<Self> {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> StorageResult<Self> {
        if config.cleanup_interval.is_zero() {
            return Err(StorageError::InvalidInterval);
        }

        let store = Store {
            shared: Arc::new(SharedState {
                table: Arc::new(EntryTable::new()),
                handles: HandleRegistry::new(),
                sweeper: Mutex::new(Sweeper::new()),
                cleanup_interval: config.cleanup_interval,
            }),
        };

        if config.auto_start {
            store.start_sweeper(None)?;
        }
        Ok(store)
    }

    // --- Handles ---

    /// Cria um handle registrado neste store.
    pub fn create_handle(&self, initial: impl Into<Key>) -> KeyHandle {
        let handle = self.shared.handles.register(initial.into());
        debug!(handle = handle.id(), "handle criado");
        handle
    }

    pub fn find_handle(&self, id: HandleId) -> Option<KeyHandle> {
        self.shared.handles.get(id)
    }

    pub fn handle_count(&self) -> usize {
        self.shared.handles.len()
    }

    /// Identidade canônica de uma chave neste store.
    pub fn resolve(&self, key: impl Into<Key>) -> String {
        key.into().resolve_with(&self.shared.handles)
    }

    // --- Entradas ---

    pub fn set(&self, key: impl Into<Key>, value: V, options: &SetOptions) -> bool {
        let key = key.into();
        let id = key.resolve_with(&self.shared.handles);
        let entry = Entry::new(value, key, options);
        self.shared.table.insert(id, entry);
        true
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<V> {
        self.shared.table.get(&self.resolve(key))
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.shared.table.contains(&self.resolve(key))
    }

    pub fn delete(&self, key: impl Into<Key>) -> bool {
        self.shared.table.remove(&self.resolve(key))
    }

    pub fn clear(&self) -> bool {
        self.shared.table.clear();
        true
    }

    /// Ocupação bruta da tabela, incluindo entradas expiradas que ainda não
    /// foram varridas. Para a contagem viva use `keys().len()`.
    pub fn size(&self) -> usize {
        self.shared.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.table.is_empty()
    }

    /// Identidades canônicas das entradas vivas.
    pub fn keys(&self) -> Vec<String> {
        self.shared.table.live_keys()
    }

    /// Chaves das entradas vivas na forma em que foram passadas ao `set`.
    pub fn original_keys(&self) -> Vec<Key> {
        self.shared.table.live_origins()
    }

    pub fn values(&self) -> Vec<V> {
        self.shared.table.live_values()
    }

    pub fn all(&self) -> Vec<V> {
        self.values()
    }

    /// Varredura manual, a mesma que o sweeper executa.
    pub fn purge_expired(&self) -> usize {
        self.shared.table.purge_expired()
    }

    // --- Sweeper ---

    /// Inicia o sweeper com `interval` ou com o intervalo da configuração.
    pub fn start_sweeper(&self, interval: Option<Duration>) -> StorageResult<bool> {
        let interval = interval.unwrap_or(self.shared.cleanup_interval);
        let target: Arc<dyn Purge> = self.shared.table.clone();
        self.shared.sweeper.lock().start(target, interval)
    }

    pub fn stop_sweeper(&self) -> bool {
        self.shared.sweeper.lock().stop()
    }

    pub fn is_sweeper_running(&self) -> bool {
        self.shared.sweeper.lock().is_running()
    }
}
