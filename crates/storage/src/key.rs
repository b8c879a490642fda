use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use memstore_common::{BYTES_KEY_PREFIX, MAX_HANDLE_DEPTH, UNENCODABLE_KEY};

use crate::handle::{HandleRegistry, KeyHandle};

/// Representação de chave aceita pelo store.
///
/// Toda variante reduz para uma identidade canônica (`String`) que é a chave
/// real do mapa. A redução nunca falha: o que não puder ser codificado vira
/// [`UNENCODABLE_KEY`].
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Bytes(Bytes),
    /// Valor estruturado; codificado como JSON com mapas ordenados.
    Structured(serde_json::Value),
    /// Valor que não pôde ser codificado.
    Opaque,
    /// Handle re-associável; resolve pelo valor corrente.
    Handle(KeyHandle),
}

impl Key {
    /// Cria uma chave a partir de qualquer valor serializável.
    ///
    /// Se a serialização falhar (ex.: mapa com chaves não-string) a chave
    /// vira [`Key::Opaque`] em vez de propagar o erro.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Key {
        match serde_json::to_value(value) {
            Ok(json) => Key::Structured(json),
            Err(e) => {
                debug!("chave não codificável, usando fallback: {e}");
                Key::Opaque
            }
        }
    }

    /// Identidade canônica sem consultar registro de handles.
    ///
    /// Handles são resolvidos pelo próprio estado.
    pub fn resolve(&self) -> String {
        resolve_at(self, None, 0)
    }

    /// Identidade canônica consultando o registro do store.
    pub(crate) fn resolve_with(&self, registry: &HandleRegistry) -> String {
        resolve_at(self, Some(registry), 0)
    }

    pub fn as_handle(&self) -> Option<&KeyHandle> {
        match self {
            Key::Handle(handle) => Some(handle),
            _ => None,
        }
    }
}

fn resolve_at(key: &Key, registry: Option<&HandleRegistry>, depth: usize) -> String {
    match key {
        Key::Str(s) => s.clone(),
        Key::Int(n) => n.to_string(),
        Key::UInt(n) => n.to_string(),
        Key::Float(f) => f.to_string(),
        Key::Bool(b) => b.to_string(),
        Key::Bytes(data) => bytes_identity(data),
        Key::Structured(json) => json.to_string(),
        Key::Opaque => UNENCODABLE_KEY.to_string(),
        Key::Handle(handle) => {
            // Cobre também ciclos (h1 -> h2 -> h1)
            if depth >= MAX_HANDLE_DEPTH {
                debug!(handle = handle.id(), "handles aninhados demais, usando fallback");
                return UNENCODABLE_KEY.to_string();
            }
            // Valor corrente é clonado antes de descer: nenhum lock de handle
            // fica preso durante a recursão.
            let current = registry
                .and_then(|r| r.current(handle.id()))
                .unwrap_or_else(|| handle.current());
            resolve_at(&current, registry, depth + 1)
        }
    }
}

/// UTF-8 válido passa direto; o resto vira `[bytes]` + forma escapada.
fn bytes_identity(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => {
            debug!(len = data.len(), "chave binária não é UTF-8, usando forma escapada");
            format!("{BYTES_KEY_PREFIX}{}", data.escape_ascii())
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Handle(handle) => write!(f, "@{} ({})", handle.id(), self.resolve()),
            _ => f.write_str(&self.resolve()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

macro_rules! key_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Key {
            fn from(n: $t) -> Self {
                Key::Int(i64::from(n))
            }
        })*
    };
}

macro_rules! key_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Key {
            fn from(n: $t) -> Self {
                Key::UInt(u64::from(n))
            }
        })*
    };
}

key_from_signed!(i8, i16, i32, i64);
key_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::UInt(n as u64)
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Key::Float(f)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<Bytes> for Key {
    fn from(data: Bytes) -> Self {
        Key::Bytes(data)
    }
}

impl From<serde_json::Value> for Key {
    fn from(json: serde_json::Value) -> Self {
        Key::Structured(json)
    }
}

impl From<KeyHandle> for Key {
    fn from(handle: KeyHandle) -> Self {
        Key::Handle(handle)
    }
}

impl From<&KeyHandle> for Key {
    fn from(handle: &KeyHandle) -> Self {
        Key::Handle(handle.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}
