use std::time::{Duration, Instant};

use crate::key::Key;

/// Opções do SET.
///
/// `ttl_ms` só vale quando `permanent == false`; `ttl_ms == 0` também
/// significa "nunca expira".
#[derive(Debug, Clone, PartialEq)]
pub struct SetOptions {
    pub permanent: bool,
    pub ttl_ms: u64,
}

impl SetOptions {
    /// Entrada que expira `ttl_ms` milissegundos após o SET.
    pub fn expiring(ttl_ms: u64) -> Self {
        Self {
            permanent: false,
            ttl_ms,
        }
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            permanent: true,
            ttl_ms: 0,
        }
    }
}

/// Entrada no store: valor + metadados de expiração + chave original.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    value: V,
    origin: Key,
    permanent: bool,
    ttl_ms: u64,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// `expires_at` é `None` sse `permanent || ttl_ms == 0`.
    pub fn new(value: V, origin: Key, options: &SetOptions) -> Self {
        let expires_at = if options.permanent || options.ttl_ms == 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(options.ttl_ms))
        };
        Self {
            value,
            origin,
            permanent: options.permanent,
            ttl_ms: options.ttl_ms,
            expires_at,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn origin(&self) -> &Key {
        &self.origin
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}
