#![forbid(unsafe_code)]

mod error;

pub use error::*;

/// Intervalo padrão entre varreduras do sweeper (60s).
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60_000;
/// Identidade usada para chaves que não puderam ser codificadas.
pub const UNENCODABLE_KEY: &str = "[unencodable]";
/// Prefixo das chaves binárias que não são UTF-8 válido. O resto da
/// identidade é o conteúdo escapado (`\xff`), então bytes distintos
/// nunca dividem slot.
pub const BYTES_KEY_PREFIX: &str = "[bytes]";
/// Profundidade máxima ao resolver handles que apontam para outros handles.
pub const MAX_HANDLE_DEPTH: usize = 8;
/// Nome da thread do sweeper.
pub const SWEEPER_THREAD_NAME: &str = "memstore-sweeper";
