/// Erros do engine de armazenamento.
///
/// Operações sobre chaves nunca falham: chave expirada é ausente e chave
/// impossível de codificar cai na identidade de fallback. Só o ciclo de
/// vida do sweeper produz erros.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("intervalo de limpeza deve ser maior que zero")]
    InvalidInterval,
    #[error("falha ao iniciar o sweeper: {0}")]
    SweeperSpawn(#[from] std::io::Error),
}

/// Erros de parsing/validação de comandos da CLI.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("comando desconhecido: {0}")]
    Unknown(String),
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
    #[error("handle desconhecido: {0}")]
    UnknownHandle(u64),
}

/// Erro top-level do memstore.
#[derive(Debug, thiserror::Error)]
pub enum MemStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias.
pub type MemStoreResult<T> = Result<T, MemStoreError>;

/// Result do engine de armazenamento.
pub type StorageResult<T> = Result<T, StorageError>;

// Conversão implícita de io::Error → MemStoreError (via StorageError)
impl From<std::io::Error> for MemStoreError {
    fn from(e: std::io::Error) -> Self {
        MemStoreError::Storage(StorageError::SweeperSpawn(e))
    }
}
