use std::time::Duration;

use bytes::Bytes;

use memstore_common::{CommandError, MemStoreResult};
use memstore_storage::{HandleId, Key, SetOptions, Store};

/// Chave como digitada: string literal ou `@<id>` para um handle.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyArg {
    Plain(String),
    Handle(HandleId),
}

impl KeyArg {
    fn parse(token: &str) -> Result<KeyArg, CommandError> {
        match token.strip_prefix('@') {
            Some(id) => Ok(KeyArg::Handle(parse_id(id)?)),
            None => Ok(KeyArg::Plain(token.to_string())),
        }
    }

    fn to_key(&self, store: &Store) -> Result<Key, CommandError> {
        match self {
            KeyArg::Plain(s) => Ok(Key::from(s)),
            KeyArg::Handle(id) => store
                .find_handle(*id)
                .map(Key::from)
                .ok_or(CommandError::UnknownHandle(*id)),
        }
    }
}

/// Ação do SWEEP.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepAction {
    Start(Option<u64>),
    Stop,
}

/// Comandos aceitos pela CLI, 1:1 com as operações do store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: KeyArg,
        value: Bytes,
        options: SetOptions,
    },
    Get(KeyArg),
    Has(KeyArg),
    Del(KeyArg),
    Clear,
    Size,
    Keys,
    OriginalKeys,
    Values,
    Handle(String),
    Rebind {
        id: HandleId,
        value: String,
    },
    Sweep(SweepAction),
    Purge,
}

/// Resposta de um comando, no formato exibido ao usuário.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Simple(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Reply>),
}

impl Command {
    /// Faz o parse de uma linha já tokenizada.
    pub fn from_tokens(tokens: &[String]) -> Result<Command, CommandError> {
        let Some((name, args)) = tokens.split_first() else {
            return Err(CommandError::InvalidArgument("comando vazio".into()));
        };
        let name = name.to_uppercase();

        let cmd = match name.as_str() {
            "SET" => parse_set(args)?,
            "GET" => Command::Get(single_key(&name, args)?),
            "HAS" | "EXISTS" => Command::Has(single_key(&name, args)?),
            "DEL" => Command::Del(single_key(&name, args)?),
            "CLEAR" => no_args(&name, args, Command::Clear)?,
            "SIZE" => no_args(&name, args, Command::Size)?,
            "KEYS" => no_args(&name, args, Command::Keys)?,
            "OKEYS" => no_args(&name, args, Command::OriginalKeys)?,
            "VALUES" | "ALL" => no_args(&name, args, Command::Values)?,
            "PURGE" => no_args(&name, args, Command::Purge)?,
            "HANDLE" => match args {
                [initial] => Command::Handle(initial.clone()),
                _ => return Err(CommandError::WrongArity(name.clone())),
            },
            "REBIND" => match args {
                [id, value] => Command::Rebind {
                    id: parse_id(id)?,
                    value: value.clone(),
                },
                _ => return Err(CommandError::WrongArity(name.clone())),
            },
            "SWEEP" => parse_sweep(&name, args)?,
            _ => return Err(CommandError::Unknown(name.clone())),
        };

        Ok(cmd)
    }

    /// Executa o comando contra o store.
    pub fn execute(&self, store: &Store) -> MemStoreResult<Reply> {
        let reply = match self {
            Command::Set {
                key,
                value,
                options,
            } => {
                store.set(key.to_key(store)?, value.clone(), options);
                Reply::Simple("OK".into())
            }
            Command::Get(key) => match store.get(key.to_key(store)?) {
                Some(value) => Reply::Bulk(value),
                None => Reply::Null,
            },
            Command::Has(key) => Reply::Integer(store.has(key.to_key(store)?) as i64),
            Command::Del(key) => Reply::Integer(store.delete(key.to_key(store)?) as i64),
            Command::Clear => {
                store.clear();
                Reply::Simple("OK".into())
            }
            Command::Size => Reply::Integer(store.size() as i64),
            Command::Keys => Reply::Array(
                store
                    .keys()
                    .into_iter()
                    .map(|k| Reply::Bulk(Bytes::from(k)))
                    .collect(),
            ),
            Command::OriginalKeys => Reply::Array(
                store
                    .original_keys()
                    .iter()
                    .map(|k| Reply::Simple(k.to_string()))
                    .collect(),
            ),
            Command::Values => Reply::Array(store.values().into_iter().map(Reply::Bulk).collect()),
            Command::Handle(initial) => {
                let handle = store.create_handle(initial.as_str());
                Reply::Integer(handle.id() as i64)
            }
            Command::Rebind { id, value } => {
                let handle = store
                    .find_handle(*id)
                    .ok_or(CommandError::UnknownHandle(*id))?;
                let previous = handle.rebind(value.as_str());
                Reply::Bulk(Bytes::from(previous.resolve()))
            }
            Command::Sweep(SweepAction::Start(ms)) => {
                let started = store.start_sweeper(ms.map(Duration::from_millis))?;
                Reply::Integer(started as i64)
            }
            Command::Sweep(SweepAction::Stop) => Reply::Integer(store.stop_sweeper() as i64),
            Command::Purge => Reply::Integer(store.purge_expired() as i64),
        };
        Ok(reply)
    }
}

fn parse_set(args: &[String]) -> Result<Command, CommandError> {
    let (key, value, rest) = match args {
        [key, value, rest @ ..] => (KeyArg::parse(key)?, Bytes::from(value.clone()), rest),
        _ => return Err(CommandError::WrongArity("SET".into())),
    };

    let options = match rest {
        [] => SetOptions::default(),
        [opt, n] => {
            let n = parse_positive(n)?;
            match opt.to_uppercase().as_str() {
                "PX" => SetOptions::expiring(n),
                "EX" => SetOptions::expiring(n.saturating_mul(1000)),
                other => {
                    return Err(CommandError::InvalidArgument(format!(
                        "opção inválida para SET: {other}"
                    )));
                }
            }
        }
        _ => return Err(CommandError::WrongArity("SET".into())),
    };

    Ok(Command::Set {
        key,
        value,
        options,
    })
}

fn parse_sweep(name: &str, args: &[String]) -> Result<Command, CommandError> {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::WrongArity(name.into()));
    };
    match (action.to_uppercase().as_str(), rest) {
        ("START", []) => Ok(Command::Sweep(SweepAction::Start(None))),
        ("START", [ms]) => Ok(Command::Sweep(SweepAction::Start(Some(parse_positive(ms)?)))),
        ("STOP", []) => Ok(Command::Sweep(SweepAction::Stop)),
        ("START" | "STOP", _) => Err(CommandError::WrongArity(name.into())),
        (other, _) => Err(CommandError::InvalidArgument(format!(
            "ação inválida para SWEEP: {other}"
        ))),
    }
}

fn single_key(name: &str, args: &[String]) -> Result<KeyArg, CommandError> {
    match args {
        [key] => KeyArg::parse(key),
        _ => Err(CommandError::WrongArity(name.into())),
    }
}

fn no_args(name: &str, args: &[String], cmd: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(CommandError::WrongArity(name.into()))
    }
}

fn parse_id(s: &str) -> Result<HandleId, CommandError> {
    s.parse::<HandleId>()
        .map_err(|_| CommandError::InvalidArgument(format!("'{s}' não é um id de handle")))
}

fn parse_positive(s: &str) -> Result<u64, CommandError> {
    match s.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidArgument(format!(
            "'{s}' deve ser um inteiro positivo"
        ))),
    }
}
