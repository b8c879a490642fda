use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use serde_json::json;
use tracing::info;

use memstore_common::DEFAULT_CLEANUP_INTERVAL_MS;
use memstore_storage::{SetOptions, Store, StoreConfig};

mod command;

use command::{Command, Reply};

#[derive(Parser, Debug)]
#[command(name = "memstore-cli", about = "memstore CLI: store in-memory com TTL e handles")]
struct Args {
    /// Intervalo entre varreduras do sweeper, em milissegundos
    #[arg(long, default_value_t = DEFAULT_CLEANUP_INTERVAL_MS)]
    cleanup_interval_ms: u64,
    /// Não inicia o sweeper na construção do store
    #[arg(long)]
    no_auto_start: bool,
    /// Executa o cenário de demonstração e sai
    #[arg(long)]
    demo: bool,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memstore_cli=info,memstore_storage=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = StoreConfig::default()
        .with_cleanup_interval(Duration::from_millis(args.cleanup_interval_ms))
        .with_auto_start(!args.no_auto_start);
    let store: Store = Store::with_config(config)?;

    if args.demo {
        return run_demo(&store);
    }

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        println!("{}", execute_line(&store, &args.command));
        return Ok(());
    }

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("memstore> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }
        println!("{}", execute_line(&store, &tokens));
    }

    Ok(())
}

/// Faz parse e executa; erros viram uma linha `(error)`.
fn execute_line(store: &Store, tokens: &[String]) -> String {
    let result = Command::from_tokens(tokens)
        .map_err(Into::into)
        .and_then(|cmd| cmd.execute(store));
    match result {
        Ok(reply) => format_reply(&reply, 0),
        Err(e) => format!("(error) {e}"),
    }
}

/// Cenário de sessão: entrada permanente + entrada com TTL curto.
fn run_demo(store: &Store) -> anyhow::Result<()> {
    let user = json!({"role": "admin"}).to_string();
    store.set("user:1", Bytes::from(user), &SetOptions::default());
    info!(has = store.has("user:1"), "user:1 gravado");

    let session = json!({"t": "x"}).to_string();
    store.set("session:1", Bytes::from(session), &SetOptions::expiring(30));
    thread::sleep(Duration::from_millis(40));

    info!(size = store.size(), keys = ?store.keys(), "após 40ms, antes do acesso");
    info!(found = store.get("session:1").is_some(), "session:1 lida");
    info!(size = store.size(), "após acesso à sessão expirada");

    let current = store.create_handle("a");
    store.set(&current, Bytes::from_static(b"1"), &SetOptions::default());
    current.rebind("b");
    store.set(&current, Bytes::from_static(b"2"), &SetOptions::default());
    info!(
        via_handle = ?store.get(&current),
        old_slot = ?store.get("a"),
        "handle re-associado de 'a' para 'b'"
    );

    store.stop_sweeper();
    Ok(())
}

/// Tokeniza a linha de input com suporte a strings quoted.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
            } else if c == '\\' {
                match chars.peek() {
                    Some(&'n') => {
                        current.push('\n');
                        chars.next();
                    }
                    Some(&'t') => {
                        current.push('\t');
                        chars.next();
                    }
                    Some(&next) if matches!(next, '\\' | '"' | '\'') => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push(c),
                }
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Formata uma resposta para exibição humana.
fn format_reply(reply: &Reply, indent: usize) -> String {
    let pad = " ".repeat(indent);
    match reply {
        Reply::Simple(s) => format!("{pad}{s}"),
        Reply::Integer(n) => format!("{pad}(integer) {n}"),
        Reply::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("{pad}\"{s}\""),
            Err(_) => format!("{pad}(binary) {} bytes", data.len()),
        },
        Reply::Null => format!("{pad}(nil)"),
        Reply::Array(items) => {
            if items.is_empty() {
                return format!("{pad}(empty array)");
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{pad}{}) {}", i + 1, format_reply(item, 0)))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
