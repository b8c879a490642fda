use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info};

use memstore_common::{SWEEPER_THREAD_NAME, StorageError, StorageResult};

/// Alvo de uma varredura: remove o que expirou e diz quanto removeu.
pub trait Purge: Send + Sync {
    fn purge_expired(&self) -> usize;
}

/// Sinal de parada compartilhado com a thread do sweeper.
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // notify_one guarda a permissão se o loop ainda não estiver esperando
        self.notify.notify_one();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct Running {
    signal: Arc<StopSignal>,
    thread: JoinHandle<()>,
    interval: Duration,
}

/// Worker de expiração em background: `Stopped` ↔ `Running`.
///
/// Roda numa thread dedicada com um runtime tokio current-thread. `stop`
/// acorda o loop e faz join, então nenhuma varredura está em andamento
/// quando retorna. O `Drop` faz o mesmo.
#[derive(Default)]
pub struct Sweeper {
    running: Option<Running>,
}

impl Sweeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Intervalo da execução corrente.
    pub fn interval(&self) -> Option<Duration> {
        self.running.as_ref().map(|r| r.interval)
    }

    /// Inicia o loop. Retorna `Ok(false)` se já estava rodando (o intervalo
    /// corrente é mantido).
    pub fn start(&mut self, target: Arc<dyn Purge>, interval: Duration) -> StorageResult<bool> {
        // Rodando, o intervalo pedido é ignorado (nem validado)
        if self.running.is_some() {
            debug!("sweeper já está rodando");
            return Ok(false);
        }
        if interval.is_zero() {
            return Err(StorageError::InvalidInterval);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let signal = Arc::new(StopSignal::new());
        let loop_signal = signal.clone();
        let thread = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.into())
            .spawn(move || runtime.block_on(sweep_loop(target, loop_signal, interval)))?;

        info!(interval_ms = interval.as_millis() as u64, "sweeper iniciado");
        self.running = Some(Running {
            signal,
            thread,
            interval,
        });
        Ok(true)
    }

    /// Para o loop e espera a thread terminar. Retorna `false` se já estava
    /// parado.
    pub fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            debug!("sweeper já está parado");
            return false;
        };

        running.signal.stop();
        if running.thread.join().is_err() {
            error!("thread do sweeper terminou com panic");
        }
        info!("sweeper parado");
        true
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Loop do sweeper: varre, depois espera o intervalo ou o sinal de parada.
async fn sweep_loop(target: Arc<dyn Purge>, signal: Arc<StopSignal>, interval: Duration) {
    while !signal.is_stopped() {
        let removed = target.purge_expired();
        if removed > 0 {
            debug!(removed, "entradas expiradas removidas pelo sweeper");
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = signal.notify.notified() => {}
        }
    }
}
