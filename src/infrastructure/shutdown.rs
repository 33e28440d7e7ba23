use tokio::sync::watch;

/// Process-wide stop signal. Every listener observes the same trigger.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Triggers on Ctrl-C, and on SIGTERM where available.
    pub fn install_signal_handlers(&self) {
        let ctrlc = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl-C");
                ctrlc.trigger();
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let term = self.clone();
            tokio::spawn(async move {
                if let Ok(mut sig) = signal(SignalKind::terminate()) {
                    sig.recv().await;
                    tracing::info!("received SIGTERM");
                    term.trigger();
                }
            });
        }
    }
}

impl ShutdownListener {
    pub async fn notified(&mut self) {
        let _ = self.receiver.wait_for(|triggered| *triggered).await;
    }
}
