use tokio::sync::broadcast;

pub trait Shutdown {
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// Broadcasts a single stop signal to every background task of the dashboard.
#[derive(Clone)]
pub struct ShutdownChannel {
    shutdown: broadcast::Sender<()>,
}

impl ShutdownChannel {
    pub fn new(shutdown: broadcast::Sender<()>) -> Self {
        Self { shutdown }
    }

    /// Signals every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.shutdown.send(()).unwrap_or(0)
    }
}

impl Default for ShutdownChannel {
    fn default() -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self::new(shutdown)
    }
}

impl Shutdown for ShutdownChannel {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }
}
