use crate::domain::models::{WalletDescriptor, WalletDocumentStore};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::shutdown::Shutdown;

#[derive(Debug)]
enum MirrorCommand {
    Initialize {
        user: String,
    },
    Sync {
        user: String,
        wallets: Vec<WalletDescriptor>,
    },
    Remove {
        user: String,
        address: String,
    },
}

/// Fire-and-forget mirror of session wallets into a [`WalletDocumentStore`].
///
/// Writes are queued to a background listener; failures are logged and dropped.
#[derive(Clone)]
pub struct DocumentMirror {
    commands: mpsc::Sender<MirrorCommand>,
}

impl DocumentMirror {
    pub fn new<D, S>(store: Arc<D>, shutdown: S) -> Self
    where
        D: WalletDocumentStore + Send + Sync + 'static,
        S: Shutdown + Send + Sync + 'static,
    {
        let (tx_commands, rx_commands) = mpsc::channel(100);
        listen_for_commands(rx_commands, store, shutdown);
        Self {
            commands: tx_commands,
        }
    }

    pub async fn initialize(&self, user: &str) {
        self.send(MirrorCommand::Initialize {
            user: user.to_string(),
        })
        .await;
    }

    pub async fn sync(&self, user: &str, wallets: Vec<WalletDescriptor>) {
        self.send(MirrorCommand::Sync {
            user: user.to_string(),
            wallets,
        })
        .await;
    }

    pub async fn remove(&self, user: &str, address: &str) {
        self.send(MirrorCommand::Remove {
            user: user.to_string(),
            address: address.to_string(),
        })
        .await;
    }

    async fn send(&self, command: MirrorCommand) {
        if let Err(e) = self.commands.send(command).await {
            tracing::warn!("Document mirror is closed, dropping {:?}", e.0);
        }
    }
}

fn listen_for_commands<D, S>(
    mut rx_commands: mpsc::Receiver<MirrorCommand>,
    store: Arc<D>,
    shutdown: S,
) where
    D: WalletDocumentStore + Send + Sync + 'static,
    S: Shutdown + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut shutdown_recv = shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_recv.recv() => {
                    tracing::info!("Received shutdown signal, stopping document mirror");
                    break;
                }
                command = rx_commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    let result = match &command {
                        MirrorCommand::Initialize { user } => store.initialize_user(user).await,
                        MirrorCommand::Sync { user, wallets } => {
                            store.sync_wallets(user, wallets.clone()).await
                        }
                        MirrorCommand::Remove { user, address } => {
                            store.remove_wallet(user, address).await
                        }
                    };
                    if let Err(e) = result {
                        tracing::warn!("Document mirror failed to apply {:?}: {}", command, e);
                    }
                }
            }
        }
    });
}
