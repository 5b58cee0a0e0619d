//! Connection acceptor and per-client handler tasks
//!
//! One task accepts, two tasks per client (reader and writer). The
//! reader feeds a per-connection [`LineAssembler`], decodes each
//! message, writes it into the mailbox and queues one feedback reply.
//! The writer drains the client's queue, flushing per line so reply
//! latency is bounded by the message, not a batch.
//!
//! Shutdown closes the listener and drops every registered handle;
//! handler tasks observe the shutdown signal and exit through their
//! normal teardown path.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use kinelink_core::{KinelinkError, KinelinkResult};
use kinelink_wire::{FeedbackMessage, LineAssembler, PoseMessage};

use crate::{ClientId, ClientRegistry, FeedbackCell, Mailbox};

/// Acceptor configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listening port; 0 picks an ephemeral port
    pub port: u16,
    /// Size of the per-connection read buffer
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8080,
            read_buffer_size: 1024,
        }
    }
}

/// Listening bridge endpoint
pub struct BridgeServer {
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    shutdown: watch::Sender<bool>,
}

impl BridgeServer {
    /// Bind the listening socket and start accepting
    ///
    /// A bind failure is fatal to the bridge and propagates here; accept
    /// failures after a successful bind stop the accept loop.
    pub async fn bind(
        config: ServerConfig,
        mailbox: Arc<Mailbox>,
        feedback: Arc<FeedbackCell>,
        registry: Arc<ClientRegistry>,
    ) -> KinelinkResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|e| KinelinkError::BindFailed(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| KinelinkError::Transport(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(accept_loop(
            listener,
            config,
            mailbox,
            feedback,
            Arc::clone(&registry),
            shutdown_rx,
        ));
        tracing::info!(%local_addr, "bridge listening");

        Ok(BridgeServer {
            local_addr,
            registry,
            shutdown: shutdown_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and close every registered connection
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.registry.clear();
        tracing::info!("bridge shut down");
    }
}

async fn accept_loop(
    listener: TcpListener,
    config: ServerConfig,
    mailbox: Arc<Mailbox>,
    feedback: Arc<FeedbackCell>,
    registry: Arc<ClientRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let (sender, receiver) = mpsc::unbounded_channel();
                    let id = registry.register(addr, sender.clone());
                    tracing::info!(id, %addr, "client connected");

                    let (read_half, write_half) = stream.into_split();
                    tokio::spawn(write_loop(write_half, receiver, id, addr));
                    tokio::spawn(read_loop(
                        read_half,
                        sender,
                        id,
                        addr,
                        config.read_buffer_size,
                        Arc::clone(&mailbox),
                        Arc::clone(&feedback),
                        Arc::clone(&registry),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed, stopping accept loop");
                    break;
                }
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("accept loop stopped");
}

/// Per-connection reader: reassemble, decode, mailbox write, queue reply
#[allow(clippy::too_many_arguments)]
async fn read_loop(
    mut read_half: OwnedReadHalf,
    sender: mpsc::UnboundedSender<String>,
    id: ClientId,
    addr: SocketAddr,
    read_buffer_size: usize,
    mailbox: Arc<Mailbox>,
    feedback: Arc<FeedbackCell>,
    registry: Arc<ClientRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut assembler = LineAssembler::new();
    let mut buf = vec![0u8; read_buffer_size];

    loop {
        tokio::select! {
            read = read_half.read(&mut buf) => match read {
                // Zero-length read: orderly disconnect
                Ok(0) => {
                    tracing::info!(id, %addr, "client disconnected");
                    break;
                }
                Ok(n) => {
                    assembler.push(&buf[..n]);
                    while let Some(line) = assembler.next_message() {
                        handle_message(&line, addr, &sender, &mailbox, &feedback);
                    }
                }
                Err(e) => {
                    tracing::warn!(id, %addr, error = %e, "read failed, closing connection");
                    break;
                }
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    registry.unregister(id);
}

fn handle_message(
    line: &str,
    addr: SocketAddr,
    sender: &mpsc::UnboundedSender<String>,
    mailbox: &Mailbox,
    feedback: &FeedbackCell,
) {
    let message = match PoseMessage::decode(line) {
        Ok(message) => message,
        Err(e) => {
            // A malformed message must not kill the session
            tracing::warn!(%addr, error = %e, "dropping malformed message");
            return;
        }
    };

    mailbox.write(&message);

    let snapshot = feedback.load();
    let reply = FeedbackMessage::new(
        snapshot.frame_num,
        snapshot.camera_position,
        snapshot.target_position,
        snapshot.camera_mode,
        "",
    );
    match reply.encode_line() {
        Ok(reply_line) => {
            // Writer gone means the connection is tearing down; the read
            // side will notice on its own
            let _ = sender.send(reply_line);
        }
        Err(e) => tracing::warn!(%addr, error = %e, "failed to encode reply"),
    }
}

/// Per-connection writer: drain the queue, flush per message
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut receiver: mpsc::UnboundedReceiver<String>,
    id: ClientId,
    addr: SocketAddr,
) {
    while let Some(line) = receiver.recv().await {
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            tracing::debug!(id, %addr, error = %e, "write failed");
            break;
        }
        if let Err(e) = write_half.flush().await {
            tracing::debug!(id, %addr, error = %e, "flush failed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpStream;
    use tokio::time::{sleep, timeout};

    use crate::{FeedbackSnapshot, StateSnapshot};
    use kinelink_core::Vec3;

    async fn start_server() -> (BridgeServer, Arc<Mailbox>, Arc<FeedbackCell>, Arc<ClientRegistry>) {
        let mailbox = Arc::new(Mailbox::new());
        let feedback = Arc::new(FeedbackCell::new());
        let registry = Arc::new(ClientRegistry::new());
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let server = BridgeServer::bind(
            config,
            Arc::clone(&mailbox),
            Arc::clone(&feedback),
            Arc::clone(&registry),
        )
        .await
        .unwrap();
        (server, mailbox, feedback, registry)
    }

    async fn take_snapshot(mailbox: &Mailbox) -> StateSnapshot {
        timeout(Duration::from_secs(2), async {
            loop {
                if let Some(snapshot) = mailbox.take_if_dirty() {
                    return snapshot;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("mailbox never became dirty")
    }

    #[tokio::test]
    async fn test_two_messages_one_write() {
        let (server, mailbox, _feedback, _registry) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        // Two newline-terminated messages in a single TCP write must
        // produce two decodes and two mailbox writes
        stream
            .write_all(b"{\"frameNum\":1,\"param\":0.25}\n{\"frameNum\":2,\"_NoiseIntensity\":0.9}\n")
            .await
            .unwrap();

        let snapshot = timeout(Duration::from_secs(2), async {
            loop {
                if let Some(snapshot) = mailbox.take_if_dirty() {
                    if snapshot.frame_num == 2 {
                        return snapshot;
                    }
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // Fields from both messages are merged, so both writes happened
        assert_eq!(snapshot.param, 0.25);
        assert_eq!(snapshot.noise_intensity, 0.9);

        // And one reply per inbound message came back
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"frameNum\""));
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert!(line.contains("\"frameNum\""));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_malformed_message_keeps_connection_open() {
        let (server, mailbox, _feedback, _registry) = start_server().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();

        stream.write_all(b"this is not json\n").await.unwrap();
        stream.write_all(b"{\"frameNum\":77}\n").await.unwrap();

        let snapshot = take_snapshot(&mailbox).await;
        assert_eq!(snapshot.frame_num, 77);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_reply_reflects_published_feedback() {
        let (server, _mailbox, feedback, _registry) = start_server().await;
        feedback.publish(FeedbackSnapshot {
            frame_num: 12,
            camera_position: Vec3::new(1.0, 2.0, 3.0),
            target_position: Vec3::new(1.0, 0.0, 0.0),
            camera_mode: 2,
        });

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        stream.write_all(b"{\"frameNum\":12}\n").await.unwrap();

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        timeout(Duration::from_secs(2), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();

        let reply: FeedbackMessage = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(reply.frame_num, 12);
        assert_eq!(reply.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(reply.camera_to_target_relative_position, [0.0, 2.0, 3.0]);
        assert_eq!(reply.camera_mode, 2);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_registry_tracks_connections() {
        let (server, _mailbox, _feedback, registry) = start_server().await;

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        timeout(Duration::from_secs(2), async {
            while registry.is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(registry.len(), 1);

        drop(stream);
        timeout(Duration::from_secs(2), async {
            while !registry.is_empty() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        server.shutdown();
    }
}
