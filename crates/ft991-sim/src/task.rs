//! Virtual radio actor task
//!
//! The task owns a [`VirtualFt991`] and serves one duplex stream. A
//! `select!` loop reads requests from the stream, writes the radio's answers
//! back, and handles control commands (fault injection, snapshots,
//! shutdown) from an mpsc channel.

use std::io;

use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::VirtualFt991;

/// Buffer size of the in-memory duplex pair
const DUPLEX_BUFFER: usize = 4096;

/// Control commands for a running virtual radio
#[derive(Debug)]
pub enum VirtualRadioCommand {
    /// Swallow the next N answers
    MuteAnswers(u32),
    /// Answer the next request with these bytes
    InjectReply(Vec<u8>),
    /// Replace the radio state, keeping the task running
    Replace(Box<VirtualFt991>),
    /// Send back a copy of the current radio state
    Snapshot(oneshot::Sender<VirtualFt991>),
    /// Stop the task
    Shutdown,
}

/// Run the virtual radio until the stream closes or a shutdown arrives
pub async fn run_virtual_radio_task<S>(
    mut stream: S,
    mut radio: VirtualFt991,
    mut cmd_rx: mpsc::Receiver<VirtualRadioCommand>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];
    info!("Starting virtual FT-991A task");

    loop {
        tokio::select! {
            // Control commands first, so an injection queued before a
            // request is in place when the request is handled
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(VirtualRadioCommand::MuteAnswers(count)) => radio.mute_answers(count),
                    Some(VirtualRadioCommand::InjectReply(reply)) => radio.inject_reply(reply),
                    Some(VirtualRadioCommand::Replace(state)) => radio = *state,
                    Some(VirtualRadioCommand::Snapshot(reply_tx)) => {
                        let _ = reply_tx.send(radio.clone());
                    }
                    Some(VirtualRadioCommand::Shutdown) => {
                        info!("Shutdown requested for virtual FT-991A");
                        break;
                    }
                    None => {
                        debug!("Command channel closed for virtual FT-991A");
                        break;
                    }
                }
            }

            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Virtual FT-991A stream closed");
                        break;
                    }
                    Ok(n) => {
                        radio.process_bytes(&buf[..n]);
                        while let Some(answer) = radio.take_output() {
                            stream.write_all(&answer).await?;
                        }
                        stream.flush().await?;
                    }
                    Err(e) => {
                        warn!("Virtual FT-991A stream error: {}", e);
                        return Err(e);
                    }
                }
            }
        }
    }

    info!("Virtual FT-991A task ended");
    Ok(())
}

/// Handle to a spawned virtual radio
#[derive(Debug)]
pub struct VirtualRadioHandle {
    cmd_tx: mpsc::Sender<VirtualRadioCommand>,
    task: JoinHandle<io::Result<()>>,
}

impl VirtualRadioHandle {
    /// Swallow the next `count` answers
    pub async fn mute_answers(&self, count: u32) {
        self.send(VirtualRadioCommand::MuteAnswers(count)).await;
    }

    /// Answer the next request with `reply`
    pub async fn inject_reply(&self, reply: impl Into<Vec<u8>>) {
        self.send(VirtualRadioCommand::InjectReply(reply.into())).await;
    }

    /// Swap in new radio state
    pub async fn replace(&self, radio: VirtualFt991) {
        self.send(VirtualRadioCommand::Replace(Box::new(radio))).await;
    }

    /// Copy of the radio state, or `None` if the task has stopped
    pub async fn snapshot(&self) -> Option<VirtualFt991> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(VirtualRadioCommand::Snapshot(reply_tx)).await;
        reply_rx.await.ok()
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(self) -> io::Result<()> {
        self.send(VirtualRadioCommand::Shutdown).await;
        self.task
            .await
            .map_err(io::Error::other)?
    }

    async fn send(&self, cmd: VirtualRadioCommand) {
        if self.cmd_tx.send(cmd).await.is_err() {
            debug!("Virtual FT-991A task already stopped");
        }
    }
}

/// Spawn `radio` on an in-memory duplex pair. Returns the controller end
/// of the pair and a handle to the task.
pub fn spawn_virtual_radio(radio: VirtualFt991) -> (DuplexStream, VirtualRadioHandle) {
    let (client, server) = duplex(DUPLEX_BUFFER);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let task = tokio::spawn(run_virtual_radio_task(server, radio, cmd_rx));
    (client, VirtualRadioHandle { cmd_tx, task })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn read_answer(stream: &mut DuplexStream) -> Vec<u8> {
        let mut buf = [0u8; 128];
        let n = timeout(Duration::from_secs(1), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        buf[..n].to_vec()
    }

    #[tokio::test]
    async fn test_task_answers_requests() {
        let (mut client, handle) = spawn_virtual_radio(VirtualFt991::ft991a().unwrap());
        client.write_all(b"ID;").await.unwrap();
        assert_eq!(read_answer(&mut client).await, b"ID0670;");
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_reflects_sets() {
        let (mut client, handle) = spawn_virtual_radio(VirtualFt991::ft991a().unwrap());
        client.write_all(b"SQ0042;ID;").await.unwrap();
        assert_eq!(read_answer(&mut client).await, b"ID0670;");
        assert_eq!(handle.snapshot().await.unwrap().squelch(), 42);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_reply() {
        let (mut client, handle) = spawn_virtual_radio(VirtualFt991::ft991a().unwrap());
        handle.inject_reply(&b"FA0;FA1;"[..]).await;
        client.write_all(b"FA;").await.unwrap();
        assert_eq!(read_answer(&mut client).await, b"FA0;FA1;");
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_task_ends_when_stream_closes() {
        let (client, handle) = spawn_virtual_radio(VirtualFt991::ft991a().unwrap());
        drop(client);
        handle.shutdown().await.unwrap();
    }
}
