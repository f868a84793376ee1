//! Byte channels a link can run over
//!
//! Anything `AsyncRead + AsyncWrite` works: a `SerialStream` for real
//! hardware, or one end of `tokio::io::duplex()` for a virtual radio.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, trace};

use crate::config::SerialConfig;
use crate::error::Result;

/// A duplex byte stream usable as a CAT channel
pub trait CatChannel: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> CatChannel for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Open a serial port as a CAT channel
pub fn open_serial(config: &SerialConfig) -> Result<SerialStream> {
    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .timeout(config.read_timeout())
        .open_native_async()?;
    info!("Opened serial port {} at {} baud", config.port, config.baud_rate);
    Ok(stream)
}

/// Read and discard whatever is already buffered, without waiting.
/// Returns the number of bytes dropped.
pub async fn drain_input<T: CatChannel>(channel: &mut T) -> io::Result<usize> {
    let mut chunk = [0u8; 256];
    let mut discarded = 0;
    loop {
        match timeout(Duration::ZERO, channel.read(&mut chunk)).await {
            Ok(Ok(0)) | Err(_) => break,
            Ok(Ok(n)) => {
                trace!("Discarding stale input: {:?}", String::from_utf8_lossy(&chunk[..n]));
                discarded += n;
            }
            Ok(Err(e)) => return Err(e),
        }
    }
    Ok(discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_drain_discards_buffered_bytes() {
        let (mut near, mut far) = tokio::io::duplex(64);
        far.write_all(b"FA014250000;FB007074000;").await.unwrap();
        assert_eq!(drain_input(&mut near).await.unwrap(), 24);
        assert_eq!(drain_input(&mut near).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_does_not_wait() {
        let (mut near, _far) = tokio::io::duplex(64);
        let drained = timeout(Duration::from_millis(50), drain_input(&mut near)).await;
        assert_eq!(drained.unwrap().unwrap(), 0);
    }
}
