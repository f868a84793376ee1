//! Transaction engine
//!
//! One [`CatLink`] owns one channel. Each transaction is a single write
//! followed by at most one answer:
//!
//! 1. resolve the command in the catalog and encode the request
//! 2. optionally drain stale input
//! 3. write the request
//! 4. wait up to the settle window for the first answer byte; silence
//!    means [`TransactionOutcome::NoResponse`] for a read of a command the
//!    catalog marks readable and answer-bearing, and
//!    [`TransactionOutcome::NoAnswer`] otherwise
//! 5. keep reading until the terminator arrives or the response timeout
//!    expires, then classify the bytes
//!
//! Transactions take `&mut self`, so a link can never have two exchanges
//! in flight. Nothing is retried.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ft991_protocol::{
    encode_request, is_payload_byte, parse_response, Catalog, CommandCode, CommandSpec, Parameter,
    Response, TERMINATOR,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, trace, warn};

use crate::channel::{drain_input, CatChannel};
use crate::config::LinkConfig;
use crate::error::{CatError, Result};

/// Dummy request sent to wake the radio's CAT port before power-on
pub const WAKE_REQUEST: &[u8] = b"DD;";

const READ_CHUNK: usize = 256;

/// Classified result of one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Answer with a payload
    Value(String),
    /// Answer echoing the code with no payload
    Acknowledged,
    /// Nothing arrived within the settle window. Normal for set commands.
    NoAnswer,
    /// Nothing arrived for a read the radio always answers
    NoResponse,
    /// The radio answered `?;`
    Rejected { raw: String },
    /// Bytes that are neither a matching frame nor the error marker
    Malformed { raw: String },
}

impl TransactionOutcome {
    /// Turn rejection and malformed answers into errors. `Ok(None)` when
    /// there was no payload.
    pub fn into_result(self, command: CommandCode) -> Result<Option<String>> {
        match self {
            TransactionOutcome::Value(payload) => Ok(Some(payload)),
            TransactionOutcome::Acknowledged | TransactionOutcome::NoAnswer => Ok(None),
            TransactionOutcome::NoResponse => Err(CatError::NoResponse {
                command: command.to_string(),
            }),
            TransactionOutcome::Rejected { raw } => Err(CatError::Protocol {
                command: command.to_string(),
                raw,
            }),
            TransactionOutcome::Malformed { raw } => Err(CatError::MalformedResponse {
                command: command.to_string(),
                raw,
            }),
        }
    }

    /// Like [`into_result`](Self::into_result) but a payload is required
    pub fn into_value(self, command: CommandCode) -> Result<String> {
        self.into_result(command)?.ok_or_else(|| CatError::NoResponse {
            command: command.to_string(),
        })
    }
}

/// Half-duplex CAT link over one channel
pub struct CatLink<T> {
    catalog: Arc<Catalog>,
    config: LinkConfig,
    channel: Option<T>,
}

impl<T: CatChannel> CatLink<T> {
    /// A closed link. Call [`open`](Self::open) before transacting.
    pub fn new(catalog: Arc<Catalog>, config: LinkConfig) -> Self {
        Self {
            catalog,
            config,
            channel: None,
        }
    }

    /// A link already attached to `channel`
    pub fn with_channel(catalog: Arc<Catalog>, config: LinkConfig, channel: T) -> Self {
        let mut link = Self::new(catalog, config);
        link.open(channel);
        link
    }

    /// Attach a channel, replacing any previous one
    pub fn open(&mut self, channel: T) {
        if self.channel.replace(channel).is_some() {
            debug!("Replaced open CAT channel");
        }
        info!("CAT link open");
    }

    /// Detach the channel, shutting down its write half
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            channel.shutdown().await?;
            info!("CAT link closed");
        }
        Ok(())
    }

    /// Whether a channel is attached
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Command and menu tables this link validates against
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Timing configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Run one exchange for `code` with an optional parameter.
    ///
    /// The code must be in the catalog and the parameter must encode;
    /// both are checked before anything is written. A bare request for a
    /// readable, answer-bearing command is treated as a read.
    pub async fn transact(
        &mut self,
        code: &str,
        parameter: Option<Parameter>,
    ) -> Result<TransactionOutcome> {
        let spec = self.catalog.command(code)?;
        let command = spec.code();
        let expects_answer = parameter.is_none() && answers_reads(spec);
        let request = encode_request(command, parameter.as_ref())?;
        self.exchange(command, &request, expects_answer).await
    }

    /// Run a read of `code`, where `parameter` selects what to read (`"0"`
    /// for `AG0;`, the channel for `MT001;`).
    ///
    /// Fails before any I/O if the catalog does not mark the command
    /// readable. Silence is [`TransactionOutcome::NoResponse`] when the
    /// command is answer-bearing.
    pub async fn transact_read(
        &mut self,
        code: &str,
        parameter: Option<Parameter>,
    ) -> Result<TransactionOutcome> {
        let spec = self.catalog.command(code)?;
        let command = spec.code();
        if !spec.allow_read() {
            return Err(CatError::InvalidParameter(format!(
                "{command} cannot be read"
            )));
        }
        let expects_answer = spec.allow_answer();
        let request = encode_request(command, parameter.as_ref())?;
        self.exchange(command, &request, expects_answer).await
    }

    /// Like [`transact`](Self::transact), failing on `?;` or a malformed answer
    pub async fn request(
        &mut self,
        code: &str,
        parameter: Option<Parameter>,
    ) -> Result<Option<String>> {
        let command = self.catalog.command(code)?.code();
        self.transact(code, parameter).await?.into_result(command)
    }

    /// [`transact_read`](Self::transact_read), failing unless a payload
    /// came back
    pub async fn query(&mut self, code: &str, parameter: Option<Parameter>) -> Result<String> {
        let command = self.catalog.command(code)?.code();
        self.transact_read(code, parameter).await?.into_value(command)
    }

    /// Send a complete request such as `"FA;"` or `"AG0100;"`.
    ///
    /// The text must be a catalog code, payload characters and a single
    /// trailing terminator.
    pub async fn transact_raw(&mut self, request: &str) -> Result<TransactionOutcome> {
        let bytes = request.as_bytes();
        let body = match bytes.split_last() {
            Some((&TERMINATOR, body)) if body.len() >= 2 => body,
            _ => {
                return Err(CatError::InvalidParameter(format!(
                    "raw request {request:?} must be a 2-character code followed by ';'"
                )))
            }
        };
        let (code, param) = body.split_at(2);
        if !param.iter().copied().all(is_payload_byte) {
            return Err(CatError::InvalidParameter(format!(
                "raw request {request:?} has characters outside the CAT alphabet"
            )));
        }
        let code = std::str::from_utf8(code).map_err(|_| CatError::CommandNotFound(request.to_string()))?;
        let spec = self.catalog.command(code)?;
        let command = spec.code();
        let expects_answer = param.is_empty() && answers_reads(spec);
        // The code may have arrived in lowercase
        let mut wire = command.as_bytes().to_vec();
        wire.extend_from_slice(param);
        wire.push(TERMINATOR);
        self.exchange(command, &wire, expects_answer).await
    }

    /// Send the dummy wake-up request and discard anything it provokes
    pub async fn wake(&mut self) -> Result<()> {
        let settle = self.config.settle();
        let channel = self.channel.as_mut().ok_or(CatError::NotOpen)?;
        trace!("TX {:?}", String::from_utf8_lossy(WAKE_REQUEST));
        channel.write_all(WAKE_REQUEST).await?;
        channel.flush().await?;
        tokio::time::sleep(settle).await;
        drain_input(channel).await?;
        Ok(())
    }

    async fn exchange(
        &mut self,
        command: CommandCode,
        request: &[u8],
        expects_answer: bool,
    ) -> Result<TransactionOutcome> {
        let settle = self.config.settle();
        let response_timeout = self.config.response_timeout();
        let clear_input = self.config.clear_input;
        let channel = self.channel.as_mut().ok_or(CatError::NotOpen)?;

        if clear_input {
            let stale = drain_input(channel).await?;
            if stale > 0 {
                debug!("Dropped {} stale bytes before {}", stale, command);
            }
        }

        trace!("TX {:?}", String::from_utf8_lossy(request));
        channel.write_all(request).await?;
        channel.flush().await?;

        let Some(raw) = read_answer(channel, settle, response_timeout).await? else {
            if expects_answer {
                warn!("{}: no response to read", command);
                return Ok(TransactionOutcome::NoResponse);
            }
            debug!("{}: no answer", command);
            return Ok(TransactionOutcome::NoAnswer);
        };
        trace!("RX {:?}", String::from_utf8_lossy(&raw));

        let text = String::from_utf8_lossy(&raw).into_owned();
        let outcome = match parse_response(command, &raw) {
            Response::Value(payload) => TransactionOutcome::Value(payload),
            Response::Acknowledged => TransactionOutcome::Acknowledged,
            Response::Rejected => {
                warn!("{} rejected by radio: {:?}", command, text);
                TransactionOutcome::Rejected { raw: text }
            }
            Response::Malformed => {
                warn!("{}: malformed response {:?}", command, text);
                TransactionOutcome::Malformed { raw: text }
            }
        };
        debug!("{}: {:?}", command, outcome);
        Ok(outcome)
    }
}

/// Whether a bare request for this command is a read the radio answers
fn answers_reads(spec: &CommandSpec) -> bool {
    spec.allow_read() && spec.allow_answer()
}

/// Read one answer. `None` if nothing arrives within `settle`.
///
/// Once the first byte is in, reading continues until the buffer ends in
/// the terminator or `response_timeout` passes. Bytes already queued after
/// the terminator are kept so that run-together frames stay visible to the
/// parser.
async fn read_answer<T: CatChannel>(
    channel: &mut T,
    settle: Duration,
    response_timeout: Duration,
) -> Result<Option<Vec<u8>>> {
    let mut chunk = [0u8; READ_CHUNK];
    let n = match timeout(settle, channel.read(&mut chunk)).await {
        Err(_) => return Ok(None),
        Ok(result) => result?,
    };
    if n == 0 {
        return Err(closed());
    }

    let mut buf = chunk[..n].to_vec();
    let deadline = Instant::now() + response_timeout;
    while buf.last() != Some(&TERMINATOR) {
        match timeout_at(deadline, channel.read(&mut chunk)).await {
            Err(_) | Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
        }
    }

    loop {
        match timeout(Duration::ZERO, channel.read(&mut chunk)).await {
            Err(_) | Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => return Err(e.into()),
        }
    }
    Ok(Some(buf))
}

fn closed() -> CatError {
    CatError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "channel closed by peer",
    ))
}
