//! FT-991A CAT link
//!
//! Drives the half-duplex CAT exchange over any async byte channel and
//! exposes typed radio operations on top of it.
//!
//! - [`CatLink`]: one request, one classified answer, no retries
//! - [`Ft991`]: validated operations (VFOs, tuner, menu, memory channels,
//!   power, TX) returning decoded values
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ft991_link::{Ft991, LinkConfig, SerialConfig};
//! use ft991_protocol::{Catalog, Vfo};
//!
//! # async fn run() -> ft991_link::Result<()> {
//! let catalog = Arc::new(Catalog::ft991a()?);
//! let mut radio = Ft991::connect(&SerialConfig::new("/dev/ttyUSB0"), LinkConfig::default(), catalog)?;
//!
//! radio.set_frequency(Vfo::A, "14.074M").await?;
//! let hz = radio.read_frequency(Vfo::A).await?.hz();
//! assert_eq!(hz, 14_074_000);
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod radio;

pub use channel::{drain_input, open_serial, CatChannel};
pub use config::{LinkConfig, PowerOnConfig, SerialConfig, TuneWait, MIN_POWER_ON_GAP_MS};
pub use engine::{CatLink, TransactionOutcome, WAKE_REQUEST};
pub use error::{CatError, Result};
pub use radio::{Ft991, FT991A_ID, MAX_SQUELCH, NOTCH_LEVEL_HZ};
