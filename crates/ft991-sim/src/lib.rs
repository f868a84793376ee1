//! Virtual FT-991A
//!
//! A simulated radio that speaks the CAT wire protocol, for exercising
//! `ft991-link` without hardware.
//!
//! - **VirtualFt991**: radio state plus the request handler
//! - **run_virtual_radio_task**: serves one async stream with a
//!   `select!` loop
//! - **spawn_virtual_radio**: wires a radio to one end of
//!   `tokio::io::duplex()` and returns the other end
//!
//! # Example
//!
//! ```rust
//! use ft991_sim::VirtualFt991;
//!
//! let mut radio = VirtualFt991::ft991a().unwrap();
//! radio.process_bytes(b"FA007074000;FA;");
//! assert_eq!(radio.take_output().unwrap(), b"FA007074000;");
//! ```

pub mod radio;
pub mod task;

pub use radio::{VirtualFt991, RADIO_ID};
pub use task::{run_virtual_radio_task, spawn_virtual_radio, VirtualRadioCommand, VirtualRadioHandle};
