//! Decoded input events.
//!
//! The editor consumes keyboard and pointer events that the host has
//! already decoded from its platform; nothing here talks to a device.

mod keyboard;
mod pointer;

pub use keyboard::{KeyCode, KeyEvent, KeyModifiers};
pub use pointer::{PointerEvent, PointerKind};
