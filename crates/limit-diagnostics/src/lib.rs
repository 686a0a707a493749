//! Diagnostics for the Limit frontend.
//!
//! Errors are collected as [`ErrorMessage`] records inside a per-compilation
//! [`Diagnostics`] value and rendered to any `io::Write` sink.

#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

pub mod code;
pub mod context;
pub mod engine;
pub mod hints;
pub mod message;
pub mod render;
pub mod stage;

pub use code::ErrorCode;
pub use engine::Diagnostics;
pub use message::{BlockContext, ErrorMessage};
pub use render::{render, render_to_string, RenderOptions};
pub use stage::{ErrorType, Stage};
