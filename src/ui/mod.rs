//! Terminal output components.
//!
//! This module provides:
//! - [`OutputStream`] and the [`Writer`] trait for decoratable streams
//! - [`Spinner`] for single-glyph progress animation
//! - [`Bracket`] for bordered sections that nest everything written inside
//! - [`Theme`] for colors and glyphs
//!
//! # Example
//!
//! ```
//! use shellbracket::ui::{Bracket, BracketOptions, OutputStream, Theme};
//!
//! let (stream, capture) = OutputStream::capture(false);
//! let bracket = Bracket::with_options(
//!     "Setup",
//!     stream.clone(),
//!     BracketOptions::new().theme(Theme::plain()),
//! );
//! bracket.using_sync(|b| {
//!     b.task("Install dependencies");
//! });
//! assert_eq!(capture.contents(), "┌ Setup\n│ • Install dependencies\n└\n");
//! ```

pub mod bracket;
pub mod spinner;
pub mod stream;
pub mod tail;
pub mod theme;

pub use bracket::{Bracket, BracketOptions};
pub use spinner::Spinner;
pub use stream::{
    interception_suppressed, suppress_interception, CaptureWriter, OutputStream, Payload,
    SuppressGuard, TermWriter, Writer,
};
pub use tail::{tail_lines, Tail};
pub use theme::{should_use_colors, Theme};
