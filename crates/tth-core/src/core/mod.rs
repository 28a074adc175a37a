//! Runtime pieces around the markup core.
//!
//! - `interrupt`: Ctrl+C handling
//! - `turn`: drives one streamed assistant turn into a markup sink

pub mod interrupt;
pub mod turn;
