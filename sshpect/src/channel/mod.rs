//! Channel layer: the buffered pattern-matching read engine.
//!
//! A background reader task pulls chunks off the stream and hands them to
//! the consumer over a bounded queue; the consumer accumulates them in a
//! session buffer and evaluates match targets against it at a fixed poll
//! interval.

mod buffer;
mod patterns;
mod reader;
mod shell;

pub use patterns::{Pattern, PatternMatch};
pub use shell::{ChannelConfig, MatchStatus, ReadResult, ShellChannel};
