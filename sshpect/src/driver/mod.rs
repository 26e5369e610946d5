//! Session driver: the main command/response API.
//!
//! Commands go out as a line write; the reply is whatever the buffered read
//! engine recovers before the prompt pattern, a timeout, or a disconnect.

mod builder;
mod response;
mod session;

pub use builder::SessionBuilder;
pub use response::Response;
pub use session::{Session, SessionOptions};
