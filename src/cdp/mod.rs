//! Chrome DevTools Protocol client
//!
//! The pieces needed to drive a tab over the remote-debugging surface:
//! - HTTP endpoint discovery (`/json/version`, `/json`)
//! - WebSocket transport with id-correlated responses
//! - Connection/session command wrappers

pub mod connection;
pub mod endpoint;
pub mod transport;
pub mod types;

pub use connection::{Connection, Session};
pub use endpoint::{DebugEndpoint, TabTarget, VersionInfo};
pub use transport::{launch_chrome, Transport};
pub use types::{KeyEventType, MouseButton, MouseEventType};
