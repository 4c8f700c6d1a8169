//! glidenav-core: Pure NMEA-0183 + FLARM decode and tracking library.
//!
//! No async, no I/O — just algorithms. One `ParserSession` per connected
//! device feeds a `NavigationState` snapshot that downstream consumers
//! (rendering, calculations) read once per cycle.

pub mod config;
pub mod geo;
pub mod sentences;
pub mod session;
pub mod state;
pub mod tokenizer;
pub mod traffic;
pub mod types;
pub mod units;

// Re-export commonly used types at crate root
pub use sentences::{classify, SentenceId};
pub use session::{Outcome, ParserSession, SessionCaps};
pub use state::{NavigationState, TrafficStatus};
pub use traffic::{TrafficSlot, TrafficTable};
pub use types::*;
