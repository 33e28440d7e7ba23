pub mod message;
pub mod verdict;

pub use message::{InboundMessage, ScanRecord};
pub use verdict::{decide, Action, Verdict};
