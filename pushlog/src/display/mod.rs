//! Display module for periodically printing newly stored records.
//!
//! ## Flow
//!
//! ```text
//! timer → query_recent → diff against previous tick → render_report → stdout
//! ```

pub mod poller;
pub mod report;

pub use poller::DisplayPoller;
pub use report::{format_event_time, render_report};
