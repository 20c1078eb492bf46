//! Named interval timers.
//!
//! ```
//! use runtime_monitor::TimerRegistry;
//!
//! let monitor = TimerRegistry::new();
//!
//! monitor.begin("load");
//! monitor.end("load").unwrap();
//!
//! let _ = monitor.measure("parse", || "42".parse::<u32>());
//!
//! {
//!     let _timer = monitor.scope("render");
//! }
//!
//! monitor.report().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod telemetry;

pub use config::ReportConfig;
pub use error::{Result, TimerError};
pub use monitor::{ReportSummary, ScopedTimer, TimerRegistry, TimerState, TimingRecord};
