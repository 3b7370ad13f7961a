//! Widgetry window crate - the window subsystem contract and per-window
//! session lifecycle.
//!
//! # Modules
//!
//! - [`subsystem`]: traits a native window backend implements, plus the frame,
//!   event and message types exchanged with it
//! - [`session`]: the `Opening -> Hidden -> Visible -> Closed` state machine
//!   binding one widget id to one live window
//! - [`headless`]: an in-process backend that records every call, used by the
//!   binary when run headless and by tests

pub mod error;
pub mod headless;
pub mod session;
pub mod subsystem;

pub use error::WindowError;
pub use headless::{HeadlessWindow, HeadlessWindowState, HeadlessWindowSubsystem};
pub use session::{SessionEffect, SessionPhase, WindowSession};
pub use subsystem::{
    FrameOptions, PageMessage, WindowEvent, WindowEventRecord, WindowFrame, WindowHandle,
    WindowId, WindowMessage, WindowSubsystem,
};
