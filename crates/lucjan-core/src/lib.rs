//! Data and control layer between `lucjan-api` and the CLI.
//!
//! - **[`Poller`]** owns the device client: [`connect()`](Poller::connect)
//!   runs the first poll, then spawns the scheduled refresh task and the
//!   command processor. [`Poller::oneshot()`](Poller::oneshot) is the
//!   single-shot mode used by CLI invocations.
//!
//! - **[`Snapshot`]** is the immutable view built from one `thermos.json`
//!   read plus one `config.txt` read. A failed poll never replaces the last
//!   good snapshot.
//!
//! - **[`SnapshotStream`]** is the subscription handle for consumers that
//!   follow snapshot replacements.
//!
//! - **[`Command`]** is the typed write request routed through an `mpsc`
//!   channel to the command processor, one command at a time.
//!
//! - **Controls** ([`controls`]) describe every adjustable setting as a
//!   table row interpreted by one generic adapter, with
//!   [`ControlHandle`] adding optimistic display state.

pub mod command;
pub mod config;
pub mod controls;
mod convert;
pub mod error;
pub mod optimistic;
pub mod poller;
pub mod snapshot;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::PollerConfig;
pub use controls::{ControlDescriptor, ControlKind, ControlValue, controls, find_control};
pub use error::CoreError;
pub use optimistic::{ControlHandle, OptimisticState};
pub use poller::{ConnectionState, PollStatus, Poller};
pub use snapshot::{BoilerSettings, Probe, Snapshot};
pub use stream::{SnapshotStream, SnapshotWatchStream};

// Device-level types consumers need to build commands.
pub use lucjan_api::{Circuit, Output, SystemCommand};
