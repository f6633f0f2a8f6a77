//! Override resolution and live reconciliation

pub mod autodetect;
pub mod promotion;
pub mod realtime;
pub mod session;
pub mod store;

pub use autodetect::{AutoDetectOverlay, SystemProbe};
pub use promotion::Promotions;
pub use realtime::{Clock, LiveApply, RealtimeScheduler, SystemClock};
pub use session::{EditingSession, Scope, SessionContext};
pub use store::{GlobalLayer, HotkeyStore, Layers, OverrideValue, ValueStore};
