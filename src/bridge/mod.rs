//! Call bridge: the coordinator, the per-call session loop, and the legs it drives

pub mod coordinator;
pub mod leg;
pub mod pending;
pub mod session;

pub use coordinator::{Action, CallSession, Coordinator};
pub use leg::{Leg, LegPeer};
pub use pending::{PendingCall, PendingCalls};
pub use session::{CallEnd, CallRelay};
