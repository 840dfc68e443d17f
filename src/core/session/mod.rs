// Session state: the token handle, the event log and the controller that owns both.

pub mod session_controller;
pub mod session_handle;
pub mod session_history;

pub use session_controller::{SessionController, SubmitOutcome};
pub use session_handle::SessionHandle;
pub use session_history::{HistorySnapshot, HistoryState, SessionHistory};
