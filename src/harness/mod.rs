// Differential test loop around an external delta-synchronization tool.

pub mod session;
pub mod tool;
pub mod trial;

pub use session::{Case, Halt, Session, SessionReport, replay};
pub use tool::{CommandTool, Reference, SyncTool, ToolError, ToolFailure, ToolOp};
pub use trial::{Harness, HarnessConfig, HarnessError, Mismatch, TrialOutcome, UpdateMode};
