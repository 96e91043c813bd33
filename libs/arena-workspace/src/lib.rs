//! Client-side code workspace for the Arena assessment platform.
//!
//! The workspace owns everything between the editor and the judge: run and
//! submit orchestration, response normalization, compiler diagnostic
//! placement, pane layout geometry and paste policing. Rendering is left to
//! whatever presentation layer reads [`session::WorkspaceSnapshot`].

pub mod backend;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod host;
pub mod layout;
pub mod normalizer;
pub mod paste_guard;
pub mod progress;
pub mod session;


pub use controller::{ActionOutcome, ActionRejection, ExecutionController, Phase};
pub use session::{WorkspaceSession, WorkspaceSnapshot};
