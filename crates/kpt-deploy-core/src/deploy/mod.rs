//! Deploy sessions: reconcile, render, apply, destroy.

pub mod artifacts;
pub mod session;

pub use artifacts::{Artifact, ImageList};
pub use session::Deployer;
