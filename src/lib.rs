//! Deltafuzz: a differential fuzz harness for binary delta-synchronization tools.
//!
//! A sync tool takes an original file and a modified copy and must rebuild the
//! original byte-for-byte from the copy plus whatever it fetches. Deltafuzz
//! manufactures adversarial originals and realistic edits, drives the tool's
//! `prepare` and `update` commands, and checks the reconstruction.
//!
//! The crate provides:
//! - Seedable buffer synthesis and mutation (`synth`)
//! - The trial/session loop around a tool (`harness`)
//! - Artifact persistence helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use deltafuzz::harness::{CommandTool, Harness, HarnessConfig, Session, UpdateMode};
//!
//! let config = HarnessConfig {
//!     mode: UpdateMode::File,
//!     ..HarnessConfig::default()
//! };
//! let harness = Harness::new(CommandTool::new("tdmsync"), config);
//! let mut session = Session::new(harness, 42);
//! let report = session.run(Some(100)).unwrap();
//! assert!(report.halt.is_none());
//! ```

pub mod harness;
pub mod io;
pub mod synth;

#[cfg(feature = "cli")]
pub mod cli;
