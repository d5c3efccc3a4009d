//! masterini - Two-tier master/local INI configuration store
//!
//! This crate layers two INI stores: a master layer for site-wide
//! settings distributed from a central source, and a local layer for
//! per-host overrides. Reads consult the local layer first and fall back
//! to master one option at a time; every mutation lands in the local
//! layer, so the master file is never modified by the host consuming it.

pub mod error;
pub mod ini;
pub mod master;

pub use error::IniError;
pub use ini::{Ini, OptionTransform, DEFAULT_SECTION};
pub use master::{Layer, MasterIni};
