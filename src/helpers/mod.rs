//! # Helpers
//!
//! Byte-level plumbing shared by the import pipeline: unified local/remote
//! reading, ZIP member access and quick-xml event helpers.

pub(crate) mod reader;
pub(crate) mod xml;
pub(crate) mod zip;
