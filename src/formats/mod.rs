//! Output format modules for locus
//!
//! Every query answers with one vimson value.

pub mod vimson;

pub use vimson::{quote, record, VimsonWriter, EMPTY_LIST, EMPTY_RECORD};
