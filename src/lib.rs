// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod classifier;
pub mod context;
pub mod partition;
pub mod pipeline;
pub mod progress;
pub mod rewriter;
pub mod scanner;
pub mod typemap;
