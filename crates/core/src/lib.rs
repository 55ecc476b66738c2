#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod node;
mod path;
mod read;
mod store;
mod tree;
mod visitor;

pub use node::*;
pub use path::*;
pub use read::*;
pub use store::*;
pub use tree::*;
pub use visitor::*;

/// The fixed share byte-length carried by each leaf.
pub const SHARE_SIZE: usize = 256;
