#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod cid;
mod hash;
mod registry;

pub use cid::*;
pub use hash::*;
pub use registry::*;
