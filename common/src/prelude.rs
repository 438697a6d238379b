pub use crate::vfile::{DirFileSystem, MemFileSystem, VFile, VFileSystem};
pub use crate::vpath;
