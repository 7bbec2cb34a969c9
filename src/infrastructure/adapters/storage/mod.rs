//! Storage Adapter - 工作目录实现

mod work_dir;

pub use work_dir::{work_dir_key, FileWorkStorage};
