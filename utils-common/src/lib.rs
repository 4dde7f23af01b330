pub mod compression;
pub mod models;

// 重新导出常用类型和函数
pub use compression::{to_compressed, from_compressed, read_header, IndexError};
pub use models::{IndexMetadata, Post};
