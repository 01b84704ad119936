pub mod reader;

pub use reader::ByteSource;
