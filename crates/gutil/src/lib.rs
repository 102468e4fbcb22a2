//! 一组互不相关的小型工具函数：XML 文档的创建、加载、空白归一化与序列化，
//! 以及日期计算、文件大小单位、文件系统操作、数值范围和字符串处理。

pub mod calendar;
pub mod file_size;
pub mod file_util;
pub mod math_util;
pub mod string_util;
pub mod types;
mod utils;
mod xml_parser;
mod xml_serializer;
mod xml_tree;

pub use file_size::FileSizeUnit;
pub use types::{FileError, RangeError, XmlCause, XmlError};
pub use xml_parser::load_document_from_file;
pub use xml_serializer::{
    DEFAULT_INDENT, Serializer, save_to_file, save_to_file_with, save_to_file_with_indent,
    to_text, to_text_with,
};
pub use xml_tree::{
    Document, NodeId, NodeKind, create_document_with_root, create_empty_document,
    get_root_element,
};
