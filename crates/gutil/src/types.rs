//! 定义了工具库中共用的错误类型。

use std::{io, path::PathBuf, string::FromUtf8Error};

use quick_xml::{
    Error as QuickXmlErrorMain, encoding::EncodingError,
    events::attributes::AttrError as QuickXmlAttrError,
};
use thiserror::Error;

//=============================================================================
// 1. XML 错误
//=============================================================================

/// XML 文档构建、加载和序列化过程中可能发生的错误。
#[derive(Error, Debug)]
pub enum XmlError {
    /// 元素名不是合法的 XML 名称。
    #[error("无效的元素名: '{0}'")]
    InvalidElementName(String),
    /// 属性名不是合法的 XML 名称。
    #[error("无效的属性名: '{0}'")]
    InvalidAttributeName(String),
    /// 违反文档树结构约束的插入操作，例如第二个根元素。
    #[error("非法的节点层级操作: {0}")]
    HierarchyRequest(String),
    /// 需要元素节点的操作收到了其他类型的节点。
    #[error("目标节点不是元素")]
    NotAnElement,
    /// 从内存文本解析文档失败。
    #[error("无法解析 XML 文档: {0}")]
    Parse(#[source] XmlCause),
    /// 从文件加载文档失败。
    #[error("无法从文件 {} 加载 XML 文档", .path.display())]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: XmlCause,
    },
    /// 将文档渲染为文本失败。
    #[error("无法将 XML 文档转换为字符串")]
    Serialization(#[source] XmlCause),
    /// 将文档写入文件失败。
    #[error("保存 XML 文档到 {} 时出错", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: XmlCause,
    },
}

/// XML 操作失败的底层原因。
#[derive(Error, Debug)]
pub enum XmlCause {
    /// 文件读写等IO错误。
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    /// XML 读写错误，通常来自 `quick-xml` 库。
    #[error("XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，通常来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// XML 文本编码或解码错误。
    #[error("文本编码或解码错误: {0}")]
    Encoding(#[from] EncodingError),
    /// 从字节序列转换为 UTF-8 字符串失败。
    #[error("UTF-8 转换错误: {0}")]
    Utf8(#[from] FromUtf8Error),
    /// 文档结构不合法（多个根元素、未闭合的元素等）。
    #[error("格式错误的 XML: {0}")]
    Malformed(String),
}

//=============================================================================
// 2. 文件系统错误
//=============================================================================

/// 文件工具函数可能返回的错误。
#[derive(Error, Debug)]
pub enum FileError {
    #[error("无法创建 {} - 已存在", .0.display())]
    AlreadyExists(PathBuf),
    #[error("无法操作 {} - 不是文件", .0.display())]
    NotAFile(PathBuf),
    #[error("无法操作 {} - 不是目录", .0.display())]
    NotADirectory(PathBuf),
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
}

//=============================================================================
// 3. 数值范围错误
//=============================================================================

/// 数值工具函数的参数错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// 下界大于上界。
    #[error("无效的参数，最小值 {{{min}}} 不能大于最大值 {{{max}}}")]
    InvalidBounds { min: String, max: String },
    /// 半开区间 `[min, max)` 中没有任何值。
    #[error("空的取值范围: [{min}, {max})")]
    EmptyRange { min: String, max: String },
}
