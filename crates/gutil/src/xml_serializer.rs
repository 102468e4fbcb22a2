//! # XML 序列化
//!
//! 将 [`Document`] 渲染为带缩进的 XML 文本。
//!
//! 输出以 `<?xml version="1.0" encoding="UTF-8" standalone="no"?>` 开头，
//! 每个文档级节点独占一行。只包含元素、注释和处理指令的元素会把每个子节点
//! 放到单独一行并按层级缩进；含有文本或 CDATA 的元素（混合内容）原样内联
//! 输出，不添加任何空白。
//!
//! 序列化前会先对根元素执行空白归一化，否则原有的缩进空白会与生成的缩进叠加。

use std::{
    fs::File,
    io::{BufWriter, Cursor, Write},
    path::Path,
};

use quick_xml::{
    Writer,
    events::{
        BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event,
        attributes::Attribute,
    },
    name::QName,
};
use tracing::debug;

use crate::{
    types::{XmlCause, XmlError},
    utils::{escape_attribute, escape_text},
    xml_tree::{Document, NodeId, NodeKind},
};

/// 默认的缩进宽度。
pub const DEFAULT_INDENT: usize = 4;

/// 可复用的 XML 序列化器，创建后不可修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serializer {
    indent_width: usize,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT)
    }
}

impl Serializer {
    /// 创建每层缩进 `indent_width` 个空格的序列化器。
    #[must_use]
    pub const fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    #[must_use]
    pub const fn indent_width(&self) -> usize {
        self.indent_width
    }

    /// 将文档渲染为字符串，不做归一化，也不修剪结果。
    ///
    /// # Errors
    ///
    /// 写入失败或产生非 UTF-8 输出时返回对应的底层原因。
    pub fn render(&self, document: &Document) -> Result<String, XmlCause> {
        let mut buffer = Vec::new();
        self.write_document(document, Cursor::new(&mut buffer))?;
        Ok(String::from_utf8(buffer)?)
    }

    /// 将 XML 声明和整棵文档树写入 `output`，末尾不带换行。
    ///
    /// # Errors
    ///
    /// 底层写入失败时返回 `XmlCause::Io` 或 `XmlCause::Xml`。
    pub fn write_document<W: Write>(&self, document: &Document, output: W) -> Result<(), XmlCause> {
        let mut writer = Writer::new(output);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;

        for &child in document.document_children() {
            self.write_line_break(&mut writer, 0)?;
            self.write_node(&mut writer, document, child, Some(0))?;
        }

        Ok(())
    }

    fn write_line_break<W: Write>(
        &self,
        writer: &mut Writer<W>,
        depth: usize,
    ) -> Result<(), XmlCause> {
        let line_break = format!("\n{}", " ".repeat(self.indent_width * depth));
        writer.write_event(Event::Text(BytesText::from_escaped(line_break)))?;
        Ok(())
    }

    /// 写入以 `id` 为根的子树。`depth` 为 `None` 表示处于混合内容中，不再添加缩进。
    ///
    /// 使用显式栈遍历，嵌套深度不受调用栈大小限制。
    fn write_node<W: Write>(
        &self,
        writer: &mut Writer<W>,
        document: &Document,
        id: NodeId,
        depth: Option<usize>,
    ) -> Result<(), XmlCause> {
        let mut steps = vec![Step::Node(id, depth)];
        while let Some(step) = steps.pop() {
            match step {
                Step::LineBreak(depth) => self.write_line_break(writer, depth)?,
                Step::End(name, depth) => {
                    if let Some(depth) = depth {
                        self.write_line_break(writer, depth)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                }
                Step::Node(id, depth) => {
                    write_single_node(writer, document, id, depth, &mut steps)?;
                }
            }
        }
        Ok(())
    }
}

/// 序列化过程中尚未完成的工作，按出栈顺序执行。
enum Step<'a> {
    Node(NodeId, Option<usize>),
    LineBreak(usize),
    /// 结束标签；带有层级时先换行缩进到该层级。
    End(&'a str, Option<usize>),
}

/// 写出节点本身，元素的子节点和结束标签压入 `steps` 稍后处理。
fn write_single_node<'a, W: Write>(
    writer: &mut Writer<W>,
    document: &'a Document,
    id: NodeId,
    depth: Option<usize>,
    steps: &mut Vec<Step<'a>>,
) -> Result<(), XmlCause> {
    match document.node(id) {
        NodeKind::Element { name, attributes } => {
            let mut start = BytesStart::new(name.as_str());
            for (key, value) in attributes {
                start.push_attribute(Attribute {
                    key: QName(key.as_bytes()),
                    value: escape_attribute(value).into_owned().into_bytes().into(),
                });
            }

            let children = document.children(id);
            if children.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }

            writer.write_event(Event::Start(start))?;
            let indented = depth.filter(|_| is_element_only(document, children));
            steps.push(Step::End(name.as_str(), indented));
            for &child in children.iter().rev() {
                match indented {
                    Some(depth) => {
                        steps.push(Step::Node(child, Some(depth + 1)));
                        steps.push(Step::LineBreak(depth + 1));
                    }
                    None => steps.push(Step::Node(child, None)),
                }
            }
        }
        NodeKind::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))?;
        }
        NodeKind::CData(text) => {
            // "]]>" 不能出现在 CDATA 段内，拆成两个段
            let split = text.replace("]]>", "]]]]><![CDATA[>");
            writer.write_event(Event::CData(BytesCData::new(split)))?;
        }
        NodeKind::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
        NodeKind::ProcessingInstruction { target, content } => {
            let pi = if content.is_empty() {
                target.clone()
            } else {
                format!("{target} {content}")
            };
            writer.write_event(Event::PI(BytesPI::new(pi)))?;
        }
    }

    Ok(())
}

/// 子节点中没有文本和 CDATA 时才允许添加缩进。
fn is_element_only(document: &Document, children: &[NodeId]) -> bool {
    children
        .iter()
        .all(|&child| !matches!(document.node(child), NodeKind::Text(_) | NodeKind::CData(_)))
}

/// 使用默认序列化器（缩进 4）将文档转换为字符串。
///
/// 会先就地归一化根元素；返回值已去除首尾空白。
///
/// # Errors
///
/// 渲染失败时返回 `XmlError::Serialization`。
pub fn to_text(document: &mut Document) -> Result<String, XmlError> {
    to_text_with(document, &Serializer::default())
}

/// 使用指定的序列化器将文档转换为字符串。
///
/// # Errors
///
/// 渲染失败时返回 `XmlError::Serialization`。
pub fn to_text_with(document: &mut Document, serializer: &Serializer) -> Result<String, XmlError> {
    document.normalize();
    let rendered = serializer
        .render(document)
        .map_err(XmlError::Serialization)?;
    Ok(rendered.trim().to_string())
}

/// 使用默认序列化器将文档保存到文件。
///
/// # Errors
///
/// 见 [`save_to_file_with`]。
pub fn save_to_file(document: &mut Document, path: impl AsRef<Path>) -> Result<(), XmlError> {
    save_to_file_with(document, path, &Serializer::default())
}

/// 以指定缩进宽度将文档保存到文件。
///
/// # Errors
///
/// 见 [`save_to_file_with`]。
pub fn save_to_file_with_indent(
    document: &mut Document,
    path: impl AsRef<Path>,
    indent: usize,
) -> Result<(), XmlError> {
    save_to_file_with(document, path, &Serializer::new(indent))
}

/// 使用指定的序列化器将文档保存到文件，文件末尾带一个换行。
///
/// 会先就地归一化根元素。写入不是事务性的：渲染中途失败时，
/// 已写入的部分内容会留在文件中。
///
/// # Errors
///
/// 创建、写入或刷新文件失败时返回 `XmlError::FileWrite`。
pub fn save_to_file_with(
    document: &mut Document,
    path: impl AsRef<Path>,
    serializer: &Serializer,
) -> Result<(), XmlError> {
    let path = path.as_ref();
    document.normalize();
    write_file(document, path, serializer).map_err(|source| XmlError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "已保存 XML 文档");
    Ok(())
}

fn write_file(document: &Document, path: &Path, serializer: &Serializer) -> Result<(), XmlCause> {
    let mut output = BufWriter::new(File::create(path)?);
    serializer.write_document(document, &mut output)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}
