//! # XML 解析器
//!
//! 基于 `quick-xml` 的事件流构建 [`Document`] 树。
//!
//! XML 声明和 DOCTYPE 会被读取但不保留；实体引用被解析为字符并与相邻文本
//! 合并为同一个文本节点；根元素之外的空白文本被丢弃。

use std::{fs, path::Path, str};

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::debug;

use crate::{
    types::{XmlCause, XmlError},
    utils::{is_xml_blank, resolve_entity},
    xml_tree::{Document, NodeId},
};

/// 从文件加载 XML 文档。
///
/// # Errors
///
/// 文件不存在、无法读取或内容不是格式良好的 XML 时返回
/// `XmlError::DocumentLoad`，其中携带底层原因。
pub fn load_document_from_file(path: impl AsRef<Path>) -> Result<Document, XmlError> {
    let path = path.as_ref();
    let document = fs::read_to_string(path)
        .map_err(XmlCause::from)
        .and_then(|content| parse_document(&content))
        .map_err(|source| XmlError::DocumentLoad {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "已加载 XML 文档");
    Ok(document)
}

impl Document {
    /// 从字符串解析 XML 文档。
    ///
    /// # Errors
    ///
    /// 内容不是格式良好的 XML 时返回 `XmlError::Parse`。
    pub fn parse_str(content: &str) -> Result<Self, XmlError> {
        parse_document(content).map_err(XmlError::Parse)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlCause> {
    str::from_utf8(bytes).map_err(|e| XmlCause::Malformed(format!("无效的 UTF-8 内容: {e}")))
}

fn malformed(err: &XmlError) -> XmlCause {
    XmlCause::Malformed(err.to_string())
}

/// 解析的核心循环。
fn parse_document(content: &str) -> Result<Document, XmlCause> {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut document = Document::new();
    // 当前打开的元素，栈顶为最内层
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = create_element_from(&mut document, &reader, &e)?;
                attach(&mut document, &stack, element)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = create_element_from(&mut document, &reader, &e)?;
                attach(&mut document, &stack, element)?;
            }
            Event::End(_) => {
                // 标签名匹配由 quick-xml 检查
                stack.pop();
            }
            Event::Text(e) => {
                let text = e.xml_content()?;
                push_text(&mut document, &stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let entity_name = utf8(&e)?;
                let decoded = resolve_entity(entity_name).ok_or_else(|| {
                    XmlCause::Malformed(format!("未知或无效的实体引用 '&{entity_name};'"))
                })?;
                push_text(&mut document, &stack, decoded.encode_utf8(&mut [0; 4]))?;
            }
            Event::CData(e) => {
                let Some(&parent) = stack.last() else {
                    return Err(XmlCause::Malformed("根元素之外出现了 CDATA 段".to_string()));
                };
                let node = document.create_cdata_section(utf8(&e)?);
                document
                    .append_child(parent, node)
                    .map_err(|err| malformed(&err))?;
            }
            Event::Comment(e) => {
                let node = document.create_comment(utf8(&e)?);
                attach(&mut document, &stack, node)?;
            }
            Event::PI(e) => {
                let target = utf8(e.target())?;
                let pi_content = utf8(e.content())?.trim_start();
                let node = document
                    .create_processing_instruction(target, pi_content)
                    .map_err(|err| malformed(&err))?;
                attach(&mut document, &stack, node)?;
            }
            Event::Eof => break,
            // XML 声明与 DOCTYPE 不保留
            _ => {}
        }
    }

    if let Some(&open) = stack.last() {
        let name = document.tag_name(open).unwrap_or_default();
        return Err(XmlCause::Malformed(format!("元素 <{name}> 未闭合")));
    }
    if document.root_element().is_none() {
        return Err(XmlCause::Malformed("文档没有根元素".to_string()));
    }

    Ok(document)
}

fn create_element_from(
    document: &mut Document,
    reader: &Reader<&[u8]>,
    start: &BytesStart,
) -> Result<NodeId, XmlCause> {
    let qname = start.name();
    let element = document
        .create_element(utf8(qname.as_ref())?)
        .map_err(|err| malformed(&err))?;

    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        document
            .set_attribute(element, key, value.into_owned())
            .map_err(|err| malformed(&err))?;
    }

    Ok(element)
}

/// 挂接到当前打开的元素下；没有打开的元素时挂接为文档级节点。
fn attach(document: &mut Document, stack: &[NodeId], node: NodeId) -> Result<(), XmlCause> {
    let result = match stack.last() {
        Some(&parent) => document.append_child(parent, node),
        None => document.append_to_document(node),
    };
    result.map_err(|err| malformed(&err))
}

fn push_text(document: &mut Document, stack: &[NodeId], text: &str) -> Result<(), XmlCause> {
    match stack.last() {
        Some(&parent) => {
            document.append_text(parent, text);
            Ok(())
        }
        None if is_xml_blank(text) => Ok(()),
        None => Err(XmlCause::Malformed(format!(
            "根元素之外出现了文本: '{}'",
            text.trim()
        ))),
    }
}
