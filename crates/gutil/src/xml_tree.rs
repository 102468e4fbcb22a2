//! # XML 文档树
//!
//! 文档的所有节点都存放在 `Document` 持有的 arena (`Vec<NodeData>`) 中，
//! 通过 `NodeId` 引用。父节点持有有序的子节点列表；被移除的节点仍留在
//! arena 中，只是不再挂接到树上，其 `NodeId` 也不会被复用。
//!
//! 同一个 `Document` 的修改需要 `&mut` 借用，跨线程共享时由调用方负责同步。

use std::collections::BTreeMap;

use tracing::trace;

use crate::{
    types::XmlError,
    utils::{is_valid_xml_name, is_xml_blank},
};

/// 指向文档 arena 中某个节点的句柄。
///
/// 只在创建它的 `Document` 内有意义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 节点的类型及其内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// 元素。属性按名称排序存储，保证输出稳定。
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
    },
    /// 文本节点。
    Text(String),
    /// CDATA 段，归一化时与文本节点同等对待。
    CData(String),
    /// 注释。
    Comment(String),
    /// 处理指令，例如 `<?xml-stylesheet href="a.xsl"?>`。
    ProcessingInstruction { target: String, content: String },
}

impl NodeKind {
    /// 是否为内容全部由空白字符组成的文本（或 CDATA）节点。
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        match self {
            Self::Text(text) | Self::CData(text) => is_xml_blank(text),
            _ => false,
        }
    }

    /// 是否为元素节点。
    #[must_use]
    pub const fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Document,
    Node(NodeId),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<Parent>,
    children: Vec<NodeId>,
}

/// 内存中的 XML 文档。
///
/// 至多包含一个根元素；根元素前后还可以有注释和处理指令。
///
/// 除 `strip_insignificant_whitespace` 外，所有接受 `NodeId` 的方法在传入
/// 不属于本文档的句柄时会 panic。
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    children: Vec<NodeId>,
}

/// 创建一个没有根元素的空文档。
#[must_use]
pub fn create_empty_document() -> Document {
    Document::new()
}

/// 创建只包含一个名为 `root_tag` 的根元素的文档。
///
/// # Errors
///
/// `root_tag` 不是合法的 XML 名称时返回 `XmlError::InvalidElementName`。
pub fn create_document_with_root(root_tag: &str) -> Result<Document, XmlError> {
    let mut document = Document::new();
    let root = document.create_element(root_tag)?;
    document.append_to_document(root)?;
    Ok(document)
}

/// 返回文档的根元素。文档为 `None` 或没有根元素时返回 `None`。
#[must_use]
pub fn get_root_element(document: Option<&Document>) -> Option<NodeId> {
    document.and_then(Document::root_element)
}

impl Document {
    /// 创建一个空文档。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// 创建一个尚未挂接到树上的元素。
    ///
    /// # Errors
    ///
    /// 名称不合法时返回 `XmlError::InvalidElementName`。
    pub fn create_element(&mut self, name: &str) -> Result<NodeId, XmlError> {
        if !is_valid_xml_name(name) {
            return Err(XmlError::InvalidElementName(name.to_string()));
        }
        Ok(self.push_node(NodeKind::Element {
            name: name.to_string(),
            attributes: BTreeMap::new(),
        }))
    }

    /// 创建一个尚未挂接到树上的文本节点。
    pub fn create_text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    pub fn create_cdata_section(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::CData(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Comment(text.into()))
    }

    /// 创建处理指令节点。
    ///
    /// # Errors
    ///
    /// 目标名不合法时返回 `XmlError::InvalidElementName`。
    pub fn create_processing_instruction(
        &mut self,
        target: &str,
        content: impl Into<String>,
    ) -> Result<NodeId, XmlError> {
        if !is_valid_xml_name(target) {
            return Err(XmlError::InvalidElementName(target.to_string()));
        }
        Ok(self.push_node(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            content: content.into(),
        }))
    }

    /// 检查 `child` 能否被挂接到新位置。
    fn ensure_detached(&self, child: NodeId) -> Result<(), XmlError> {
        if self.nodes[child.0].parent.is_some() {
            return Err(XmlError::HierarchyRequest(
                "节点已经挂接在树上，需要先移除".to_string(),
            ));
        }
        Ok(())
    }

    /// 将 `child` 追加为元素 `parent` 的最后一个子节点。
    ///
    /// # Errors
    ///
    /// * `XmlError::NotAnElement` - `parent` 不是元素。
    /// * `XmlError::HierarchyRequest` - `child` 已挂接在树上，或 `child` 是
    ///   `parent` 自身或其祖先。
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), XmlError> {
        if !self.nodes[parent.0].kind.is_element() {
            return Err(XmlError::NotAnElement);
        }
        self.ensure_detached(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(XmlError::HierarchyRequest(
                "不能将节点插入到它自身或其后代之下".to_string(),
            ));
        }

        self.nodes[child.0].parent = Some(Parent::Node(parent));
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// 将 `child` 追加为文档级子节点。
    ///
    /// 文档级只允许一个元素，以及任意数量的注释和处理指令。
    ///
    /// # Errors
    ///
    /// 违反上述约束或 `child` 已挂接在树上时返回 `XmlError::HierarchyRequest`。
    pub fn append_to_document(&mut self, child: NodeId) -> Result<(), XmlError> {
        self.ensure_detached(child)?;
        match &self.nodes[child.0].kind {
            NodeKind::Element { .. } if self.root_element().is_some() => {
                return Err(XmlError::HierarchyRequest(
                    "文档已经有根元素".to_string(),
                ));
            }
            NodeKind::Text(_) | NodeKind::CData(_) => {
                return Err(XmlError::HierarchyRequest(
                    "文本不能直接作为文档的子节点".to_string(),
                ));
            }
            _ => {}
        }

        self.nodes[child.0].parent = Some(Parent::Document);
        self.children.push(child);
        Ok(())
    }

    /// 从元素 `parent` 中移除子节点 `child`。被移除的节点可以重新挂接。
    ///
    /// # Errors
    ///
    /// `child` 不是 `parent` 的子节点时返回 `XmlError::HierarchyRequest`。
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), XmlError> {
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| XmlError::HierarchyRequest("节点不是该元素的子节点".to_string()))?;
        self.detach_at(parent, index);
        Ok(())
    }

    /// 向元素末尾追加文本；若最后一个子节点本身是文本节点则直接拼接。
    ///
    /// 解析器会把被实体引用切开的文本片段交给这里合并。
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text_node(text);
        self.nodes[node.0].parent = Some(Parent::Node(parent));
        self.nodes[parent.0].children.push(node);
    }

    fn detach_at(&mut self, parent: NodeId, index: usize) -> NodeId {
        let child = self.nodes[parent.0].children.remove(index);
        self.nodes[child.0].parent = None;
        child
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// 设置元素属性，已存在的同名属性会被覆盖。
    ///
    /// # Errors
    ///
    /// * `XmlError::NotAnElement` - `element` 不是元素。
    /// * `XmlError::InvalidAttributeName` - 属性名不合法。
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), XmlError> {
        if !is_valid_xml_name(name) {
            return Err(XmlError::InvalidAttributeName(name.to_string()));
        }
        match &mut self.nodes[element.0].kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.to_string(), value.into());
                Ok(())
            }
            _ => Err(XmlError::NotAnElement),
        }
    }

    /// 读取元素属性。节点不是元素或属性不存在时返回 `None`。
    #[must_use]
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[element.0].kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// 元素的全部属性，按名称排序。
    pub fn attributes(&self, element: NodeId) -> impl Iterator<Item = (&str, &str)> {
        let attributes = match &self.nodes[element.0].kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        };
        attributes
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// 节点的有序子节点列表。
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// 文档级子节点（根元素以及其前后的注释、处理指令）。
    #[must_use]
    pub fn document_children(&self) -> &[NodeId] {
        &self.children
    }

    /// 父元素。文档级节点和未挂接的节点返回 `None`。
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id.0].parent {
            Some(Parent::Node(parent)) => Some(parent),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// 拼接节点及其所有后代中的文本（含 CDATA）。
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            match &self.nodes[id.0].kind {
                NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
                NodeKind::Element { .. } => {
                    pending.extend(self.nodes[id.0].children.iter().rev());
                }
                NodeKind::Comment(_) | NodeKind::ProcessingInstruction { .. } => {}
            }
        }
        out
    }

    /// 文档的根元素，空文档返回 `None`。
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children
            .iter()
            .copied()
            .find(|&id| self.nodes[id.0].kind.is_element())
    }

    /// 移除 `element` 整棵子树中所有只包含空白的文本节点。
    ///
    /// 子节点从最后一个向第一个遍历：移除下标 `i` 的节点只会移动已经访问过的
    /// 那一段，因此每个原始子节点都恰好被访问一次。元素子节点会先于其前面的
    /// 兄弟节点被处理，注释和处理指令保持不变。遍历使用显式栈，嵌套深度不受
    /// 调用栈大小限制。
    ///
    /// `element` 为 `None`、不是元素或不属于本文档时什么也不做。
    pub fn strip_insignificant_whitespace(&mut self, element: Option<NodeId>) {
        let Some(element) = element else {
            return;
        };
        if !self
            .nodes
            .get(element.0)
            .is_some_and(|data| data.kind.is_element())
        {
            return;
        }

        // 每一帧记录元素及其下一个待访问子节点之后的下标
        let mut stack = vec![(element, self.nodes[element.0].children.len())];
        while let Some(frame) = stack.last_mut() {
            let (parent, next) = *frame;
            let Some(i) = next.checked_sub(1) else {
                stack.pop();
                continue;
            };
            frame.1 = i;

            let child = self.nodes[parent.0].children[i];
            let kind = &self.nodes[child.0].kind;
            if kind.is_blank_text() {
                self.detach_at(parent, i);
                trace!(parent = parent.0, child = child.0, "移除空白文本节点");
            } else if kind.is_element() {
                stack.push((child, self.nodes[child.0].children.len()));
            }
        }
    }

    /// 对根元素执行 [`Document::strip_insignificant_whitespace`]。
    pub fn normalize(&mut self) {
        self.strip_insignificant_whitespace(self.root_element());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .iter()
            .map(|&id| match doc.node(id) {
                NodeKind::Element { name, .. } => name.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let doc = create_empty_document();
        assert_eq!(doc.root_element(), None);
        assert!(doc.document_children().is_empty());
    }

    #[test]
    fn test_document_with_root() {
        let doc = create_document_with_root("my_root").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.tag_name(root), Some("my_root"));
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn test_document_with_invalid_root_name() {
        assert!(matches!(
            create_document_with_root("1root"),
            Err(XmlError::InvalidElementName(name)) if name == "1root"
        ));
        assert!(matches!(
            create_document_with_root(""),
            Err(XmlError::InvalidElementName(_))
        ));
    }

    #[test]
    fn test_get_root_element_is_null_safe() {
        assert_eq!(get_root_element(None), None);
        let empty = create_empty_document();
        assert_eq!(get_root_element(Some(&empty)), None);
        let rooted = create_document_with_root("root").unwrap();
        assert_eq!(get_root_element(Some(&rooted)), rooted.root_element());
    }

    #[test]
    fn test_second_root_is_rejected() {
        let mut doc = create_document_with_root("root").unwrap();
        let other = doc.create_element("other").unwrap();
        assert!(matches!(
            doc.append_to_document(other),
            Err(XmlError::HierarchyRequest(_))
        ));
        let text = doc.create_text_node("x");
        assert!(matches!(
            doc.append_to_document(text),
            Err(XmlError::HierarchyRequest(_))
        ));
        let comment = doc.create_comment(" header ");
        doc.append_to_document(comment).unwrap();
        assert_eq!(doc.document_children().len(), 2);
    }

    #[test]
    fn test_append_child_rejects_cycles_and_reattachment() {
        let mut doc = create_document_with_root("root").unwrap();
        let root = doc.root_element().unwrap();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(root, a).unwrap();
        doc.append_child(a, b).unwrap();

        assert!(matches!(
            doc.append_child(b, a),
            Err(XmlError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(root, b),
            Err(XmlError::HierarchyRequest(_))
        ));

        doc.remove_child(a, b).unwrap();
        assert_eq!(doc.parent(b), None);
        doc.append_child(root, b).unwrap();
        assert_eq!(element_names(&doc, root), ["a", "b"]);

        let text = doc.create_text_node("t");
        assert!(matches!(
            doc.append_child(text, a),
            Err(XmlError::NotAnElement)
        ));
    }

    #[test]
    fn test_attributes() {
        let mut doc = create_document_with_root("root").unwrap();
        let root = doc.root_element().unwrap();
        doc.set_attribute(root, "b", "2").unwrap();
        doc.set_attribute(root, "a", "1").unwrap();
        doc.set_attribute(root, "b", "3").unwrap();
        assert_eq!(doc.attribute(root, "b"), Some("3"));
        assert_eq!(doc.attribute(root, "missing"), None);
        assert_eq!(
            doc.attributes(root).collect::<Vec<_>>(),
            [("a", "1"), ("b", "3")]
        );
        assert!(matches!(
            doc.set_attribute(root, "bad name", "x"),
            Err(XmlError::InvalidAttributeName(_))
        ));
        let text = doc.create_text_node("t");
        assert!(matches!(
            doc.set_attribute(text, "a", "1"),
            Err(XmlError::NotAnElement)
        ));
    }

    #[test]
    fn test_strip_removes_interleaved_whitespace_without_skipping() {
        let mut doc = create_document_with_root("parent").unwrap();
        let parent = doc.root_element().unwrap();
        let t1 = doc.create_text_node(" ");
        let a = doc.create_element("A").unwrap();
        let t2 = doc.create_text_node("\n");
        let b = doc.create_element("B").unwrap();
        let t3 = doc.create_text_node("  ");
        for child in [t1, a, t2, b, t3] {
            doc.append_child(parent, child).unwrap();
        }

        doc.strip_insignificant_whitespace(Some(parent));

        assert_eq!(doc.children(parent), [a, b]);
        assert_eq!(doc.parent(t2), None);
    }

    #[test]
    fn test_strip_keeps_non_blank_text_untouched() {
        let mut doc = create_document_with_root("root").unwrap();
        let root = doc.root_element().unwrap();
        let blank = doc.create_text_node("   \n\t");
        let content = doc.create_text_node("  x  ");
        doc.append_child(root, blank).unwrap();
        doc.append_child(root, content).unwrap();

        doc.normalize();

        assert_eq!(doc.children(root), [content]);
        assert_eq!(doc.node(content), &NodeKind::Text("  x  ".to_string()));
    }

    #[test]
    fn test_strip_recurses_and_keeps_comments() {
        let mut doc = create_document_with_root("root").unwrap();
        let root = doc.root_element().unwrap();
        let child = doc.create_element("child").unwrap();
        let grandchild = doc.create_element("grandchild").unwrap();
        let comment = doc.create_comment(" ");
        let ws_deep = doc.create_text_node("\n        ");
        let cdata = doc.create_cdata_section("\t");
        let ws_top = doc.create_text_node("\n    ");
        doc.append_child(root, ws_top).unwrap();
        doc.append_child(root, child).unwrap();
        doc.append_child(child, ws_deep).unwrap();
        doc.append_child(child, grandchild).unwrap();
        doc.append_child(child, comment).unwrap();
        doc.append_child(child, cdata).unwrap();
        doc.set_attribute(grandchild, "attr", " ").unwrap();

        doc.normalize();

        assert_eq!(doc.children(root), [child]);
        assert_eq!(doc.children(child), [grandchild, comment]);
        assert_eq!(doc.attribute(grandchild, "attr"), Some(" "));
    }

    #[test]
    fn test_strip_is_idempotent() {
        let mut doc = create_document_with_root("root").unwrap();
        let root = doc.root_element().unwrap();
        let a = doc.create_element("a").unwrap();
        let ws = doc.create_text_node(" \r\n");
        let text = doc.create_text_node("keep");
        doc.append_child(root, ws).unwrap();
        doc.append_child(root, a).unwrap();
        doc.append_child(a, text).unwrap();

        doc.normalize();
        let once = (doc.children(root).to_vec(), doc.children(a).to_vec());
        doc.normalize();
        let twice = (doc.children(root).to_vec(), doc.children(a).to_vec());

        assert_eq!(once, twice);
        assert_eq!(doc.text_content(root), "keep");
    }

    #[test]
    fn test_strip_ignores_absent_and_non_element_nodes() {
        let mut doc = create_empty_document();
        doc.strip_insignificant_whitespace(None);
        doc.normalize();

        let text = doc.create_text_node("  ");
        doc.strip_insignificant_whitespace(Some(text));
        assert_eq!(doc.node(text), &NodeKind::Text("  ".to_string()));
    }

    #[test]
    fn test_strip_handles_deep_nesting() {
        const DEPTH: usize = 5000;
        let mut doc = create_document_with_root("root").unwrap();
        let mut parent = doc.root_element().unwrap();
        for _ in 0..DEPTH {
            let ws = doc.create_text_node("\n  ");
            let child = doc.create_element("a").unwrap();
            doc.append_child(parent, ws).unwrap();
            doc.append_child(parent, child).unwrap();
            parent = child;
        }
        let leaf = doc.create_text_node("leaf");
        doc.append_child(parent, leaf).unwrap();

        doc.normalize();

        let mut current = doc.root_element().unwrap();
        for _ in 0..DEPTH {
            let children = doc.children(current);
            assert_eq!(children.len(), 1);
            current = children[0];
        }
        assert_eq!(doc.children(current), [leaf]);
        assert_eq!(doc.text_content(doc.root_element().unwrap()), "leaf");
    }
}
