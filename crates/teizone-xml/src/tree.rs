//! Arena-backed mutable XML tree
//!
//! Nodes live in a single arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Detaching a node only unlinks it; the arena slot stays valid so
//! handles held by callers never dangle. Only nodes reachable from the root
//! are serialized.

use crate::error::{Result, XmlError};
use crate::name::QName;

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An attribute of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name
    pub name: QName,
    /// Unescaped attribute value
    pub value: String,
}

/// Element payload: name plus attributes in document order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Element name
    pub name: QName,
    /// Attributes in insertion order
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element without attributes
    #[inline]
    #[must_use]
    pub const fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    /// Get an attribute value
    #[inline]
    #[must_use]
    pub fn attr(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, name: QName, value: String) {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            self.attributes.push(Attribute { name, value });
        }
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attr(&mut self, name: &QName) -> Option<String> {
        let idx = self.attributes.iter().position(|a| &a.name == name)?;
        Some(self.attributes.remove(idx).value)
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element(Element),
    /// Text node (unescaped)
    Text(String),
    /// Comment node (raw content between `<!--` and `-->`)
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable XML document with a single root element
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document holding only an empty root element
    #[must_use]
    pub fn new(root_name: QName) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element(root_name);
        doc
    }

    /// The root element
    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Make a detached or nested element the document root
    pub(crate) fn promote_to_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    /// Node payload
    #[inline]
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element payload, `None` for text and comments
    #[inline]
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Mutable element payload
    #[inline]
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Element name, `None` for text and comments
    #[inline]
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.element(id).map(|e| &e.name)
    }

    /// Whether the node is an element with the given name
    #[inline]
    #[must_use]
    pub fn is_named(&self, id: NodeId, name: &QName) -> bool {
        self.name(id) == Some(name)
    }

    /// Parent node, `None` for the root and detached nodes
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All child nodes in document order
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements in document order
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// Child elements with the given name
    pub fn child_elements_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a QName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.is_named(c, name))
    }

    /// First child element with the given name
    #[must_use]
    pub fn first_child_named(&self, id: NodeId, name: &QName) -> Option<NodeId> {
        self.child_elements_named(id, name).next()
    }

    /// Position of the node among its parent's children
    #[must_use]
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes[parent.0].children.iter().position(|&c| c == id)
    }

    /// Preceding sibling node of any kind
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        idx.checked_sub(1).map(|i| self.nodes[parent.0].children[i])
    }

    /// Following sibling node of any kind
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.nodes[parent.0].children.get(idx + 1).copied()
    }

    /// First following sibling element with the given name
    #[must_use]
    pub fn next_sibling_named(&self, id: NodeId, name: &QName) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.nodes[parent.0].children[idx + 1..]
            .iter()
            .copied()
            .find(|&c| self.is_named(c, name))
    }

    /// Attribute value of an element
    #[inline]
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &QName) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Set an attribute on an element; ignored for text and comments
    pub fn set_attr(&mut self, id: NodeId, name: QName, value: impl Into<String>) {
        if let Some(e) = self.element_mut(id) {
            e.set_attr(name, value.into());
        }
    }

    /// Remove an attribute from an element
    pub fn remove_attr(&mut self, id: NodeId, name: &QName) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove_attr(name))
    }

    /// Concatenated text content of the node and its descendants
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Comment(_) => {}
            NodeKind::Element(_) => {
                for &c in &self.nodes[id.0].children {
                    self.collect_text(c, out);
                }
            }
        }
    }

    /// Replace all children of an element with a single text node
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.remove_children(id);
        let t = self.create_text(text);
        self.nodes[t.0].parent = Some(id);
        self.nodes[id.0].children.push(t);
    }

    /// Unlink a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Unlink all children of a node
    pub fn remove_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for c in children {
            self.nodes[c.0].parent = None;
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(XmlError::InvalidStructure(
                "the root element cannot be re-parented".to_string(),
            ));
        }
        if self.element(parent).is_none() {
            return Err(XmlError::InvalidStructure(
                "only elements can have children".to_string(),
            ));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(XmlError::InvalidStructure(
                "cannot insert a node into itself or its descendants".to_string(),
            ));
        }
        Ok(())
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
    }

    /// Append a node as the last child of `parent`, moving it if attached
    ///
    /// # Errors
    ///
    /// Returns `XmlError::InvalidStructure` when `parent` is not an element or
    /// the insertion would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        self.detach(child);
        let len = self.nodes[parent.0].children.len();
        self.insert_at(parent, len, child);
        Ok(())
    }

    /// Insert a node immediately before `reference`, moving it if attached
    ///
    /// # Errors
    ///
    /// Returns `XmlError::InvalidArgument` when `reference` has no parent,
    /// or `XmlError::InvalidStructure` for cyclic insertions.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        if reference == child {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or_else(|| {
            XmlError::InvalidArgument("reference node is not attached".to_string())
        })?;
        self.check_insertable(parent, child)?;
        self.detach(child);
        let idx = self.index_in_parent(reference).ok_or_else(|| {
            XmlError::InvalidStructure("reference node missing from its parent".to_string())
        })?;
        self.insert_at(parent, idx, child);
        Ok(())
    }

    /// Put `new` where `old` is, detaching `old`
    ///
    /// # Errors
    ///
    /// Returns `XmlError::InvalidArgument` when `old` is detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.insert_before(old, new)?;
        self.detach(old);
        Ok(())
    }

    /// Copy a node and its subtree into a new detached node
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.push(kind);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let c = self.deep_copy(child);
            self.nodes[c.0].parent = Some(copy);
            self.nodes[copy.0].children.push(c);
        }
        copy
    }

    /// The node and all its descendants in document order
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for &c in self.nodes[n.0].children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }
}
