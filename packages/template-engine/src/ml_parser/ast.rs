//! ML Parser AST
//!
//! A parsed template is a flat, arena-indexed node array. Every node carries
//! a back-reference to the component that structurally encloses it, so the
//! array encodes a tree without any node owning another. A `Template` is
//! immutable once built and can be shared freely between threads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type NodeIndex = usize;

/// The structurally enclosing component of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Container {
    /// No enclosing component: the node sits directly under the template root.
    Root,
    /// Index of the enclosing component node in the same node array.
    Node(NodeIndex),
}

impl Container {
    pub fn is_root(&self) -> bool {
        matches!(self, Container::Root)
    }
}

/// A classified attribute or property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Literal(String),
    Expression(String),
    DataBinding(String),
    Asset(String),
    Parameter(String),
    Localization(String),
    NestedTemplate(Arc<Template>),
}

impl AttrValue {
    pub fn is_literal(&self) -> bool {
        matches!(self, AttrValue::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::Literal(_) => "literal",
            AttrValue::Expression(_) => "expression",
            AttrValue::DataBinding(_) => "data binding",
            AttrValue::Asset(_) => "asset",
            AttrValue::Parameter(_) => "parameter",
            AttrValue::Localization(_) => "localization",
            AttrValue::NestedTemplate(_) => "template",
        }
    }
}

/// One piece of a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    Text(String),
    Expression(String),
    Statements(String),
    DataBinding(String),
    Parameter(String),
    /// Asset path relative to the template's context path.
    Asset(String),
    Localization(String),
}

impl Fragment {
    pub fn is_text(&self) -> bool {
        matches!(self, Fragment::Text(_))
    }
}

/// A merged run of adjacent literal/expression/statement/binding fragments
/// rendered as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositeLiteral {
    fragments: Vec<Fragment>,
}

impl CompositeLiteral {
    /// Builds a composite, coalescing adjacent text fragments.
    pub fn new(fragments: Vec<Fragment>) -> Self {
        let mut merged: Vec<Fragment> = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            if let (Some(Fragment::Text(prev)), Fragment::Text(next)) = (merged.last_mut(), &fragment) {
                prev.push_str(next);
                continue;
            }
            merged.push(fragment);
        }
        CompositeLiteral { fragments: merged }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn has_data_bindings(&self) -> bool {
        self.fragments
            .iter()
            .any(|f| matches!(f, Fragment::DataBinding(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextContent {
    Literal(String),
    Composite(CompositeLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Text {
        container: Container,
        content: TextContent,
    },
    Component {
        container: Container,
        type_name: String,
        /// Lower-cased attribute name to value; dotted names are
        /// subproperties.
        attributes: IndexMap<String, AttrValue>,
    },
}

impl Node {
    pub fn container(&self) -> Container {
        match self {
            Node::Text { container, .. } | Node::Component { container, .. } => *container,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Node::Component { .. })
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Node::Component { type_name, .. } => Some(type_name),
            Node::Text { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        match self {
            Node::Component { attributes, .. } => attributes.get(&name.to_ascii_lowercase()),
            Node::Text { .. } => None,
        }
    }
}

/// Immutable parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
    pub(crate) directive: Option<IndexMap<String, AttrValue>>,
    pub(crate) context_path: PathBuf,
    pub(crate) source_file: Option<PathBuf>,
    pub(crate) starting_line: usize,
    pub(crate) is_source_template: bool,
    pub(crate) hash: String,
    pub(crate) included_files: Vec<PathBuf>,
}

impl Template {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Nodes whose container is `container`, with their indices.
    pub fn children_of(&self, container: Container) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.container() == container)
    }

    /// Name-value pairs of the directive block (plus any root-level property
    /// tags), if the template had any.
    pub fn directive(&self) -> Option<&IndexMap<String, AttrValue>> {
        self.directive.as_ref()
    }

    /// Directory used to resolve relative asset references.
    pub fn context_path(&self) -> &Path {
        &self.context_path
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Line offset of the first line of this template inside its source.
    pub fn starting_line(&self) -> usize {
        self.starting_line
    }

    /// `true` when loaded from storage, `false` for templates embedded in
    /// another template's property.
    pub fn is_source_template(&self) -> bool {
        self.is_source_template
    }

    /// Hash of the raw template text.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Every file pulled in through include markers, in inclusion order.
    pub fn included_files(&self) -> &[PathBuf] {
        &self.included_files
    }
}
