use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier of a source node, unique within its owning document
pub type NodeId = String;

/// Style properties (`color` → `red`)
pub type StyleMap = BTreeMap<String, String>;

/// Element attributes (`name` → `value`)
pub type AttributeMap = BTreeMap<String, String>;

/// Opaque key/value bag carried by every node; never interpreted by the evaluator
pub type Metadata = BTreeMap<String, String>;

/// Native tag a component renders as when its extends chain names none
pub const DEFAULT_TAG: &str = "div";

/// Tag of the slot marker element inside component templates
pub const SLOT_TAG: &str = "slot";

/// Attribute carrying a slot marker's name
pub const SLOT_NAME_ATTRIBUTE: &str = "name";

/// Attribute a call-site child uses to pick the slot it is projected into
pub const SLOT_TARGET_ATTRIBUTE: &str = "slot";

/// Source tree node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Module(Module),
    Component(Component),
    Element(Element),
    Text(TextNode),
    Variant(Variant),
    Override(Override),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Module(module) => &module.id,
            Node::Component(component) => &component.id,
            Node::Element(element) => &element.id,
            Node::Text(text) => &text.id,
            Node::Variant(variant) => &variant.id,
            Node::Override(override_def) => &override_def.id,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Module(module) => module.label.as_deref(),
            Node::Component(component) => component.label.as_deref(),
            Node::Element(element) => element.label.as_deref(),
            Node::Text(text) => text.label.as_deref(),
            Node::Variant(variant) => variant.label.as_deref(),
            Node::Override(override_def) => override_def.label.as_deref(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Node::Module(module) => &module.metadata,
            Node::Component(component) => &component.metadata,
            Node::Element(element) => &element.metadata,
            Node::Text(text) => &text.metadata,
            Node::Variant(variant) => &variant.metadata,
            Node::Override(override_def) => &override_def.metadata,
        }
    }

    /// Content children (module roots or template children)
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Module(module) => &module.children,
            Node::Component(component) => &component.children,
            Node::Element(element) => &element.children,
            Node::Text(_) | Node::Variant(_) | Node::Override(_) => &[],
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Node::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// One document: the unit that owns node ids and carries a uri
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: NodeId,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Module {
    pub fn new(id: impl Into<NodeId>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// Reusable component definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Id of the component this one extends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is: Option<NodeId>,
    /// Native tag used when this component terminates an extends chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Template content
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl Component {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn extends(mut self, base: impl Into<NodeId>) -> Self {
        self.is = Some(base.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_override(mut self, override_def: Override) -> Self {
        self.overrides.push(override_def);
        self
    }

    pub fn default_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|variant| variant.is_default)
    }
}

/// Native element, or a component instance when `is` is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub tag: String,
    /// Id of the instantiated component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is: Option<NodeId>,
    /// Variants explicitly activated on this instance
    #[serde(default)]
    pub variant: Vec<NodeId>,
    #[serde(default)]
    pub overrides: Vec<Override>,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(id: impl Into<NodeId>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Instance of the component `component_id`
    pub fn instance(id: impl Into<NodeId>, component_id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            tag: DEFAULT_TAG.to_string(),
            is: Some(component_id.into()),
            ..Default::default()
        }
    }

    /// Slot marker; `None` is the default slot
    pub fn slot(id: impl Into<NodeId>, name: Option<&str>) -> Self {
        let element = Self::new(id, SLOT_TAG);
        match name {
            Some(name) => element.with_attr(SLOT_NAME_ATTRIBUTE, name),
            None => element,
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_variant(mut self, variant_id: impl Into<NodeId>) -> Self {
        self.variant.push(variant_id.into());
        self
    }

    pub fn with_override(mut self, override_def: Override) -> Self {
        self.overrides.push(override_def);
        self
    }

    pub fn is_slot(&self) -> bool {
        self.is.is_none() && self.tag == SLOT_TAG
    }

    /// Name of the slot this marker declares (`None` for the default slot)
    pub fn slot_name(&self) -> Option<&str> {
        self.attributes.get(SLOT_NAME_ATTRIBUTE).map(String::as_str)
    }

    /// Slot a call-site child asks to be projected into
    pub fn slot_target(&self) -> Option<&str> {
        self.attributes.get(SLOT_TARGET_ATTRIBUTE).map(String::as_str)
    }
}

/// Text leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub value: String,
    #[serde(default)]
    pub style: StyleMap,
}

impl TextNode {
    pub fn new(id: impl Into<NodeId>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }
}

/// Named alternate configuration of a component's overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    /// Overrides active only while this variant is
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl Variant {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_override(mut self, override_def: Override) -> Self {
        self.overrides.push(override_def);
        self
    }
}

/// Authored change to a node inside a component template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Ids leading from the instance root to the target; empty = instance root
    #[serde(default)]
    pub target_id_path: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<NodeId>,
    pub property: OverrideValue,
}

impl Override {
    pub fn new(id: impl Into<NodeId>, target_id_path: &[&str], property: OverrideValue) -> Self {
        Self {
            id: id.into(),
            label: None,
            metadata: Metadata::new(),
            target_id_path: target_id_path.iter().map(|id| id.to_string()).collect(),
            variant_id: None,
            property,
        }
    }

    pub fn style(id: impl Into<NodeId>, target_id_path: &[&str], entries: &[(&str, &str)]) -> Self {
        Self::new(id, target_id_path, OverrideValue::Style(to_map(entries)))
    }

    pub fn attributes(
        id: impl Into<NodeId>,
        target_id_path: &[&str],
        entries: &[(&str, &str)],
    ) -> Self {
        Self::new(id, target_id_path, OverrideValue::Attributes(to_map(entries)))
    }

    pub fn text(id: impl Into<NodeId>, target_id_path: &[&str], value: impl Into<String>) -> Self {
        Self::new(id, target_id_path, OverrideValue::Text(value.into()))
    }

    pub fn children(id: impl Into<NodeId>, target_id_path: &[&str], children: Vec<Node>) -> Self {
        Self::new(id, target_id_path, OverrideValue::Children(children))
    }

    pub fn variant(id: impl Into<NodeId>, target_id_path: &[&str], variant_ids: &[&str]) -> Self {
        Self::new(
            id,
            target_id_path,
            OverrideValue::Variant(variant_ids.iter().map(|id| id.to_string()).collect()),
        )
    }

    pub fn for_variant(mut self, variant_id: impl Into<NodeId>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    pub fn property_name(&self) -> PropertyName {
        self.property.name()
    }
}

/// Override payload, one shape per overridden property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "propertyName", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideValue {
    Style(StyleMap),
    Attributes(AttributeMap),
    Children(Vec<Node>),
    Text(String),
    /// Variant ids to activate on the targeted instance
    Variant(Vec<NodeId>),
}

impl OverrideValue {
    pub fn name(&self) -> PropertyName {
        match self {
            OverrideValue::Style(_) => PropertyName::Style,
            OverrideValue::Attributes(_) => PropertyName::Attributes,
            OverrideValue::Children(_) => PropertyName::Children,
            OverrideValue::Text(_) => PropertyName::Text,
            OverrideValue::Variant(_) => PropertyName::Variant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyName {
    Style,
    Attributes,
    Children,
    Text,
    Variant,
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl From<Module> for Node {
    fn from(module: Module) -> Self {
        Node::Module(module)
    }
}

impl From<Component> for Node {
    fn from(component: Component) -> Self {
        Node::Component(component)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<TextNode> for Node {
    fn from(text: TextNode) -> Self {
        Node::Text(text)
    }
}

impl From<Variant> for Node {
    fn from(variant: Variant) -> Self {
        Node::Variant(variant)
    }
}

impl From<Override> for Node {
    fn from(override_def: Override) -> Self {
        Node::Override(override_def)
    }
}
