//! XML resource configuration format.
//!
//! ```xml
//! <resources>
//!     <resource class="App\Entity\Greeting" shortName="greeting">
//!         <itemOperations>
//!             <itemOperation name="get"/>
//!         </itemOperations>
//!         <attribute name="normalization_context">
//!             <attribute name="groups">
//!                 <attribute>default</attribute>
//!             </attribute>
//!         </attribute>
//!         <property name="foo" readable="true">
//!             <subresource collection="true" resourceClass="Foo" maxDepth="1"/>
//!         </property>
//!     </resource>
//! </resources>
//! ```

use crate::error::ExtractError;
use crate::metadata::parameters::PlaceholderResolution;
use crate::metadata::types::{Operations, PropertyMetadata, ResourceMetadata, SubresourceMetadata};
use crate::metadata::value::{AttributeKey, AttributeValue, Attributes};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Minimal element tree; the resource schema only needs names, attributes,
/// children and text.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut attributes = IndexMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.insert(key, value);
        }
        Ok(Element {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_tree(content: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at position {}: {}", reader.buffer_position(), e))?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unexpected closing tag")?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document, <{}> is not closed", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(format!("unexpected second root element <{}>", element.name)),
    }
    Ok(())
}

pub(crate) fn parse(
    path: &Path,
    content: &str,
    params: &mut PlaceholderResolution<'_>,
) -> Result<Vec<(String, ResourceMetadata)>, ExtractError> {
    let root = parse_tree(content).map_err(|message| ExtractError::malformed(path, message))?;
    if root.name != "resources" {
        return Err(ExtractError::malformed(
            path,
            format!("expected root element <resources>, found <{}>", root.name),
        ));
    }

    let mut resources = Vec::new();
    for resource in root.children_named("resource") {
        let class = resource
            .attr("class")
            .ok_or_else(|| ExtractError::malformed(path, "<resource> requires a \"class\" attribute"))?;
        let class = resolve(path, params, class)?;
        let metadata = ResourceMetadata {
            short_name: resource.attr("shortName").map(str::to_string),
            description: resource.attr("description").map(str::to_string),
            iri: resource.attr("iri").map(str::to_string),
            item_operations: operations(path, resource, "itemOperations", "itemOperation")?,
            collection_operations: operations(path, resource, "collectionOperations", "collectionOperation")?,
            subresource_operations: operations(path, resource, "subresourceOperations", "subresourceOperation")?,
            graphql: operations(path, resource, "graphql", "operation")?,
            attributes: Some(attribute_map(resource, true)).filter(|a| !a.is_empty()),
            properties: properties(path, resource, params)?,
        };
        resources.push((class, metadata));
    }
    Ok(resources)
}

fn resolve(path: &Path, params: &mut PlaceholderResolution<'_>, value: &str) -> Result<String, ExtractError> {
    params.resolve(value).map_err(|name| ExtractError::UnresolvedParameter {
        name,
        path: path.to_path_buf(),
    })
}

/// Operations without attributes come out as `None`: XML cannot tell an
/// empty operation from one with no value.
fn operations(path: &Path, resource: &Element, parent: &str, child: &str) -> Result<Option<Operations>, ExtractError> {
    let Some(parent) = resource.child(parent) else {
        return Ok(None);
    };
    let mut operations = Operations::new();
    for operation in parent.children_named(child) {
        let name = operation
            .attr("name")
            .ok_or_else(|| ExtractError::malformed(path, format!("<{}> requires a \"name\" attribute", child)))?;
        let attributes = attribute_map(operation, false);
        operations.insert(name.to_string(), Some(attributes).filter(|a| !a.is_empty()));
    }
    Ok(Some(operations))
}

fn attribute_entries(element: &Element, top_level: bool) -> Vec<(Option<AttributeKey>, AttributeValue)> {
    element
        .children_named("attribute")
        .map(|attribute| {
            let value = if attribute.child("attribute").is_some() {
                AttributeValue::from_entries(attribute_entries(attribute, false))
            } else if top_level && attribute.text.is_empty() {
                AttributeValue::List(Vec::new())
            } else {
                AttributeValue::typed_scalar(&attribute.text)
            };
            (attribute.attr("name").map(AttributeKey::parse), value)
        })
        .collect()
}

fn attribute_map(element: &Element, top_level: bool) -> Attributes {
    let mut next_index: i64 = 0;
    let mut attributes = Attributes::new();
    for (key, value) in attribute_entries(element, top_level) {
        let key = match key {
            Some(AttributeKey::Index(i)) => {
                next_index = next_index.max(i + 1);
                i.to_string()
            }
            Some(key) => key.to_string(),
            None => {
                next_index += 1;
                (next_index - 1).to_string()
            }
        };
        attributes.insert(key, value);
    }
    attributes
}

fn properties(
    path: &Path,
    resource: &Element,
    params: &mut PlaceholderResolution<'_>,
) -> Result<Option<IndexMap<String, PropertyMetadata>>, ExtractError> {
    if resource.child("property").is_none() {
        return Ok(None);
    }
    let mut properties = IndexMap::new();
    for property in resource.children_named("property") {
        let name = property
            .attr("name")
            .ok_or_else(|| ExtractError::malformed(path, "<property> requires a \"name\" attribute"))?;
        let subresource = match property.child("subresource") {
            Some(sub) => Some(SubresourceMetadata {
                collection: bool_attr(path, sub, "collection")?,
                resource_class: sub.attr("resourceClass").map(|c| resolve(path, params, c)).transpose()?,
                max_depth: sub
                    .attr("maxDepth")
                    .map(|d| {
                        d.trim()
                            .parse::<i64>()
                            .map_err(|_| ExtractError::malformed(path, format!("maxDepth \"{}\" is not an integer", d)))
                    })
                    .transpose()?,
            }),
            None => None,
        };
        let metadata = PropertyMetadata {
            description: property.attr("description").map(str::to_string),
            readable: bool_attr(path, property, "readable")?,
            writable: bool_attr(path, property, "writable")?,
            readable_link: bool_attr(path, property, "readableLink")?,
            writable_link: bool_attr(path, property, "writableLink")?,
            required: bool_attr(path, property, "required")?,
            identifier: bool_attr(path, property, "identifier")?,
            iri: property.attr("iri").map(str::to_string),
            attributes: attribute_map(property, false),
            subresource,
        };
        properties.insert(name.to_string(), metadata);
    }
    Ok(Some(properties))
}

fn bool_attr(path: &Path, element: &Element, name: &str) -> Result<Option<bool>, ExtractError> {
    match element.attr(name).map(str::trim) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(ExtractError::malformed(
            path,
            format!("attribute \"{}\" of <{}> must be a boolean, got \"{}\"", name, element.name, other),
        )),
    }
}
