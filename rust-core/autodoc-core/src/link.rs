//! # Shape Linking
//!
//! Folds shapes that are referenced by other shapes into the referencing
//! fields, so a route documents a forest of root shapes instead of a flat
//! list with duplicates.
//!
//! Linkage is by exact canonical name (`FieldDescriptor::shape_ref`), never
//! by substring of the displayed type.

use crate::error::{Error, Result};
use crate::shape::{FieldDescriptor, ShapeDescriptor};
use std::collections::{HashMap, HashSet};

/// Link a flat list of shapes into root shapes with nested properties
///
/// 1. Shapes are indexed by name; a repeated name keeps its first entry.
/// 2. A field referring to another shape of the list receives that shape's
///    (recursively linked) fields as `properties`, and the referenced shape
///    is marked as consumed. A field referring to its own shape is left
///    unlinked.
/// 3. Unconsumed shapes are returned in their original order.
///
/// # Errors
///
/// Returns `Error::ShapeCycle` if shapes reference each other in a loop.
pub fn link_shapes(shapes: Vec<ShapeDescriptor>) -> Result<Vec<ShapeDescriptor>> {
    let mut seen = HashSet::new();
    let shapes: Vec<ShapeDescriptor> = shapes
        .into_iter()
        .filter(|s| seen.insert(s.name.clone()))
        .collect();

    let index: HashMap<&str, &ShapeDescriptor> =
        shapes.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut consumed: HashSet<&str> = HashSet::new();
    for shape in &shapes {
        for target in shape.fields.iter().filter_map(|f| f.shape_ref.as_deref()) {
            if target != shape.name && index.contains_key(target) {
                consumed.insert(target);
            }
        }
    }

    let mut roots = Vec::new();
    let mut stack = Vec::new();
    for shape in &shapes {
        // Consumed shapes are expanded too so that cycles among them surface.
        let fields = expand_fields(shape, &index, &mut stack)?;
        if !consumed.contains(shape.name.as_str()) {
            roots.push(ShapeDescriptor {
                name: shape.name.clone(),
                fields,
            });
        }
    }
    Ok(roots)
}

fn expand_fields(
    shape: &ShapeDescriptor,
    index: &HashMap<&str, &ShapeDescriptor>,
    stack: &mut Vec<String>,
) -> Result<Vec<FieldDescriptor>> {
    stack.push(shape.name.clone());

    let mut fields = shape.fields.clone();
    for field in &mut fields {
        let Some(target) = field.shape_ref.as_deref() else {
            continue;
        };
        if target == shape.name {
            continue;
        }
        let Some(child) = index.get(target) else {
            continue;
        };

        if let Some(pos) = stack.iter().position(|name| name == target) {
            let mut path = stack[pos..].to_vec();
            path.push(target.to_string());
            return Err(Error::ShapeCycle { path });
        }

        field.properties = expand_fields(child, index, stack)?;
    }

    stack.pop();
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{FieldSpec, ShapeBuilder};

    fn plain(name: &str, fields: &[&str]) -> ShapeDescriptor {
        fields
            .iter()
            .fold(ShapeBuilder::new(name), |b, f| {
                b.field(FieldSpec::new(f, "i64"))
            })
            .build()
            .unwrap()
    }

    fn with_ref(name: &str, field: &str, target: &str) -> ShapeDescriptor {
        ShapeBuilder::new(name)
            .field(FieldSpec::new("id", "i64"))
            .field(FieldSpec::new(field, target).shape_ref(Some(target.to_string())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_referenced_shape_is_folded() {
        let a = with_ref("t::A", "b", "t::B");
        let b = plain("t::B", &["x", "y"]);

        let linked = link_shapes(vec![a, b]).unwrap();

        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, "t::A");
        let props = &linked[0].field("b").unwrap().properties;
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "x");
        assert_eq!(props[1].name, "y");
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = with_ref("t::A", "b", "t::B");
        let b = plain("t::B", &["x"]);

        let linked = link_shapes(vec![b, a]).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, "t::A");
    }

    #[test]
    fn test_unreferenced_shapes_stay_roots() {
        let a = plain("t::A", &["x"]);
        let c = plain("t::C", &["z"]);

        let linked = link_shapes(vec![a.clone(), c.clone()]).unwrap();
        assert_eq!(linked, vec![a, c]);
    }

    #[test]
    fn test_nested_chain_is_linked_transitively() {
        let a = with_ref("t::A", "b", "t::B");
        let b = with_ref("t::B", "c", "t::C");
        let c = plain("t::C", &["leaf"]);

        let linked = link_shapes(vec![a, b, c]).unwrap();

        assert_eq!(linked.len(), 1);
        let b_props = &linked[0].field("b").unwrap().properties;
        let c_field = b_props.iter().find(|f| f.name == "c").unwrap();
        assert_eq!(c_field.properties[0].name, "leaf");
    }

    #[test]
    fn test_substring_names_do_not_link() {
        // "t::B" is a substring of "t::BB" but the field refers to t::BB only.
        let a = with_ref("t::A", "bb", "t::BB");
        let b = plain("t::B", &["x"]);
        let bb = plain("t::BB", &["y"]);

        let linked = link_shapes(vec![a, b, bb]).unwrap();

        let names: Vec<_> = linked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["t::A", "t::B"]);
        assert_eq!(linked[0].field("bb").unwrap().properties[0].name, "y");
    }

    #[test]
    fn test_reference_outside_list_is_left_alone() {
        let a = with_ref("t::A", "b", "t::B");
        let linked = link_shapes(vec![a]).unwrap();
        assert!(linked[0].field("b").unwrap().properties.is_empty());
    }

    #[test]
    fn test_self_reference_is_not_linked() {
        let node = with_ref("t::Node", "children", "t::Node");
        let linked = link_shapes(vec![node]).unwrap();

        assert_eq!(linked.len(), 1);
        assert!(linked[0].field("children").unwrap().properties.is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let a = with_ref("t::A", "b", "t::B");
        let b = with_ref("t::B", "a", "t::A");

        let err = link_shapes(vec![a, b]).unwrap_err();
        match err {
            Error::ShapeCycle { path } => {
                assert_eq!(path, vec!["t::A", "t::B", "t::A"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_behind_root_is_reported() {
        let root = with_ref("t::Root", "a", "t::A");
        let a = with_ref("t::A", "b", "t::B");
        let b = with_ref("t::B", "a", "t::A");

        assert!(matches!(
            link_shapes(vec![root, a, b]),
            Err(Error::ShapeCycle { .. })
        ));
    }

    #[test]
    fn test_repeated_shape_is_emitted_once() {
        let a = plain("t::A", &["x"]);
        let linked = link_shapes(vec![a.clone(), a]).unwrap();
        assert_eq!(linked.len(), 1);
    }
}
