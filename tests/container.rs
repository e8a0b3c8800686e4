//! Description, container and tag list behavior across the public surface.

use gridbuf::{ArrayContainer, ArrayDescription, DataType, Shape};
use smallvec::smallvec;

#[test]
fn derived_quantities_hold_for_positive_rank() {
    for (dims, cc, dt) in [
        (Shape::from_slice(&[16]), 1usize, DataType::U8),
        (Shape::from_slice(&[640, 480]), 3, DataType::U16),
        (Shape::from_slice(&[8, 8, 8]), 2, DataType::F64),
    ] {
        let desc = ArrayDescription::new(dims.clone(), cc, dt);
        let product: usize = dims.iter().product();
        assert_eq!(desc.element_count(), product);
        assert_eq!(
            desc.data_size(),
            desc.element_count() * desc.component_count() * desc.component_size()
        );
    }
}

#[test]
fn zero_rank_has_zero_elements() {
    // Deliberate contract: no dimensions means no elements, even though the
    // empty product would be 1.
    let desc = ArrayDescription::new(Shape::new(), 4, DataType::I64);
    assert_eq!(desc.element_count(), 0);
    assert_eq!(desc.data_size(), 0);
}

#[test]
fn index_arithmetic_roundtrips() {
    for dims in [
        Shape::from_slice(&[11]),
        Shape::from_slice(&[4, 7]),
        Shape::from_slice(&[2, 3, 4]),
    ] {
        let desc = ArrayDescription::new(dims, 1, DataType::U8);
        for linear in 0..desc.element_count() {
            assert_eq!(desc.linear_index(&desc.vector_index(linear)), linear);
        }
        // And the other direction, exhaustively for the 3D case.
        if desc.dimension_count() == 3 {
            for k in 0..desc.dimension(2) {
                for j in 0..desc.dimension(1) {
                    for i in 0..desc.dimension(0) {
                        let v = [i, j, k];
                        assert_eq!(desc.vector_index(desc.linear_index(&v)).as_slice(), &v);
                    }
                }
            }
        }
    }
}

#[test]
fn reference_scenario() {
    let desc = ArrayDescription::new(smallvec![2usize, 3], 1, DataType::U8);
    let mut arr = ArrayContainer::new(desc);
    arr.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6]);

    assert_eq!(arr.linear_index(&[1, 2]), 5);
    assert_eq!(arr.get::<u8>(5, 0), 6);

    let floats = gridbuf::convert(&arr, DataType::F32);
    assert_eq!(floats.get::<f32>(5, 0), 6.0);
}

#[test]
fn shallow_copy_shares_deep_copy_does_not() {
    let desc = ArrayDescription::new(smallvec![4usize], 2, DataType::I32);
    let mut original = ArrayContainer::new(desc);
    original.set::<i32>(3, 1, -7);
    original.global_tags_mut().set("TITLE", "numbers");

    let shallow = original.clone();
    assert!(shallow.shares_storage_with(&original));

    let mut deep = original.deep_copy();
    assert_eq!(deep, original);
    assert!(!deep.shares_storage_with(&original));

    deep.set::<i32>(3, 1, 1000);
    assert_eq!(original.get::<i32>(3, 1), -7);
    assert_eq!(shallow.get::<i32>(3, 1), -7);
}

#[test]
fn default_container_is_the_absent_value() {
    let empty = ArrayContainer::default();
    assert!(!empty.is_allocated());

    let desc = ArrayDescription::new(smallvec![1usize], 1, DataType::U8);
    let allocated = ArrayContainer::new(desc);
    assert!(allocated.is_allocated());
    assert!(!empty.shares_storage_with(&allocated));
    assert_ne!(empty, allocated);
}

#[test]
fn tag_lists_per_scope() {
    let desc = ArrayDescription::new(smallvec![32usize, 32], 4, DataType::U8);
    let mut arr = ArrayContainer::new(desc);

    arr.global_tags_mut().set("FOO", "bar");
    arr.global_tags_mut().unset("FOO");
    assert!(!arr.global_tags().contains("FOO"));

    for (c, name) in ["red", "green", "blue", "alpha"].iter().enumerate() {
        arr.component_tags_mut(c).set("INTERPRETATION", *name);
    }
    assert_eq!(
        arr.component_tags(3).value("INTERPRETATION"),
        Some("alpha")
    );

    arr.dimension_tags_mut(0).set("SAMPLE-DISTANCE", "0.25");
    assert_eq!(arr.dimension_tags(0).parsed::<f64>("SAMPLE-DISTANCE"), Some(0.25));
}
