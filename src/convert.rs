//! The type-conversion engine.
//!
//! [`convert`] turns a container's components into another [`DataType`] with
//! plain `as`-cast semantics: exact widening, wraparound on integer
//! width/signedness changes, truncation toward zero for float to integer
//! (saturating at the integer's bounds, NaN to zero). It is total over all
//! 10×10 ordered type pairs and never fails; it is silently lossy exactly
//! where a plain numeric cast is.
//!
//! Converting to the type a container already has returns a container that
//! *shares* the original storage. No allocation, no copy; that zero-copy
//! share is an observable contract, not an implementation detail.
//!
//! One generic kernel behind two ten-arm dispatches replaces the hundred-case
//! matrix the semantics describe.

use num_traits::AsPrimitive;

use crate::container::ArrayContainer;
use crate::dtype::{DataType, Scalar};

/// Convert `container` to `new_type`.
///
/// Same-type calls share storage with the input; otherwise a fresh heap
/// container with the same shape and tags is filled component by component.
/// The empty container converts to the empty container.
pub fn convert(container: &ArrayContainer, new_type: DataType) -> ArrayContainer {
    if container.data_type() == new_type {
        return container.clone();
    }
    if !container.is_allocated() {
        return ArrayContainer::default();
    }
    let mut out = ArrayContainer::new(container.description().with_data_type(new_type));
    dispatch_source(container, &mut out);
    out
}

fn dispatch_source(src: &ArrayContainer, out: &mut ArrayContainer) {
    match src.data_type() {
        DataType::I8 => dispatch_target::<i8>(src, out),
        DataType::U8 => dispatch_target::<u8>(src, out),
        DataType::I16 => dispatch_target::<i16>(src, out),
        DataType::U16 => dispatch_target::<u16>(src, out),
        DataType::I32 => dispatch_target::<i32>(src, out),
        DataType::U32 => dispatch_target::<u32>(src, out),
        DataType::I64 => dispatch_target::<i64>(src, out),
        DataType::U64 => dispatch_target::<u64>(src, out),
        DataType::F32 => dispatch_target::<f32>(src, out),
        DataType::F64 => dispatch_target::<f64>(src, out),
    }
}

fn dispatch_target<S: Scalar>(src: &ArrayContainer, out: &mut ArrayContainer) {
    match out.data_type() {
        DataType::I8 => fill::<S, i8>(src, out),
        DataType::U8 => fill::<S, u8>(src, out),
        DataType::I16 => fill::<S, i16>(src, out),
        DataType::U16 => fill::<S, u16>(src, out),
        DataType::I32 => fill::<S, i32>(src, out),
        DataType::U32 => fill::<S, u32>(src, out),
        DataType::I64 => fill::<S, i64>(src, out),
        DataType::U64 => fill::<S, u64>(src, out),
        DataType::F32 => fill::<S, f32>(src, out),
        DataType::F64 => fill::<S, f64>(src, out),
    }
}

fn fill<S, D>(src: &ArrayContainer, out: &mut ArrayContainer)
where
    S: Scalar + AsPrimitive<D>,
    D: Scalar,
{
    let source = src.as_slice_of::<S>();
    let target = out.as_mut_slice_of::<D>();
    for (t, &s) in target.iter_mut().zip(source) {
        *t = s.as_();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::ArrayDescription;
    use smallvec::smallvec;

    fn filled<T: Scalar>(values: &[T]) -> ArrayContainer {
        let desc = ArrayDescription::new(smallvec![values.len()], 1, T::TYPE);
        let mut c = ArrayContainer::new(desc);
        for (i, &v) in values.iter().enumerate() {
            c.set(i, 0, v);
        }
        c
    }

    #[test]
    fn same_type_shares_storage() {
        let a = filled::<u8>(&[1, 2, 3]);
        let mut b = convert(&a, DataType::U8);
        assert!(a.shares_storage_with(&b));
        b.set::<u8>(1, 0, 77);
        assert_eq!(a.get::<u8>(1, 0), 77);
    }

    #[test]
    fn different_type_has_independent_storage() {
        let a = filled::<u8>(&[1, 2, 3]);
        let b = convert(&a, DataType::F32);
        assert!(!a.shares_storage_with(&b));
        assert_eq!(b.data_type(), DataType::F32);
        assert_eq!(b.get::<f32>(2, 0), 3.0);
    }

    #[test]
    fn widening_is_exact() {
        let a = filled::<i16>(&[i16::MIN, -1, 0, 1, i16::MAX]);
        let b = convert(&a, DataType::I64);
        assert_eq!(b.get::<i64>(0, 0), i64::from(i16::MIN));
        assert_eq!(b.get::<i64>(1, 0), -1);
        assert_eq!(b.get::<i64>(4, 0), i64::from(i16::MAX));
    }

    #[test]
    fn signedness_change_wraps() {
        let a = filled::<i8>(&[-1, -128]);
        let b = convert(&a, DataType::U8);
        assert_eq!(b.get::<u8>(0, 0), 255);
        assert_eq!(b.get::<u8>(1, 0), 128);

        let c = filled::<u16>(&[0xFFFF]);
        let d = convert(&c, DataType::I8);
        assert_eq!(d.get::<i8>(0, 0), -1);
    }

    #[test]
    fn narrowing_integers_truncate_modulo() {
        let a = filled::<i32>(&[0x1_0203]);
        let b = convert(&a, DataType::U8);
        assert_eq!(b.get::<u8>(0, 0), 0x03);
    }

    #[test]
    fn float_to_int_truncates_toward_zero() {
        let a = filled::<f32>(&[2.9, -2.9, 0.5]);
        let b = convert(&a, DataType::I32);
        assert_eq!(b.get::<i32>(0, 0), 2);
        assert_eq!(b.get::<i32>(1, 0), -2);
        assert_eq!(b.get::<i32>(2, 0), 0);
    }

    #[test]
    fn float_to_float_narrowing() {
        let a = filled::<f64>(&[1.5, f64::INFINITY]);
        let b = convert(&a, DataType::F32);
        assert_eq!(b.get::<f32>(0, 0), 1.5);
        assert_eq!(b.get::<f32>(1, 0), f32::INFINITY);
    }

    #[test]
    fn int_to_float_rounds_like_a_cast() {
        // 2^24 + 1 is not representable in f32.
        let a = filled::<i32>(&[16_777_217]);
        let b = convert(&a, DataType::F32);
        assert_eq!(b.get::<f32>(0, 0), 16_777_216.0);
    }

    #[test]
    fn f64_roundtrip_is_lossless_for_i32() {
        let values = [i32::MIN, -1, 0, 1, i32::MAX];
        let a = filled::<i32>(&values);
        let back = convert(&convert(&a, DataType::F64), DataType::I32);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(back.get::<i32>(i, 0), v);
        }
        assert_eq!(back, a);
    }

    #[test]
    fn narrowing_roundtrip_may_lose() {
        let a = filled::<u16>(&[0x1234]);
        let back = convert(&convert(&a, DataType::U8), DataType::U16);
        assert_eq!(back.get::<u16>(0, 0), 0x34);
    }

    #[test]
    fn conversion_preserves_tags_and_shape() {
        let mut a = filled::<u8>(&[9]);
        a.global_tags_mut().set("TITLE", "kept");
        a.component_tags_mut(0).set("INTERPRETATION", "gray");
        let b = convert(&a, DataType::U32);
        assert_eq!(b.global_tags().value("TITLE"), Some("kept"));
        assert_eq!(b.component_tags(0).value("INTERPRETATION"), Some("gray"));
        assert_eq!(b.dimensions(), a.dimensions());
    }

    #[test]
    fn empty_container_converts_to_empty() {
        let a = ArrayContainer::default();
        let b = convert(&a, DataType::F64);
        assert!(!b.is_allocated());
    }
}
