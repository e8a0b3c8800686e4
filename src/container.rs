//! Array containers: a description plus shared, allocator-backed bytes.
//!
//! [`ArrayContainer`] owns an [`ArrayDescription`] and a reference to a
//! [`Storage`] buffer of exactly `data_size()` bytes. Cloning a container
//! produces a new description value over the *same* buffer; mutation through
//! one clone is visible through the others, and the buffer is released when
//! the last clone drops. [`ArrayContainer::deep_copy`] is the only way to get
//! a container with private storage.
//!
//! A default-constructed container is the canonical "absent" value: it has no
//! buffer and [`ArrayContainer::is_allocated`] is false.
//!
//! Typed access ([`ArrayContainer::get`]/[`ArrayContainer::set`]) checks the
//! requested scalar type against the stored component type and panics on
//! mismatch; that is a caller contract violation, not a recoverable error.

use crate::alloc::{Allocator, Storage};
use crate::desc::{ArrayDescription, Shape};
use crate::dtype::{DataType, Scalar};
use crate::error::AllocationError;
use crate::tags::TagList;

/// An [`ArrayDescription`] plus a shared byte buffer.
#[derive(Debug, Clone)]
pub struct ArrayContainer {
    desc: ArrayDescription,
    storage: Option<Storage>,
}

impl Default for ArrayContainer {
    /// The empty container: no dimensions, no components, no buffer.
    fn default() -> Self {
        ArrayContainer {
            desc: ArrayDescription::new(Shape::new(), 0, DataType::U8),
            storage: None,
        }
    }
}

impl ArrayContainer {
    /// Allocate a container on the heap.
    pub fn new(desc: ArrayDescription) -> Self {
        let storage = Storage::heap(desc.data_size());
        ArrayContainer {
            desc,
            storage: Some(storage),
        }
    }

    /// Allocate a container through a custom allocator.
    ///
    /// # Errors
    /// Propagates the allocator's [`AllocationError`]; on failure no container
    /// exists (there is no partially-constructed state).
    pub fn with_allocator(
        desc: ArrayDescription,
        allocator: &dyn Allocator,
    ) -> Result<Self, AllocationError> {
        let storage = allocator.allocate(desc.data_size())?;
        Ok(ArrayContainer {
            desc,
            storage: Some(storage),
        })
    }

    pub(crate) fn from_parts(desc: ArrayDescription, storage: Storage) -> Self {
        debug_assert_eq!(storage.len(), desc.data_size());
        ArrayContainer {
            desc,
            storage: Some(storage),
        }
    }

    /// Whether this container has a buffer. False only for the default
    /// (empty) container.
    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    pub fn description(&self) -> &ArrayDescription {
        &self.desc
    }

    /// Mutable description access, for tag editing.
    pub fn description_mut(&mut self) -> &mut ArrayDescription {
        &mut self.desc
    }

    pub(crate) fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    /// Whether `self` and `other` reference the same buffer.
    pub fn shares_storage_with(&self, other: &ArrayContainer) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => a.shares_with(b),
            _ => false,
        }
    }

    /// The raw array bytes; empty for the unallocated container.
    pub fn data(&self) -> &[u8] {
        self.storage.as_ref().map_or(&[], Storage::as_slice)
    }

    /// Mutable raw array bytes.
    ///
    /// Clones of this container see the mutation; concurrent access from
    /// other threads must be serialized by the caller.
    ///
    /// # Panics
    /// Panics if the buffer is backed by a read-only mapping.
    pub fn data_mut(&mut self) -> &mut [u8] {
        match &self.storage {
            // Safety: exclusive access is the caller's contract (§ sharing
            // model in the module docs); the slice spans the whole buffer.
            Some(storage) => unsafe { storage.as_mut_slice() },
            None => &mut [],
        }
    }

    /// The bytes of element `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn element(&self, index: usize) -> &[u8] {
        let offset = self.desc.element_offset(index);
        &self.data()[offset..offset + self.desc.element_size()]
    }

    /// The mutable bytes of element `index`.
    pub fn element_mut(&mut self, index: usize) -> &mut [u8] {
        let offset = self.desc.element_offset(index);
        let size = self.desc.element_size();
        &mut self.data_mut()[offset..offset + size]
    }

    fn check_type<T: Scalar>(&self) {
        assert_eq!(
            T::TYPE,
            self.desc.data_type(),
            "typed access with {} to a {} container",
            T::TYPE,
            self.desc.data_type()
        );
    }

    /// Read component `component` of element `element` as `T`.
    ///
    /// # Panics
    /// Panics if `T` does not match the stored component type or either index
    /// is out of range.
    pub fn get<T: Scalar>(&self, element: usize, component: usize) -> T {
        self.check_type::<T>();
        let offset = self.desc.component_offset(element, component);
        let storage = self.storage.as_ref().expect("container is not allocated");
        // Safety: offset is in range and aligned for T (buffers are 8-byte
        // aligned and offsets are multiples of the component size).
        unsafe { (storage.as_ptr().add(offset) as *const T).read() }
    }

    /// Write component `component` of element `element`.
    ///
    /// # Panics
    /// Same contract as [`ArrayContainer::get`], plus read-only storage.
    pub fn set<T: Scalar>(&mut self, element: usize, component: usize, value: T) {
        self.check_type::<T>();
        let offset = self.desc.component_offset(element, component);
        let storage = self.storage.as_ref().expect("container is not allocated");
        // Safety: as for `get`; exclusive access is the caller's contract.
        unsafe {
            let bytes = storage.as_mut_slice();
            (bytes.as_mut_ptr().add(offset) as *mut T).write(value);
        }
    }

    /// View the whole buffer as a flat slice of `T`.
    ///
    /// # Panics
    /// Panics if `T` does not match the stored component type.
    pub(crate) fn as_slice_of<T: Scalar>(&self) -> &[T] {
        self.check_type::<T>();
        match &self.storage {
            Some(storage) if !storage.is_empty() => {
                let count = storage.len() / std::mem::size_of::<T>();
                // Safety: buffer alignment and length are allocator
                // guarantees; count covers exactly the stored components.
                unsafe { std::slice::from_raw_parts(storage.as_ptr() as *const T, count) }
            }
            _ => &[],
        }
    }

    /// Mutable variant of [`ArrayContainer::as_slice_of`].
    pub(crate) fn as_mut_slice_of<T: Scalar>(&mut self) -> &mut [T] {
        self.check_type::<T>();
        match &self.storage {
            Some(storage) if !storage.is_empty() => {
                let count = storage.len() / std::mem::size_of::<T>();
                // Safety: as above; exclusive access is the caller's contract.
                unsafe {
                    let bytes = storage.as_mut_slice();
                    std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut T, count)
                }
            }
            _ => &mut [],
        }
    }

    /// Copy this container into fresh heap storage.
    ///
    /// The result is equal in shape, type, tags and data but shares nothing
    /// with `self`.
    pub fn deep_copy(&self) -> Self {
        match &self.storage {
            Some(storage) => {
                let copy = Storage::heap(storage.len());
                // Safety: freshly allocated, not yet shared.
                unsafe { copy.as_mut_slice() }.copy_from_slice(storage.as_slice());
                ArrayContainer {
                    desc: self.desc.clone(),
                    storage: Some(copy),
                }
            }
            None => ArrayContainer::default(),
        }
    }

    // Delegating description accessors, the read surface format adapters use.

    pub fn dimension_count(&self) -> usize {
        self.desc.dimension_count()
    }

    pub fn dimension(&self, d: usize) -> usize {
        self.desc.dimension(d)
    }

    pub fn dimensions(&self) -> &[usize] {
        self.desc.dimensions()
    }

    pub fn component_count(&self) -> usize {
        self.desc.component_count()
    }

    pub fn data_type(&self) -> DataType {
        self.desc.data_type()
    }

    pub fn element_count(&self) -> usize {
        self.desc.element_count()
    }

    pub fn element_size(&self) -> usize {
        self.desc.element_size()
    }

    pub fn data_size(&self) -> usize {
        self.desc.data_size()
    }

    pub fn linear_index(&self, index: &[usize]) -> usize {
        self.desc.linear_index(index)
    }

    pub fn vector_index(&self, linear: usize) -> Shape {
        self.desc.vector_index(linear)
    }

    pub fn global_tags(&self) -> &TagList {
        self.desc.global_tags()
    }

    pub fn global_tags_mut(&mut self) -> &mut TagList {
        self.desc.global_tags_mut()
    }

    pub fn dimension_tags(&self, d: usize) -> &TagList {
        self.desc.dimension_tags(d)
    }

    pub fn dimension_tags_mut(&mut self, d: usize) -> &mut TagList {
        self.desc.dimension_tags_mut(d)
    }

    pub fn component_tags(&self, c: usize) -> &TagList {
        self.desc.component_tags(c)
    }

    pub fn component_tags_mut(&mut self, c: usize) -> &mut TagList {
        self.desc.component_tags_mut(c)
    }
}

impl PartialEq for ArrayContainer {
    /// Equality over description (shape, type, tags) and data bytes, not over
    /// storage identity.
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.data() == other.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn u8_2x3() -> ArrayContainer {
        let desc = ArrayDescription::new(smallvec![2usize, 3], 1, DataType::U8);
        let mut c = ArrayContainer::new(desc);
        c.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        c
    }

    #[test]
    fn default_container_is_unallocated() {
        let c = ArrayContainer::default();
        assert!(!c.is_allocated());
        assert_eq!(c.data(), &[] as &[u8]);
        assert_eq!(c.element_count(), 0);
        let allocated = ArrayContainer::new(ArrayDescription::new(
            smallvec![1usize],
            1,
            DataType::U8,
        ));
        assert!(allocated.is_allocated());
    }

    #[test]
    fn reference_scenario_2x3_u8() {
        let c = u8_2x3();
        assert_eq!(c.linear_index(&[1, 2]), 5);
        assert_eq!(c.get::<u8>(5, 0), 6);
        assert_eq!(c.element(5), &[6]);
    }

    #[test]
    fn clone_shares_storage() {
        let c = u8_2x3();
        let mut d = c.clone();
        assert!(c.shares_storage_with(&d));
        d.set::<u8>(0, 0, 99);
        assert_eq!(c.get::<u8>(0, 0), 99);
    }

    #[test]
    fn clone_does_not_share_description() {
        let c = u8_2x3();
        let mut d = c.clone();
        d.global_tags_mut().set("FOO", "bar");
        assert!(!c.global_tags().contains("FOO"));
    }

    #[test]
    fn deep_copy_is_equal_but_independent() {
        let mut c = u8_2x3();
        c.global_tags_mut().set("TITLE", "original");
        let mut copy = c.deep_copy();
        assert_eq!(copy, c);
        assert!(!copy.shares_storage_with(&c));
        copy.set::<u8>(0, 0, 42);
        assert_eq!(c.get::<u8>(0, 0), 1);
        assert_ne!(copy, c);
    }

    #[test]
    fn multi_component_get_set() {
        let desc = ArrayDescription::new(smallvec![2usize, 2], 3, DataType::F32);
        let mut c = ArrayContainer::new(desc);
        c.set::<f32>(2, 1, 0.5);
        assert_eq!(c.get::<f32>(2, 1), 0.5);
        assert_eq!(c.get::<f32>(2, 0), 0.0);
        assert_eq!(c.element_size(), 12);
    }

    #[test]
    #[should_panic(expected = "typed access")]
    fn type_mismatch_panics() {
        let c = u8_2x3();
        c.get::<i16>(0, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn component_out_of_range_panics() {
        let c = u8_2x3();
        c.get::<u8>(0, 1);
    }

    #[test]
    fn with_allocator_failure_produces_no_container() {
        let desc = ArrayDescription::new(smallvec![4usize], 1, DataType::U8);
        let alloc = crate::alloc::MmapAllocator::read_file("/nonexistent-gridbuf/data.bin");
        assert!(ArrayContainer::with_allocator(desc, &alloc).is_err());
    }
}
