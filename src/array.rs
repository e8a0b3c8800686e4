//! Typed array views.
//!
//! [`Array<T>`] wraps an [`ArrayContainer`] with the static guarantee that the
//! stored component type is `T`, so element access needs no per-call type
//! check. It adds random-access iteration over flat components and over
//! elements (chunks of `component_count` components), plus zero-copy
//! `ndarray` views.
//!
//! Constructing an `Array<T>` from a container whose component type differs
//! from `T` runs the conversion engine instead of failing; the same-type path
//! shares the container's storage.

use std::marker::PhantomData;
use std::slice::{ChunksExact, ChunksExactMut};

use ndarray::IxDyn;

use crate::container::ArrayContainer;
use crate::convert::convert;
use crate::dtype::Scalar;

/// A type-checked view over an [`ArrayContainer`].
#[derive(Debug, Clone)]
pub struct Array<T: Scalar> {
    container: ArrayContainer,
    _type: PhantomData<T>,
}

impl<T: Scalar> From<ArrayContainer> for Array<T> {
    /// Wrap `container`, converting its components to `T` first if needed.
    fn from(container: ArrayContainer) -> Self {
        let container = if container.data_type() == T::TYPE {
            container
        } else {
            convert(&container, T::TYPE)
        };
        Array {
            container,
            _type: PhantomData,
        }
    }
}

impl<T: Scalar> Array<T> {
    /// Allocate a typed array on the heap.
    pub fn new(description: crate::desc::ArrayDescription) -> Self {
        assert_eq!(
            description.data_type(),
            T::TYPE,
            "description type {} does not match array type {}",
            description.data_type(),
            T::TYPE
        );
        Array {
            container: ArrayContainer::new(description),
            _type: PhantomData,
        }
    }

    pub fn container(&self) -> &ArrayContainer {
        &self.container
    }

    pub fn into_container(self) -> ArrayContainer {
        self.container
    }

    /// All components as one flat slice, elements in linear-index order.
    pub fn as_slice(&self) -> &[T] {
        self.container.as_slice_of::<T>()
    }

    /// Mutable flat component slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.container.as_mut_slice_of::<T>()
    }

    /// Random-access iteration over flat components.
    pub fn components(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn components_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Random-access iteration over elements: each item is one element's
    /// components, with a fixed stride of `component_count`.
    pub fn elements(&self) -> ChunksExact<'_, T> {
        // max(1) keeps the stride legal for zero-component descriptions,
        // whose flat slice is empty anyway.
        let stride = self.container.component_count().max(1);
        self.as_slice().chunks_exact(stride)
    }

    pub fn elements_mut(&mut self) -> ChunksExactMut<'_, T> {
        let stride = self.container.component_count().max(1);
        self.as_mut_slice().chunks_exact_mut(stride)
    }

    /// Component `component` of element `element`, unchecked against the
    /// component type (the wrapper guarantees it).
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn get(&self, element: usize, component: usize) -> T {
        let offset = self
            .container
            .description()
            .component_offset(element, component);
        self.as_slice()[offset / std::mem::size_of::<T>()]
    }

    pub fn set(&mut self, element: usize, component: usize, value: T) {
        let offset = self
            .container
            .description()
            .component_offset(element, component);
        let index = offset / std::mem::size_of::<T>();
        self.as_mut_slice()[index] = value;
    }

    /// Zero-copy `ndarray` view.
    ///
    /// Axes are the reversed dimension order followed by the component axis,
    /// because dimension 0 varies fastest while ndarray is row-major. A
    /// zero-dimensional array views as shape `[0]`.
    pub fn as_ndarray(&self) -> ndarray::ArrayView<'_, T, IxDyn> {
        let shape = self.ndarray_shape();
        ndarray::ArrayView::from_shape(IxDyn(&shape), self.as_slice())
            .expect("container data size matches its description")
    }

    /// Mutable zero-copy `ndarray` view.
    pub fn as_mut_ndarray(&mut self) -> ndarray::ArrayViewMut<'_, T, IxDyn> {
        let shape = self.ndarray_shape();
        ndarray::ArrayViewMut::from_shape(IxDyn(&shape), self.as_mut_slice())
            .expect("container data size matches its description")
    }

    fn ndarray_shape(&self) -> Vec<usize> {
        if self.container.dimension_count() == 0 {
            return vec![0];
        }
        let mut shape: Vec<usize> = self.container.dimensions().iter().rev().copied().collect();
        shape.push(self.container.component_count());
        shape
    }
}

impl<T: Scalar> std::ops::Deref for Array<T> {
    type Target = ArrayContainer;

    fn deref(&self) -> &ArrayContainer {
        &self.container
    }
}

impl<T: Scalar> std::ops::DerefMut for Array<T> {
    fn deref_mut(&mut self) -> &mut ArrayContainer {
        &mut self.container
    }
}
