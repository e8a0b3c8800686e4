//! Array descriptions: shape, component type and tag metadata.
//!
//! An [`ArrayDescription`] records the ordered dimension sizes, the number of
//! components per element and the component [`DataType`], together with one
//! global [`TagList`], one per dimension and one per component. The derived
//! byte quantities are computed once at construction and stay consistent
//! through every copying constructor.
//!
//! Elements are stored with dimension 0 varying fastest, which is also the
//! order the native container format lists dimension sizes in.
//!
//! Out-of-range dimension, component or element indices are caller contract
//! violations and panic; they are not recoverable errors.

use smallvec::SmallVec;

use crate::dtype::DataType;
use crate::tags::TagList;

/// Shape type: dimension sizes, inline up to 4 dimensions.
pub type Shape = SmallVec<[usize; 4]>;

/// The shape/type/metadata record of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDescription {
    dimensions: Shape,
    component_count: usize,
    data_type: DataType,
    // Derived at construction.
    element_count: usize,
    element_size: usize,
    data_size: usize,
    global_tags: TagList,
    dimension_tags: Vec<TagList>,
    component_tags: Vec<TagList>,
}

fn checked_product(dims: &[usize]) -> usize {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .expect("shape element count overflows usize")
}

impl ArrayDescription {
    /// Create a description with empty tag lists.
    ///
    /// # Panics
    /// Panics if the element or byte count overflows `usize`.
    pub fn new(
        dimensions: impl Into<Shape>,
        component_count: usize,
        data_type: DataType,
    ) -> Self {
        let dimensions = dimensions.into();
        // A description without dimensions has no elements. This asymmetry
        // (product of an empty list would be 1) is a load-bearing contract:
        // downstream code distinguishes "no shape yet" from "one scalar".
        let element_count = if dimensions.is_empty() {
            0
        } else {
            checked_product(&dimensions)
        };
        let element_size = component_count
            .checked_mul(data_type.size())
            .expect("element byte size overflows usize");
        let data_size = element_count
            .checked_mul(element_size)
            .expect("array byte size overflows usize");
        ArrayDescription {
            dimension_tags: vec![TagList::new(); dimensions.len()],
            component_tags: vec![TagList::new(); component_count],
            dimensions,
            component_count,
            data_type,
            element_count,
            element_size,
            data_size,
            global_tags: TagList::new(),
        }
    }

    /// Copy of this description with a different component type.
    ///
    /// Dimensions and all tag lists are preserved; the derived byte sizes are
    /// recomputed for the new type. Used by the conversion engine.
    pub fn with_data_type(&self, data_type: DataType) -> Self {
        let mut desc = ArrayDescription::new(self.dimensions.clone(), self.component_count, data_type);
        desc.global_tags = self.global_tags.clone();
        desc.dimension_tags = self.dimension_tags.clone();
        desc.component_tags = self.component_tags.clone();
        desc
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Size of dimension `d`.
    ///
    /// # Panics
    /// Panics if `d` is out of range.
    pub fn dimension(&self, d: usize) -> usize {
        self.dimensions[d]
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Byte size of one component.
    pub fn component_size(&self) -> usize {
        self.data_type.size()
    }

    /// Byte size of one element (`component_count * component_size`).
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of elements; zero when the description has no dimensions.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Total byte size of the array data.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Whether arrays of `self` and `other` can be combined element-wise:
    /// same component type, component count and element count.
    pub fn is_compatible(&self, other: &ArrayDescription) -> bool {
        self.data_type == other.data_type
            && self.component_count == other.component_count
            && self.element_count == other.element_count
    }

    /// Linear element index for a multidimensional index, dimension 0 fastest.
    ///
    /// # Panics
    /// Panics if `index` has the wrong length or any coordinate is out of
    /// range.
    pub fn linear_index(&self, index: &[usize]) -> usize {
        assert_eq!(
            index.len(),
            self.dimensions.len(),
            "index rank {} does not match dimension count {}",
            index.len(),
            self.dimensions.len()
        );
        assert!(!index.is_empty(), "description has no dimensions");
        for (d, (&i, &size)) in index.iter().zip(&self.dimensions).enumerate() {
            assert!(i < size, "index {i} out of range for dimension {d} (size {size})");
        }
        let mut linear = index[index.len() - 1];
        for d in (0..index.len() - 1).rev() {
            linear = linear * self.dimensions[d] + index[d];
        }
        linear
    }

    /// Multidimensional index for a linear element index; inverse of
    /// [`ArrayDescription::linear_index`].
    ///
    /// # Panics
    /// Panics if `linear >= element_count()`.
    pub fn vector_index(&self, linear: usize) -> Shape {
        assert!(
            linear < self.element_count,
            "element index {linear} out of range (count {})",
            self.element_count
        );
        let mut rest = linear;
        let mut index = Shape::with_capacity(self.dimensions.len());
        for &size in &self.dimensions {
            index.push(rest % size);
            rest /= size;
        }
        index
    }

    /// Byte offset of element `index` within the array data.
    ///
    /// # Panics
    /// Panics if `index >= element_count()`.
    pub fn element_offset(&self, index: usize) -> usize {
        assert!(
            index < self.element_count,
            "element index {index} out of range (count {})",
            self.element_count
        );
        index * self.element_size
    }

    /// Byte offset of component `component` of element `element`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn component_offset(&self, element: usize, component: usize) -> usize {
        assert!(
            component < self.component_count,
            "component index {component} out of range (count {})",
            self.component_count
        );
        self.element_offset(element) + component * self.component_size()
    }

    pub fn global_tags(&self) -> &TagList {
        &self.global_tags
    }

    pub fn global_tags_mut(&mut self) -> &mut TagList {
        &mut self.global_tags
    }

    /// Tag list of dimension `d`.
    ///
    /// # Panics
    /// Panics if `d` is out of range.
    pub fn dimension_tags(&self, d: usize) -> &TagList {
        &self.dimension_tags[d]
    }

    pub fn dimension_tags_mut(&mut self, d: usize) -> &mut TagList {
        &mut self.dimension_tags[d]
    }

    /// Tag list of component `c`.
    ///
    /// # Panics
    /// Panics if `c` is out of range.
    pub fn component_tags(&self, c: usize) -> &TagList {
        &self.component_tags[c]
    }

    pub fn component_tags_mut(&mut self, c: usize) -> &mut TagList {
        &mut self.component_tags[c]
    }
}
