//! Multidimensional arrays with tagged metadata and pluggable storage.
//!
//! `gridbuf` is the shared data model underneath a family of file-format
//! adapters: elements made of a fixed number of fixed-type numeric components,
//! arranged along an ordered list of dimensions, with string key/value
//! metadata attached globally, per dimension and per component.
//!
//! The pieces, leaves first:
//! - [`TagList`]: a uniquely-keyed, key-sorted string map.
//! - [`Allocator`] / [`Storage`]: pluggable allocation producing shared byte
//!   buffers; [`HeapAllocator`] is the default, [`MmapAllocator`] backs
//!   buffers with memory-mapped files for out-of-core arrays.
//! - [`ArrayDescription`]: shape, component type and tags, with the derived
//!   byte sizes and the multidimensional index arithmetic.
//! - [`ArrayContainer`]: a description plus shared storage. Cloning shares
//!   the buffer; [`ArrayContainer::deep_copy`] is the only way to a private
//!   one.
//! - [`Array<T>`](Array): a type-checked view adding component and element
//!   iteration and zero-copy `ndarray` views.
//! - [`convert`]: the total conversion engine across the ten scalar types;
//!   same-type calls share storage.
//!
//! ```
//! use gridbuf::{convert, ArrayContainer, ArrayDescription, DataType};
//! use smallvec::smallvec;
//!
//! let desc = ArrayDescription::new(smallvec![2usize, 3], 1, DataType::U8);
//! let mut image = ArrayContainer::new(desc);
//! image.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
//! image.component_tags_mut(0).set("INTERPRETATION", "gray");
//!
//! assert_eq!(image.linear_index(&[1, 2]), 5);
//! assert_eq!(image.get::<u8>(5, 0), 6);
//!
//! let floats = convert(&image, DataType::F32);
//! assert_eq!(floats.get::<f32>(5, 0), 6.0);
//! ```
//!
//! ## Sharing model
//! Buffers are reference counted. Concurrent reads from several threads are
//! safe; mutation of a shared buffer is not synchronized and must be
//! serialized by the caller. All operations are synchronous and bounded; the
//! only blocking I/O is the allocator's initial file open/resize/map, which
//! either completes or fails with an [`AllocationError`].

pub mod alloc;
pub mod array;
pub mod container;
pub mod convert;
pub mod desc;
pub mod dtype;
pub mod error;
pub mod tags;

pub use alloc::{Allocator, HeapAllocator, MmapAllocator, Storage};
pub use array::Array;
pub use container::ArrayContainer;
pub use convert::convert;
pub use desc::{ArrayDescription, Shape};
pub use dtype::{DataType, ParseDataTypeError, Scalar, ALL_DATA_TYPES};
pub use error::AllocationError;
pub use tags::TagList;
