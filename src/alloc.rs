//! Allocation strategies and shared byte storage.
//!
//! An [`Allocator`] produces [`Storage`]: a fixed-length, reference-counted
//! byte buffer whose release strategy was captured at allocation time. The
//! consuming code ([`crate::container::ArrayContainer`]) never knows whether a
//! buffer lives on the heap or in a memory-mapped file; dropping the last
//! reference releases it the matching way (dealloc or munmap).
//!
//! Two allocators are provided:
//! - [`HeapAllocator`]: the default, global-allocator backed.
//! - [`MmapAllocator`]: file-backed storage in four modes (private temp file,
//!   new named file, existing file read-only, existing file read-write), for
//!   arrays larger than RAM. On targets without memory-mapping primitives it
//!   degrades to a heap buffer with identical functional behavior.
//!
//! ## Sharing and mutation
//! `Storage` clones share the same bytes. Concurrent reads from multiple
//! threads are safe; mutation of a shared buffer is not synchronized and must
//! be serialized by the caller. All slices handed out are derived from one
//! raw pointer owned by the storage, so aliased views stay coherent.

use std::alloc::Layout;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::AllocationError;

/// Minimum alignment of every buffer, enough for the widest scalar type.
const BUFFER_ALIGN: usize = 8;

/// A strategy for producing [`Storage`] buffers.
pub trait Allocator {
    /// Allocate a buffer of exactly `size` bytes.
    ///
    /// # Errors
    /// Returns [`AllocationError`] when an OS-level file or mapping operation
    /// fails. Plain heap exhaustion aborts through the global allocator's
    /// error hook, as it does for `Vec`.
    fn allocate(&self, size: usize) -> Result<Storage, AllocationError>;

    /// Whether buffers returned by this allocator are guaranteed zero-filled.
    fn clears_memory(&self) -> bool;
}

enum Backing {
    /// Zero-length storage; no release needed.
    Empty,
    /// Buffer from the global allocator, released with the same layout.
    Heap { layout: Layout },
    /// Writable memory mapping; drop unmaps.
    #[cfg(any(unix, windows))]
    Map(memmap2::MmapMut),
    /// Read-only memory mapping; drop unmaps.
    #[cfg(any(unix, windows))]
    MapRo(memmap2::Mmap),
}

struct StorageInner {
    ptr: NonNull<u8>,
    len: usize,
    writable: bool,
    backing: Backing,
}

// The raw pointer targets memory owned by `backing` (heap block or mapping),
// which lives exactly as long as the inner value. Concurrent mutation is the
// caller's contract to serialize.
unsafe impl Send for StorageInner {}
unsafe impl Sync for StorageInner {}

impl Drop for StorageInner {
    fn drop(&mut self) {
        if let Backing::Heap { layout } = self.backing {
            // Safety: `ptr` came from `alloc_zeroed` with this exact layout
            // and has not been released before.
            unsafe { std::alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
        // Mappings unmap when the Mmap/MmapMut value drops.
    }
}

/// A shared, fixed-length byte buffer with a captured release strategy.
///
/// Cloning shares the bytes; the last clone dropped releases them through
/// whatever backing the allocator chose.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<StorageInner>,
}

impl Storage {
    /// Zero-length storage, used for empty arrays.
    pub(crate) fn empty() -> Self {
        Storage {
            inner: Arc::new(StorageInner {
                ptr: NonNull::dangling(),
                len: 0,
                writable: true,
                backing: Backing::Empty,
            }),
        }
    }

    /// Heap storage of `len` zeroed bytes, aligned for any scalar type.
    pub(crate) fn heap(len: usize) -> Self {
        if len == 0 {
            return Storage::empty();
        }
        let layout = match Layout::from_size_align(len, BUFFER_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("buffer of {len} bytes exceeds the address space"),
        };
        // Safety: `layout` has non-zero size.
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            std::alloc::handle_alloc_error(layout);
        };
        Storage {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                writable: true,
                backing: Backing::Heap { layout },
            }),
        }
    }

    #[cfg(any(unix, windows))]
    fn from_map(mut map: memmap2::MmapMut) -> Self {
        let ptr = NonNull::new(map.as_mut_ptr()).expect("mapped region has a non-null address");
        let len = map.len();
        Storage {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                writable: true,
                backing: Backing::Map(map),
            }),
        }
    }

    #[cfg(any(unix, windows))]
    fn from_map_ro(map: memmap2::Mmap) -> Self {
        let ptr =
            NonNull::new(map.as_ptr() as *mut u8).expect("mapped region has a non-null address");
        let len = map.len();
        Storage {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                writable: false,
                backing: Backing::MapRo(map),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Whether mutable access is permitted (false for read-only mappings).
    pub fn is_writable(&self) -> bool {
        self.inner.writable
    }

    /// Whether `self` and `other` reference the same bytes.
    pub fn shares_with(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.inner.ptr.as_ptr()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // Safety: `ptr` covers exactly `len` initialized bytes for the
        // lifetime of the storage.
        unsafe { std::slice::from_raw_parts(self.inner.ptr.as_ptr(), self.inner.len) }
    }

    /// # Safety
    /// Mutation of a shared buffer must be serialized by the caller; no other
    /// slice derived from this storage may be accessed concurrently.
    ///
    /// # Panics
    /// Panics for read-only mappings.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn as_mut_slice(&self) -> &mut [u8] {
        assert!(
            self.inner.writable,
            "mutable access to storage backed by a read-only mapping"
        );
        std::slice::from_raw_parts_mut(self.inner.ptr.as_ptr(), self.inner.len)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.inner.len)
            .field("writable", &self.inner.writable)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

/// The default allocator: heap memory from the global allocator.
///
/// `clears_memory` is `false`: callers get no zero-fill guarantee, whatever
/// the current implementation happens to do.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn allocate(&self, size: usize) -> Result<Storage, AllocationError> {
        Ok(Storage::heap(size))
    }

    fn clears_memory(&self) -> bool {
        false
    }
}

/// How an [`MmapAllocator`] backs its buffers with a file.
#[derive(Debug, Clone)]
enum MmapMode {
    /// Unlinked temp file in a directory; zeroed; not observable afterwards.
    Private { dir: PathBuf },
    /// Create/truncate a named file to the requested size; zeroed.
    NewFile { path: PathBuf },
    /// Map an existing file read-only at its current size.
    ReadFile { path: PathBuf },
    /// Map an existing file read-write at its current size.
    ReadWriteFile { path: PathBuf },
}

/// File-backed storage for arrays larger than RAM.
///
/// For the existing-file modes the requested byte count must equal the file's
/// actual size; the allocator maps exactly the requested length and callers
/// that pass anything else are outside the contract.
#[derive(Debug, Clone)]
pub struct MmapAllocator {
    mode: MmapMode,
}

impl MmapAllocator {
    /// Storage backed by an unlinked temporary file in `dir`.
    ///
    /// The file is not observable: it is unlinked as soon as it is open
    /// (`O_TMPFILE` where the platform supports it). Contents start zeroed.
    pub fn private(dir: impl Into<PathBuf>) -> Self {
        MmapAllocator {
            mode: MmapMode::Private { dir: dir.into() },
        }
    }

    /// Storage backed by a newly created (or truncated) named file.
    pub fn new_file(path: impl Into<PathBuf>) -> Self {
        MmapAllocator {
            mode: MmapMode::NewFile { path: path.into() },
        }
    }

    /// Read-only storage over an existing file's contents.
    pub fn read_file(path: impl Into<PathBuf>) -> Self {
        MmapAllocator {
            mode: MmapMode::ReadFile { path: path.into() },
        }
    }

    /// Writable storage over an existing file's contents.
    pub fn read_write_file(path: impl Into<PathBuf>) -> Self {
        MmapAllocator {
            mode: MmapMode::ReadWriteFile { path: path.into() },
        }
    }
}

impl Allocator for MmapAllocator {
    fn allocate(&self, size: usize) -> Result<Storage, AllocationError> {
        if size == 0 {
            return Ok(Storage::empty());
        }
        allocate_mapped(&self.mode, size)
    }

    fn clears_memory(&self) -> bool {
        // New file content is zero pages; existing files reflect their bytes.
        matches!(
            self.mode,
            MmapMode::Private { .. } | MmapMode::NewFile { .. }
        )
    }
}

#[cfg(any(unix, windows))]
fn allocate_mapped(mode: &MmapMode, size: usize) -> Result<Storage, AllocationError> {
    match mode {
        MmapMode::Private { dir } => {
            let file = tempfile::tempfile_in(dir).map_err(|source| AllocationError::Open {
                path: dir.clone(),
                source,
            })?;
            file.set_len(size as u64)
                .map_err(|source| AllocationError::Resize {
                    path: dir.clone(),
                    source,
                })?;
            // Safety: the file is unlinked and owned by this handle, so no
            // other process can truncate the mapping out from under us.
            let map = unsafe { memmap2::MmapMut::map_mut(&file) }.map_err(|source| {
                AllocationError::Map {
                    path: dir.clone(),
                    source,
                }
            })?;
            Ok(Storage::from_map(map))
        }
        MmapMode::NewFile { path } => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|source| AllocationError::Open {
                    path: path.clone(),
                    source,
                })?;
            file.set_len(size as u64)
                .map_err(|source| AllocationError::Resize {
                    path: path.clone(),
                    source,
                })?;
            // Safety: freshly created file, sized above; the caller contract
            // forbids external truncation while mapped.
            let map = unsafe { memmap2::MmapMut::map_mut(&file) }.map_err(|source| {
                AllocationError::Map {
                    path: path.clone(),
                    source,
                }
            })?;
            Ok(Storage::from_map(map))
        }
        MmapMode::ReadFile { path } => {
            let file = std::fs::File::open(path).map_err(|source| AllocationError::Open {
                path: path.clone(),
                source,
            })?;
            // Safety: read-only mapping of a caller-owned file; the caller
            // contract forbids concurrent truncation.
            let map = unsafe { memmap2::MmapOptions::new().len(size).map(&file) }.map_err(
                |source| AllocationError::Map {
                    path: path.clone(),
                    source,
                },
            )?;
            Ok(Storage::from_map_ro(map))
        }
        MmapMode::ReadWriteFile { path } => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|source| AllocationError::Open {
                    path: path.clone(),
                    source,
                })?;
            // Safety: see above.
            let map = unsafe { memmap2::MmapOptions::new().len(size).map_mut(&file) }.map_err(
                |source| AllocationError::Map {
                    path: path.clone(),
                    source,
                },
            )?;
            Ok(Storage::from_map(map))
        }
    }
}

/// Heap fallback for targets without memory-mapping primitives: zero-filled
/// buffers for the creating modes, file contents copied in for the existing
/// modes. Functional behavior is preserved; only the out-of-core property is
/// lost.
#[cfg(not(any(unix, windows)))]
fn allocate_mapped(mode: &MmapMode, size: usize) -> Result<Storage, AllocationError> {
    use std::io::Read;

    match mode {
        MmapMode::Private { .. } => Ok(Storage::heap(size)),
        MmapMode::NewFile { path } => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|source| AllocationError::Open {
                    path: path.clone(),
                    source,
                })?;
            file.set_len(size as u64)
                .map_err(|source| AllocationError::Resize {
                    path: path.clone(),
                    source,
                })?;
            Ok(Storage::heap(size))
        }
        MmapMode::ReadFile { path } | MmapMode::ReadWriteFile { path } => {
            let mut file = std::fs::File::open(path).map_err(|source| AllocationError::Open {
                path: path.clone(),
                source,
            })?;
            let storage = Storage::heap(size);
            // Safety: freshly allocated, not yet shared.
            let buf = unsafe { storage.as_mut_slice() };
            file.read_exact(buf)
                .map_err(|source| AllocationError::Read {
                    path: path.clone(),
                    source,
                })?;
            Ok(storage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_storage_has_requested_len_and_alignment() {
        let storage = HeapAllocator.allocate(37).unwrap();
        assert_eq!(storage.len(), 37);
        assert!(storage.is_writable());
        assert_eq!(storage.as_ptr() as usize % BUFFER_ALIGN, 0);
    }

    #[test]
    fn heap_allocator_reports_no_zero_guarantee() {
        assert!(!HeapAllocator.clears_memory());
    }

    #[test]
    fn zero_sized_allocation_is_empty() {
        let storage = HeapAllocator.allocate(0).unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn clones_share_bytes() {
        let a = HeapAllocator.allocate(16).unwrap();
        let b = a.clone();
        assert!(a.shares_with(&b));
        unsafe { b.as_mut_slice()[3] = 0xAB };
        assert_eq!(a.as_slice()[3], 0xAB);
    }

    #[test]
    fn separate_allocations_do_not_share() {
        let a = HeapAllocator.allocate(16).unwrap();
        let b = HeapAllocator.allocate(16).unwrap();
        assert!(!a.shares_with(&b));
    }

    #[test]
    fn mmap_mode_zero_guarantees() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(MmapAllocator::private(dir.path()).clears_memory());
        assert!(MmapAllocator::new_file(dir.path().join("f")).clears_memory());
        assert!(!MmapAllocator::read_file(dir.path().join("f")).clears_memory());
        assert!(!MmapAllocator::read_write_file(dir.path().join("f")).clears_memory());
    }

    #[test]
    fn private_mapping_reads_back_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = MmapAllocator::private(dir.path()).allocate(1024).unwrap();
        assert_eq!(storage.len(), 1024);
        assert!(storage.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn open_failure_carries_the_path() {
        let missing = std::path::Path::new("/nonexistent-dir-gridbuf/file.bin");
        let err = MmapAllocator::read_file(missing).allocate(16).unwrap_err();
        match &err {
            AllocationError::Open { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.path(), missing);
    }
}
