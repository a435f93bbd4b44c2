//! nf-library: the scanned catalog.
//!
//! The scanner walks the configured collection directories and produces an
//! immutable [`Library`] snapshot with id indexes. [`LibraryHandle`] holds the
//! current snapshot and is swapped wholesale on rescan. Sidecar descriptors
//! are parsed lazily through [`DescriptorSlot`].

pub mod descriptor;
pub mod handle;
pub mod index;
pub mod model;
pub mod scan;

pub use descriptor::{Actor, AudioDetails, Descriptor, DescriptorSlot, StreamDetails, VideoDetails};
pub use handle::LibraryHandle;
pub use index::{Details, EpisodeEntry, ItemEntry, Library, SeasonEntry};
pub use model::{Collection, Episode, Item, ItemKind, Season};
pub use scan::{scan, scan_collection};
