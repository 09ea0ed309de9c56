//! # SHADE Registry
//!
//! Reference collaborators for the SHADE protocol: where meta-addresses are
//! published and where announcements are appended.
//!
//! This crate provides:
//!
//! - **Memory**: [`MemoryKeyRegistry`] and [`MemoryAnnouncementLog`] for
//!   development, testing and single-process deployments
//! - **File**: [`FileAnnouncementLog`], a persistent log for single-node use
//!
//! ## Example
//!
//! ```rust
//! use shade_core::{Address, AnnouncementLog};
//! use shade_registry::MemoryAnnouncementLog;
//! # use shade_core::{Announcement, EncodedPublicKey, ViewTag};
//! # tokio_test::block_on(async {
//! # let announcement = Announcement::new(
//! #     EncodedPublicKey::from_bytes(&[2u8; 33]).unwrap(),
//! #     Address::from_array([1; 20]),
//! #     ViewTag::from_array([7; 12]),
//! # );
//! let log = MemoryAnnouncementLog::new();
//! let sender = Address::from_array([0xAA; 20]);
//!
//! let offset = log.append(&sender, announcement).await.unwrap();
//! let page = log.read_from(offset, 100).await.unwrap();
//! assert_eq!(page.len(), 1);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::{FileAnnouncementLog, DEFAULT_AUTO_SAVE_THRESHOLD};
pub use memory::{LogIter, MemoryAnnouncementLog, MemoryKeyRegistry};

// Re-export the collaborator traits from core
pub use shade_core::traits::{AnnouncementLog, KeyRegistry};
