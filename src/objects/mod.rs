//! Object store explorer
//!
//! - [`classify`]: media kind from the key suffix
//! - [`client`]: the [`ObjectStore`] seam and its S3 implementation
//! - [`descriptor`]: metadata plus presigned URL for one object
//! - [`explorer`]: the tab's state machine
//!
//! ```rust
//! use data_explorer::objects::{classify, MediaKind};
//!
//! assert_eq!(classify("video.mp4"), MediaKind::Video);
//! assert_eq!(classify("SCAN.PNG"), MediaKind::Image);
//! assert_eq!(classify("report.docx"), MediaKind::Other);
//! ```

pub mod classify;
pub mod client;
pub mod descriptor;
pub mod explorer;

pub use classify::{classify, MediaKind};
pub use client::{ObjectStore, S3ObjectStore};
pub use descriptor::{
    describe, download_to_temp, temp_suffix, AccessUrl, ObjectDescriptor, ObjectMetadata,
};
pub use explorer::{ObjectExplorer, ObjectView, Preview};
