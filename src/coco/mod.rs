//! The COCO-style output model.
//!
//! An [`AnnotationDocument`] holds three collections linked by integer ids:
//! images, categories and annotations. Every annotation points at one image
//! and one category through [`ImageId`] and [`CategoryId`].
//!
//! # Example
//!
//! ```
//! use cocofy::coco::{AnnotationDocument, CategoryRecord, ImageRecord};
//!
//! let document = AnnotationDocument {
//!     images: vec![ImageRecord::new(0u64, "image.jpg", 640, 480)],
//!     categories: vec![CategoryRecord::new(0u64, "person")],
//!     ..Default::default()
//! };
//! assert_eq!(document.images[0].file_name, "image.jpg");
//! ```

mod ids;
pub mod io_json;
mod model;

pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{area, AnnotationDocument, AnnotationRecord, CategoryRecord, ImageRecord};
