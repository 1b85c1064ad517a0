//! Newtype ids for the three linked COCO collections.
//!
//! An annotation carries both an image id and a category id; keeping them
//! as distinct types means a lookup table for one can never be indexed with
//! the other.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! collection_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Creates an id from a raw value.
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Creates an id from a 0-based position in its collection.
            #[inline]
            pub fn from_index(index: usize) -> Self {
                Self(index as u64)
            }

            /// Returns the underlying u64 value.
            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

collection_id!(
    /// Position of a distinct file name in first-seen order.
    ImageId
);

collection_id!(
    /// Position of a name in the caller's category vocabulary.
    CategoryId
);

collection_id!(
    /// Position of an annotation among the kept, labelled rows.
    AnnotationId
);
