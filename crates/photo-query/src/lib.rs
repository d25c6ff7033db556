//! photo-query - Tag search
//!
//! Resolves tag names to concepts and filters the catalogue down to photos
//! carrying every requested tag.
//!
//! # Example
//!
//! ```rust
//! use photo_query::{search, TagQuery};
//! use photo_store::PhotoStore;
//!
//! let mut store = PhotoStore::new();
//! let id = store.add_photo("abc", "beach.jpg").unwrap();
//! store.tag_photo(id, "sea").unwrap();
//! store.tag_photo(id, "sunny day").unwrap();
//!
//! let query = TagQuery::from_words(["Sea", "-", "sunny", "day"]).unwrap();
//! assert_eq!(search(&store, &query).unwrap(), vec!["beach.jpg"]);
//! ```

mod search;

pub use search::{find_photos, search, TagQuery};
