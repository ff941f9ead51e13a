//! A bridge between typed values and generic XML fragments.
//!
//! Types that know how to stream themselves (the [`XmlSerializable`] /
//! [`XmlDeserializable`] contracts) are marshalled into a [`Fragment`] — an
//! element-name/attributes/children exchange representation — and rebuilt
//! from one via a per-type [`DeserializerFactory`] resolved through a
//! [`FactoryRegistry`]. Namespace scoping travels alongside as a
//! [`NamespaceSnapshot`] and is replayed onto the synthetic subtree during
//! unmarshalling.
//!
//! # Example
//!
//! ```
//! use xmlbind::{
//!     BindError, DeserializerFactory, FactoryRegistry, QName, XmlDeserializable, XmlRead,
//!     XmlSerializable, XmlWrite, deserialize_helper, marshal, unmarshal,
//! };
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Song {
//!     title: String,
//! }
//!
//! impl XmlSerializable for Song {
//!     fn serialize(&self, out: &mut dyn XmlWrite) -> Result<(), BindError> {
//!         out.start_element(&QName::local("song"))?;
//!         out.attribute(&QName::local("title"), &self.title)?;
//!         out.end_element()
//!     }
//! }
//!
//! impl XmlDeserializable for Song {
//!     fn element_name(&self) -> QName {
//!         QName::local("song")
//!     }
//!
//!     fn deserialize_attribute(
//!         &mut self,
//!         _ns: Option<&str>,
//!         local_name: &str,
//!         value: &str,
//!     ) -> Result<bool, BindError> {
//!         if local_name == "title" {
//!             self.title = value.to_owned();
//!             return Ok(true);
//!         }
//!         Ok(false)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct SongFactory;
//!
//! impl DeserializerFactory<Song> for SongFactory {
//!     fn deserialize(&self, reader: &mut dyn XmlRead) -> Result<Song, BindError> {
//!         deserialize_helper(Song::default(), reader)
//!     }
//! }
//!
//! let mut registry = FactoryRegistry::new();
//! registry.register::<Song, _>(SongFactory)?;
//!
//! let song = Song { title: "echoes".into() };
//! let fragment = marshal(&song)?;
//! assert_eq!(fragment.attributes.len(), 1);
//!
//! let rebuilt: Song = unmarshal(&registry, &fragment, None)?;
//! assert_eq!(rebuilt, song);
//! # Ok::<(), xmlbind::BindError>(())
//! ```

#![deny(unsafe_code)]

mod error;
mod event;
mod fragment;
mod marshal;
mod registry;
mod serializable;
mod tracing_macros;
mod tree_reader;
mod tree_writer;
mod unmarshal;

pub use error::{BindError, BindErrorKind};
pub use event::{EventKind, XmlRead, XmlWrite};
pub use fragment::Fragment;
pub use marshal::marshal;
pub use registry::{DeserializerFactory, FactoryRegistry, XmlDeserialize};
pub use serializable::{ChildHandling, XmlDeserializable, XmlSerializable, deserialize_helper};
pub use tree_reader::TreeReader;
pub use tree_writer::TreeWriter;
pub use unmarshal::{PLACEHOLDER_NAME, unmarshal, unmarshal_with};

// Re-export the node model so downstream code needs only one dependency.
pub use xmlbind_node::{
    Element, NamespaceSnapshot, Node, ParseError, QName, is_xml_whitespace, parse_element,
    parse_forest,
};
