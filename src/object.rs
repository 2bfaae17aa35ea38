//! PDF object model used by the writer.
//!
//! Objects are built in memory, given ids by [`crate::writer::PdfWriter`]
//! and serialized by [`crate::writer::ObjectSerializer`].

use std::collections::HashMap;

/// Dictionary payload of a PDF dictionary or stream.
pub type Dict = HashMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Stream data
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Build a name object.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    /// Build a dictionary from key/value pairs.
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Object)>) -> Self {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array of reals, as used for rectangles and matrices.
    pub fn reals(values: &[f32]) -> Self {
        Object::Array(values.iter().map(|v| Object::Real(f64::from(*v))).collect())
    }

    /// Build a stream object.
    pub fn stream(dict: Dict, data: impl Into<bytes::Bytes>) -> Self {
        Object::Stream {
            dict,
            data: data.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict_builder() {
        let obj = Object::dict([("Type", Object::name("Page")), ("Count", Object::Integer(2))]);
        let Object::Dictionary(d) = obj else {
            panic!("expected a dictionary");
        };
        assert_eq!(d["Type"], Object::Name("Page".to_string()));
        assert_eq!(d["Count"], Object::Integer(2));
    }

    #[test]
    fn test_stream_builder() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(3));
        let Object::Stream { dict, data } = Object::stream(dict, b"abc".to_vec()) else {
            panic!("expected a stream");
        };
        assert_eq!(dict["Length"], Object::Integer(3));
        assert_eq!(&data[..], b"abc");
    }

    #[test]
    fn test_reals_and_reference() {
        assert_eq!(Object::reals(&[0.0, 1.5]), Object::Array(vec![Object::Real(0.0), Object::Real(1.5)]));
        assert_eq!(ObjectRef::new(4, 0).to_string(), "4 0 R");
    }
}
