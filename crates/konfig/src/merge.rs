//! Decoding a document over an existing value.
//!
//! The target is captured as a [`serde_yaml::Value`] tree, which unlike a
//! JSON tree keeps non-finite floats. The document is merged over that tree
//! and the target is rebuilt from the result, so fields the document does
//! not mention come back unchanged.
//!
//! Merge rules:
//! - Mappings merge key by key. A document key matches a field exactly, or
//!   else ignoring case.
//! - A `null` in the document leaves the existing value alone.
//! - Anything else in the document replaces the existing value.

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::{ConfigError, Format};

/// Decode `document` over `target`'s current value.
///
/// A null document leaves `target` untouched.
pub(crate) fn decode_into<T>(
    document: serde_json::Value,
    format: Format,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    if document.is_null() {
        return Ok(());
    }

    let overlay = serde_yaml::to_value(document).map_err(|e| ConfigError::decode(format, e))?;
    let mut merged = serde_yaml::to_value(&*target).map_err(ConfigError::Snapshot)?;
    merge(&mut merged, overlay);

    *target = T::deserialize(Node(merged)).map_err(|e| ConfigError::decode(format, e))?;
    Ok(())
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                let key = resolve_key(base, key);
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// Exact match wins; otherwise the first key equal ignoring case
fn resolve_key(mapping: &Mapping, key: Value) -> Value {
    if mapping.contains_key(&key) {
        return key;
    }
    let Some(name) = key.as_str() else {
        return key;
    };

    let folded = name.to_lowercase();
    mapping
        .keys()
        .find(|candidate| {
            candidate
                .as_str()
                .is_some_and(|candidate| candidate.to_lowercase() == folded)
        })
        .cloned()
        .unwrap_or(key)
}

/// Deserializer over a merged tree.
///
/// Scalars go straight to `serde_yaml`. Mappings and sequences are walked
/// here so that a single-entry mapping can stand for an externally tagged
/// enum variant, the way a JSON document spells one.
struct Node(Value);

impl<'de> IntoDeserializer<'de, serde_yaml::Error> for Node {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn visit_mapping<'de, V>(mapping: Mapping, visitor: V) -> Result<V::Value, serde_yaml::Error>
where
    V: Visitor<'de>,
{
    let entries = mapping.into_iter().map(|(k, v)| (Node(k), Node(v)));
    let mut access: MapDeserializer<'de, _, serde_yaml::Error> = MapDeserializer::new(entries);
    let value = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(value)
}

fn visit_sequence<'de, V>(sequence: Vec<Value>, visitor: V) -> Result<V::Value, serde_yaml::Error>
where
    V: Visitor<'de>,
{
    let mut access: SeqDeserializer<_, serde_yaml::Error> =
        SeqDeserializer::new(sequence.into_iter().map(Node));
    let value = visitor.visit_seq(&mut access)?;
    access.end()?;
    Ok(value)
}

macro_rules! forward_scalar {
    ($($method:ident)*) => {$(
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<'de>,
        {
            match self.0 {
                value @ (Value::Mapping(_) | Value::Sequence(_)) => {
                    Node(value).deserialize_any(visitor)
                }
                value => value.$method(visitor),
            }
        }
    )*};
}

impl<'de> Deserializer<'de> for Node {
    type Error = serde_yaml::Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Mapping(mapping) => visit_mapping(mapping, visitor),
            Value::Sequence(sequence) => visit_sequence(sequence, visitor),
            value => value.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(Node(value)),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            Value::Mapping(mapping) if mapping.len() == 1 => {
                let entries = mapping.into_iter().map(|(k, v)| (Node(k), Node(v)));
                let access: MapDeserializer<'de, _, serde_yaml::Error> =
                    MapDeserializer::new(entries);
                visitor.visit_enum(MapAccessDeserializer::new(access))
            }
            value => value.deserialize_enum(name, variants, visitor),
        }
    }

    forward_scalar! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_unit deserialize_identifier
        deserialize_ignored_any
    }

    serde::forward_to_deserialize_any! {
        seq tuple tuple_struct map struct unit_struct
    }
}
