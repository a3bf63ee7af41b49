//! Decoding of response bodies into typed values.
//!
//! [`JsonDecoder`] parses the body in two passes: the raw bytes are first read
//! into a [`serde_json::Value`], then the target type is deserialized from that
//! value through a deserializer whose error type is [`DecodeError`]. The second
//! pass lets serde report *what* went wrong (a missing key, a null, a wrong
//! type) through its structured error hooks instead of a flat message.

use std::{fmt::Display, marker::PhantomData};

use serde::de::{
    self,
    value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer},
    DeserializeOwned, Deserializer, Expected, IntoDeserializer, Unexpected, Visitor,
};
use serde_json::{Number, Value};

/// Turns a response body into a value of the requested type.
pub trait Decoder: Send + Sync {
    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError>;
}

/// Why a body could not be decoded. The `Display` output is the detail
/// string reported to callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Data corrupted: {0}")]
    DataCorrupted(String),
    #[error("Key '{0}' not found")]
    KeyNotFound(String),
    #[error("Type mismatch for '{0}'")]
    TypeMismatch(String),
    #[error("Value '{0}' not found")]
    ValueNotFound(String),
    #[error("{0}")]
    Other(String),
}

impl de::Error for DecodeError {
    fn custom<T: Display>(msg: T) -> Self {
        DecodeError::Other(msg.to_string())
    }

    fn invalid_type(unexp: Unexpected<'_>, exp: &dyn Expected) -> Self {
        match unexp {
            // JSON null where a value was required
            Unexpected::Unit => DecodeError::ValueNotFound(exp.to_string()),
            _ => DecodeError::TypeMismatch(exp.to_string()),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        DecodeError::KeyNotFound(field.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, DecodeError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| DecodeError::DataCorrupted(err.to_string()))?;
        T::deserialize(ValueDeserializer::new(value))
    }
}

/// Owned deserializer over a parsed JSON tree, generic over its error type.
struct ValueDeserializer<E> {
    value: Value,
    marker: PhantomData<E>,
}

impl<E> ValueDeserializer<E> {
    fn new(value: Value) -> Self {
        Self {
            value,
            marker: PhantomData,
        }
    }
}

impl<'de, E: de::Error> IntoDeserializer<'de, E> for ValueDeserializer<E> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn visit_number<'de, V, E>(number: Number, visitor: V) -> Result<V::Value, E>
where
    V: Visitor<'de>,
    E: de::Error,
{
    if let Some(n) = number.as_u64() {
        visitor.visit_u64(n)
    } else if let Some(n) = number.as_i64() {
        visitor.visit_i64(n)
    } else if let Some(n) = number.as_f64() {
        visitor.visit_f64(n)
    } else {
        Err(E::custom(format!("number {} is not representable", number)))
    }
}

fn object_access<'de, E: de::Error>(
    map: serde_json::Map<String, Value>,
) -> MapDeserializer<'de, impl Iterator<Item = (String, ValueDeserializer<E>)>, E> {
    MapDeserializer::new(
        map.into_iter()
            .map(|(key, value)| (key, ValueDeserializer::new(value))),
    )
}

impl<'de, E: de::Error> Deserializer<'de> for ValueDeserializer<E> {
    type Error = E;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => visit_number(n, visitor),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => {
                let mut seq: SeqDeserializer<_, E> =
                    SeqDeserializer::new(items.into_iter().map(ValueDeserializer::<E>::new));
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Value::Object(map) => {
                let mut access = object_access::<E>(map);
                let value = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(value)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, E> {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::<E>::new(value)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, E> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, E> {
        match self.value {
            Value::String(variant) => {
                visitor.visit_enum(<String as IntoDeserializer<'de, E>>::into_deserializer(variant))
            }
            Value::Object(map) if map.len() == 1 => {
                visitor.visit_enum(MapAccessDeserializer::new(object_access::<E>(map)))
            }
            other => ValueDeserializer::<E>::new(other).deserialize_any(visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}
