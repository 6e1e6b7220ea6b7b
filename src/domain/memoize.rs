//! Result memoization backed by a shared [`CacheStore`].
//!
//! The cache key is a SHA-256 fingerprint of the operation name and its
//! arguments serialized to canonical JSON (object keys sorted at every depth,
//! so named-argument order never changes the key). Only successful results are
//! cached. Arguments containing NaN or an infinity bypass the cache, since
//! their JSON form cannot tell them apart. Concurrent misses on the same key
//! collapse into one invocation; if that invocation fails nothing is stored
//! and the next waiter runs it.

use crate::domain::cache::CacheStore;
use crate::domain::error::TradingSystemError;
use crate::domain::operation::Operation;
use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Sort object keys recursively so serialization order is irrelevant.
pub fn canonicalize_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let old_map = std::mem::take(map);
            let mut entries: Vec<(String, Value)> = old_map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (_, v) in entries.iter_mut() {
                canonicalize_json_value(v);
            }
            for (k, v) in entries {
                map.insert(k, v);
            }
        }
        Value::Array(values) => {
            for v in values.iter_mut() {
                canonicalize_json_value(v);
            }
        }
        _ => {}
    }
}

/// Deterministic cache key for `operation` called with `args`.
///
/// Arguments holding NaN or an infinity have no faithful key (JSON writes
/// them all as `null`) and are rejected with a `Validation` error.
pub fn fingerprint<A>(operation: &str, args: &A) -> Result<String, TradingSystemError>
where
    A: Serialize + ?Sized,
{
    fingerprint_key(operation, args)?.ok_or_else(|| {
        TradingSystemError::validation(format!(
            "{operation} arguments contain a non-finite float"
        ))
    })
}

/// `None` when the arguments contain a non-finite float.
fn fingerprint_key<A>(operation: &str, args: &A) -> Result<Option<String>, TradingSystemError>
where
    A: Serialize + ?Sized,
{
    let mut value = serde_json::to_value(args)?;
    if args.serialize(FiniteCheck).is_err() {
        return Ok(None);
    }
    canonicalize_json_value(&mut value);
    let document = serde_json::json!({ "args": value, "op": operation });
    let bytes = serde_json::to_vec(&document)?;
    Ok(Some(hex::encode(Sha256::digest(&bytes))))
}

pub struct Memoized<O> {
    inner: O,
    store: Arc<CacheStore>,
    ttl: Duration,
}

/// Cache successful results of `inner` in `store` for `ttl`.
pub fn with_cache<O>(inner: O, store: Arc<CacheStore>, ttl: Duration) -> Memoized<O> {
    Memoized { inner, store, ttl }
}

impl<A, O> Operation<A> for Memoized<O>
where
    A: Serialize,
    O: Operation<A>,
    O::Output: Clone + Send + Sync + 'static,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<O::Output, TradingSystemError> {
        let name = self.inner.name();
        let Some(key) = fingerprint_key(name, &args)? else {
            tracing::debug!(operation = %name, "{} arguments not cacheable, calling through", name);
            return self.inner.call(args);
        };

        if let Some(hit) = self.store.get::<O::Output>(&key) {
            tracing::debug!(operation = %name, "cache hit for {}", name);
            return Ok(hit);
        }

        let _claim = self.store.claim(&key);
        // another caller may have filled the key while we waited
        if let Some(hit) = self.store.get::<O::Output>(&key) {
            tracing::debug!(operation = %name, "cache hit for {} after wait", name);
            return Ok(hit);
        }

        let value = self.inner.call(args)?;
        self.store.put(&key, value.clone(), self.ttl);
        tracing::debug!(operation = %name, ttl_secs = self.ttl.as_secs(), "cached result for {}", name);
        Ok(value)
    }
}

/// Serializer that only walks a value, failing on the first NaN or infinity.
struct FiniteCheck;

type CheckError = serde::de::value::Error;
type CheckResult = Result<(), CheckError>;

fn check_float(finite: bool) -> CheckResult {
    if finite {
        Ok(())
    } else {
        Err(<CheckError as ser::Error>::custom("non-finite float"))
    }
}

macro_rules! accept {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(fn $method(self, _: $ty) -> CheckResult {
            Ok(())
        })*
    };
}

impl Serializer for FiniteCheck {
    type Ok = ();
    type Error = CheckError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    accept!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_struct(&'static str),
    );

    fn serialize_f32(self, v: f32) -> CheckResult {
        check_float(v.is_finite())
    }

    fn serialize_f64(self, v: f64) -> CheckResult {
        check_float(v.is_finite())
    }

    fn serialize_none(self) -> CheckResult {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, CheckError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, CheckError> {
        Ok(self)
    }
}

macro_rules! walk_compound {
    ($($trait:ident::$method:ident),* $(,)?) => {
        $(impl ser::$trait for FiniteCheck {
            type Ok = ();
            type Error = CheckError;

            fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
                value.serialize(FiniteCheck)
            }

            fn end(self) -> CheckResult {
                Ok(())
            }
        })*
    };
}

walk_compound!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field,
);

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> CheckResult {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = CheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}
