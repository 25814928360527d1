//! Binding named arguments onto declared callback parameters.
//!
//! A callback declares its parameters up front as a [`Signature`]. At call
//! time [`bind`] walks that signature in order and, for each parameter,
//! takes the supplied value, else the declared default, else `null` if the
//! parameter is nullable. Anything else is a `MissingRequiredArgument`.
//!
//! ```
//! use serde_json::{json, Map, Value};
//! use trellis_views::binder::{bind, Signature};
//!
//! let signature = Signature::new()
//!     .required("a")
//!     .with_default("b", "default")
//!     .nullable("c");
//!
//! let mut args = Map::new();
//! args.insert("a".into(), json!("x"));
//!
//! let bound = bind(&signature, &args).unwrap();
//! assert_eq!(bound.positional(), &[json!("x"), json!("default"), Value::Null]);
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use serde_json::{Map, Value};
use trellis_core::{TrellisError, TrellisResult};

/// One declared callback parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: Option<Value>,
    nullable: bool,
}

impl Parameter {
    /// A parameter that must be supplied.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            nullable: false,
        }
    }

    /// A parameter that falls back to `default` when omitted.
    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
            nullable: false,
        }
    }

    /// A parameter that binds to `null` when omitted.
    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            nullable: true,
        }
    }

    /// Marks the parameter nullable. A default, if present, still wins.
    #[must_use]
    pub fn or_null(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn resolve<A: ArgumentSource + ?Sized>(&self, args: &A) -> TrellisResult<Value> {
        if let Some(value) = args.argument(&self.name) {
            return Ok(value);
        }
        if let Some(default) = &self.default {
            return Ok(default.clone());
        }
        if self.nullable {
            return Ok(Value::Null);
        }
        Err(TrellisError::MissingRequiredArgument(self.name.clone()))
    }
}

/// The ordered parameter list of a callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// An empty signature; the callback takes no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(Parameter::required(name))
    }

    #[must_use]
    pub fn with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.param(Parameter::with_default(name, default))
    }

    #[must_use]
    pub fn nullable(self, name: impl Into<String>) -> Self {
        self.param(Parameter::nullable(name))
    }

    /// Returns the parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl FromIterator<Parameter> for Signature {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self {
            parameters: iter.into_iter().collect(),
        }
    }
}

/// Arguments resolved against a [`Signature`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    names: Vec<String>,
    values: Vec<Value>,
}

impl BoundArguments {
    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
    }

    /// Returns the value bound to `name` if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns the values in declaration order.
    pub fn positional(&self) -> &[Value] {
        &self.values
    }

    /// Iterates over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(&self.values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Binds `args` onto `signature`.
///
/// A supplied `null` is a supplied value and is bound as-is; it does not fall
/// through to the default.
///
/// # Errors
///
/// Returns `MissingRequiredArgument` naming the first parameter that has no
/// supplied value, no default, and is not nullable.
pub fn bind<A: ArgumentSource + ?Sized>(
    signature: &Signature,
    args: &A,
) -> TrellisResult<BoundArguments> {
    let mut bound = BoundArguments {
        names: Vec::with_capacity(signature.len()),
        values: Vec::with_capacity(signature.len()),
    };
    for parameter in &signature.parameters {
        bound.values.push(parameter.resolve(args)?);
        bound.names.push(parameter.name.clone());
    }
    Ok(bound)
}

/// A name to value lookup that arguments are bound from.
pub trait ArgumentSource {
    /// Returns the value supplied for `name`, or `None` if it was not
    /// supplied at all.
    fn argument(&self, name: &str) -> Option<Value>;
}

impl ArgumentSource for Map<String, Value> {
    fn argument(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<K, V, S> ArgumentSource for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn argument(&self, name: &str) -> Option<Value> {
        self.get(name).cloned().map(Into::into)
    }
}

impl<K, V> ArgumentSource for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: Clone + Into<Value>,
{
    fn argument(&self, name: &str) -> Option<Value> {
        self.get(name).cloned().map(Into::into)
    }
}

impl<K, V> ArgumentSource for [(K, V)]
where
    K: Borrow<str>,
    V: Clone + Into<Value>,
{
    fn argument(&self, name: &str) -> Option<Value> {
        self.iter()
            .find(|(key, _)| Borrow::<str>::borrow(key) == name)
            .map(|(_, value)| value.clone().into())
    }
}

impl<K, V, const N: usize> ArgumentSource for [(K, V); N]
where
    K: Borrow<str>,
    V: Clone + Into<Value>,
{
    fn argument(&self, name: &str) -> Option<Value> {
        self.as_slice().argument(name)
    }
}
