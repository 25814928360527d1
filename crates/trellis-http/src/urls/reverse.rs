//! Reverse URL resolution.
//!
//! [`reverse`] turns a route name plus parameter values back into a concrete
//! path. Parameter values come from any [`ParamSource`]: hash maps, B-tree
//! maps, slices or arrays of pairs, and JSON objects.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::{BuildHasher, Hash};

use trellis_core::{TrellisError, TrellisResult};

use super::resolver::RouteTable;

/// Supplies parameter values, by name, for URL assembly.
///
/// Values are rendered to strings with their `Display` implementation; no
/// percent-encoding is applied.
pub trait ParamSource {
    /// Returns the value for `name`, or `None` if it is absent.
    fn param(&self, name: &str) -> Option<String>;
}

impl<K, V, S> ParamSource for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: Display,
    S: BuildHasher,
{
    fn param(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }
}

impl<K, V> ParamSource for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: Display,
{
    fn param(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }
}

impl<K: Borrow<str>, V: Display> ParamSource for [(K, V)] {
    fn param(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(key, _)| Borrow::<str>::borrow(key) == name)
            .map(|(_, value)| value.to_string())
    }
}

impl<K: Borrow<str>, V: Display, const N: usize> ParamSource for [(K, V); N] {
    fn param(&self, name: &str) -> Option<String> {
        self.as_slice().param(name)
    }
}

impl<K: Borrow<str>, V: Display> ParamSource for Vec<(K, V)> {
    fn param(&self, name: &str) -> Option<String> {
        self.as_slice().param(name)
    }
}

/// JSON strings are used unquoted; `null` counts as absent.
impl ParamSource for serde_json::Map<String, serde_json::Value> {
    fn param(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Generates the URL for a named route.
///
/// # Errors
///
/// Returns [`TrellisError::UnknownRoute`] if `name` was never registered, or
/// [`TrellisError::MissingRequiredParameter`] if a parameter outside every
/// optional segment has no value.
///
/// # Examples
///
/// ```
/// use trellis_http::urls::resolver::RouteTable;
/// use trellis_http::urls::reverse::reverse;
///
/// let mut routes: RouteTable<()> = RouteTable::new();
/// routes.register("archive", "/archive[/:year[/:month]]", None, None).unwrap();
///
/// assert_eq!(reverse(&routes, "archive", &[("year", "2024")]).unwrap(), "/archive/2024");
/// assert!(reverse(&routes, "missing", &[("year", "2024")]).is_err());
/// ```
pub fn reverse<H, P: ParamSource + ?Sized>(
    routes: &RouteTable<H>,
    name: &str,
    params: &P,
) -> TrellisResult<String> {
    let route = routes
        .get(name)
        .ok_or_else(|| TrellisError::UnknownRoute(name.to_string()))?;

    let url = route.pattern().assemble(name, params)?;
    tracing::trace!(route = name, url = %url, "assembled URL");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<()> {
        let mut routes = RouteTable::new();
        routes.register("users", "/users[/:id]", None, None).unwrap();
        routes.register("item", "/item/:id", None, None).unwrap();
        routes.register("nested", "/a[/:x[/:y]]", None, None).unwrap();
        routes
    }

    #[test]
    fn test_reverse_optional_present_and_absent() {
        let routes = table();
        assert_eq!(
            reverse(&routes, "users", &HashMap::<&str, &str>::new()).unwrap(),
            "/users"
        );
        assert_eq!(reverse(&routes, "users", &[("id", "7")]).unwrap(), "/users/7");
    }

    #[test]
    fn test_reverse_nested_optionals() {
        let routes = table();
        assert_eq!(reverse(&routes, "nested", &[("x", "1")]).unwrap(), "/a/1");
        assert_eq!(
            reverse(&routes, "nested", &[("x", "1"), ("y", "2")]).unwrap(),
            "/a/1/2"
        );
        assert_eq!(
            reverse(&routes, "nested", &Vec::<(&str, &str)>::new()).unwrap(),
            "/a"
        );
    }

    #[test]
    fn test_reverse_unknown_route() {
        let routes = table();
        let err = reverse(&routes, "nope", &[("id", "1")]).unwrap_err();
        assert!(matches!(err, TrellisError::UnknownRoute(ref n) if n == "nope"));
    }

    #[test]
    fn test_reverse_missing_required_parameter() {
        let routes = table();
        let err = reverse(&routes, "item", &HashMap::<String, String>::new()).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::MissingRequiredParameter { ref parameter, ref route }
                if parameter == "id" && route == "item"
        ));
    }

    #[test]
    fn test_reverse_display_values() {
        let routes = table();
        assert_eq!(reverse(&routes, "item", &[("id", 42)]).unwrap(), "/item/42");

        let mut map = BTreeMap::new();
        map.insert("id".to_string(), 3.5);
        assert_eq!(reverse(&routes, "item", &map).unwrap(), "/item/3.5");
    }

    #[test]
    fn test_json_param_source() {
        let routes = table();
        let serde_json::Value::Object(params) = serde_json::json!({"id": "abc"}) else {
            unreachable!()
        };
        assert_eq!(reverse(&routes, "users", &params).unwrap(), "/users/abc");

        let serde_json::Value::Object(params) = serde_json::json!({"id": 12}) else {
            unreachable!()
        };
        assert_eq!(reverse(&routes, "item", &params).unwrap(), "/item/12");

        let serde_json::Value::Object(params) = serde_json::json!({"id": null}) else {
            unreachable!()
        };
        assert_eq!(reverse(&routes, "users", &params).unwrap(), "/users");
        assert!(reverse(&routes, "item", &params).is_err());
    }

    #[test]
    fn test_slice_param_source_first_wins() {
        let pairs = [("id", "1"), ("id", "2")];
        assert_eq!(pairs.param("id").as_deref(), Some("1"));
        assert_eq!(pairs.param("other"), None);
    }
}
