//! URL routing and reverse resolution.
//!
//! - [`pattern`]: the route pattern grammar (`:name`, `[optional]`, `*`)
//! - [`resolver`]: the ordered route table and path matching
//! - [`reverse`]: building concrete URLs from route names and parameters
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use trellis_http::urls::resolver::RouteTable;
//!
//! let mut routes: RouteTable<()> = RouteTable::new();
//! routes.register("user", "/users[/:id]", Some("users"), None).unwrap();
//!
//! // Forward resolution
//! let m = routes.resolve("/users/7?tab=posts").unwrap();
//! assert_eq!(m.get("id"), Some("7"));
//!
//! // Reverse resolution
//! assert_eq!(routes.reverse("user", &HashMap::<&str, &str>::new()).unwrap(), "/users");
//! assert_eq!(routes.reverse("user", &[("id", 7)]).unwrap(), "/users/7");
//! ```

pub mod pattern;
pub mod resolver;
pub mod reverse;
