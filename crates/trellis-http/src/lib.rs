//! # trellis-http
//!
//! HTTP layer for trellis. Provides the route pattern grammar, the ordered
//! route table that matches paths against it, reverse URL assembly, and the
//! [`Response`] type handed back to the HTTP adapter.

pub mod response;
pub mod urls;

pub use response::Response;
pub use urls::pattern::RoutePattern;
pub use urls::resolver::{ResolverMatch, Route, RouteTable};
pub use urls::reverse::{reverse, ParamSource};
