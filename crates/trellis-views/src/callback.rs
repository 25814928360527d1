//! Callbacks: route handlers and lifecycle hooks.
//!
//! A [`Callback`] pairs a [`Signature`] with a function. Invoking it binds the
//! supplied arguments onto the signature and calls the function with the
//! request [`Context`], so handlers read and change the request's data,
//! view, and layout through the context they are handed.

use std::fmt;
use std::sync::Arc;

use trellis_core::TrellisResult;

use crate::binder::{bind, ArgumentSource, BoundArguments, Signature};
use crate::context::Context;

/// The function behind a callback.
///
/// Returning `Ok(Some(body))` with a non-empty body replaces the response
/// body; `Ok(None)` lets processing continue.
pub type CallbackFn =
    dyn Fn(&mut Context<'_>, &BoundArguments) -> TrellisResult<Option<String>> + Send + Sync;

/// A callable with a declared parameter list.
///
/// # Examples
///
/// ```
/// use trellis_views::{Callback, Signature};
///
/// let greet = Callback::new(Signature::new().required("name"), |ctx, args| {
///     ctx.set("greeting", format!("Hello, {}", args.get_str("name").unwrap_or("?")));
///     Ok(None)
/// });
/// assert_eq!(greet.signature().len(), 1);
/// ```
#[derive(Clone)]
pub struct Callback {
    signature: Signature,
    func: Arc<CallbackFn>,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Callback {
    /// Creates a callback from a signature and a function.
    pub fn new<F>(signature: Signature, func: F) -> Self
    where
        F: Fn(&mut Context<'_>, &BoundArguments) -> TrellisResult<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            signature,
            func: Arc::new(func),
        }
    }

    /// Creates a callback that declares no parameters.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> TrellisResult<Option<String>> + Send + Sync + 'static,
    {
        Self::new(Signature::new(), move |ctx, _| func(ctx))
    }

    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Binds `args` onto the signature and calls the function.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredArgument` if binding fails, or whatever the
    /// function itself returns.
    pub fn invoke<A: ArgumentSource + ?Sized>(
        &self,
        context: &mut Context<'_>,
        args: &A,
    ) -> TrellisResult<Option<String>> {
        let bound = bind(&self.signature, args)?;
        (self.func)(context, &bound)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};
    use trellis_core::TrellisError;
    use trellis_http::RouteTable;

    use super::*;
    use crate::context::RequestState;

    #[test]
    fn test_invoke_passes_context_and_arguments() {
        let routes: RouteTable<Callback> = RouteTable::new();
        let mut state = RequestState::new("/", None, Map::new());
        let callback = Callback::new(
            Signature::new().required("id").with_default("tab", "posts"),
            |ctx, args| {
                ctx.set("id", args.get("id").cloned().unwrap_or_default());
                ctx.set("tab", args.get("tab").cloned().unwrap_or_default());
                ctx.set_view("users/show");
                Ok(None)
            },
        );

        let mut ctx = Context::new(&mut state, &routes);
        let out = callback.invoke(&mut ctx, &[("id", "7")]).unwrap();
        assert!(out.is_none());
        assert_eq!(state.data()["id"], json!("7"));
        assert_eq!(state.data()["tab"], json!("posts"));
        assert_eq!(state.view(), Some("users/show"));
    }

    #[test]
    fn test_invoke_missing_argument_does_not_call() {
        let routes: RouteTable<Callback> = RouteTable::new();
        let mut state = RequestState::new("/", None, Map::new());
        let callback = Callback::new(Signature::new().required("id"), |ctx, _| {
            ctx.set("called", true);
            Ok(None)
        });

        let mut ctx = Context::new(&mut state, &routes);
        let err = callback.invoke(&mut ctx, &Map::new()).unwrap_err();
        assert!(matches!(err, TrellisError::MissingRequiredArgument(ref name) if name == "id"));
        assert!(state.data().get("called").is_none());
    }

    #[test]
    fn test_from_fn_returns_body() {
        let routes: RouteTable<Callback> = RouteTable::new();
        let mut state = RequestState::new("/", None, Map::new());
        let callback = Callback::from_fn(|_| Ok(Some("short".to_string())));
        let mut ctx = Context::new(&mut state, &routes);
        assert_eq!(
            callback.invoke(&mut ctx, &Map::new()).unwrap().as_deref(),
            Some("short")
        );
        assert!(format!("{callback:?}").contains("Callback"));
    }
}
