//! Routes and callbacks for the guestbook.

use serde_json::{json, Map, Value};
use trellis::prelude::*;

/// The guestbook's entries. Read-only; the demo has no storage.
pub fn entries() -> Vec<Value> {
    vec![
        json!({"id": 1, "author": "ada", "message": "First!", "year": "2025", "month": "11"}),
        json!({"id": 2, "author": "grace", "message": "Nice <b>site</b>.", "year": "2026", "month": "01"}),
        json!({"id": 3, "author": null, "message": "Just passing through.", "year": "2026", "month": "03"}),
    ]
}

/// Builds the guestbook application.
///
/// # Errors
///
/// Returns an error if a route pattern is malformed.
pub fn build(settings: &Settings) -> TrellisResult<Application> {
    let mut app = Application::from_settings(settings);
    app.set_data("site", "trellis guestbook");

    app.route("home", "/", Some("home"), Some(Callback::from_fn(home)))?
        .route(
            "entry",
            "/entries/:id",
            Some("entries/show"),
            Some(Callback::new(Signature::new().required("id"), show_entry)),
        )?
        .route(
            "archive",
            "/archive[/:year[/:month]]",
            Some("archive"),
            Some(Callback::new(
                Signature::new().nullable("year").nullable("month"),
                archive,
            )),
        )?
        .route(
            "legacy",
            "/entry.php/:id",
            None,
            Some(Callback::new(Signature::new().required("id"), |ctx, args| {
                let id = args.get_str("id").unwrap_or_default().to_string();
                ctx.redirect("entry", &[("id", id)])?;
                Ok(None)
            })),
        )?
        .route("about", "/about", Some("<p>A guestbook served by trellis.</p>"), None)?;

    app.on_start(Callback::from_fn(|ctx| {
        let home_url = ctx.url("home", &Map::new())?;
        let archive_url = ctx.url("archive", &Map::new())?;
        ctx.set("home_url", home_url);
        ctx.set("archive_url", archive_url);
        Ok(None)
    }));

    app.on_error(Callback::new(
        Signature::new().required("error").with_default("status", 500),
        |_, args| {
            let error = args.get_str("error").unwrap_or_default();
            let status = args.get("status").cloned().unwrap_or_default();
            Ok(Some(format!(
                "<h1>Something went wrong ({status})</h1><pre>{error}</pre>"
            )))
        },
    ));

    Ok(app)
}

fn home(ctx: &mut Context<'_>) -> TrellisResult<Option<String>> {
    let latest = entries().pop().unwrap_or(Value::Null);
    let latest_url = ctx.url("entry", &[("id", latest["id"].clone())])?;
    ctx.set("latest", latest);
    ctx.set("latest_url", latest_url);
    Ok(None)
}

fn show_entry(ctx: &mut Context<'_>, args: &BoundArguments) -> TrellisResult<Option<String>> {
    let id = args.get_str("id").unwrap_or_default();
    let entry = entries()
        .into_iter()
        .find(|entry| entry["id"].to_string() == id)
        .ok_or_else(|| TrellisError::handler(format!("No entry with id '{id}'")))?;
    ctx.set("title", format!("Entry {id}"));
    ctx.set("entry", entry);
    Ok(None)
}

fn archive(ctx: &mut Context<'_>, args: &BoundArguments) -> TrellisResult<Option<String>> {
    let year = args.get_str("year");
    let month = args.get_str("month");
    let count = entries()
        .iter()
        .filter(|entry| year.map_or(true, |y| entry["year"] == y))
        .filter(|entry| month.map_or(true, |m| entry["month"] == m))
        .count();

    ctx.set("year", year);
    ctx.set("month", month);
    ctx.set("count", count);
    Ok(None)
}
