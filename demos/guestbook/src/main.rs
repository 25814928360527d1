//! # trellis guestbook
//!
//! A small guestbook demonstrating the trellis pipeline: named routes with
//! optional segments, handlers with declared parameters, views and a layout
//! loaded from disk, lifecycle callbacks, and redirects built from route
//! names.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p guestbook -- --config demos/guestbook/guestbook.toml serve
//! cargo run -p guestbook -- render /archive/2026
//! ```

mod app;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Arg, ArgAction, ArgMatches, Command};
use trellis::core::logging::setup_logging;
use trellis::core::settings_loader;
use trellis::prelude::*;

fn cli() -> Command {
    Command::new("guestbook")
        .about("A guestbook served by trellis")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("TOML settings file (TRELLIS_* environment variables still apply)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("serve").about("Serve over HTTP").arg(
                Arg::new("addr")
                    .long("addr")
                    .value_name("HOST:PORT")
                    .help("Address to bind; defaults to bind_address from settings"),
            ),
        )
        .subcommand(
            Command::new("render")
                .about("Render one path to stdout")
                .arg(Arg::new("path").required(true))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .action(ArgAction::SetTrue)
                        .help("Print the status line before the body"),
                ),
        )
        .subcommand(Command::new("routes").about("List routes in match order"))
}

fn load_settings(matches: &ArgMatches) -> anyhow::Result<Settings> {
    if let Some(path) = matches.get_one::<String>("config") {
        return settings_loader::from_toml_file_with_env(path)
            .with_context(|| format!("loading settings from {path}"));
    }

    let mut settings = Settings {
        view_dirs: vec![PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("views")],
        layout: Some("layout".to_string()),
        ..Settings::default()
    };
    settings_loader::apply_env_overrides(&mut settings);
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let settings = load_settings(&matches)?;
    setup_logging(&settings);

    let application = app::build(&settings).context("building the guestbook")?;
    tracing::debug!(routes = application.routes().len(), "guestbook ready");

    match matches.subcommand() {
        Some(("serve", sub)) => {
            let addr = sub
                .get_one::<String>("addr")
                .cloned()
                .unwrap_or_else(|| settings.bind_address.clone());
            server::run(application, &addr).await?;
        }
        Some(("render", sub)) => {
            let path = sub
                .get_one::<String>("path")
                .context("a path is required")?;
            let response = application.dispatch(path);
            if sub.get_flag("status") {
                println!("{}", response.status());
                if let Some(location) = response.location() {
                    println!("Location: {location}");
                }
            }
            println!("{}", response.body());
        }
        Some(("routes", _)) => {
            for route in application.routes().iter() {
                println!(
                    "{:<10} {:<28} {}",
                    route.name(),
                    route.pattern().source(),
                    route.view().unwrap_or("-")
                );
            }
        }
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let matches = cli()
            .try_get_matches_from(["guestbook", "render", "/archive", "--status"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "render");
        assert_eq!(sub.get_one::<String>("path").map(String::as_str), Some("/archive"));
        assert!(sub.get_flag("status"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(cli().try_get_matches_from(["guestbook"]).is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guestbook.toml");
        std::fs::write(&path, "bind_address = \"0.0.0.0:9000\"\nlayout = \"frame\"\n").unwrap();

        let matches = cli()
            .try_get_matches_from(["guestbook", "--config", path.to_str().unwrap(), "routes"])
            .unwrap();
        let settings = load_settings(&matches).unwrap();
        assert_eq!(settings.layout.as_deref(), Some("frame"));
    }

    #[test]
    fn test_load_settings_missing_file() {
        let matches = cli()
            .try_get_matches_from(["guestbook", "-c", "/nonexistent/guestbook.toml", "routes"])
            .unwrap();
        assert!(load_settings(&matches).is_err());
    }
}
