use std::time::Instant;

use tracing_subscriber::EnvFilter;

use nbsite::error::Result;

use crate::config::Settings;
use crate::render::Gallery;

mod config;
mod render;
mod watch;

pub const CONFIG_FILE: &str = "config.toml";

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Build a static site from a directory of notebooks.
        cmd gallery {
            /// Read `config_<name>.toml` instead of `config.toml`.
            optional -c, --config name: String
            /// Rebuild whenever a notebook, template or static file changes.
            optional -w, --watch
            /// Write the site here instead of the configured output directory.
            optional -o, --output dir: PathBuf
        }
    }
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gallery=info,nbsite=info")))
        .with_target(false)
        .init();

    let flags = flags::Gallery::from_env_or_exit();
    if let Err(e) = run(flags) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(flags: flags::Gallery) -> Result<()> {
    let start = Instant::now();
    let mut settings = Settings::load(flags.config.as_deref())?;
    if let Some(output) = flags.output {
        settings.output = output;
    }

    if flags.watch {
        return watch::watch(settings);
    }

    let gallery = Gallery::new(settings)?;
    gallery.build()?;
    tracing::info!("total time: {}ms", start.elapsed().as_millis());
    tracing::info!("open {} in your browser", gallery.settings.output.join("index.html").display());
    Ok(())
}
