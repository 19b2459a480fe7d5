use anyhow::Result;
use tracing_subscriber::EnvFilter;

use centre_admin::app::{App, AppContext};
use centre_admin::config::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let context = AppContext::from_config(config)?;
    launch(context)
}

#[cfg(feature = "desktop")]
fn launch(context: AppContext) -> Result<()> {
    let webview_data_dir = centre_admin::config::default_webview_data_dir()?;

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Centre Admin"))
                .with_data_directory(webview_data_dir),
        )
        .with_context(context)
        .launch(App);
    Ok(())
}

#[cfg(not(feature = "desktop"))]
fn launch(context: AppContext) -> Result<()> {
    dioxus::LaunchBuilder::new().with_context(context).launch(App);
    Ok(())
}
