mod notifier;
mod shell;

use adw::prelude::*;
use gtk::glib;
use tracing_subscriber::EnvFilter;

const APP_ID: &str = "org.wren.Shell";

fn main() -> glib::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = adw::Application::builder().application_id(APP_ID).build();
    app.connect_activate(shell::build_ui);
    app.run()
}
