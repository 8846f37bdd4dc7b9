//! console-demo: list one configured resource from the academic records API
//! as a text table.
//!
//! Run from repo root: `cargo run -p console-demo -- materias [search term]`
//!
//! Environment: `CONSOLE_API_URL`, `CONSOLE_API_TIMEOUT_MS`,
//! `CONSOLE_TOKEN_FILE`, `CONSOLE_RESOURCES` (file or directory of resource
//! JSON, default `console_demo/resources`), and optionally
//! `CONSOLE_USERNAME`/`CONSOLE_PASSWORD` to log in first.

use academic_console::{
    init_tracing, load_from_path, ApiClient, ClientConfig, CrudEngine, FileTokenStore, Session,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client_config = ClientConfig::from_env();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let resource = args.next().unwrap_or_else(|| "materias".into());
    let search = args.collect::<Vec<_>>().join(" ");

    let session = match &client_config.token_file {
        Some(path) => Session::new(Arc::new(FileTokenStore::new(path.clone()))),
        None => Session::in_memory(),
    };
    session.restore().await?;
    let client = ApiClient::new(&client_config, session)?;

    if let (Ok(user), Ok(pass)) = (std::env::var("CONSOLE_USERNAME"), std::env::var("CONSOLE_PASSWORD")) {
        client.login(&user, &pass).await?;
    }

    let resources_path = std::env::var("CONSOLE_RESOURCES").unwrap_or_else(|_| "console_demo/resources".into());
    let console = load_from_path(&resources_path).await?;
    let config = console
        .resource(&resource)
        .cloned()
        .ok_or_else(|| format!("unknown resource '{}' in {}", resource, resources_path))?;
    tracing::info!(resource = %resource, endpoint = %config.endpoint, "listing");

    let mut engine = CrudEngine::configure(config, client)?;
    engine.list().await;
    if !search.is_empty() {
        engine.search(&search);
    }
    println!("{}", engine.config().title);
    println!("{}", engine.table().render_text());
    if let Some(err) = engine.last_error() {
        eprintln!("{}", err);
    }
    Ok(())
}
