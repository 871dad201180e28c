mod cli;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use webview_bridge::config::{self, WebviewConfig};
use webview_bridge::{BridgeError, HandlerError, NativeTable, Registry, Webview};

const PAGE: &str = r#"<!doctype html>
<html>
<body style="font-family: sans-serif">
  <h1 id="out">webview-bridge</h1>
  <button onclick="greet('world').then(r => out.textContent = r)">greet</button>
  <button onclick="later(500).then(r => out.textContent = JSON.stringify(r))">later</button>
  <button onclick="fail().catch(e => out.textContent = e.message)">fail</button>
  <button onclick="quit()">quit</button>
</body>
</html>"#;

fn main() {
    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("webview_bridge=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "webview_bridge=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("webview-demo v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match args.config.as_deref() {
        Some(path) => config::load_from_path(Path::new(path)).unwrap_or_else(|e| {
            tracing::warn!("Config load failed, using defaults: {e}");
            WebviewConfig::default()
        }),
        None => WebviewConfig::default(),
    };
    if args.debug {
        config.debug = true;
    }
    if let Some(library) = args.library {
        config.library = Some(PathBuf::from(library));
    }
    if config.title.is_none() {
        config.title = Some("webview-bridge demo".into());
    }

    if let Err(e) = run(&config, args.url.as_deref()) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}

fn run(config: &WebviewConfig, url: Option<&str>) -> Result<(), BridgeError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Runtime(e.to_string()))?;

    let library = config::resolve_library_path(config.library.as_deref());
    let table = NativeTable::load(&library)?;
    let registry = Registry::with_runtime(table, runtime.handle().clone());

    let webview = Webview::new(&registry, config)?;

    webview.bind("greet", |(name,): (String,)| Ok(format!("hi {name}")))?;
    webview.bind_async("later", |(ms,): (u64,)| async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok::<_, HandlerError>(json!({ "ok": true, "waited_ms": ms }))
    })?;
    webview.bind("fail", |(): ()| -> Result<Value, HandlerError> {
        Err(HandlerError::new("boom"))
    })?;
    let this = webview.downgrade();
    webview.bind("quit", move |(): ()| {
        this.terminate().map_err(|e| HandlerError::new(e.to_string()))
    })?;

    match url {
        Some(url) => webview.navigate(url)?,
        None => webview.set_html(PAGE)?,
    }

    tracing::info!("Entering run loop");
    webview.run()?;

    let leftover = registry.unload();
    tracing::debug!(leftover, "registry unloaded");
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}
