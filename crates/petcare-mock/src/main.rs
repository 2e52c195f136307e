use anyhow::Context;
use clap::{Parser, Subcommand};
use hyper::Method;
use petcare_mock::petcare;
use petcare_mock::{ApiRequest, ClientFactory, LatencyProfile, MockConfig, PathMatcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolve pet-care API requests against the mock route set
#[derive(Parser, Debug)]
#[command(name = "petcare-mock")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "PETCARE_MOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Fixed mock latency in milliseconds (overrides the config file)
    #[arg(short, long, env = "PETCARE_MOCK_LATENCY_MS")]
    latency_ms: Option<u64>,

    /// Directory of fixture JSON files replacing the embedded ones
    #[arg(short, long, env = "PETCARE_MOCK_FIXTURES_DIR")]
    fixtures_dir: Option<PathBuf>,

    /// Base URL requests are resolved against
    #[arg(short, long, env = "PETCARE_MOCK_BASE_URL")]
    base_url: Option<String>,

    /// Send requests to the real API instead of the mock routes
    #[arg(long)]
    force_real: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one request through the client and print the response envelope
    Resolve {
        /// HTTP method, e.g. GET
        method: String,
        /// Request URL, absolute or relative to the base URL
        url: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
    /// List registered mock routes in match order
    Routes {
        /// Show which route a URL would match instead of listing all
        #[arg(long)]
        probe: Option<String>,
    },
}

fn load_config(args: &Args) -> anyhow::Result<MockConfig> {
    let mut config = match &args.config {
        Some(path) => MockConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MockConfig::default(),
    };

    if let Some(ms) = args.latency_ms {
        config.latency = LatencyProfile::Fixed(ms);
    }
    if let Some(dir) = &args.fixtures_dir {
        config.fixtures_dir = Some(dir.clone());
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    config.force_real |= args.force_real;

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petcare_mock=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let store = Arc::new(petcare::fixture_store(config.fixtures_dir.as_deref()));
    let registry = Arc::new(petcare::default_registry(store)?);

    match args.command {
        Command::Resolve { method, url, body } => {
            let method: Method = method
                .to_uppercase()
                .parse()
                .with_context(|| format!("Invalid HTTP method '{method}'"))?;
            let mut request = ApiRequest::new(method, url);
            if let Some(body) = body {
                let body = serde_json::from_str(&body).context("Request body is not valid JSON")?;
                request = request.with_body(body);
            }

            let factory = ClientFactory::from_config(&config, registry)?;
            let client = factory.client();
            info!("Resolving {} {}", request.method, request.url);

            let envelope = client.send(request).await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Routes { probe } => {
            let matcher = PathMatcher::new(registry);
            match probe {
                Some(url) => {
                    let (method, url) = url
                        .split_once(' ')
                        .map(|(m, u)| (m.to_uppercase(), u.to_string()))
                        .unwrap_or_else(|| ("GET".to_string(), url.clone()));
                    let method: Method = method
                        .parse()
                        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
                    match matcher.resolve(&method, &url) {
                        Some(found) => println!("{} ({:?})", found.key(), found.tier),
                        None => println!("no route for {method} {url}"),
                    }
                }
                None => {
                    for key in matcher.registry().keys() {
                        println!("{key}");
                    }
                }
            }
        }
    }

    Ok(())
}
