use std::io::Write;

use clap::Parser;
use futures_util::StreamExt;
use weave_http::client::{self, BodyType, FetchOptions, Protocol};
use weave_http::config::{load_config, ClientConfig, ObservabilityConfig};
use weave_http::observability::init_logging;

#[derive(Parser)]
#[command(name = "weave-fetch")]
#[command(about = "Send one HTTP request over HTTP/1.1, HTTPS or HTTP/2", long_about = None)]
struct Cli {
    /// Target URL
    url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra header, `name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body, sent as-is
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Label the body as `binary` instead of `json`
    #[arg(long)]
    binary: bool,

    /// Use HTTP/2 (https only)
    #[arg(long)]
    http2: bool,

    /// Deadline in milliseconds (0 = none)
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept any server certificate
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Print body chunks as they arrive
    #[arg(long)]
    stream: bool,

    /// Client defaults from a config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log transport details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let defaults = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ClientConfig::default(),
    };

    if cli.verbose {
        init_logging(&ObservabilityConfig {
            log_level: "debug".into(),
            ..ObservabilityConfig::default()
        });
    }

    let mut options = FetchOptions::new(cli.method.to_uppercase().parse()?)
        .timeout_ms(cli.timeout.unwrap_or(defaults.timeout_ms))
        .reject_unauthorized(defaults.reject_unauthorized && !cli.insecure);
    options.alpn_protocols = defaults.alpn_protocols;

    for header in &cli.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("malformed header `{header}`, expected `name: value`"))?;
        options = options.header(name.trim(), value.trim());
    }
    if let Some(data) = cli.data {
        options = options.body(data);
    }
    if cli.binary {
        options = options.body_type(BodyType::Binary);
    }
    if cli.stream {
        options = options.body_type(BodyType::Sockets);
    }
    if cli.http2 {
        options = options.protocol(Protocol::Http2);
    }

    let mut response = client::fetch(&cli.url, options).await?;

    println!("{} {}", response.status(), response.status_text());
    for (name, value) in response.headers() {
        println!("{name}: {value}");
    }
    println!();

    let mut stdout = std::io::stdout();
    if response.is_stream() {
        let mut stream = response.stream()?;
        while let Some(chunk) = stream.next().await {
            stdout.write_all(&chunk?)?;
            stdout.flush()?;
        }
    } else {
        stdout.write_all(&response.bytes().await?)?;
    }
    writeln!(stdout)?;

    if !response.ok() {
        std::process::exit(1);
    }
    Ok(())
}
