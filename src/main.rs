use chatstream::{StreamClient, StreamClientConfig, StreamOptions};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::{json, Value};
use std::io::Write;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: chatstream [--get] [--skip-auth] <endpoint> [message]";

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Args {
    endpoint: String,
    message: Option<String>,
    get: bool,
    skip_auth: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut get = false;
    let mut skip_auth = false;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--get" => get = true,
            "--skip-auth" => skip_auth = true,
            flag if flag.starts_with("--") => return Err(eyre!("unknown flag {}\n{}", flag, USAGE)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let endpoint = positional.next().ok_or_else(|| eyre!(USAGE))?;
    let message = positional.next();
    if positional.next().is_some() {
        return Err(eyre!("too many arguments\n{}", USAGE));
    }
    if get && message.is_some() {
        return Err(eyre!("--get takes no message\n{}", USAGE));
    }

    Ok(Args {
        endpoint,
        message,
        get,
        skip_auth,
    })
}

/// The text to print for one message: `token`, `text` or `content`, else raw JSON.
fn display_text(message: &Value) -> String {
    ["token", "text", "content"]
        .iter()
        .find_map(|key| message.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}\n", message))
}

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("chatstream {}", VERSION);
        std::process::exit(0);
    }

    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatstream=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let client = StreamClient::from_config(StreamClientConfig::from_env())?;

    let payload = match (&args.message, args.get) {
        (Some(message), _) => Some(json!({ "message": message })),
        (None, true) => None,
        (None, false) => Some(json!({})),
    };

    let options = StreamOptions::new()
        .skip_auth(args.skip_auth)
        .on_error(|e| eprintln!("\n{}", e.user_message()));

    let handle = client
        .stream(
            &args.endpoint,
            payload,
            |message| {
                print!("{}", display_text(&message));
                let _ = std::io::stdout().flush();
            },
            options,
        )
        .await?;

    tokio::select! {
        _ = handle.closed() => {}
        _ = tokio::signal::ctrl_c() => handle.close(),
    }
    handle.closed().await;
    println!();

    Ok(())
}
