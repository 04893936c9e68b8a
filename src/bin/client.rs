//! vpnas-rpc command-line tool
//!
//! Invokes one management method on the appliance and prints the result as
//! JSON.
//!
//! ```text
//! vpnas-rpc [--config FILE | --env] --list
//! vpnas-rpc [--config FILE | --env] <Method> [ARG ...] [name=ARG ...]
//! ```
//!
//! Arguments are JSON literals; anything that does not parse as JSON is sent
//! as a string.

use log::{debug, error, info};
use std::env;
use std::process;
use vpnas_rpc::{
    client::RpcClient,
    config::ClientConfig,
    error::{Result, RpcError},
    Args, HttpTransport, MethodContract, Value,
};

enum ConfigSource {
    File(String),
    Env,
}

struct Invocation {
    source: ConfigSource,
    list: bool,
    method: Option<String>,
    raw_args: Vec<String>,
}

fn main() {
    let invocation = match parse_command_line(env::args().skip(1).collect()) {
        Ok(Some(invocation)) => invocation,
        Ok(None) => {
            print_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            process::exit(2);
        }
    };

    let config = match load_config(&invocation.source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    info!("Starting vpnas-rpc v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&config, &invocation) {
        error!("{e}");
        eprintln!("{e}");
        process::exit(1);
    }
}

fn run(config: &ClientConfig, invocation: &Invocation) -> Result<()> {
    let client = RpcClient::connect(config)?;

    if invocation.list {
        for name in client.methods() {
            println!("{name}");
        }
        return Ok(());
    }

    let method = invocation
        .method
        .as_deref()
        .ok_or_else(|| RpcError::Config("No method given".to_string()))?;
    let contract = client.catalog().lookup(method)?;
    let args = build_args(contract, &invocation.raw_args);
    debug!("Invoking {method} with {} arguments", args.len());

    let result = call(&client, method, args)?;
    let rendered = serde_json::to_string_pretty(&result.to_json())?;
    println!("{rendered}");
    Ok(())
}

fn call(client: &RpcClient<HttpTransport>, method: &str, args: Args) -> Result<Value> {
    client.call(method, args).inspect_err(|e| {
        if let Some(fault) = e.fault() {
            debug!("Remote fault {}: {}", fault.code, fault.message);
        }
    })
}

/// `Ok(None)` means help was requested
fn parse_command_line(args: Vec<String>) -> std::result::Result<Option<Invocation>, String> {
    let mut source = ConfigSource::File("config.toml".to_string());
    let mut list = false;
    let mut rest = Vec::new();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" if rest.is_empty() => {
                let path = iter.next().ok_or("--config requires a file path")?;
                source = ConfigSource::File(path);
            }
            "--env" if rest.is_empty() => source = ConfigSource::Env,
            "--list" if rest.is_empty() => list = true,
            "--help" | "-h" => return Ok(None),
            _ => rest.push(arg),
        }
    }

    let mut rest = rest.into_iter();
    let method = rest.next();
    if method.is_none() && !list {
        return Err("Missing method name".to_string());
    }

    Ok(Some(Invocation {
        source,
        list,
        method,
        raw_args: rest.collect(),
    }))
}

fn load_config(source: &ConfigSource) -> Result<ClientConfig> {
    match source {
        ConfigSource::File(path) => {
            let config = ClientConfig::from_file(path)?;
            config.validate()?;
            Ok(config)
        }
        ConfigSource::Env => ClientConfig::from_env(),
    }
}

/// `name=value` is a named argument when `name` is one of the method's
/// parameters; everything else is positional.
fn build_args(contract: &MethodContract, raw_args: &[String]) -> Args {
    raw_args.iter().fold(Args::new(), |args, raw| {
        match raw.split_once('=') {
            Some((name, value)) if contract.param(name).is_some() => {
                args.named(name, parse_value(value))
            }
            _ => args.arg(parse_value(raw)),
        }
    })
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(|json| Value::from_json(&json))
        .unwrap_or_else(|_| Value::from(raw))
}

fn print_usage() {
    eprintln!("Usage: vpnas-rpc [--config FILE | --env] --list");
    eprintln!("       vpnas-rpc [--config FILE | --env] <Method> [ARG ...] [name=ARG ...]");
}
