mod shell;

use keylens_core::{AppConfig, AppConfigStore, JsonFileStorage};
use keylens_http::ReqwestApiService;
use keylens_state::Store;
use log::{error, info, warn};
use std::sync::Arc;

const USAGE: &str = "usage: keylens [--api URL] <database-id>";

struct Options {
    api_url: Option<String>,
    database_id: String,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut api_url = std::env::var("KEYLENS_API_URL").ok();
    let mut database_id = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api" => {
                let url = iter.next().ok_or("--api needs a URL")?;
                api_url = Some(url.clone());
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => return Err(format!("unknown option {other}")),
            other => database_id = Some(other.to_string()),
        }
    }

    Ok(Options {
        api_url,
        database_id: database_id.ok_or(USAGE)?,
    })
}

fn load_config(options: &Options) -> AppConfig {
    let mut config = match AppConfigStore::new().and_then(|store| store.load()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default settings: {}", e);
            AppConfig::default()
        }
    };

    if let Some(url) = &options.api_url {
        config.api_base_url = url.clone();
    }
    config
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let config = load_config(&options);
    info!("Backend at {}", config.api_base_url);

    let api = match ReqwestApiService::new(&config) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let mut builder = Store::builder(Arc::new(api))
        .with_config(config)
        .with_instance(options.database_id.clone(), options.database_id);
    match JsonFileStorage::new() {
        Ok(storage) => builder = builder.with_local_storage(Arc::new(storage)),
        Err(e) => warn!("Preferences will not be kept: {}", e),
    }
    let store = builder.build();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(shell::run(&store));
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn database_id_is_required() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--api"])).is_err());
    }

    #[test]
    fn api_flag_overrides_environment() {
        let options = parse_args(&args(&["--api", "http://10.0.0.2:5540/api", "db-1"])).unwrap();
        assert_eq!(options.api_url.as_deref(), Some("http://10.0.0.2:5540/api"));
        assert_eq!(options.database_id, "db-1");
    }
}
