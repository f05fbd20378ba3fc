use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use foodbot_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

const CONFIG_FILES: [&str; 2] = ["foodbot.toml", "config/foodbot.toml"];

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::report(0, lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let database = &config.database;
    let password = if database.has_password() { "<redacted>" } else { "<unset>" };

    vec![
        Field {
            key: "database.host",
            value: database.host.clone(),
            env_keys: &["FOODBOT_DATABASE_HOST", "DB_HOST"],
        },
        Field {
            key: "database.port",
            value: database.port.to_string(),
            env_keys: &["FOODBOT_DATABASE_PORT", "DB_PORT"],
        },
        Field {
            key: "database.user",
            value: database.user.clone(),
            env_keys: &["FOODBOT_DATABASE_USER", "DB_USER"],
        },
        Field {
            key: "database.password",
            value: password.to_string(),
            env_keys: &["FOODBOT_DATABASE_PASSWORD", "DB_PASSWORD"],
        },
        Field {
            key: "database.name",
            value: database.name.clone(),
            env_keys: &["FOODBOT_DATABASE_NAME", "DB_NAME"],
        },
        Field {
            key: "database.max_connections",
            value: database.max_connections.to_string(),
            env_keys: &["FOODBOT_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key: "database.timeout_secs",
            value: database.timeout_secs.to_string(),
            env_keys: &["FOODBOT_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key: "database.statement_timeout_secs",
            value: database.statement_timeout_secs.to_string(),
            env_keys: &["FOODBOT_DATABASE_STATEMENT_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["FOODBOT_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["FOODBOT_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["FOODBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["FOODBOT_LOGGING_LEVEL", "FOODBOT_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["FOODBOT_LOGGING_FORMAT", "FOODBOT_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    CONFIG_FILES.iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    // Same lookup order as the loader: first set key wins.
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
