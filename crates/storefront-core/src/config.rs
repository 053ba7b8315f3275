use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let jwt_secret = require("STOREFRONT_JWT_SECRET")?;
    if jwt_secret.len() < 32 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_JWT_SECRET".to_string(),
            reason: "must be at least 32 characters".to_string(),
        });
    }

    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"));

    let bind_addr = parse_addr("STOREFRONT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");
    let seed_path = PathBuf::from(or_default("STOREFRONT_SEED_PATH", "./config/catalog.yaml"));

    let access_token_ttl_minutes = parse_i64("STOREFRONT_ACCESS_TOKEN_TTL_MINUTES", "60")?;
    let refresh_token_ttl_minutes = parse_i64("STOREFRONT_REFRESH_TOKEN_TTL_MINUTES", "10080")?;

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        jwt_secret,
        access_token_ttl_minutes,
        refresh_token_ttl_minutes,
        seed_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn minimal_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/storefront"),
            (
                "STOREFRONT_JWT_SECRET",
                "0123456789abcdef0123456789abcdef",
            ),
        ])
    }

    #[test]
    fn builds_with_defaults_from_minimal_env() {
        let map = minimal_env();
        let config = build_app_config(lookup_from_map(&map)).expect("config");

        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.access_token_ttl_minutes, 60);
        assert_eq!(config.refresh_token_ttl_minutes, 10080);
        assert_eq!(config.db_max_connections, 10);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let map = HashMap::from([(
            "STOREFRONT_JWT_SECRET",
            "0123456789abcdef0123456789abcdef",
        )]);
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "DATABASE_URL"));
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let map = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("STOREFRONT_JWT_SECRET", "too-short"),
        ]);
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar { var, .. } if var == "STOREFRONT_JWT_SECRET"
        ));
    }

    #[test]
    fn invalid_bind_addr_is_an_error() {
        let mut map = minimal_env();
        map.insert("STOREFRONT_BIND_ADDR", "not-an-addr");
        let err = build_app_config(lookup_from_map(&map)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar { var, .. } if var == "STOREFRONT_BIND_ADDR"
        ));
    }

    #[test]
    fn environment_parsing_defaults_to_development() {
        assert_eq!(parse_environment("production"), Environment::Production);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let map = minimal_env();
        let config = build_app_config(lookup_from_map(&map)).expect("config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("postgres://localhost/storefront"));
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("[redacted]"));
    }
}
