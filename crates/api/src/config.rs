//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use edugest_infra::ServiceSettings;
use edugest_saft::CompanyInfo;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Where the school records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    InMemory,
    Postgres {
        url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub persistence: Persistence,
    pub services: ServiceSettings,
}

impl ApiConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `BIND_ADDR`: listen address (default: 0.0.0.0:8080)
    /// - `JWT_SECRET`: HS256 secret (default: insecure dev secret, logged)
    /// - `USE_PERSISTENT_STORES`: `true`/`1` selects Postgres (default: false)
    /// - `DATABASE_URL`: required with persistent stores
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `INVOICE_SERIES_PREFIX`: invoice series prefix (default: EDU)
    /// - `SAFT_COMPANY_NIF`, `SAFT_COMPANY_NAME`, `SAFT_COMPANY_ADDRESS`,
    ///   `SAFT_COMPANY_CITY`, `SAFT_SOFTWARE_CERTIFICATE`, `SAFT_PRODUCT_ID`:
    ///   audit file header (default: development values)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: raw,
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let persistent = match var("USE_PERSISTENT_STORES").as_deref() {
            None => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "USE_PERSISTENT_STORES",
                    value: v.to_string(),
                });
            }
        };
        let persistence = if persistent {
            let url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => raw
                    .parse()
                    .ok()
                    .filter(|n: &u32| *n > 0)
                    .ok_or(ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    })?,
                None => 10,
            };
            Persistence::Postgres {
                url,
                max_connections,
            }
        } else {
            Persistence::InMemory
        };

        let defaults = CompanyInfo::development();
        let company = CompanyInfo {
            tax_id: var("SAFT_COMPANY_NIF").unwrap_or(defaults.tax_id),
            name: var("SAFT_COMPANY_NAME").unwrap_or(defaults.name),
            address: var("SAFT_COMPANY_ADDRESS").unwrap_or(defaults.address),
            city: var("SAFT_COMPANY_CITY").unwrap_or(defaults.city),
            software_certificate: var("SAFT_SOFTWARE_CERTIFICATE")
                .unwrap_or(defaults.software_certificate),
            product_id: var("SAFT_PRODUCT_ID").unwrap_or(defaults.product_id),
            ..defaults
        };

        let invoice_prefix = var("INVOICE_SERIES_PREFIX").unwrap_or_else(|| "EDU".to_string());
        if !invoice_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid {
                name: "INVOICE_SERIES_PREFIX",
                value: invoice_prefix,
            });
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            persistence,
            services: ServiceSettings {
                invoice_prefix,
                company,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_in_memory_dev_setup() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.persistence, Persistence::InMemory);
        assert_eq!(cfg.services.invoice_prefix, "EDU");
    }

    #[test]
    fn persistent_stores_need_a_database_url() {
        assert_eq!(
            config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "1"),
            ("DATABASE_URL", "postgres://localhost/edugest"),
        ])
        .unwrap();
        assert_eq!(
            cfg.persistence,
            Persistence::Postgres {
                url: "postgres://localhost/edugest".into(),
                max_connections: 10,
            }
        );
    }

    #[test]
    fn invalid_values_fail_start_up() {
        assert!(matches!(
            config(&[("BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("INVOICE_SERIES_PREFIX", "ED U")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn company_settings_override_development_values() {
        let cfg = config(&[("SAFT_COMPANY_NIF", "5417000000"), ("SAFT_COMPANY_NAME", "Colégio Horizonte")])
            .unwrap();
        assert_eq!(cfg.services.company.tax_id, "5417000000");
        assert_eq!(cfg.services.company.name, "Colégio Horizonte");
        assert_eq!(cfg.services.company.source_id, CompanyInfo::development().source_id);
    }
}
