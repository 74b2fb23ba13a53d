use anyhow::{bail, Context};
use uuid::Uuid;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub default_owner: Option<Uuid>,
    pub max_connections: u32,
}

impl Config {
    /// Reads `DATABASE_URL`, `PAKTIQ_USER_ID` and `PAKTIQ_MAX_CONNECTIONS`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set to the PaktIQ Postgres instance")?;

        let default_owner = match lookup("PAKTIQ_USER_ID") {
            Some(raw) if !raw.trim().is_empty() => Some(
                Uuid::parse_str(raw.trim()).context("PAKTIQ_USER_ID must be a UUID")?,
            ),
            _ => None,
        };

        let max_connections = match lookup("PAKTIQ_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("PAKTIQ_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            bail!("PAKTIQ_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            database_url,
            default_owner,
            max_connections,
        })
    }

    /// The owner to act as: `--user` wins over `PAKTIQ_USER_ID`.
    pub fn owner(&self, flag: Option<Uuid>) -> anyhow::Result<Uuid> {
        flag.or(self.default_owner)
            .context("pass --user or set PAKTIQ_USER_ID to choose whose pakts to use")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DATABASE_URL", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/paktiq")]).unwrap();
        assert_eq!(config.max_connections, 5);
        assert!(config.default_owner.is_none());
        assert!(config.owner(None).is_err());
    }

    #[test]
    fn flag_overrides_env_owner() {
        let env_owner = Uuid::new_v4();
        let flag_owner = Uuid::new_v4();
        let env_owner_text = env_owner.to_string();
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/paktiq"),
            ("PAKTIQ_USER_ID", env_owner_text.as_str()),
            ("PAKTIQ_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert_eq!(config.max_connections, 12);
        assert_eq!(config.owner(None).unwrap(), env_owner);
        assert_eq!(config.owner(Some(flag_owner)).unwrap(), flag_owner);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("DATABASE_URL", "x"), ("PAKTIQ_USER_ID", "me")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("PAKTIQ_MAX_CONNECTIONS", "0")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("PAKTIQ_MAX_CONNECTIONS", "many")]).is_err());
    }
}
