use std::env;
use std::path::PathBuf;

/// Largest payload the generation API accepts as inline data.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub database_url: String,
    pub model: String,
    pub upload_dir: PathBuf,
    pub bind_address: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| format!("{} must be set", key))
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("MAX_UPLOAD_BYTES is not a number: {}", raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            api_key: required("API_KEY")?,
            database_url: required("DATABASE_URL")?,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "public".to_string())),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            max_upload_bytes,
        })
    }

    #[cfg(test)]
    pub fn for_tests(upload_dir: &std::path::Path) -> Self {
        Config {
            api_key: "test-key".to_string(),
            database_url: "postgres://unused".to_string(),
            model: "gemini-1.5-flash".to_string(),
            upload_dir: upload_dir.to_path_buf(),
            bind_address: "127.0.0.1:0".to_string(),
            max_upload_bytes: 1024,
        }
    }
}
