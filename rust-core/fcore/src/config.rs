//! # Application Configuration

/// Application settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in logs
    pub app_name: String,
    /// Maximum number of idle contexts kept for reuse
    pub pool_capacity: usize,
    /// Header holding the client address when behind a proxy
    pub proxy_header: String,
    /// Max request body size in bytes, enforced by the hyper adapter
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            pool_capacity: 1024,
            proxy_header: "X-Forwarded-For".to_string(),
            max_body_size: 4 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.pool_capacity, 1024);
        assert_eq!(config.proxy_header, "X-Forwarded-For");
        assert_eq!(config.max_body_size, 4 * 1024 * 1024);
    }
}
