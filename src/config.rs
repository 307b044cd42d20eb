//! Configuration for the object store
//!
//! Provides a builder pattern for configuring connection settings. Per-class
//! knobs (table names, primary-key columns, boolean encodings) live on the
//! schema, not here.

/// Configuration for the object store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MySQL database URL
    pub database_url: String,
    /// Connection pool size (default: 5)
    pub max_connections: u32,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_url)
    }
}

/// Builder for [`StoreConfig`]
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_url: String,
    max_connections: u32,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    /// Set the connection pool size (default: 5)
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url,
            max_connections: self.max_connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::builder("mysql://localhost/test").build();
        assert_eq!(config.database_url, "mysql://localhost/test");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_custom_pool_size() {
        let config = StoreConfig::builder("mysql://localhost/test")
            .max_connections(12)
            .build();
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_builder_accepts_string_and_str() {
        let c1 = StoreConfig::builder(String::from("mysql://localhost/db")).build();
        let c2 = StoreConfig::builder("mysql://localhost/db").build();
        assert_eq!(c1.database_url, c2.database_url);
    }
}
