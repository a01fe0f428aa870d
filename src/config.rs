//! Startup configuration for the HTTP service
use clap::builder::FalseyValueParser;
use clap::Args;

/// Where to listen, and how chatty to be. Parsed once at startup from the
/// command line, with environment variables as fallbacks, then handed to
/// `server::serve`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ServerConfig {
    /// Interface to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
    /// Log requests and debugging detail
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { host: "0.0.0.0".to_owned(), port: 5000, debug: false }
    }
}

impl ServerConfig {
    /// `host:port`, ready for `TcpListener::bind`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
