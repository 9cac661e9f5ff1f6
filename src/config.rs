// Application configuration, loaded from environment variables and CLI flags.

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Seed for the battle/random-meal RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:meal_max.db?mode=rwc`)
    /// - `BIND_ADDRESS` - Interface to listen on (default: `0.0.0.0`)
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `MEAL_MAX_SEED` - Fixed RNG seed for reproducible battles
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--seed <SEED>` - Override the RNG seed
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from CLI arguments and an environment lookup.
    /// CLI flags take precedence over environment variables.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let database_url =
            env("DATABASE_URL").unwrap_or_else(|| "sqlite:meal_max.db?mode=rwc".to_string());

        let bind_address = env("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(5000);

        let seed = Self::parse_cli_value(args, "--seed")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("MEAL_MAX_SEED").and_then(|v| v.parse().ok()));

        Config {
            database_url,
            bind_address,
            port,
            seed,
        }
    }

    /// `host:port` string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
