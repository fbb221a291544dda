use std::env;

/// Default listen port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

const LOCAL_JWT_SECRET: &str = "event-hub-local-development-secret";

/// AppConfig
///
/// Holds the application's entire configuration state. The struct is immutable once loaded
/// and is pulled into handlers and extractors via `FromRef<AppState>`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub database_url: Option<String>,
    // Secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // Runtime environment marker.
    pub env: Env,
    // Email seeded as an admin into the in-memory store, so a local run can reach the
    // admin routes.
    pub seed_admin_email: Option<String>,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (in-memory store, fallback secret, pretty logs) and production requirements.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test scaffolding. Uses the in-memory store.
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            port: DEFAULT_PORT,
            env: Env::Local,
            seed_admin_email: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and implements the **fail-fast**
    /// principle: the process must not start with an incomplete production configuration.
    ///
    /// # Panics
    /// Panics if `DATABASE_URL` or `JWT_SECRET` is missing in production, or if `PORT`
    /// is set but is not a valid port number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .unwrap_or_else(|_| panic!("FATAL: PORT must be a valid port number, got {raw:?}")),
            Err(_) => DEFAULT_PORT,
        };

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Without a database the server falls back to the in-memory store.
                database_url: env::var("DATABASE_URL").ok(),
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                port,
                seed_admin_email: env::var("SEED_ADMIN_EMAIL").ok(),
            },
            Env::Production => Self {
                env: Env::Production,
                database_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
                ),
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                port,
                seed_admin_email: None,
            },
        }
    }
}
