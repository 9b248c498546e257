use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    /// Set the Secure attribute on auth cookies (on in production)
    pub cookie_secure: bool,
    /// Speech provider credentials; the speech endpoint fails without them
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_api_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up).
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env_name = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env_name)).required(false),
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/ujuzi".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "ujuzi".to_string());

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .unwrap_or_else(|_| {
                if env_name == "prod" {
                    panic!("FATAL: JWT_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let cookie_secure = settings
            .get_bool("auth.cookie_secure")
            .unwrap_or(env_name == "prod");

        let elevenlabs_api_key = settings
            .get_string("speech.api_key")
            .or_else(|_| env::var("ELEVENLABS_API_KEY"))
            .ok();

        let elevenlabs_api_url = settings
            .get_string("speech.api_url")
            .or_else(|_| env::var("ELEVENLABS_API_URL"))
            .unwrap_or_else(|_| "https://api.elevenlabs.io".to_string());

        Ok(Config {
            mongo_uri,
            mongo_database,
            jwt_secret,
            cookie_secure,
            elevenlabs_api_key,
            elevenlabs_api_url,
        })
    }
}
