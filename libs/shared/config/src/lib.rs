use std::env;
use tracing::warn;

pub const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            server_port: match env::var("SERVER_PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("SERVER_PORT '{}' is not a valid port, using default", raw);
                    DEFAULT_SERVER_PORT
                }),
                Err(_) => DEFAULT_SERVER_PORT,
            },
        };

        if !config.is_configured() {
            warn!("Document store not configured - missing Supabase environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }
}
