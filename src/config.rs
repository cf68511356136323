use std::env;

const DEFAULT_PORT: u16 = 3010;
const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";
const DEFAULT_SESSIONS_DIR: &str = "./sessions";

/// Gateway runtime configuration, resolved from the environment by the
/// embedding process (`PORT`, `BACKEND_URL`, `SESSIONS_DIR`).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port the HTTP surface should listen on.
    pub port: u16,
    /// Base URL of the backend that receives forwarded messages.
    pub backend_url: String,
    /// Directory holding one credential namespace per client id.
    pub sessions_dir: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let sessions_dir =
            env::var("SESSIONS_DIR").unwrap_or_else(|_| DEFAULT_SESSIONS_DIR.to_string());
        Self {
            port,
            backend_url,
            sessions_dir,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            sessions_dir: DEFAULT_SESSIONS_DIR.to_string(),
        }
    }
}
