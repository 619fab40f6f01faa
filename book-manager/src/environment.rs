/// Deployment configuration, baked in at compile time and overridable through environment
/// variables at build time. The defaults match a local dev setup where the backend (or the
/// Choreo local gateway) listens on port 8080 and `trunk serve` hosts the app on port 3000.
pub struct Environment {
    pub api_base_url: &'static str,
    pub auth_gateway_url: &'static str,
    pub app_url: &'static str,
}

pub const ENVIRONMENT: Environment = Environment {
    api_base_url: match option_env!("BOOK_MANAGER_API_BASE_URL") {
        Some(it) => it,
        None => "http://localhost:8080/",
    },
    auth_gateway_url: match option_env!("BOOK_MANAGER_AUTH_GATEWAY_URL") {
        Some(it) => it,
        None => "http://localhost:8080/",
    },
    app_url: match option_env!("BOOK_MANAGER_APP_URL") {
        Some(it) => it,
        None => "http://localhost:3000/",
    },
};
