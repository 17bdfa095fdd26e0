use std::env;

pub const PROTOCOL_HTTP: &str = "http";
pub const PROTOCOL_HTTPS: &str = "https";
const PORT_HTTP: &str = "80";
const PORT_HTTPS: &str = "443";

#[derive(Debug, Clone)]
pub struct ConfigApp {
    pub app_host: String,
    pub app_protocol: String,
    pub app_port: usize,
    pub app_max_age: usize,
    pub app_domain: String,
    pub app_allowed_origin: String,
}

impl ConfigApp {
    pub fn init_by_env() -> Self {
        let app_host = env::var("APP_HOST").expect("APP_HOST must be set");
        let protocol = env::var("APP_PROTOCOL").unwrap_or("".to_string());
        let app_protocol = if protocol.to_lowercase() == PROTOCOL_HTTPS {
            PROTOCOL_HTTPS.to_string()
        } else {
            PROTOCOL_HTTP.to_string()
        };
        let port_default = if PROTOCOL_HTTPS == app_protocol { PORT_HTTPS } else { PORT_HTTP };
        let app_port = env::var("APP_PORT").unwrap_or(port_default.to_string());
        // Maximum number of seconds the results can be cached.
        let app_max_age = env::var("APP_MAX_AGE").expect("APP_MAX_AGE must be set");
        let app_domain = Self::get_domain(&app_protocol, &app_host, &app_port);
        // Cors permissions "allowed_origin" (array of values, comma delimited)
        let app_allowed_origin = env::var("APP_ALLOWED_ORIGIN").unwrap_or("".to_string());

        ConfigApp {
            app_host,
            app_protocol,
            app_port: app_port.parse::<usize>().unwrap(),
            app_max_age: app_max_age.parse::<usize>().unwrap(),
            app_domain,
            app_allowed_origin,
        }
    }
    fn get_domain(protocol: &str, host: &str, port: &str) -> String {
        format!("{}://{}:{}", protocol, host, port)
    }
}

#[cfg(all(test, feature = "mockdata"))]
pub fn get_test_config() -> ConfigApp {
    let app_host = "127.0.0.1".to_string();
    let app_protocol = "http".to_string();
    let app_port = 8080;
    let app_domain = ConfigApp::get_domain(&app_protocol, &app_host, &(app_port.to_string()));

    ConfigApp {
        app_host,
        app_protocol,
        app_port,
        app_max_age: 120,
        app_domain,
        app_allowed_origin: "".to_string(),
    }
}
