use std::io;

use actix_web::{middleware::Logger, App, HttpServer};

use chatnest::{configure_server, create_cors, settings};

// ** Funcion Main **
#[actix_web::main]
async fn main() -> io::Result<()> {
    #[cfg(feature = "mockdata")]
    #[rustfmt::skip]
    assert!(false, "Launch in `mockdata` mode! Disable `default=[test, mockdata]` in Cargo.toml.");

    dotenv::dotenv().expect("Failed to read .env file");

    if std::env::var_os("RUST_LOG").is_none() {
        let log = "info,actix_web=info,actix_server=info,chatnest=info";
        std::env::set_var("RUST_LOG", log);
    }
    env_logger::init();

    let config_app = settings::config_app::ConfigApp::init_by_env();

    let app_host: String = config_app.app_host.clone();
    let app_port: usize = config_app.app_port.clone();
    let app_domain: String = config_app.app_domain.clone();

    log::info!("starting HTTP server at {}", &app_domain);

    HttpServer::new(move || {
        let cors = create_cors(config_app.clone());

        App::new()
            .configure(configure_server())
            .wrap(cors)
            .wrap(Logger::default())
    })
    .bind(&format!("{}:{}", &app_host, &app_port))?
    .run()
    .await
}
