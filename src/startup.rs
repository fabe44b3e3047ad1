use std::net::TcpListener;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{dev::Server, http::header, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::ScraperSettings,
    routes::{default_route, scrape_route, validate_route},
};

pub fn run(listener: TcpListener, scraper_settings: ScraperSettings) -> Result<Server, std::io::Error> {
    let scraper_settings = web::Data::new(scraper_settings);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["POST", "GET", "OPTIONS"])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .service(scrape_route::scrape)
            .service(validate_route::validate_selector)
            .service(default_route::index)
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .app_data(scraper_settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
