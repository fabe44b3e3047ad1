use actix_files::NamedFile;
use actix_web::get;

#[get("/")]
async fn index() -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async("./static/index.html").await?)
}
