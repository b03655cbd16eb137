use serde::Serialize;
use warp::reply::Json;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

pub fn health() -> Json {
    warp::reply::json(&HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
