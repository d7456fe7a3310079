use std::future::Future;
use std::net::SocketAddr;

use warp::Filter;

use super::PrometheusReporter;

/// Health check response structure
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Bind the metrics/health server and return its address and serving future
pub fn serve_metrics(
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + Send), warp::Error> {
    warp::serve(routes()).try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown)
}

fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let metrics_route = warp::path("metrics").and(warp::path::end()).map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
    });

    let health_route = warp::path("health").and(warp::path::end()).map(|| {
        let response = HealthResponse {
            status: "healthy",
            service: "mqtt-to-fcm",
            version: env!("CARGO_PKG_VERSION"),
        };
        warp::reply::json(&response)
    });

    let liveness_route = warp::path("livez")
        .and(warp::path::end())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let readiness_route = warp::path("readyz").and(warp::path::end()).map(|| {
        let response = HealthResponse {
            status: "ready",
            service: "mqtt-to-fcm",
            version: env!("CARGO_PKG_VERSION"),
        };
        warp::reply::json(&response)
    });

    warp::get().and(
        metrics_route
            .or(health_route)
            .or(liveness_route)
            .or(readiness_route),
    )
}
