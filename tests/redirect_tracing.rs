// Redirect tracing against in-process HTTP servers.

use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use safe_surf::redirect::{
    analyze_redirects, HttpRedirectTracer, RedirectReport, RedirectResolver, RedirectTracer,
    RenderedRedirectTracer, LOOP_ISSUE,
};
use safe_surf::TraceError;

/// Serves:
/// - `/redirect/{hop}`: 307 to `/redirect/{hop - 1}`, landing at 0
/// - `/loop/a` <-> `/loop/b`
/// - `/meta`: HTML page with a meta refresh to `/landing`
/// - `/script`: HTML page assigning `location.href` to `/landing`
/// - `/meta-loop`: meta refresh to itself
/// - `/slow`: sleeps before answering
async fn start_server() -> String {
    let app = Router::new()
        .route(
            "/redirect/{hop}",
            get(|Path(hop): Path<usize>| async move {
                if hop > 0 {
                    Redirect::temporary(&format!("/redirect/{}", hop - 1)).into_response()
                } else {
                    "Final Destination".into_response()
                }
            }),
        )
        .route("/loop/a", get(|| async { Redirect::temporary("/loop/b") }))
        .route("/loop/b", get(|| async { Redirect::temporary("/loop/a") }))
        .route(
            "/meta",
            get(|| async {
                Html(r#"<html><head><meta http-equiv="refresh" content="0; url=/landing"></head></html>"#)
            }),
        )
        .route(
            "/script",
            get(|| async { Html(r#"<script>window.location.href = "/landing";</script>"#) }),
        )
        .route(
            "/meta-loop",
            get(|| async {
                Html(r#"<meta http-equiv="refresh" content="0; url=/meta-loop">"#)
            }),
        )
        .route(
            "/landing",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<p>landed</p>") }),
        )
        .route("/missing-location", get(|| async { StatusCode::FOUND }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Server failed to start");
    });

    format!("http://{}", addr)
}

fn redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_http_tracer_records_every_hop() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/redirect/3")).await.unwrap();
    let hops = trace.chain.as_slice();
    assert_eq!(hops.len(), 4);
    assert_eq!(hops[0], format!("{base}/redirect/3"));
    assert_eq!(hops[3], format!("{base}/redirect/0"));
    assert_eq!(trace.final_url(), format!("{base}/redirect/0"));
    assert!(trace.revisit.is_none());
}

#[tokio::test]
async fn test_http_tracer_non_redirect_is_chain_of_one() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/landing")).await.unwrap();
    assert_eq!(trace.chain.len(), 1);
    assert_eq!(trace.final_url(), format!("{base}/landing"));
}

#[tokio::test]
async fn test_http_tracer_hop_limit() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client()).with_max_hops(2);

    let err = tracer.trace(&format!("{base}/redirect/5")).await.unwrap_err();
    assert!(matches!(err, TraceError::TooManyRedirects(2)));
}

#[tokio::test]
async fn test_http_tracer_detects_loop() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/loop/a")).await.unwrap();
    assert_eq!(trace.chain.len(), 2);
    assert_eq!(trace.revisit.as_deref(), Some(format!("{base}/loop/a").as_str()));
}

#[tokio::test]
async fn test_http_tracer_redirect_without_location_lands() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let trace = tracer
        .trace(&format!("{base}/missing-location"))
        .await
        .unwrap();
    assert_eq!(trace.chain.len(), 1);
}

#[tokio::test]
async fn test_http_tracer_times_out() {
    let base = start_server().await;
    let tracer =
        HttpRedirectTracer::new(redirect_client()).with_timeout(Duration::from_millis(200));

    let err = tracer.trace(&format!("{base}/slow")).await.unwrap_err();
    assert!(matches!(err, TraceError::Timeout));
}

#[tokio::test]
async fn test_http_tracer_ignores_meta_refresh() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/meta")).await.unwrap();
    assert_eq!(trace.final_url(), format!("{base}/meta"));
}

#[tokio::test]
async fn test_rendered_tracer_follows_meta_refresh() {
    let base = start_server().await;
    let tracer = RenderedRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/meta")).await.unwrap();
    assert_eq!(
        trace.chain.as_slice(),
        &[format!("{base}/meta"), format!("{base}/landing")]
    );
}

#[tokio::test]
async fn test_rendered_tracer_follows_script_redirect() {
    let base = start_server().await;
    let tracer = RenderedRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/script")).await.unwrap();
    assert_eq!(trace.chain.len(), 2);
    assert_eq!(trace.final_url(), format!("{base}/landing"));
}

#[tokio::test]
async fn test_rendered_tracer_detects_meta_loop() {
    let base = start_server().await;
    let tracer = RenderedRedirectTracer::new(redirect_client());

    let trace = tracer.trace(&format!("{base}/meta-loop")).await.unwrap();
    assert_eq!(trace.chain.len(), 1);
    assert!(trace.revisit.is_some());
    assert_eq!(trace.hops_for_analysis().len(), 2);
}

#[tokio::test]
async fn test_resolver_degrades_on_unreachable_host() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resolver = RedirectResolver::new(std::sync::Arc::new(HttpRedirectTracer::new(
        redirect_client(),
    )));
    let url = format!("http://{addr}/x");
    let resolution = resolver.resolve(&url).await.unwrap();
    assert!(resolution.degraded);
    assert!(!resolution.is_shortened);
    assert_eq!(resolution.final_url, url);
}

#[tokio::test]
async fn test_analyze_redirects_reports_loop() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client());

    let report = analyze_redirects(&tracer, &format!("{base}/loop/a"))
        .await
        .unwrap();
    let RedirectReport::Analyzed {
        is_suspicious,
        reason,
        redirect_chain,
        ..
    } = report
    else {
        panic!("expected analyzed report");
    };
    assert!(is_suspicious);
    assert!(reason.iter().any(|r| r == LOOP_ISSUE));
    assert_eq!(redirect_chain.len(), 3);
}

#[tokio::test]
async fn test_analyze_redirects_too_many_is_error_report() {
    let base = start_server().await;
    let tracer = HttpRedirectTracer::new(redirect_client()).with_max_hops(1);

    let report = analyze_redirects(&tracer, &format!("{base}/redirect/4"))
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Too many redirects"));
}
