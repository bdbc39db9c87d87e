//! Mocked cluster client for repository tests

use http::{Method, Request, Response, StatusCode};
use kube::Client;
use kube::client::Body;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::repository::ClientRegistry;

/// Registers a client for `cluster` that answers one request with `status`
///
/// The returned handle yields the method and path of that request.
pub(crate) fn status_registry(
    cluster: &str,
    status: StatusCode,
) -> (Arc<ClientRegistry>, JoinHandle<(Method, String)>) {
    let (service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();

    let registry = ClientRegistry::new();
    registry.insert(cluster, Client::new(service, "default"));

    let responder = tokio::spawn(async move {
        let (request, send) = handle.next_request().await.expect("no request sent");

        let body = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": status.canonical_reason().unwrap_or_default(),
            "reason": status.canonical_reason().unwrap_or_default().replace(' ', ""),
            "code": status.as_u16(),
        });
        let response = Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        send.send_response(response);

        (request.method().clone(), request.uri().path().to_string())
    });

    (Arc::new(registry), responder)
}
