//! Readiness poll over a set of endpoints

use std::future::poll_fn;
use std::task::Poll;
use std::time::Duration;

use crate::Endpoint;

/// Wait until at least one endpoint has a datagram queued
///
/// Returns the indices (into `endpoints`) of every ready endpoint, or an
/// empty vector when `timeout` elapses first. Output and closed endpoints
/// never become ready.
pub async fn poll_ready(endpoints: &[&Endpoint], timeout: Duration) -> Vec<usize> {
    let wait = poll_fn(|cx| {
        let ready: Vec<usize> = endpoints
            .iter()
            .enumerate()
            .filter_map(|(index, endpoint)| {
                let socket = endpoint.ready_source()?;
                // an error is surfaced by the following receive
                socket.poll_recv_ready(cx).is_ready().then_some(index)
            })
            .collect();

        if ready.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(ready)
        }
    });

    tokio::time::timeout(timeout, wait).await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EndpointConfig;

    async fn input(label: &str) -> Endpoint {
        Endpoint::open(&EndpointConfig::input(label, "127.0.0.1:0".parse().unwrap()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn times_out_with_nothing_ready() {
        let a = input("a").await;
        let b = input("b").await;
        let ready = poll_ready(&[&a, &b], Duration::from_millis(30)).await;
        assert!(ready.is_empty());
    }

    #[tokio::test]
    async fn reports_ready_index() {
        let a = input("a").await;
        let b = input("b").await;
        let out = Endpoint::open(&EndpointConfig::output("out", b.local_addr().unwrap()))
            .await
            .unwrap();
        out.send(b"ping").await.unwrap();

        let ready = poll_ready(&[&a, &b], Duration::from_secs(1)).await;
        assert_eq!(ready, vec![1]);
        assert_eq!(&b.try_receive(16).unwrap()[..], b"ping");
    }

    #[tokio::test]
    async fn closed_endpoints_are_skipped() {
        let mut a = input("a").await;
        a.close();
        let ready = poll_ready(&[&a], Duration::from_millis(20)).await;
        assert!(ready.is_empty());
    }
}
