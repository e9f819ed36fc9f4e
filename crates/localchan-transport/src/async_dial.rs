//! Tokio flavor of the retrying dialer.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dialer::RetryPolicy;
use crate::error::{Result, TransportError};
use crate::name::Endpoint;

/// The async stream type for the build target.
#[cfg(unix)]
pub type AsyncIpcStream = tokio::net::UnixStream;

/// The async stream type for the build target.
#[cfg(windows)]
pub type AsyncIpcStream = tokio::net::windows::named_pipe::NamedPipeClient;

#[cfg(unix)]
async fn connect_once(endpoint: &Endpoint) -> std::io::Result<AsyncIpcStream> {
    tokio::net::UnixStream::connect(endpoint.address()).await
}

#[cfg(windows)]
async fn connect_once(endpoint: &Endpoint) -> std::io::Result<AsyncIpcStream> {
    tokio::net::windows::named_pipe::ClientOptions::new().open(endpoint.address())
}

/// Connect to `endpoint`, retrying with `tokio::time::sleep` while it is not
/// ready.
///
/// Cancelling `cancel` aborts the dial at the next await point; an in-flight
/// connect future is dropped, so no half-open handle leaks.
pub async fn dial_async(
    endpoint: &Endpoint,
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<AsyncIpcStream> {
    let cancel = cancel.cloned().unwrap_or_else(CancellationToken::new);
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(endpoint, attempts));
        }

        attempts = attempts.saturating_add(1);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(endpoint, attempts)),
            outcome = connect_once(endpoint) => outcome,
        };

        let err = match outcome {
            Ok(stream) => {
                debug!(%endpoint, attempts, "endpoint connected");
                return Ok(stream);
            }
            Err(err) => err,
        };

        let pause = policy.after_failure(endpoint, attempts, started.elapsed(), err)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(endpoint, attempts)),
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

fn cancelled(endpoint: &Endpoint, attempts: u32) -> TransportError {
    debug!(%endpoint, attempts, "dial cancelled");
    TransportError::Cancelled {
        endpoint: endpoint.clone(),
        attempts,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn socket_endpoint(tag: &str) -> (std::path::PathBuf, Endpoint) {
        let dir = std::env::temp_dir().join(format!("lc-adial-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("a.sock");
        let _ = std::fs::remove_file(&path);
        (dir, Endpoint::from_socket_path(path).unwrap())
    }

    #[tokio::test]
    async fn dials_listener_that_appears_late() {
        let (dir, endpoint) = socket_endpoint("late");
        let path = endpoint.address().to_path_buf();

        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let listener = tokio::net::UnixListener::bind(&path).unwrap();
            let (mut conn, _) = listener.accept().await.unwrap();
            conn.write_all(b"up").await.unwrap();
        });

        let policy = RetryPolicy::new(Duration::from_millis(5));
        let mut stream = dial_async(&endpoint, &policy, None).await.unwrap();
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"up");

        server.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn cancellation_stops_the_dial() {
        let (dir, endpoint) = socket_endpoint("cancel");
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let policy = RetryPolicy::new(Duration::from_millis(5));
        let err = dial_async(&endpoint, &policy, Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Cancelled { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn bounded_attempts_give_up() {
        let (dir, endpoint) = socket_endpoint("bounded");
        let policy = RetryPolicy::new(Duration::from_millis(1)).with_max_attempts(2);

        let err = dial_async(&endpoint, &policy, None).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::RetriesExhausted { attempts: 2, .. }
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
