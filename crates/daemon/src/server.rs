// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.
//!
//! Each accepted connection runs on its own task so a long apply never
//! blocks lock administration or other pull requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tfgate_adapters::{ShellRunner, TerraformExecutor};
use tfgate_core::{check_workspace, Clock, Lock};
use tfgate_engine::CommandRunner;
use tfgate_storage::LockStore;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, Instrument};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("request read timeout")]
    Timeout,
}

/// Shared state behind every connection task
struct Shared<L, C, T, R> {
    runner: CommandRunner<L, C, T, R>,
    start_time: Instant,
    shutdown: watch::Sender<bool>,
    active: AtomicUsize,
    idle: Notify,
}

/// Accepts connections and dispatches requests to the command runner
pub struct Server<L, C, T, R> {
    shared: Arc<Shared<L, C, T, R>>,
}

impl<L, C, T, R> Clone for Server<L, C, T, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Counts a connection as active until dropped
struct ActiveConnection<L, C, T, R> {
    shared: Arc<Shared<L, C, T, R>>,
}

impl<L, C, T, R> Drop for ActiveConnection<L, C, T, R> {
    fn drop(&mut self) {
        if self.shared.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.idle.notify_waiters();
        }
    }
}

impl<L, C, T, R> Server<L, C, T, R>
where
    L: LockStore,
    C: Clock,
    T: TerraformExecutor,
    R: ShellRunner,
{
    pub fn new(runner: CommandRunner<L, C, T, R>, start_time: Instant) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                runner,
                start_time,
                shutdown,
                active: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Accept connections until shutdown is requested
    pub async fn serve(&self, listener: &UnixListener) {
        let mut shutdown = self.shared.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, _)) => self.spawn_connection(stream),
                    Err(e) => error!(error = %e, "error accepting connection"),
                },
                _ = shutdown.changed() => {
                    info!("shutdown requested, no longer accepting connections");
                    return;
                }
            }
        }
    }

    /// Stop the accept loop; in-flight connections keep running
    pub fn request_shutdown(&self) {
        self.shared.shutdown.send_replace(true);
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shared.shutdown.borrow()
    }

    /// Connections currently being handled
    pub fn active_connections(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Wait for in-flight connections to finish, up to `grace`.
    ///
    /// Returns false if connections were still running when the grace
    /// period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.shared.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.active_connections() == 0 {
                    return;
                }
                notified.await;
            }
        };

        match tokio::time::timeout(grace, wait).await {
            Ok(()) => true,
            Err(_) => {
                error!(
                    active = self.active_connections(),
                    grace_ms = grace.as_millis() as u64,
                    "grace period elapsed with commands still running"
                );
                false
            }
        }
    }

    fn spawn_connection(&self, stream: UnixStream) {
        self.shared.active.fetch_add(1, Ordering::SeqCst);
        let active = ActiveConnection {
            shared: Arc::clone(&self.shared),
        };
        let server = self.clone();
        tokio::spawn(async move {
            let _active = active;
            if let Err(e) = server.handle_connection(stream).await {
                error!(error = %e, "error handling connection");
            }
        });
    }

    /// Handle a single client connection
    pub async fn handle_connection(&self, stream: UnixStream) -> Result<(), ServerError> {
        let (mut reader, mut writer) = stream.into_split();

        let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
            Ok(req) => req,
            Err(protocol::ProtocolError::Timeout) => return Err(ServerError::Timeout),
            Err(protocol::ProtocolError::ConnectionClosed) => {
                debug!("client disconnected before sending request");
                return Ok(());
            }
            Err(e) => return Err(ServerError::Protocol(e)),
        };

        debug!(?request, "received request");
        let response = self.handle_request(request).await;
        debug!(?response, "sending response");

        protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
        Ok(())
    }

    /// Handle a single request and return a response
    pub async fn handle_request(&self, request: Request) -> Response {
        let runner = &self.shared.runner;
        match request {
            Request::Ping => Response::Pong,

            Request::Hello { version: _ } => Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            },

            Request::Status => match runner.locks().list() {
                Ok(locks) => Response::Status {
                    uptime_secs: self.shared.start_time.elapsed().as_secs(),
                    locks_held: locks.len(),
                    commands_in_flight: runner.working_dirs().in_flight(),
                },
                Err(e) => error_response(e),
            },

            Request::Shutdown => {
                self.request_shutdown();
                Response::ShuttingDown
            }

            Request::Command { request } => {
                if let Err(e) = check_workspace(&request.workspace) {
                    return error_response(e);
                }
                let (ctx, project) = request.into_context();
                let span = tracing::info_span!("request", pull = ctx.pull.num);
                let result = runner.run(&ctx, &project).instrument(span).await;
                Response::CommandResult { result }
            }

            Request::ListLocks => match runner.locks().list() {
                Ok(locks) => {
                    let mut locks: Vec<Lock> = locks.into_values().collect();
                    locks.sort_by_key(|lock| lock.key());
                    Response::Locks { locks }
                }
                Err(e) => error_response(e),
            },

            Request::GetLock { key } => match runner.locks().get_lock(&key) {
                Ok(lock) => Response::Lock { lock },
                Err(e) => error_response(e),
            },

            Request::Unlock { key } => match runner.locks().unlock(&key) {
                Ok(lock) => Response::Unlocked { lock },
                Err(e) => error_response(e),
            },

            Request::UnlockPull { repo, num } => match runner.locks().unlock_by_pull(&repo, num) {
                Ok(locks) => Response::Released { locks },
                Err(e) => error_response(e),
            },
        }
    }
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
