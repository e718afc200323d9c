//! Single-threaded event loop.
//!
//! The loop waits for the hotplug descriptor to become readable, pulls one
//! event, and runs reconciliation and dispatch to completion before waiting
//! again. A rip therefore blocks every later event until it finishes.

use std::future::Future;
use std::os::unix::io::AsRawFd;

use tokio::io::unix::AsyncFd;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, instrument};

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::drive::DriveStatusReader;
use crate::error::Result;
use crate::events::{DeviceCache, DeviceEventSource, RawDeviceEvent};
use crate::reconcile::Reconciler;

/// Owns the pipeline and the device cache.
pub struct EventLoop<R, D> {
    reconciler: Reconciler,
    reader: R,
    dispatcher: D,
    cache: DeviceCache,
}

impl<R: DriveStatusReader, D: Dispatcher> EventLoop<R, D> {
    #[must_use]
    pub fn new(reconciler: Reconciler, reader: R, dispatcher: D) -> Self {
        Self {
            reconciler,
            reader,
            dispatcher,
            cache: DeviceCache::new(),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Run one reconciliation cycle for `event`.
    ///
    /// Returns the dispatch report when a rip ran and succeeded.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned. Recoverable ones are logged and
    /// yield `Ok(None)`.
    #[instrument(skip_all, fields(sys_path = %event.sys_path.display()))]
    pub fn handle_event(&mut self, event: &RawDeviceEvent) -> Result<Option<DispatchReport>> {
        let outcome = self
            .reconciler
            .reconcile(event, &mut self.cache, &self.reader);

        let result = match outcome {
            Ok(reconciliation) => match reconciliation.decision() {
                Some(decision) => self.dispatcher.dispatch(decision).map(Some),
                None => Ok(None),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(report)) => {
                info!(
                    kind = ?report.kind,
                    device = %report.device_node.display(),
                    exit_status = ?report.exit_code,
                    ejected = report.ejected,
                    "Dispatch finished"
                );
                Ok(Some(report))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Fatal error; stopping");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "Dispatch failed; waiting for next event");
                Ok(None)
            }
        }
    }

    /// Process events from `source` until `shutdown` resolves.
    ///
    /// Shutdown is checked before each event is pulled; an in-flight cycle
    /// is never interrupted.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, or an IO error if the descriptor
    /// cannot be registered.
    pub async fn run_until<S, F>(&mut self, source: S, shutdown: F) -> Result<()>
    where
        S: DeviceEventSource + AsRawFd,
        F: Future<Output = ()>,
    {
        let mut fd = AsyncFd::new(source)?;
        tokio::pin!(shutdown);
        info!("Event loop started");

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Event loop stopping");
                    return Ok(());
                }
                guard = fd.readable_mut() => {
                    let mut guard = guard?;
                    match guard.get_inner_mut().receive()? {
                        Some(event) => {
                            drop(guard);
                            self.handle_event(&event)?;
                        }
                        None => {
                            debug!("Spurious wakeup");
                            guard.clear_ready();
                        }
                    }
                }
            }
        }
    }

    /// Process events until SIGINT or SIGTERM.
    pub async fn run<S>(&mut self, source: S) -> Result<()>
    where
        S: DeviceEventSource + AsRawFd,
    {
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let shutdown = async move {
            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT"),
                _ = sigterm.recv() => info!("Received SIGTERM"),
            }
        };
        self.run_until(source, shutdown).await
    }
}
