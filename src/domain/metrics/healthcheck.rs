use std::fmt;
use std::sync::Mutex;

type CheckFn = Box<dyn Fn(&Healthcheck) + Send + Sync>;

/// User-defined health check.
///
/// The check function inspects whatever it guards and records the outcome by
/// calling [`Healthcheck::healthy`] or [`Healthcheck::unhealthy`].
pub struct Healthcheck {
    check: CheckFn,
    error: Mutex<Option<String>>,
}

impl Healthcheck {
    pub fn new(check: impl Fn(&Healthcheck) + Send + Sync + 'static) -> Self {
        Self {
            check: Box::new(check),
            error: Mutex::new(None),
        }
    }

    /// Run the check function
    pub fn check(&self) {
        (self.check)(self);
    }

    /// Last recorded error, `None` while healthy
    pub fn error(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn healthy(&self) {
        *self.lock() = None;
    }

    pub fn unhealthy(&self, error: impl Into<String>) {
        *self.lock() = Some(error.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.error.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Healthcheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Healthcheck")
            .field("error", &self.error())
            .finish_non_exhaustive()
    }
}
