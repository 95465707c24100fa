use std::time::Duration;

/// Why a verification attempt failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer timeout.
    Timeout,
    /// 429 / 503.
    Throttled,
    /// Connect refused, reset, DNS, send/recv failures.
    Connection,
    /// Certificate or peer verification. Some endpoints produce these
    /// spuriously, so they are retried quietly.
    TlsVerification,
    /// Other 5xx responses.
    Http5xx(u16),
    /// Body cut short or unreadable after the head arrived.
    Transfer,
    /// The record store rejected the write.
    Commit,
    /// 403 / 404 (or a key that cannot be addressed at all).
    Inaccessible(u16),
    Other,
}

/// How the retry loop treats a kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retried; logged at debug only and counted separately.
    Suppressed,
    Retryable,
    /// Not retried.
    Fatal,
}

impl ErrorKind {
    pub fn class(self) -> FailureClass {
        use ErrorKind::*;
        match self {
            TlsVerification => FailureClass::Suppressed,
            Inaccessible(_) => FailureClass::Fatal,
            Timeout | Throttled | Connection | Http5xx(_) | Transfer | Commit | Other => {
                FailureClass::Retryable
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Capped exponential backoff with a hard attempt ceiling.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per object, the first one included.
    pub max_attempts: u32,
    /// Wait after the first failure; doubled after each further one.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.base_delay;
        for _ in 1..attempt {
            if delay >= self.max_delay {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        delay.min(self.max_delay)
    }

    /// What to do after failed attempt number `attempt` (1-based).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        let out_of_attempts = attempt >= self.max_attempts;
        if out_of_attempts || kind.class() == FailureClass::Fatal {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.delay_for(attempt))
        }
    }
}
