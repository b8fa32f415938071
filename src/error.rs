pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("pool '{pool}' rejected work: {reason}")]
    Rejected { pool: String, reason: RejectReason },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a pool refused to accept a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The pool was built with a parallelism of zero.
    NoWorkers,
    /// Shutdown has started; no new work is admitted.
    ShutDown,
    /// The queue reached its configured capacity.
    Saturated,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::NoWorkers => "pool has no workers",
            RejectReason::ShutDown => "pool is shut down",
            RejectReason::Saturated => "queue is full",
        };
        f.write_str(s)
    }
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn rejected<S: Into<String>>(pool: S, reason: RejectReason) -> Self {
        Error::Rejected {
            pool: pool.into(),
            reason,
        }
    }

    /// Returns the rejection reason if this error is a rejection.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Error::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
