use std::error::Error;
use std::fmt;

/// Recoverable kernel failures. Contract violations (dispatching from an
/// empty scheduler, out-of-range hardware access) panic instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// No free frame exists and the victim algorithm cannot evict.
    OutOfMemory,
    /// A launch named a program the file system does not hold.
    ProgramNotFound(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::OutOfMemory => write!(f, "out of memory: no frame available"),
            KernelError::ProgramNotFound(path) => write!(f, "program not found: {}", path),
        }
    }
}

impl Error for KernelError {}
