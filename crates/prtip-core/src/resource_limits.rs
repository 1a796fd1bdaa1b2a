//! Resource limit detection: file-descriptor ceiling discovery feeding the Scan Driver's
//! max-sockets auto-sizing clamp (SPEC_FULL §4.F).
//!
//! Inspired by RustScan's resource management patterns.

use std::fmt;
use thiserror::Error;

#[cfg(unix)]
use rlimit::Resource;

/// Errors that can occur during resource limit operations
#[derive(Error, Debug)]
pub enum ResourceLimitError {
    /// Failed to get resource limit
    #[error("Failed to get resource limit: {0}")]
    GetLimitFailed(String),
}

/// Resource limit information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Soft limit (current limit)
    pub soft: u64,
    /// Hard limit (maximum limit)
    pub hard: u64,
}

impl fmt::Display for ResourceLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "soft: {}, hard: {}", self.soft, self.hard)
    }
}

/// Get the current file descriptor limit (RLIMIT_NOFILE)
///
/// # Examples
///
/// ```
/// use prtip_core::resource_limits::get_file_descriptor_limit;
///
/// match get_file_descriptor_limit() {
///     Ok(limits) => println!("File descriptor limits: {}", limits),
///     Err(e) => eprintln!("Failed to get limits: {}", e),
/// }
/// ```
#[cfg(unix)]
pub fn get_file_descriptor_limit() -> Result<ResourceLimits, ResourceLimitError> {
    Resource::NOFILE
        .get()
        .map(|(soft, hard)| ResourceLimits { soft, hard })
        .map_err(|e| ResourceLimitError::GetLimitFailed(e.to_string()))
}

/// Get the current file descriptor limit (Windows stub)
#[cfg(not(unix))]
pub fn get_file_descriptor_limit() -> Result<ResourceLimits, ResourceLimitError> {
    // Windows has different resource management
    // Default to a conservative value similar to typical Windows limits
    Ok(ResourceLimits {
        soft: 2048,
        hard: 2048,
    })
}

/// Clamp a desired `high_water` (max concurrent sockets) to the soft file-descriptor limit,
/// reserving a handful of descriptors for stdio/log files. Returns `(clamped, was_reduced)`.
///
/// Mirrors SPEC_FULL §4.F's FD-ceiling rule: `soft_fd_limit - 10`.
pub fn clamp_high_water_to_fd_limit(desired: u32, soft_fd_limit: u64) -> (u32, bool) {
    const RESERVE: u64 = 10;
    let ceiling = soft_fd_limit.saturating_sub(RESERVE);
    if (desired as u64) > ceiling {
        (ceiling.max(1) as u32, true)
    } else {
        (desired, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_file_descriptor_limit() {
        let result = get_file_descriptor_limit();
        assert!(result.is_ok());
        let limits = result.unwrap();
        // Sanity check: limits should be reasonable
        assert!(limits.soft > 0);
        assert!(limits.hard >= limits.soft);
    }

    #[test]
    fn test_clamp_high_water_reduces_when_over_ceiling() {
        let (clamped, reduced) = clamp_high_water_to_fd_limit(10000, 1024);
        assert_eq!(clamped, 1014);
        assert!(reduced);
    }

    #[test]
    fn test_clamp_high_water_passes_through_when_under_ceiling() {
        let (clamped, reduced) = clamp_high_water_to_fd_limit(500, 1024);
        assert_eq!(clamped, 500);
        assert!(!reduced);
    }

    #[test]
    fn test_resource_limits_display() {
        let limits = ResourceLimits {
            soft: 1024,
            hard: 4096,
        };
        let display = format!("{}", limits);
        assert_eq!(display, "soft: 1024, hard: 4096");
    }

    #[test]
    fn test_resource_limits_equality() {
        let limits1 = ResourceLimits {
            soft: 1024,
            hard: 4096,
        };
        let limits2 = ResourceLimits {
            soft: 1024,
            hard: 4096,
        };
        let limits3 = ResourceLimits {
            soft: 2048,
            hard: 4096,
        };

        assert_eq!(limits1, limits2);
        assert_ne!(limits1, limits3);
    }
}
