//! The device-control seam.
//!
//! The relay treats device control as an opaque privileged operation: a
//! method name plus an optional numeric argument, answered with output
//! text. The platform implementation lives in the daemon.

use crate::error::CoreError;

pub trait DeviceController: Send + Sync {
    /// Invokes a device method. Unknown methods and backend failures are
    /// reported as [`CoreError::DeviceControl`] and surfaced to the
    /// client in the normal response envelope.
    fn invoke(&self, method: &str, value: Option<i64>) -> Result<String, CoreError>;
}
