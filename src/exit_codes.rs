//! Exit code constants for the quotedesk CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, config, I/O)
//! - 2: Quote or product not found
//! - 3: Ownership violation
//! - 4: Operation not legal in the quote's stage (includes empty submit)
//! - 5: Persistence conflict
//! - 6: Approval system round-trip failed
//! - 7: Timed out waiting for a quote lock

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid input, config or filesystem failure.
pub const USER_ERROR: i32 = 1;

/// The quote or a referenced product does not exist.
pub const NOT_FOUND: i32 = 2;

/// The acting customer does not own the quote.
pub const FORBIDDEN: i32 = 3;

/// The lifecycle stage does not allow the operation.
pub const INVALID_STAGE: i32 = 4;

/// The store rejected the save.
pub const CONFLICT: i32 = 5;

/// The approval system could not be reached or answered badly.
pub const EXTERNAL_FAILURE: i32 = 6;

/// A quote lock could not be acquired within the configured wait.
pub const LOCK_TIMEOUT: i32 = 7;
