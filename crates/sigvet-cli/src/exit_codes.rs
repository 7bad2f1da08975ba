//! Exit codes for the sigvet binary.
//! Part of the public contract; fetch pipelines branch on these.

pub const SUCCESS: i32 = 0;
pub const VERIFICATION_FAILED: i32 = 1; // Verdict rejected the signature(s)
pub const INTERNAL_ERROR: i32 = 2; // Verification could not be run at all
