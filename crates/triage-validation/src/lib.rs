//! # triage-validation
//!
//! Verification oracle for proposed fixes.
//!
//! A fix is checked by calling one function it defines with a fixed
//! regression input and comparing the result with the expected value using
//! the interpreter's own equality, so `3.0` matches `3`. Any
//! failure along the way (no function, syntax error, exception, timeout)
//! counts as the bug still being present.
//!
//! Each check runs in its own interpreter process, so bindings never leak
//! between checks.

mod oracle;
mod runner;

pub use oracle::{FixCheck, VerificationOracle};
pub use runner::{FixRunner, FnRunner, PythonRunner, RunOutput};
