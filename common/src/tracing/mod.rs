mod init;

pub use init::{init_tracing, OtelGuard};
