//! courier-bootstrap - 统一 worker 启动骨架
//!
//! 所有后台 worker 复用的启动逻辑

mod runtime;
mod shutdown;
mod starter;

pub use runtime::*;
pub use shutdown::*;
pub use starter::*;
