//! 内存存储适配器
//!
//! `MessageStore` 与 `CodeStore` 的进程内实现，满足两者的原子性约定，
//! 用于单实例部署和测试。

mod code_store;
mod message_store;

pub use code_store::InMemoryCodeStore;
pub use message_store::InMemoryMessageStore;
