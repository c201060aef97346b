//! Courier - 通知投递服务
//!
//! 模块：
//! - `template`: 模板注册表与渲染引擎
//! - `channel`: 邮件 / 短信投递通道
//! - `engine`: 消息入队、调度循环与批次回滚

pub mod channel;
pub mod engine;
pub mod template;

pub use engine::{Courier, CourierOptions, MessageQueue};
