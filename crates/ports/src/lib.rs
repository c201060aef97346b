//! ports - 抽象 trait 层
//!
//! 定义消息队列、验证码存储与投递通道的抽象接口

mod code;
mod message;
mod transport;

pub use code::*;
pub use message::*;
pub use transport::*;
