//! 投递通道
//!
//! 每个通道把一条 `Message` 加上还原出的模板转换成具体协议上的投递。

mod email;
mod sms;

pub use email::{EmailDispatcher, EmailSender};
pub use sms::SmsDispatcher;
