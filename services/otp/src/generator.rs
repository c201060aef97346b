//! 验证码生成

use rand::Rng;

/// 生成指定长度的纯数字验证码
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}
