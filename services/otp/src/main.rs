//! OTP Worker - 短信验证码服务与通知投递同进程运行
//!
//! 使用 courier-bootstrap 统一启动模式

use otp::OtpApp;

use courier_bootstrap::run_worker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_worker("config", |config, shutdown| async move {
        // 组装 Courier 与验证码服务（共享内存消息队列）
        let app = OtpApp::from_config(&config)?;

        app.run(shutdown).await
    })
    .await
}
