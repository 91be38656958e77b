// ==========================================
// 快件生命周期引擎 - 日志初始化
// ==========================================
// 职责: tracing 订阅器的统一装配(应用态与测试态)
// 说明: 引擎各层只发 tracing 事件,订阅器由宿主进程装配一次
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化应用态日志(宿主进程启动时调用一次)
///
/// # 环境变量
/// - RUST_LOG: 级别过滤器,缺省 info
///   例如: RUST_LOG=courier_lifecycle=trace
///
/// # 示例
/// ```no_run
/// use courier_lifecycle::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试态日志
///
/// 本 crate 放到 debug 级便于排查流转编排,其余依赖保持 info;
/// try_init 保证同进程多测试重复调用安全
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("courier_lifecycle=debug,info"))
        .with_test_writer()
        .try_init();
}
