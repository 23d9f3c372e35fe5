/// 命令行命令模块
///
/// 每个子命令对应一个处理函数:
/// - log_commands: 上报、补交、查看本地错误队列
/// - auth_commands: 认证状态、登录、登出
/// - watch_commands: 连通性监视与联网补交
/// - boundary_commands: 错误边界演示

pub mod auth_commands;
pub mod boundary_commands;
pub mod log_commands;
pub mod watch_commands;
