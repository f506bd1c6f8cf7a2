//! 会话命令
//!
//! 核心只接受这一组封闭的命令，字符串解析由命令行外壳完成。

/// 会话内可执行的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 显示帮助
    Help,
    /// 查询天气，未指定地点时使用用户自己的地点
    Weather { location: Option<String> },
    /// 随机趣闻
    Fact,
    /// 显示当前用户资料
    WhoAmI,
    /// 加入广播频道
    Listen { channel: String },
    /// 向广播频道发布消息
    Publish { channel: String, text: String },
    /// 离开广播频道
    Leave { channel: String },
    /// 读取所有未读消息
    Fetch,
    /// 发送私信
    DirectMessage { recipient: String, text: String },
    /// 结束会话
    Exit,
}
