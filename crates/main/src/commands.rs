//! 命令行输入解析
//!
//! 把一行用户输入转换为会话命令。需要第二次输入的命令（发布、私信）
//! 先返回目标，由控制台继续询问消息内容。

use domain::Command;

/// 缺少的命令参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingArgument {
    Channel,
    Recipient,
}

/// 解析后的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 可以直接执行的命令
    Ready(Command),
    /// 向频道发布，等待消息内容
    PublishTo(String),
    /// 发送私信，等待确认收件人和消息内容
    DirectTo(String),
    MissingArgument(MissingArgument),
    Unknown,
}

/// 带参数命令：返回去掉前缀后的参数
fn argument<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

pub fn parse(line: &str) -> Input {
    let line = line.trim();

    match line {
        "@Exit" => return Input::Ready(Command::Exit),
        "!help" => return Input::Ready(Command::Help),
        "!fact" => return Input::Ready(Command::Fact),
        "!whoami" => return Input::Ready(Command::WhoAmI),
        "~fetch" => return Input::Ready(Command::Fetch),
        _ => {}
    }

    if let Some(location) = argument(line, "!weather") {
        let location = (!location.is_empty()).then(|| location.to_string());
        return Input::Ready(Command::Weather { location });
    }

    if let Some(channel) = argument(line, "~listen") {
        return with_channel(channel, |channel| Input::Ready(Command::Listen { channel }));
    }

    if let Some(channel) = argument(line, "~publish") {
        return with_channel(channel, Input::PublishTo);
    }

    if let Some(channel) = argument(line, "~leave") {
        return with_channel(channel, |channel| Input::Ready(Command::Leave { channel }));
    }

    if let Some(recipient) = argument(line, "~dm") {
        if recipient.is_empty() {
            return Input::MissingArgument(MissingArgument::Recipient);
        }
        return Input::DirectTo(recipient.to_string());
    }

    Input::Unknown
}

fn with_channel(channel: &str, build: impl FnOnce(String) -> Input) -> Input {
    if channel.is_empty() {
        Input::MissingArgument(MissingArgument::Channel)
    } else {
        build(channel.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("!help"), Input::Ready(Command::Help));
        assert_eq!(parse("  !fact "), Input::Ready(Command::Fact));
        assert_eq!(parse("!whoami"), Input::Ready(Command::WhoAmI));
        assert_eq!(parse("~fetch"), Input::Ready(Command::Fetch));
        assert_eq!(parse("@Exit"), Input::Ready(Command::Exit));
    }

    #[test]
    fn test_weather_location_is_optional() {
        assert_eq!(
            parse("!weather"),
            Input::Ready(Command::Weather { location: None })
        );
        assert_eq!(
            parse("!weather  New York "),
            Input::Ready(Command::Weather {
                location: Some("New York".to_string()),
            })
        );
    }

    #[test]
    fn test_channel_commands() {
        assert_eq!(
            parse("~listen sports"),
            Input::Ready(Command::Listen {
                channel: "sports".to_string(),
            })
        );
        assert_eq!(
            parse("~leave sports"),
            Input::Ready(Command::Leave {
                channel: "sports".to_string(),
            })
        );
        let publish = Input::PublishTo("sports".to_string());
        assert_eq!(parse("~publish sports"), publish);
    }

    #[test]
    fn test_missing_arguments() {
        let no_channel = Input::MissingArgument(MissingArgument::Channel);
        for line in ["~listen", "~publish   ", "~leave"] {
            assert_eq!(parse(line), no_channel);
        }
        let no_recipient = Input::MissingArgument(MissingArgument::Recipient);
        assert_eq!(parse("~dm"), no_recipient);
    }

    #[test]
    fn test_direct_message_target() {
        assert_eq!(parse("~dm bob2"), Input::DirectTo("bob2".to_string()));
    }

    #[test]
    fn test_unknown_input() {
        assert_eq!(parse("hello"), Input::Unknown);
        assert_eq!(parse("@exit"), Input::Unknown);
        assert_eq!(parse(""), Input::Unknown);
    }
}
