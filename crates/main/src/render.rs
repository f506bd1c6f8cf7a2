//! 输出文本

use application::{
    ApplicationError, CommandOutcome, JoinOutcome, LeaveOutcome, LookupError, WeatherReport,
};
use domain::{ClassifiedMessage, DomainError, MessageOrigin, UserProfile};

use crate::commands::MissingArgument;

pub const END_OF_MESSAGES: &str = "=========END=========";

pub fn help(name: &str) -> String {
    format!(
        "Here is what I can do for you, {name}:\n\
         \n\
         \x20 !help                 show this guide\n\
         \x20 !weather [location]   weather for a location (your own if omitted)\n\
         \x20 !fact                 a random fact\n\
         \x20 !whoami               your profile\n\
         \x20 ~listen <channel>     subscribe to a channel\n\
         \x20 ~publish <channel>    publish a message to a channel\n\
         \x20 ~leave <channel>      unsubscribe from a channel\n\
         \x20 ~fetch                read all unread messages\n\
         \x20 ~dm <username>        send a direct message\n\
         \x20 @Exit                 leave the chatbot"
    )
}

pub fn introduction(name: &str) -> String {
    format!(
        "Nice to meet you, {name}! I am a chatbot built on Redis publish/subscribe. \
         You can chat on channels, send direct messages to other users, \
         check the weather or ask me for a fact. Type [!help] to see every command."
    )
}

pub fn location_confirmed(location: &str, report: &WeatherReport) -> String {
    format!(
        "Thanks! A quick weather update for your location ({location}) - \
         Temperature: {} | Humidity: {}",
        report.temperature, report.humidity
    )
}

/// 引导阶段选择不继续时的告别
pub fn goodbye(name: &str) -> String {
    format!("GoodBye, {name}!")
}

/// `@Exit` 结束会话时的告别
pub fn farewell(name: &str) -> String {
    format!("GoodBye, {name}")
}

pub fn missing_argument(argument: MissingArgument) -> &'static str {
    match argument {
        MissingArgument::Channel => "Please try again along with a channel name.",
        MissingArgument::Recipient => "Please try again along with receiver's username.",
    }
}

pub fn unknown_input(name: &str) -> String {
    format!(
        "Sorry, I did not understand that. {name}, \
         please type [!help] to get list of all the valid commands."
    )
}

pub fn whoami(profile: &UserProfile) -> String {
    format!(
        "You are {}. You are a {}-year-old {} from {}. Your username is {}.",
        profile.name, profile.age, profile.gender, profile.location, profile.username
    )
}

pub fn message(message: &ClassifiedMessage) -> String {
    match &message.origin {
        MessageOrigin::Direct(sender) => format!("[FROM: {}]: {}", sender, message.text),
        MessageOrigin::Broadcast(channel) => format!("[ON: {}]: {}", channel, message.text),
    }
}

fn weather(location: &str, report: &Result<WeatherReport, LookupError>) -> String {
    match report {
        Ok(report) => format!(
            "{location} - Temperature: {} | Humidity: {}",
            report.temperature, report.humidity
        ),
        Err(err) => err.reason.clone(),
    }
}

/// 命令执行结果的展示文本
pub fn outcome(outcome: &CommandOutcome, profile: &UserProfile) -> String {
    match outcome {
        CommandOutcome::Help => help(profile.name.as_str()),
        CommandOutcome::Weather { location, report } => weather(location, report),
        CommandOutcome::Fact(fact) => format!("Do You Know? {fact}"),
        CommandOutcome::Profile(profile) => whoami(profile),
        CommandOutcome::Joined { channel, outcome } => match outcome {
            JoinOutcome::AlreadySubscribed => format!("You are already subscribed to {channel}."),
            JoinOutcome::Subscribed => format!("You are now subscribed to {channel}."),
        },
        CommandOutcome::Left { channel, outcome } => match outcome {
            LeaveOutcome::Unsubscribed => format!("You are no longer subscribed to {channel}."),
            LeaveOutcome::NotSubscribed => {
                format!("No action needed as you were not subscribed to {channel}.")
            }
        },
        CommandOutcome::Published(_) => "Your message has been published.".to_string(),
        CommandOutcome::DirectSent(_) => "Your message has been sent.".to_string(),
        CommandOutcome::Messages(messages) => messages
            .iter()
            .map(message)
            .chain(std::iter::once(END_OF_MESSAGES.to_string()))
            .collect::<Vec<_>>()
            .join("\n\n"),
        CommandOutcome::Exit => farewell(profile.name.as_str()),
    }
}

/// 可恢复错误的提示文本
pub fn error(err: &ApplicationError) -> String {
    match err.as_domain() {
        Some(DomainError::SelfAddressed { .. }) => {
            "You cannot send a direct-message to yourself.".to_string()
        }
        Some(DomainError::UnknownRecipient { .. }) => {
            "No user found. Please try again with a correct username.".to_string()
        }
        Some(DomainError::ValidationError { field, message }) => {
            format!("Invalid {field}: {message}")
        }
        Some(other) => other.to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::Ack;
    use domain::{Age, ChannelName, DisplayName, Topic, UserId, Username};

    fn profile() -> UserProfile {
        UserProfile::new(
            UserId::new(3),
            DisplayName::parse("carol").unwrap(),
            Age::new(41).unwrap(),
            "female",
            "Lisbon",
        )
    }

    #[test]
    fn test_whoami_sentence() {
        assert_eq!(
            whoami(&profile()),
            "You are carol. You are a 41-year-old female from Lisbon. Your username is carol3."
        );
    }

    #[test]
    fn test_messages_end_with_marker() {
        let messages = vec![
            ClassifiedMessage {
                origin: MessageOrigin::Direct(Username::parse("bob2").unwrap()),
                text: "hi".to_string(),
            },
            ClassifiedMessage {
                origin: MessageOrigin::Broadcast(ChannelName::parse("sports").unwrap()),
                text: "goal".to_string(),
            },
        ];

        let text = outcome(&CommandOutcome::Messages(messages), &profile());
        assert_eq!(
            text,
            "[FROM: bob2]: hi\n\n[ON: sports]: goal\n\n=========END========="
        );
    }

    #[test]
    fn test_empty_fetch_prints_only_marker() {
        let text = outcome(&CommandOutcome::Messages(Vec::new()), &profile());
        assert_eq!(text, END_OF_MESSAGES);
    }

    #[test]
    fn test_weather_outcome() {
        let ok = CommandOutcome::Weather {
            location: "Lisbon".to_string(),
            report: Ok(WeatherReport {
                temperature: 19.5,
                humidity: 60.0,
            }),
        };
        assert_eq!(
            outcome(&ok, &profile()),
            "Lisbon - Temperature: 19.5 | Humidity: 60"
        );

        let reason = "Invalid entry detected; please try again.";
        let failed = CommandOutcome::Weather {
            location: "Atlantis".to_string(),
            report: Err(LookupError::new(reason)),
        };
        assert_eq!(outcome(&failed, &profile()), reason);
    }

    #[test]
    fn test_publish_ack_and_subscription_texts() {
        let ack = Ack {
            topic: Topic::resolve("sports", false).unwrap(),
            receivers: 0,
        };
        assert_eq!(
            outcome(&CommandOutcome::Published(ack), &profile()),
            "Your message has been published."
        );
        assert_eq!(
            outcome(
                &CommandOutcome::Left {
                    channel: "sports".to_string(),
                    outcome: LeaveOutcome::NotSubscribed,
                },
                &profile(),
            ),
            "No action needed as you were not subscribed to sports."
        );
    }

    #[test]
    fn test_exit_and_decline_farewells_differ() {
        assert_eq!(outcome(&CommandOutcome::Exit, &profile()), "GoodBye, carol");
        assert_eq!(goodbye("carol"), "GoodBye, carol!");
    }

    #[test]
    fn test_recipient_errors() {
        let own: ApplicationError = DomainError::self_addressed("carol3").into();
        assert_eq!(error(&own), "You cannot send a direct-message to yourself.");

        let missing: ApplicationError = DomainError::unknown_recipient("nobody9").into();
        assert_eq!(
            error(&missing),
            "No user found. Please try again with a correct username."
        );
    }
}
