//! 交互式控制台
//!
//! 负责新用户引导和命令循环。输入来自任意异步按行读取的来源，
//! 输出写入任意 `Write`，便于在测试中脚本化整个会话。

use std::io::{self, Write};

use application::{
    ApplicationError, ChatSession, CommandOutcome, IdentityRegistry, RegisterUserRequest,
    VerifiedLocation,
};
use domain::{Age, Command, DisplayName, DomainError, UserProfile};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, error};

use crate::commands::{self, Input};
use crate::render;

const COMMAND_PROMPT: &str = "=>>";
const NAME_PROMPT: &str = "\nHi, please enter your name to get started: ";
const GENDER_PROMPT: &str = "\nNext, please enter your gender: ";
const LOCATION_PROMPT: &str = "\nLastly, please enter your city or state: ";
const MESSAGE_PROMPT: &str = "\nPlease enter your message: ";
const DIRECT_MESSAGE_PROMPT: &str = "\nUser found. Please enter your message: ";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("console io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\n{text}\n")
    }

    /// 显示提示并读取一行；输入结束时返回 `None`
    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        self.lines.next_line().await
    }

    /// 新用户引导：收集资料、验证地点并注册
    ///
    /// 用户选择不继续或输入结束时返回 `Ok(None)`。
    pub async fn onboard(
        &mut self,
        registry: &IdentityRegistry,
    ) -> Result<Option<UserProfile>, CliError> {
        let name = loop {
            let Some(line) = self.prompt(NAME_PROMPT).await? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match DisplayName::parse(line) {
                Ok(name) => break name,
                Err(err) => self.say(&render::error(&ApplicationError::from(err)))?,
            }
        };

        loop {
            let question = format!(
                "\nHi {name}, just a few other details to get to know you better and \
                 before you can play around with the chatbot. \
                 Press 'Y' or 'y' to get started or 'N' or 'n' to exit: "
            );
            let Some(answer) = self.prompt(&question).await? else {
                return Ok(None);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" => break,
                "n" => {
                    self.say(&render::goodbye(name.as_str()))?;
                    return Ok(None);
                }
                _ => {}
            }
        }

        let age = loop {
            let question = format!("\nThanks for continuing, {name}, please enter your age: ");
            let Some(line) = self.prompt(&question).await? else {
                return Ok(None);
            };
            match Age::parse(&line) {
                Ok(age) => break age,
                Err(_) => self.say("Invalid entry; please only enter numerals.")?,
            }
        };

        let gender = loop {
            let Some(line) = self.prompt(GENDER_PROMPT).await? else {
                return Ok(None);
            };
            let line = line.trim();
            if !line.is_empty() {
                break line.to_string();
            }
        };

        let Some(location) = self.ask_location(registry).await? else {
            return Ok(None);
        };

        let profile = registry
            .register(RegisterUserRequest {
                name,
                age,
                gender,
                location,
            })
            .await?;

        self.say(&render::introduction(profile.name.as_str()))?;
        Ok(Some(profile))
    }

    async fn ask_location(
        &mut self,
        registry: &IdentityRegistry,
    ) -> Result<Option<VerifiedLocation>, CliError> {
        loop {
            let Some(line) = self.prompt(LOCATION_PROMPT).await? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }

            match registry.verify_location(&line).await {
                Ok(location) => {
                    self.say(&render::location_confirmed(&location.name, &location.weather))?;
                    return Ok(Some(location));
                }
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    let reason = match err.as_domain() {
                        Some(DomainError::ValidationError { message, .. }) => message.clone(),
                        _ => render::error(&err),
                    };
                    self.say(&reason)?;
                }
            }
        }
    }

    /// 命令循环，直到 `@Exit`、输入结束或出现不可恢复的错误
    pub async fn run(&mut self, session: &mut ChatSession) -> Result<(), CliError> {
        loop {
            let Some(line) = self.prompt(COMMAND_PROMPT).await? else {
                debug!("输入结束，退出会话");
                return Ok(());
            };

            let command = match commands::parse(&line) {
                Input::Ready(command) => command,
                Input::PublishTo(channel) => {
                    let Some(text) = self.prompt(MESSAGE_PROMPT).await? else {
                        return Ok(());
                    };
                    Command::Publish { channel, text }
                }
                Input::DirectTo(recipient) => {
                    if let Err(err) = session.check_recipient(&recipient).await {
                        self.report(err)?;
                        continue;
                    }
                    let Some(text) = self.prompt(DIRECT_MESSAGE_PROMPT).await? else {
                        return Ok(());
                    };
                    Command::DirectMessage { recipient, text }
                }
                Input::MissingArgument(argument) => {
                    self.say(render::missing_argument(argument))?;
                    continue;
                }
                Input::Unknown => {
                    self.say(&render::unknown_input(session.profile().name.as_str()))?;
                    continue;
                }
            };

            match session.execute(command).await {
                Ok(outcome) => {
                    self.say(&render::outcome(&outcome, session.profile()))?;
                    if outcome == CommandOutcome::Exit {
                        return Ok(());
                    }
                }
                Err(err) => self.report(err)?,
            }
        }
    }

    /// 可恢复错误提示给用户，不可恢复错误结束会话
    fn report(&mut self, err: ApplicationError) -> Result<(), CliError> {
        if err.is_fatal() {
            error!(error = %err, "会话无法继续");
            return Err(err.into());
        }
        self.say(&render::error(&err))?;
        Ok(())
    }
}
