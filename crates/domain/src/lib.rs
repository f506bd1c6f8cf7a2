//! 聊天机器人核心领域模型
//!
//! 包含用户资料、主题命名空间、消息信封等核心类型，以及相关的校验规则。

pub mod command;
pub mod envelope;
pub mod errors;
pub mod profile;
pub mod topic;
pub mod value_objects;

// 重新导出常用类型
pub use command::*;
pub use envelope::*;
pub use errors::*;
pub use profile::*;
pub use topic::*;
pub use value_objects::*;
