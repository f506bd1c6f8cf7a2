//! 用户资料实体
//!
//! 用户资料在注册时创建一次，之后不可变更，会话期间不会删除。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Age, DisplayName, UserId, Username};

/// 存储层使用的字段映射（与 Redis 哈希一一对应）。
pub type ProfileFields = BTreeMap<String, String>;

/// 用户资料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// 全局计数器分配的唯一ID
    pub id: UserId,
    /// 名字与ID拼接而成的用户名
    pub username: Username,
    pub name: DisplayName,
    pub age: Age,
    pub gender: String,
    /// 注册时经过外部查询验证的地点
    pub location: String,
}

impl UserProfile {
    pub fn new(
        id: UserId,
        name: DisplayName,
        age: Age,
        gender: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let username = Username::derive(&name, id);
        Self {
            id,
            username,
            name,
            age,
            gender: gender.into(),
            location: location.into(),
        }
    }

    /// 转换为存储字段：`{id, name, age, gender, location}`
    pub fn to_fields(&self) -> ProfileFields {
        let mut fields = ProfileFields::new();
        fields.insert("id".to_string(), self.id.to_string());
        fields.insert("name".to_string(), self.name.to_string());
        fields.insert("age".to_string(), self.age.to_string());
        fields.insert("gender".to_string(), self.gender.clone());
        fields.insert("location".to_string(), self.location.clone());
        fields
    }

    /// 从存储字段还原用户资料
    pub fn from_fields(username: &Username, fields: &ProfileFields) -> DomainResult<Self> {
        let invalid = |message: String| DomainError::invalid_record(username.as_str(), message);
        let corrupt = |err: DomainError| invalid(err.to_string());
        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| invalid(format!("缺少字段 {name}")))
        };

        let id = field("id")?
            .parse::<u64>()
            .map(UserId::from)
            .map_err(|e| invalid(format!("id: {e}")))?;
        let name = DisplayName::parse(field("name")?.as_str()).map_err(corrupt)?;
        let age = Age::parse(field("age")?).map_err(corrupt)?;

        Ok(Self {
            id,
            username: username.clone(),
            name,
            age,
            gender: field("gender")?.clone(),
            location: field("location")?.clone(),
        })
    }
}
