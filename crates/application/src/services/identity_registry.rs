use std::sync::Arc;

use domain::{Age, DisplayName, DomainError, UserId, UserProfile, Username};

use crate::{
    error::ApplicationError,
    lookup::{LocationLookup, WeatherReport},
    repository::ProfileStore,
};

/// 经过外部查询确认存在的地点
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLocation {
    pub name: String,
    pub weather: WeatherReport,
}

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub name: DisplayName,
    pub age: Age,
    pub gender: String,
    pub location: VerifiedLocation,
}

pub struct IdentityRegistryDependencies {
    pub profile_store: Arc<dyn ProfileStore>,
    pub location_lookup: Arc<dyn LocationLookup>,
}

/// 身份注册中心：分配唯一ID并保存用户资料
pub struct IdentityRegistry {
    deps: IdentityRegistryDependencies,
}

impl IdentityRegistry {
    pub fn new(deps: IdentityRegistryDependencies) -> Self {
        Self { deps }
    }

    /// 通过外部查询确认地点。失败属于校验错误，调用方应重新询问用户。
    pub async fn verify_location(
        &self,
        location: &str,
    ) -> Result<VerifiedLocation, ApplicationError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(DomainError::validation_error("location", "cannot be empty").into());
        }

        match self.deps.location_lookup.lookup(location).await {
            Ok(weather) => Ok(VerifiedLocation {
                name: location.to_string(),
                weather,
            }),
            Err(err) => {
                tracing::debug!(location, reason = %err, "地点查询失败");
                Err(DomainError::validation_error("location", err.reason).into())
            }
        }
    }

    /// 注册新用户。ID 由存储层原子递增分配，并发注册不会得到相同的ID。
    pub async fn register(
        &self,
        request: RegisterUserRequest,
    ) -> Result<UserProfile, ApplicationError> {
        let gender = request.gender.trim();
        if gender.is_empty() {
            return Err(DomainError::validation_error("gender", "cannot be empty").into());
        }

        let id = UserId::from(self.deps.profile_store.next_id().await?);
        let location = request.location.name;
        let profile = UserProfile::new(id, request.name, request.age, gender, location);

        self.deps
            .profile_store
            .put_profile(profile.username.as_str(), &profile.to_fields())
            .await?;

        tracing::info!(
            user_id = %profile.id,
            username = %profile.username,
            "用户注册成功"
        );

        Ok(profile)
    }

    pub async fn find_profile(
        &self,
        username: &Username,
    ) -> Result<Option<UserProfile>, ApplicationError> {
        let key = username.as_str();
        let Some(fields) = self.deps.profile_store.get_profile(key).await? else {
            return Ok(None);
        };
        Ok(Some(UserProfile::from_fields(username, &fields)?))
    }
}
