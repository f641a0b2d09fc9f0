use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::summary::User;
use crate::identity::IdentityStore;
use crate::network::{DonmaniApi, NetworkError};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Registers (or re-identifies) the stored user key and remembers the
    /// name the server assigned.
    async fn register_user(&self) -> Result<User, NetworkError>;
    fn get_user_name(&self) -> String;
    async fn update_user_name(&self, new_user_name: &str) -> Result<User, NetworkError>;
    async fn post_update_token(&self, token: &str) -> Result<String, NetworkError>;
    async fn put_last_login(&self) -> Result<(), NetworkError>;
    async fn put_notice_status(&self) -> Result<(), NetworkError>;
    async fn get_notice_status(&self) -> Result<bool, NetworkError>;
    async fn put_reward_status(&self) -> Result<(), NetworkError>;
    async fn get_reward_status(&self) -> Result<bool, NetworkError>;
}

pub struct DefaultUserRepository {
    api: Arc<DonmaniApi>,
    identity: Arc<IdentityStore>,
}

impl DefaultUserRepository {
    pub fn new(api: Arc<DonmaniApi>, identity: Arc<IdentityStore>) -> Self {
        Self { api, identity }
    }
}

#[async_trait]
impl UserRepository for DefaultUserRepository {
    async fn register_user(&self) -> Result<User, NetworkError> {
        let user = self
            .api
            .register_user(&self.identity.user_key())
            .await?
            .into_domain();
        self.identity.set_user_name(&user.user_name);
        Ok(user)
    }

    fn get_user_name(&self) -> String {
        self.identity.user_name()
    }

    async fn update_user_name(&self, new_user_name: &str) -> Result<User, NetworkError> {
        let user = self
            .api
            .update_user_name(&self.identity.user_key(), new_user_name)
            .await?
            .into_domain();
        self.identity.set_user_name(&user.user_name);
        Ok(user)
    }

    async fn post_update_token(&self, token: &str) -> Result<String, NetworkError> {
        self.api
            .update_token(&self.identity.user_key(), token)
            .await
    }

    async fn put_last_login(&self) -> Result<(), NetworkError> {
        self.api.put_last_login(&self.identity.user_key()).await
    }

    async fn put_notice_status(&self) -> Result<(), NetworkError> {
        self.api.put_notice_status(&self.identity.user_key()).await
    }

    async fn get_notice_status(&self) -> Result<bool, NetworkError> {
        self.api.get_notice_status(&self.identity.user_key()).await
    }

    async fn put_reward_status(&self) -> Result<(), NetworkError> {
        self.api.put_reward_status(&self.identity.user_key()).await
    }

    async fn get_reward_status(&self) -> Result<bool, NetworkError> {
        self.api.get_reward_status(&self.identity.user_key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultUserRepository, UserRepository};
    use crate::identity::IdentityStore;
    use crate::network::{DonmaniApi, Gateway};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn registration_and_rename_update_stored_name() {
        let server = MockServer::start().await;
        let dir = std::env::temp_dir().join(format!("donmani-user-{}", Uuid::now_v7()));
        let identity = Arc::new(IdentityStore::new(dir.join("identity.json")));
        let key = identity.generate_uuid().unwrap();

        Mock::given(method("POST"))
            .and(path("/user/register"))
            .and(body_partial_json(serde_json::json!({ "userKey": key })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userKey": key, "userName": "고운 별", "isNew": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/user/update"))
            .and(body_partial_json(serde_json::json!({ "newUserName": "별별이" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userKey": key, "userName": "별별이"
            })))
            .mount(&server)
            .await;

        let repo = DefaultUserRepository::new(
            Arc::new(DonmaniApi::new(Gateway::new(&server.uri(), Duration::from_secs(2)).unwrap())),
            identity,
        );
        let user = repo.register_user().await.unwrap();
        assert!(user.is_new);
        assert_eq!(repo.get_user_name(), "고운 별");

        let renamed = repo.update_user_name("별별이").await.unwrap();
        assert!(!renamed.is_new);
        assert_eq!(repo.get_user_name(), "별별이");
        let _ = std::fs::remove_dir_all(dir);
    }
}
