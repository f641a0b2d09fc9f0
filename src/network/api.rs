use reqwest::Method;

use super::dto::{
    AppVersionResponse, CategoryStatisticsResponse, FeedbackCardResponse, FeedbackStateResponse,
    MonthlyRecordResponse, NoticeStatusResponse, NotOpenedCountResponse, RecordRequest,
    RecordStatisticsResponse, RewardDto, RewardSaveRequest, RewardStatusResponse, TokenResponse,
    UpdateTokenRequest, UpdateUserNameRequest, UserKeyRequest, UserResponse,
    YearlySummaryResponse,
};
use super::{Gateway, NetworkError};

/// Every server path in one place. Paths that address a user take the user
/// key as the trailing segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiPath {
    RegisterUser,
    UpdateUser,
    UpdateToken,
    LastLogin,
    NoticeStatus,
    RewardStatus,
    Record,
    RecordList,
    RecordCalendar,
    RecordStatistics,
    CategoryStatistics,
    YearlySummary,
    UserRewards,
    NotOpenedRewardCount,
    MonthlyRewards,
    HiddenRead,
    OpenReward,
    SaveReward,
    FeedbackState,
    FeedbackCard,
    AppVersion,
}

impl ApiPath {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiPath::RegisterUser => "user/register",
            ApiPath::UpdateUser => "user/update",
            ApiPath::UpdateToken => "user/fcm",
            ApiPath::LastLogin => "user/last-login",
            ApiPath::NoticeStatus => "notice/status",
            ApiPath::RewardStatus => "reward/status",
            ApiPath::Record => "expenses",
            ApiPath::RecordList => "expenses/list",
            ApiPath::RecordCalendar => "expenses/calendar",
            ApiPath::RecordStatistics => "expenses/statistics",
            ApiPath::CategoryStatistics => "expenses/category-statistics",
            ApiPath::YearlySummary => "expenses/summary",
            ApiPath::UserRewards => "reward",
            ApiPath::NotOpenedRewardCount => "reward/not-open",
            ApiPath::MonthlyRewards => "reward/monthly",
            ApiPath::HiddenRead => "reward/hidden",
            ApiPath::OpenReward => "reward/open",
            ApiPath::SaveReward => "reward/save",
            ApiPath::FeedbackState => "feedback",
            ApiPath::FeedbackCard => "feedback/card",
            ApiPath::AppVersion => "app-version",
        }
    }
}

fn month_query(year: i32, month: u8) -> [(&'static str, String); 2] {
    [("year", year.to_string()), ("month", month.to_string())]
}

/// Typed endpoints over the gateway. Wire DTOs come back unconverted; the
/// repositories own the mapping into domain values.
#[derive(Clone)]
pub struct DonmaniApi {
    gateway: Gateway,
}

impl DonmaniApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // user

    pub async fn register_user(&self, user_key: &str) -> Result<UserResponse, NetworkError> {
        let url = self.gateway.url(&[ApiPath::RegisterUser.as_str()], &[])?;
        self.gateway
            .send(Method::POST, url, &UserKeyRequest { user_key })
            .await
    }

    pub async fn update_user_name(
        &self,
        user_key: &str,
        new_user_name: &str,
    ) -> Result<UserResponse, NetworkError> {
        let url = self.gateway.url(&[ApiPath::UpdateUser.as_str()], &[])?;
        self.gateway
            .send(
                Method::POST,
                url,
                &UpdateUserNameRequest {
                    user_key,
                    new_user_name,
                },
            )
            .await
    }

    pub async fn update_token(&self, user_key: &str, token: &str) -> Result<String, NetworkError> {
        let url = self.gateway.url(&[ApiPath::UpdateToken.as_str()], &[])?;
        let response: TokenResponse = self
            .gateway
            .send(Method::POST, url, &UpdateTokenRequest { user_key, token })
            .await?;
        Ok(response.token)
    }

    pub async fn put_last_login(&self, user_key: &str) -> Result<(), NetworkError> {
        let url = self.gateway.url(&[ApiPath::LastLogin.as_str(), user_key], &[])?;
        self.gateway.send_empty::<()>(Method::PUT, url, None).await
    }

    pub async fn get_notice_status(&self, user_key: &str) -> Result<bool, NetworkError> {
        let url = self.gateway.url(&[ApiPath::NoticeStatus.as_str(), user_key], &[])?;
        let response: NoticeStatusResponse = self.gateway.get(url).await?;
        Ok(response.read)
    }

    pub async fn put_notice_status(&self, user_key: &str) -> Result<(), NetworkError> {
        let url = self.gateway.url(&[ApiPath::NoticeStatus.as_str(), user_key], &[])?;
        self.gateway.send_empty::<()>(Method::PUT, url, None).await
    }

    pub async fn get_reward_status(&self, user_key: &str) -> Result<bool, NetworkError> {
        let url = self.gateway.url(&[ApiPath::RewardStatus.as_str(), user_key], &[])?;
        let response: RewardStatusResponse = self.gateway.get(url).await?;
        Ok(response.checked)
    }

    pub async fn put_reward_status(&self, user_key: &str) -> Result<(), NetworkError> {
        let url = self.gateway.url(&[ApiPath::RewardStatus.as_str(), user_key], &[])?;
        self.gateway.send_empty::<()>(Method::PUT, url, None).await
    }

    // records

    pub async fn post_record(&self, body: &RecordRequest<'_>) -> Result<(), NetworkError> {
        let url = self.gateway.url(&[ApiPath::Record.as_str()], &[])?;
        self.gateway.send_empty(Method::POST, url, Some(body)).await
    }

    pub async fn get_monthly_record_list(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordResponse, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::RecordList.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.get(url).await
    }

    pub async fn get_monthly_record_calendar(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordResponse, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::RecordCalendar.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.get(url).await
    }

    pub async fn get_monthly_record_statistics(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<RecordStatisticsResponse, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::RecordStatistics.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.get(url).await
    }

    pub async fn get_monthly_category_statistics(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<CategoryStatisticsResponse, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::CategoryStatistics.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.get(url).await
    }

    pub async fn get_yearly_record_summary(
        &self,
        user_key: &str,
        year: i32,
    ) -> Result<YearlySummaryResponse, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::YearlySummary.as_str(), user_key],
            &[("year", year.to_string())],
        )?;
        self.gateway.get(url).await
    }

    // rewards

    pub async fn get_user_rewards(&self, user_key: &str) -> Result<Vec<RewardDto>, NetworkError> {
        let url = self.gateway.url(&[ApiPath::UserRewards.as_str(), user_key], &[])?;
        self.gateway.get(url).await
    }

    pub async fn get_not_opened_reward_count(&self, user_key: &str) -> Result<i64, NetworkError> {
        let url = self
            .gateway
            .url(&[ApiPath::NotOpenedRewardCount.as_str(), user_key], &[])?;
        let response: NotOpenedCountResponse = self.gateway.get(url).await?;
        Ok(response.count)
    }

    pub async fn get_monthly_rewards(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<Vec<RewardDto>, NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::MonthlyRewards.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.get(url).await
    }

    pub async fn put_hidden_read(
        &self,
        user_key: &str,
        year: i32,
        month: u8,
    ) -> Result<(), NetworkError> {
        let url = self.gateway.url(
            &[ApiPath::HiddenRead.as_str(), user_key],
            &month_query(year, month),
        )?;
        self.gateway.send_empty::<()>(Method::PUT, url, None).await
    }

    pub async fn put_open_reward(&self, user_key: &str) -> Result<Vec<RewardDto>, NetworkError> {
        let url = self.gateway.url(&[ApiPath::OpenReward.as_str(), user_key], &[])?;
        self.gateway
            .send(Method::PUT, url, &UserKeyRequest { user_key })
            .await
    }

    pub async fn put_save_reward(&self, body: &RewardSaveRequest<'_>) -> Result<(), NetworkError> {
        let url = self.gateway.url(&[ApiPath::SaveReward.as_str()], &[])?;
        self.gateway.send_empty(Method::PUT, url, Some(body)).await
    }

    // feedback and version

    pub async fn get_feedback_state(
        &self,
        user_key: &str,
    ) -> Result<FeedbackStateResponse, NetworkError> {
        let url = self.gateway.url(&[ApiPath::FeedbackState.as_str(), user_key], &[])?;
        self.gateway.get(url).await
    }

    pub async fn get_feedback_card(
        &self,
        user_key: &str,
    ) -> Result<FeedbackCardResponse, NetworkError> {
        let url = self.gateway.url(&[ApiPath::FeedbackCard.as_str(), user_key], &[])?;
        self.gateway.get(url).await
    }

    pub async fn get_app_version(&self) -> Result<AppVersionResponse, NetworkError> {
        let url = self.gateway.url(&[ApiPath::AppVersion.as_str()], &[])?;
        self.gateway.get(url).await
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.gateway.download(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiPath, DonmaniApi};
    use crate::network::dto::{RecordDto, RecordRequest, RewardSaveRequest};
    use crate::network::{Gateway, NetworkError};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> DonmaniApi {
        DonmaniApi::new(Gateway::new(&server.uri(), Duration::from_secs(2)).unwrap())
    }

    #[test]
    fn user_scoped_paths_are_distinct() {
        let all = [
            ApiPath::RecordList,
            ApiPath::RecordCalendar,
            ApiPath::RecordStatistics,
            ApiPath::CategoryStatistics,
            ApiPath::YearlySummary,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[tokio::test]
    async fn monthly_list_passes_user_key_and_month() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/expenses/list/KEY-1"))
            .and(query_param("year", "2025"))
            .and(query_param("month", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{ "date": "2025-05-01", "contents": null }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server)
            .get_monthly_record_list("KEY-1", 2025, 5)
            .await
            .unwrap();
        assert_eq!(response.records.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn post_record_sends_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/expenses"))
            .and(body_json(serde_json::json!({
                "userKey": "KEY-1",
                "records": [{ "date": "2025-05-01", "contents": null }]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let body = RecordRequest {
            user_key: "KEY-1",
            records: vec![RecordDto {
                date: "2025-05-01".into(),
                contents: None,
            }],
        };
        api(&server).post_record(&body).await.unwrap();
    }

    #[tokio::test]
    async fn save_reward_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/reward/save"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let body = RewardSaveRequest {
            user_key: "KEY-1",
            year: 2025,
            month: 5,
            background_id: 1,
            effect_id: 2,
            decoration_id: 3,
            byeoltong_case_id: 24,
        };
        assert_eq!(
            api(&server).put_save_reward(&body).await,
            Err(NetworkError::ServerError { status_code: 500 })
        );
    }

    #[tokio::test]
    async fn not_opened_count_and_status_flags_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reward/not-open/KEY-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "count": 3 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notice/status/KEY-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "read": true })))
            .mount(&server)
            .await;

        let api = api(&server);
        assert_eq!(api.get_not_opened_reward_count("KEY-1").await.unwrap(), 3);
        assert!(api.get_notice_status("KEY-1").await.unwrap());
    }
}
