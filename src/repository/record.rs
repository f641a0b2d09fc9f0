use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::day::Day;
use crate::domain::record::Record;
use crate::domain::summary::{
    CategoryStatistics, MonthlyRecordState, RecordCountSummary, RecordStatistics,
};
use crate::identity::IdentityStore;
use crate::network::dto::{RecordDto, RecordRequest};
use crate::network::{DonmaniApi, NetworkError};
use crate::store::records::RecordStore;

#[async_trait]
pub trait RecordRepository: Send + Sync {
    fn save(&self, record: &Record);
    fn load(&self, day: Day) -> Option<Record>;
    fn save_records(&self, records: &[Record]);
    fn load_records(&self, year: i32, month: u8) -> Option<Vec<Record>>;

    async fn post_record(&self, record: &Record) -> Result<(), NetworkError>;
    async fn get_monthly_record_list(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError>;
    async fn get_monthly_record_calendar(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError>;
    async fn get_monthly_record_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<RecordStatistics, NetworkError>;
    async fn get_monthly_category_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<CategoryStatistics, NetworkError>;
    async fn get_yearly_record_summary(&self, year: i32)
        -> Result<RecordCountSummary, NetworkError>;
}

pub struct DefaultRecordRepository {
    api: Arc<DonmaniApi>,
    identity: Arc<IdentityStore>,
    store: RecordStore,
}

impl DefaultRecordRepository {
    pub fn new(api: Arc<DonmaniApi>, identity: Arc<IdentityStore>, store: RecordStore) -> Self {
        Self {
            api,
            identity,
            store,
        }
    }

    fn user_key(&self) -> String {
        self.identity.user_key()
    }
}

#[async_trait]
impl RecordRepository for DefaultRecordRepository {
    fn save(&self, record: &Record) {
        self.store.save(record);
    }

    fn load(&self, day: Day) -> Option<Record> {
        self.store.load(day)
    }

    fn save_records(&self, records: &[Record]) {
        self.store.save_all(records);
    }

    fn load_records(&self, year: i32, month: u8) -> Option<Vec<Record>> {
        self.store.load_month(year, month)
    }

    async fn post_record(&self, record: &Record) -> Result<(), NetworkError> {
        let user_key = self.user_key();
        let body = RecordRequest {
            user_key: &user_key,
            records: vec![RecordDto::from_domain(record)],
        };
        self.api.post_record(&body).await
    }

    async fn get_monthly_record_list(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError> {
        Ok(self
            .api
            .get_monthly_record_list(&self.user_key(), year, month)
            .await?
            .into_domain())
    }

    async fn get_monthly_record_calendar(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MonthlyRecordState, NetworkError> {
        Ok(self
            .api
            .get_monthly_record_calendar(&self.user_key(), year, month)
            .await?
            .into_domain())
    }

    async fn get_monthly_record_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<RecordStatistics, NetworkError> {
        Ok(self
            .api
            .get_monthly_record_statistics(&self.user_key(), year, month)
            .await?
            .into_domain())
    }

    async fn get_monthly_category_statistics(
        &self,
        year: i32,
        month: u8,
    ) -> Result<CategoryStatistics, NetworkError> {
        Ok(self
            .api
            .get_monthly_category_statistics(&self.user_key(), year, month)
            .await?
            .into_domain())
    }

    async fn get_yearly_record_summary(
        &self,
        year: i32,
    ) -> Result<RecordCountSummary, NetworkError> {
        Ok(self
            .api
            .get_yearly_record_summary(&self.user_key(), year)
            .await?
            .into_domain())
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultRecordRepository, RecordRepository};
    use crate::domain::day::Day;
    use crate::domain::record::Record;
    use crate::identity::IdentityStore;
    use crate::network::{DonmaniApi, Gateway, NetworkError};
    use crate::store::records::RecordStore;
    use crate::store::test_support::TempStore;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repository(base_url: &str, temp: &TempStore) -> DefaultRecordRepository {
        let identity = Arc::new(IdentityStore::new(temp.root.join("identity.json")));
        identity.generate_uuid().unwrap();
        DefaultRecordRepository::new(
            Arc::new(DonmaniApi::new(Gateway::new(base_url, Duration::from_secs(2)).unwrap())),
            identity,
            RecordStore::new(temp.store.clone()),
        )
    }

    #[tokio::test]
    async fn remote_failure_leaves_local_cache_alone() {
        let temp = TempStore::new();
        let repo = repository("http://127.0.0.1:9", &temp);
        let day = Day::new(2025, 5, 1).unwrap();
        repo.save(&Record::empty(day));

        let result = repo.post_record(&Record::empty(day.next())).await;
        assert_eq!(result, Err(NetworkError::RequestFailed));
        assert!(repo.load(day).is_some());
        assert!(repo.load(day.next()).is_none());
    }

    #[tokio::test]
    async fn fetching_a_month_does_not_write_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/expenses/list/[0-9A-F-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{ "date": "2025-05-02", "contents": null }]
            })))
            .mount(&server)
            .await;

        let temp = TempStore::new();
        let repo = repository(&server.uri(), &temp);
        let state = repo.get_monthly_record_list(2025, 5).await.unwrap();
        assert_eq!(state.records.unwrap().len(), 1);
        assert_eq!(repo.load_records(2025, 5), None);
    }
}
