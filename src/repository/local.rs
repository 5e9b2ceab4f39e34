// Local repository - delegates to the on-device store; the user id is unused

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::VisitRecord;
use crate::repository::VisitHistoryRepository;
use crate::store::LocalStore;

pub struct LocalVisitHistoryRepository {
    store: Arc<LocalStore>,
}

impl LocalVisitHistoryRepository {
    pub fn new(store: Arc<LocalStore>) -> Self {
        LocalVisitHistoryRepository { store }
    }
}

#[async_trait]
impl VisitHistoryRepository for LocalVisitHistoryRepository {
    async fn load(&self, _user_id: &str) -> Result<Vec<VisitRecord>> {
        Ok(self.store.load_visit_history())
    }

    async fn save_all(&self, _user_id: &str, records: &[VisitRecord]) -> Result<Vec<VisitRecord>> {
        Ok(self.store.save_visit_history(records))
    }

    async fn append(&self, _user_id: &str, record: &VisitRecord) -> Result<Vec<VisitRecord>> {
        // New visits go to the front; the list is newest-first.
        let mut records = vec![record.clone()];
        records.extend(self.store.load_visit_history());
        Ok(self.store.save_visit_history(&records))
    }

    async fn remove(&self, _user_id: &str, record_id: &str) -> Result<Vec<VisitRecord>> {
        let records: Vec<VisitRecord> = self
            .store
            .load_visit_history()
            .into_iter()
            .filter(|record| record.id != record_id)
            .collect();
        Ok(self.store.save_visit_history(&records))
    }

    async fn clear(&self, _user_id: &str) -> Result<()> {
        self.store.clear_visit_history();
        Ok(())
    }
}
