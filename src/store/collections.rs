use futures::try_join;
use tracing::debug;

use crate::backend::{fetch_all, Record, RemoteStore};
use crate::dataset;
use crate::error::Result;
use crate::model::{App, Contact, Deal, Task};

/// The four entity collections, each in listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    pub apps: Vec<App>,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<Task>,
}

impl Collections {
    /// The static dataset.
    pub fn mock() -> Self {
        Self {
            apps: dataset::apps(),
            contacts: dataset::contacts(),
            deals: dataset::deals(),
            tasks: dataset::tasks(),
        }
    }

    /// Fetch all four tables concurrently. The first failure fails the load.
    pub async fn fetch(remote: &dyn RemoteStore) -> Result<Self> {
        let (apps, contacts, deals, tasks) = try_join!(
            fetch_all::<App>(remote),
            fetch_all::<Contact>(remote),
            fetch_all::<Deal>(remote),
            fetch_all::<Task>(remote),
        )?;
        debug!(
            "Fetched {} apps, {} contacts, {} deals, {} tasks",
            apps.len(),
            contacts.len(),
            deals.len(),
            tasks.len()
        );
        Ok(Self {
            apps,
            contacts,
            deals,
            tasks,
        })
    }
}

/// A record type with a home in [`Collections`].
pub(crate) trait Collected: Record {
    fn items(data: &Collections) -> &Vec<Self>;
    fn items_mut(data: &mut Collections) -> &mut Vec<Self>;
}

impl Collected for App {
    fn items(data: &Collections) -> &Vec<Self> {
        &data.apps
    }
    fn items_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.apps
    }
}

impl Collected for Contact {
    fn items(data: &Collections) -> &Vec<Self> {
        &data.contacts
    }
    fn items_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.contacts
    }
}

impl Collected for Deal {
    fn items(data: &Collections) -> &Vec<Self> {
        &data.deals
    }
    fn items_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.deals
    }
}

impl Collected for Task {
    fn items(data: &Collections) -> &Vec<Self> {
        &data.tasks
    }
    fn items_mut(data: &mut Collections) -> &mut Vec<Self> {
        &mut data.tasks
    }
}

/// `<prefix>_<millis>`, bumping the millisecond part until the id is unused.
pub(crate) fn mock_id<T: Record>(existing: &[T], now_millis: i64) -> String {
    let mut millis = now_millis;
    loop {
        let id = format!("{}_{millis}", T::ID_PREFIX);
        if !existing.iter().any(|r| r.id() == id) {
            return id;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRemoteStore;

    #[test]
    fn test_mock_id_format() {
        let apps = dataset::apps();
        assert_eq!(mock_id(&apps, 1_700_000_000_000), "app_1700000000000");
    }

    #[test]
    fn test_mock_id_bumps_on_collision() {
        let mut tasks = dataset::tasks();
        tasks[0].id = "task_500".into();
        tasks[1].id = "task_501".into();
        assert_eq!(mock_id(&tasks, 500), "task_502");
    }

    #[tokio::test]
    async fn test_fetch_orders_each_table() {
        let remote = MockRemoteStore::new().with_dataset();
        let data = Collections::fetch(&remote).await.unwrap();

        assert_eq!(data.apps.len(), 3);
        assert_eq!(data.apps[0].id, "app_3");
        assert_eq!(data.deals[0].id, "deal_6");
        assert_eq!(data.tasks[0].id, "task_4");
        assert_eq!(remote.call_count(), 4);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_any_table_fails() {
        let remote = MockRemoteStore::new()
            .with_dataset()
            .with_failing_table(crate::backend::Table::Tasks, "timeout");
        assert!(Collections::fetch(&remote).await.is_err());
    }
}
