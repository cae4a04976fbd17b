use std::collections::BTreeMap;

use crate::{error::TableError, schema::Table, table_service::TableService};

pub const EMAIL_ADDRESS: &str = "email_address";
pub const NOTIFY_TRANSFERS_DAYS: &str = "notify_transfers_days";
pub const NOTIFY_PERIOD_DAYS: &str = "notify_period_days";
pub const NOTIFY_PROMOTION_DAYS: &str = "notify_promotion_days";

pub const REQUIRED_KEYS: [&str; 4] = [
    EMAIL_ADDRESS,
    NOTIFY_TRANSFERS_DAYS,
    NOTIFY_PERIOD_DAYS,
    NOTIFY_PROMOTION_DAYS,
];

/// The key/value `Configuración` table, read in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn load(tables: &TableService) -> Result<Self, TableError> {
        let values = tables
            .get_all_records(Table::Config.name())?
            .into_iter()
            .map(|record| (record.display("key"), record.display("value")))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn days(&self, key: &str, default: u32) -> u32 {
        self.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    pub fn email_address(&self) -> Option<&str> {
        self.get(EMAIL_ADDRESS).filter(|v| !v.is_empty())
    }

    pub fn notify_transfers_days(&self) -> u32 {
        self.days(NOTIFY_TRANSFERS_DAYS, 3)
    }

    pub fn notify_period_days(&self) -> u32 {
        self.days(NOTIFY_PERIOD_DAYS, 2)
    }

    pub fn notify_promotion_days(&self) -> u32 {
        self.days(NOTIFY_PROMOTION_DAYS, 7)
    }

    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .into_iter()
            .filter(|key| !self.values.contains_key(*key))
            .collect()
    }
}
