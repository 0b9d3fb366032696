//! MySQL/MariaDB driver.
//!
//! - [`MysqlReader`]: catalog and row access for one instance
//! - [`MysqlProvider`]: both instances behind the metadata and data provider traits
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod reader;

pub use reader::MysqlReader;

use async_trait::async_trait;
use tracing::warn;

use crate::config::Config;
use crate::core::{
    ColumnDescriptor, DataProvider, Instance, MetadataProvider, PrimaryKeySpec, TableName,
    TableRows,
};
use crate::error::Result;

/// Metadata and data provider over two MySQL instances.
pub struct MysqlProvider {
    instance1: MysqlReader,
    instance2: MysqlReader,
    include_views: bool,
}

impl MysqlProvider {
    /// Connect to both instances.
    ///
    /// If instance 2 cannot be reached, the already opened pool of
    /// instance 1 is closed before the error is returned.
    pub async fn connect(config: &Config) -> Result<Self> {
        let max_conns = config.comparison.max_connections;
        let instance1 =
            MysqlReader::new(Instance::One, &config.instance1, config.database1(), max_conns)
                .await?;
        let instance2 = match MysqlReader::new(
            Instance::Two,
            &config.instance2,
            config.database2(),
            max_conns,
        )
        .await
        {
            Ok(reader) => reader,
            Err(e) => {
                instance1.close().await;
                return Err(e);
            }
        };

        Ok(Self {
            instance1,
            instance2,
            include_views: config.comparison.include_views,
        })
    }

    /// Reader for one instance.
    pub fn reader(&self, instance: Instance) -> &MysqlReader {
        match instance {
            Instance::One => &self.instance1,
            Instance::Two => &self.instance2,
        }
    }

    /// Close both pools.
    pub async fn close(&self) {
        futures::join!(self.instance1.close(), self.instance2.close());
    }
}

#[async_trait]
impl MetadataProvider for MysqlProvider {
    async fn list_tables(&self, instance: Instance) -> Result<Vec<TableName>> {
        let tables = self.reader(instance).list_tables(self.include_views).await?;
        if tables.is_empty() {
            warn!(
                "No tables found in database {} on {}",
                self.reader(instance).database(),
                instance
            );
        }
        Ok(tables)
    }

    async fn get_columns(&self, instance: Instance, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.reader(instance).load_columns(table).await
    }

    async fn get_primary_key(&self, instance: Instance, table: &str) -> Result<PrimaryKeySpec> {
        self.reader(instance).load_primary_key(table).await
    }
}

#[async_trait]
impl DataProvider for MysqlProvider {
    async fn fetch_all_rows(
        &self,
        instance: Instance,
        table: &str,
        primary_key: &PrimaryKeySpec,
    ) -> Result<TableRows> {
        self.reader(instance).fetch_rows(table, primary_key).await
    }
}
