//! MySQL/MariaDB instance reader.
//!
//! One reader wraps the connection pool of one instance and answers the
//! catalog and row queries the comparison needs. Uses SQLx for pooling and
//! async query execution; all access is read-only.

use std::time::{Duration, Instant};

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Row, ValueRef};
use tracing::{debug, info};

use crate::config::InstanceConfig;
use crate::core::{ColumnDescriptor, Instance, PrimaryKeySpec, RowSnapshot, SqlValue, TableRows};
use crate::error::{CompareError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Reader for one MySQL/MariaDB instance.
pub struct MysqlReader {
    instance: Instance,
    pool: MySqlPool,
    database: String,
}

/// Column type as needed for decoding.
struct DecodeType {
    data_type: String,
    unsigned: bool,
}

impl DecodeType {
    /// Parse a full `COLUMN_TYPE` such as `int(10) unsigned` or `varchar(64)`.
    fn from_column_type(column_type: &str) -> Self {
        let lower = column_type.to_lowercase();
        let data_type = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            unsigned: lower.contains("unsigned"),
            data_type,
        }
    }
}

fn parse_ssl_mode(mode: &str) -> MySqlSslMode {
    match mode.to_lowercase().as_str() {
        "disabled" => MySqlSslMode::Disabled,
        "required" => MySqlSslMode::Required,
        "verify_ca" => MySqlSslMode::VerifyCa,
        "verify_identity" => MySqlSslMode::VerifyIdentity,
        _ => MySqlSslMode::Preferred,
    }
}

impl MysqlReader {
    /// Connect to an instance and verify the connection.
    pub async fn new(
        instance: Instance,
        config: &InstanceConfig,
        database: &str,
        max_conns: u32,
    ) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(parse_ssl_mode(&config.ssl_mode));

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| CompareError::connection(instance, e))?;

        let reader = Self {
            instance,
            pool,
            database: database.to_string(),
        };
        reader.test_connection().await?;

        info!(
            "Connected to {}: {}:{}/{}",
            instance, config.host, config.port, database
        );

        Ok(reader)
    }

    /// Database this reader is bound to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Test the database connection.
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CompareError::connection(self.instance, e))?;
        Ok(())
    }

    /// Round-trip latency of a trivial query.
    pub async fn latency(&self) -> Result<Duration> {
        let start = Instant::now();
        self.test_connection().await?;
        Ok(start.elapsed())
    }

    /// Close the pool, waiting for connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed connection pool for {}", self.instance);
    }

    /// List base tables (and optionally views) of the database.
    pub async fn list_tables(&self, include_views: bool) -> Result<Vec<String>> {
        // CAST to CHAR to handle collation differences
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ?
              AND (TABLE_TYPE = 'BASE TABLE' OR (? AND TABLE_TYPE = 'VIEW'))
            ORDER BY TABLE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(include_views)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CompareError::metadata(self.instance, "*", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("TABLE_NAME")
                    .map_err(|e| CompareError::metadata(self.instance, "*", e))
            })
            .collect()
    }

    /// Column definitions of a table in ordinal order.
    pub async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(COLUMN_TYPE AS CHAR(1024)) AS COLUMN_TYPE,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(COLUMN_KEY AS CHAR(16)) AS COLUMN_KEY,
                CAST(COLUMN_DEFAULT AS CHAR(4096)) AS COLUMN_DEFAULT,
                CAST(EXTRA AS CHAR(255)) AS EXTRA
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CompareError::metadata(self.instance, table, e))?;

        let columns = rows
            .iter()
            .map(|row| -> std::result::Result<ColumnDescriptor, sqlx::Error> {
                Ok(ColumnDescriptor {
                    name: row.try_get("COLUMN_NAME")?,
                    column_type: row.try_get("COLUMN_TYPE")?,
                    nullable: row.try_get::<i32, _>("is_nullable")? == 1,
                    key: row.try_get("COLUMN_KEY")?,
                    default: row.try_get("COLUMN_DEFAULT")?,
                    extra: row.try_get("EXTRA")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CompareError::metadata(self.instance, table, e))?;

        if columns.is_empty() {
            return Err(CompareError::metadata(
                self.instance,
                table,
                "table has no columns or does not exist",
            ));
        }
        Ok(columns)
    }

    /// Primary key columns of a table in key order.
    pub async fn load_primary_key(&self, table: &str) -> Result<PrimaryKeySpec> {
        // CAST to CHAR to handle collation differences
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CompareError::metadata(self.instance, table, e))?;

        let columns = rows
            .iter()
            .map(|row| row.try_get::<String, _>("COLUMN_NAME"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CompareError::metadata(self.instance, table, e))?;

        Ok(PrimaryKeySpec(columns))
    }

    /// Quote a MySQL identifier.
    fn quote_ident(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Fetch every row of a table.
    pub async fn fetch_rows(&self, table: &str, primary_key: &PrimaryKeySpec) -> Result<TableRows> {
        let descriptors = self
            .load_columns(table)
            .await
            .map_err(|e| CompareError::data_fetch(self.instance, table, e))?;

        let column_list = descriptors
            .iter()
            .map(|c| Self::quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {}.{}",
            column_list,
            Self::quote_ident(&self.database),
            Self::quote_ident(table)
        );
        debug!("{}: {}", self.instance, sql);

        let rows: Vec<MySqlRow> = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CompareError::data_fetch(self.instance, table, e))?;

        let types: Vec<DecodeType> = descriptors
            .iter()
            .map(|c| DecodeType::from_column_type(&c.column_type))
            .collect();
        let columns: Vec<String> = descriptors.into_iter().map(|c| c.name).collect();

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = Self::row_to_values(row, &types).map_err(|(idx, e)| {
                CompareError::data_fetch(
                    self.instance,
                    table,
                    format!("decoding column {}: {}", columns[idx], e),
                )
            })?;
            snapshots.push(RowSnapshot::from_row(primary_key, &columns, values));
        }

        Ok(TableRows {
            columns,
            rows: snapshots,
        })
    }

    /// Convert a MySQL row to values, reporting the failing column index.
    fn row_to_values(
        row: &MySqlRow,
        types: &[DecodeType],
    ) -> std::result::Result<Vec<SqlValue>, (usize, sqlx::Error)> {
        types
            .iter()
            .enumerate()
            .map(|(i, ty)| Self::decode_value(row, i, ty).map_err(|e| (i, e)))
            .collect()
    }

    fn decode_value(
        row: &MySqlRow,
        i: usize,
        ty: &DecodeType,
    ) -> std::result::Result<SqlValue, sqlx::Error> {
        if row.try_get_raw(i)?.is_null() {
            return Ok(SqlValue::Null);
        }

        let value = match ty.data_type.as_str() {
            // Integer types
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
                if ty.unsigned {
                    SqlValue::UInt(row.try_get::<u64, _>(i)?)
                } else {
                    SqlValue::Int(row.try_get::<i64, _>(i)?)
                }
            }
            "year" => SqlValue::UInt(u64::from(row.try_get::<u16, _>(i)?)),
            "bit" => SqlValue::UInt(row.try_get::<u64, _>(i)?),

            // Floating point
            "float" => SqlValue::Float(f64::from(row.try_get::<f32, _>(i)?)),
            "double" | "real" => SqlValue::Float(row.try_get::<f64, _>(i)?),

            // Decimal
            "decimal" | "numeric" => SqlValue::Decimal(row.try_get::<rust_decimal::Decimal, _>(i)?),

            // Binary types
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
                SqlValue::Bytes(row.try_get::<Vec<u8>, _>(i)?)
            }

            // Date/Time types
            "date" | "time" | "datetime" | "timestamp" => {
                let decoded = match ty.data_type.as_str() {
                    "date" => row.try_get::<chrono::NaiveDate, _>(i).map(SqlValue::Date),
                    "time" => row.try_get::<chrono::NaiveTime, _>(i).map(SqlValue::Time),
                    _ => row
                        .try_get::<chrono::NaiveDateTime, _>(i)
                        .map(SqlValue::DateTime),
                };
                temporal_or_text(decoded, &ty.data_type, || {
                    row.try_get_unchecked::<Vec<u8>, _>(i)
                })?
            }

            // Text, enum, set, json and anything else
            _ => match row.try_get::<String, _>(i) {
                Ok(s) => SqlValue::Text(s),
                Err(_) => SqlValue::Bytes(row.try_get::<Vec<u8>, _>(i)?),
            },
        };
        Ok(value)
    }
}

/// Keep a typed temporal value, or fall back to MySQL's text form when chrono
/// cannot represent it (zero dates, TIME beyond one day or negative).
fn temporal_or_text(
    decoded: std::result::Result<SqlValue, sqlx::Error>,
    data_type: &str,
    raw: impl FnOnce() -> std::result::Result<Vec<u8>, sqlx::Error>,
) -> std::result::Result<SqlValue, sqlx::Error> {
    match decoded {
        Ok(value) => Ok(value),
        Err(e) => match temporal_text(data_type, &raw()?) {
            Some(text) => {
                debug!("{} value {} is not representable, comparing as text", data_type, text);
                Ok(SqlValue::Text(text))
            }
            None => Err(e),
        },
    }
}

/// Render a raw temporal cell the way MySQL prints it.
///
/// Binary protocol cells keep their length prefix; anything else is taken
/// as text protocol output.
fn temporal_text(data_type: &str, raw: &[u8]) -> Option<String> {
    let (&len, body) = raw.split_first()?;
    if usize::from(len) != body.len() {
        return raw
            .iter()
            .all(|b| b.is_ascii_graphic() || *b == b' ')
            .then(|| String::from_utf8_lossy(raw).into_owned());
    }

    match data_type {
        "time" => binary_time_text(body),
        "date" => binary_date_text(body).map(|(date, _)| date),
        _ => {
            let (date, rest) = binary_date_text(body)?;
            let (h, m, s, micros) = match rest {
                [] => (0, 0, 0, 0),
                [h, m, s] => (*h, *m, *s, 0),
                [h, m, s, u0, u1, u2, u3] => {
                    (*h, *m, *s, u32::from_le_bytes([*u0, *u1, *u2, *u3]))
                }
                _ => return None,
            };
            Some(format!("{} {:02}:{:02}:{:02}{}", date, h, m, s, fraction(micros)))
        }
    }
}

fn binary_date_text(body: &[u8]) -> Option<(String, &[u8])> {
    match body {
        [] => Some(("0000-00-00".to_string(), body)),
        [y0, y1, month, day, rest @ ..] => Some((
            format!("{:04}-{:02}-{:02}", u16::from_le_bytes([*y0, *y1]), month, day),
            rest,
        )),
        _ => None,
    }
}

fn binary_time_text(body: &[u8]) -> Option<String> {
    let (negative, days, h, m, s, micros) = match body {
        [] => (0, [0; 4], 0, 0, 0, 0),
        [neg, d0, d1, d2, d3, h, m, s] => (*neg, [*d0, *d1, *d2, *d3], *h, *m, *s, 0),
        [neg, d0, d1, d2, d3, h, m, s, u0, u1, u2, u3] => (
            *neg,
            [*d0, *d1, *d2, *d3],
            *h,
            *m,
            *s,
            u32::from_le_bytes([*u0, *u1, *u2, *u3]),
        ),
        _ => return None,
    };
    let hours = u64::from(u32::from_le_bytes(days)) * 24 + u64::from(h);
    Some(format!(
        "{}{:02}:{:02}:{:02}{}",
        if negative != 0 { "-" } else { "" },
        hours,
        m,
        s,
        fraction(micros)
    ))
}

fn fraction(micros: u32) -> String {
    if micros == 0 {
        String::new()
    } else {
        format!(".{:06}", micros)
    }
}
