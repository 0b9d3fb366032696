//! Column definition reconciliation for one table.

use std::collections::BTreeMap;

use crate::core::{display_default, normalize_default, ColumnDescriptor};

use super::types::{Aspect, AspectChange, ColumnDifference, ColumnSide, ColumnStatus};

/// Compare the column definitions of one table on both instances.
///
/// Columns are matched by name and visited in byte order of the name union.
/// A record is produced only for one-sided columns and for columns with at
/// least one differing attribute.
pub fn compare_column_sets(
    table: &str,
    columns1: &[ColumnDescriptor],
    columns2: &[ColumnDescriptor],
) -> Vec<ColumnDifference> {
    let by_name1: BTreeMap<&str, &ColumnDescriptor> =
        columns1.iter().map(|c| (c.name.as_str(), c)).collect();
    let by_name2: BTreeMap<&str, &ColumnDescriptor> =
        columns2.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut names: Vec<&str> = by_name1.keys().chain(by_name2.keys()).copied().collect();
    names.sort_unstable();
    names.dedup();

    let mut records = Vec::new();
    for name in names {
        let record = match (by_name1.get(name), by_name2.get(name)) {
            (Some(c1), None) => Some(ColumnDifference {
                table: table.to_string(),
                column: name.to_string(),
                status: ColumnStatus::OnlyInInstance1,
                instance1: ColumnSide::Present((*c1).clone()),
                instance2: ColumnSide::NotApplicable,
                changes: Vec::new(),
            }),
            (None, Some(c2)) => Some(ColumnDifference {
                table: table.to_string(),
                column: name.to_string(),
                status: ColumnStatus::OnlyInInstance2,
                instance1: ColumnSide::NotApplicable,
                instance2: ColumnSide::Present((*c2).clone()),
                changes: Vec::new(),
            }),
            (Some(c1), Some(c2)) => {
                let changes = attribute_changes(c1, c2);
                (!changes.is_empty()).then(|| ColumnDifference {
                    table: table.to_string(),
                    column: name.to_string(),
                    status: ColumnStatus::Different,
                    instance1: ColumnSide::Present((*c1).clone()),
                    instance2: ColumnSide::Present((*c2).clone()),
                    changes,
                })
            }
            (None, None) => None,
        };
        records.extend(record);
    }
    records
}

/// Differing attributes of two descriptors, in [`Aspect`] order.
pub fn attribute_changes(c1: &ColumnDescriptor, c2: &ColumnDescriptor) -> Vec<AspectChange> {
    let mut changes = Vec::new();
    let mut check = |aspect: Aspect, differs: bool, v1: String, v2: String| {
        if differs {
            changes.push(AspectChange {
                aspect,
                value1: v1,
                value2: v2,
            });
        }
    };

    check(
        Aspect::Type,
        c1.column_type != c2.column_type,
        c1.column_type.clone(),
        c2.column_type.clone(),
    );
    check(
        Aspect::Nullable,
        c1.nullable != c2.nullable,
        c1.nullable_label().to_string(),
        c2.nullable_label().to_string(),
    );
    check(Aspect::Key, c1.key != c2.key, c1.key.clone(), c2.key.clone());
    check(
        Aspect::Default,
        normalize_default(c1.default.as_deref()) != normalize_default(c2.default.as_deref()),
        display_default(c1.default.as_deref()),
        display_default(c2.default.as_deref()),
    );
    check(Aspect::Extra, c1.extra != c2.extra, c1.extra.clone(), c2.extra.clone());

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, column_type: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable,
            key: String::new(),
            default: None,
            extra: String::new(),
        }
    }

    #[test]
    fn test_identical_columns_produce_nothing() {
        let cols = vec![
            col("id", "int", false),
            col("email", "varchar(255)", true),
        ];
        assert!(compare_column_sets("users", &cols, &cols.clone()).is_empty());
    }

    #[test]
    fn test_type_and_nullability_change() {
        let c1 = vec![col("email", "varchar(255)", true)];
        let c2 = vec![col("email", "varchar(100)", false)];
        let records = compare_column_sets("users", &c1, &c2);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ColumnStatus::Different);
        assert_eq!(
            records[0].changed_aspects(),
            "Type(varchar(255) vs varchar(100)), Nullable(YES vs NO)"
        );
    }

    #[test]
    fn test_null_default_encodings_are_equal() {
        let mut c1 = col("note", "text", true);
        let mut c2 = c1.clone();
        c1.default = None;
        c2.default = Some("NULL".to_string());
        assert!(compare_column_sets("t", &[c1.clone()], &[c2]).is_empty());

        let mut c3 = c1.clone();
        c3.default = Some("null".to_string());
        assert!(compare_column_sets("t", &[c1], &[c3]).is_empty());
    }

    #[test]
    fn test_default_change_renders_null() {
        let c1 = col("status", "varchar(16)", false);
        let mut c2 = c1.clone();
        c2.default = Some("pending".to_string());

        let records = compare_column_sets("orders", &[c1], &[c2]);
        assert_eq!(records[0].changed_aspects(), "Default(NULL vs pending)");
    }

    #[test]
    fn test_aspect_order_is_fixed() {
        let c1 = ColumnDescriptor {
            name: "id".to_string(),
            column_type: "int".to_string(),
            nullable: false,
            key: "PRI".to_string(),
            default: None,
            extra: "auto_increment".to_string(),
        };
        let c2 = ColumnDescriptor {
            name: "id".to_string(),
            column_type: "bigint".to_string(),
            nullable: true,
            key: String::new(),
            default: Some("0".to_string()),
            extra: String::new(),
        };

        let records = compare_column_sets("t", &[c1], &[c2]);
        let aspects: Vec<Aspect> = records[0].changes.iter().map(|c| c.aspect).collect();
        assert_eq!(
            aspects,
            vec![Aspect::Type, Aspect::Nullable, Aspect::Key, Aspect::Default, Aspect::Extra]
        );
        assert_eq!(
            records[0].difference(),
            "Type(int vs bigint), Nullable(NO vs YES), Key(PRI vs ), Default(NULL vs 0), Extra(auto_increment vs )"
        );
    }

    #[test]
    fn test_one_sided_columns_sorted() {
        let c1 = vec![col("zeta", "int", true), col("id", "int", false)];
        let c2 = vec![col("id", "int", false), col("alpha", "int", true)];
        let records = compare_column_sets("t", &c1, &c2);

        let summary: Vec<(&str, ColumnStatus)> =
            records.iter().map(|r| (r.column.as_str(), r.status)).collect();
        assert_eq!(
            summary,
            vec![
                ("alpha", ColumnStatus::OnlyInInstance2),
                ("zeta", ColumnStatus::OnlyInInstance1),
            ]
        );
        assert_eq!(records[0].instance1, ColumnSide::NotApplicable);
        assert_eq!(records[0].difference(), "Column missing in Instance 1");
        assert_eq!(records[1].instance2.type_label(), "N/A");
    }
}
