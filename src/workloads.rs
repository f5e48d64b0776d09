//! Stock household-registry query pairs: each label carries one SQL text for
//! the relational side and one aggregation pipeline for the document side,
//! written to produce structurally comparable work.
//!
//! Relational schema: `household_member` rows joined through
//! `member_address` to `address`, with the household head denormalized on
//! `household`. Document schema: one member document embedding its
//! `addresses` array and `household` subdocument.

use crate::backend::Operation;
use crate::harness::Workload;
use mongodb::bson::doc;

/// Natural key used for the point-lookup pair.
pub const SAMPLE_EXTERNAL_ID: &str = "08637940265423";

const DISTRICT_PATTERN: &str = "District 4";

pub fn registry_queries() -> Vec<Workload> {
    vec![
        find_by_external_id(),
        district_filter(),
        multiple_addresses(),
        residency_by_demographics(),
        complex_household(),
    ]
}

fn find_by_external_id() -> Workload {
    Workload::new(
        "find by external id",
        Operation::read_sql(format!(
            "SELECT * FROM household_member WHERE external_id = '{SAMPLE_EXTERNAL_ID}'"
        )),
        Operation::read_pipeline(vec![doc! {
            "$match": { "external_id": SAMPLE_EXTERNAL_ID }
        }]),
    )
}

fn district_filter() -> Workload {
    Workload::new(
        "district filter",
        Operation::read_sql(format!(
            "SELECT m.full_name, m.gender, m.birth_date, a.name AS address_name, h.head_name \
             FROM household_member m \
             JOIN member_address ma ON m.external_id = ma.member_external_id \
             JOIN address a ON ma.address_id = a.id \
             JOIN household h ON m.household_id = h.id \
             WHERE m.deceased = FALSE \
             AND a.name LIKE '%{DISTRICT_PATTERN}%' \
             ORDER BY m.full_name"
        )),
        Operation::read_pipeline(vec![
            doc! { "$match": {
                "deceased": false,
                "addresses.name": { "$regex": DISTRICT_PATTERN, "$options": "i" }
            }},
            doc! { "$project": {
                "_id": 0,
                "full_name": 1,
                "gender": 1,
                "birth_date": 1,
                "head_name": "$household.head_name",
                "addresses": { "$filter": {
                    "input": "$addresses",
                    "as": "addr",
                    "cond": { "$regexMatch": {
                        "input": "$$addr.name",
                        "regex": DISTRICT_PATTERN,
                        "options": "i"
                    }}
                }}
            }},
            doc! { "$sort": { "full_name": 1 } },
        ]),
    )
}

fn multiple_addresses() -> Workload {
    Workload::new(
        "multiple addresses",
        Operation::read_sql(
            "SELECT m.external_id, m.full_name, COUNT(ma.address_id) AS address_count \
             FROM household_member m \
             JOIN member_address ma ON m.external_id = ma.member_external_id \
             WHERE m.deceased = FALSE \
             GROUP BY m.external_id, m.full_name \
             HAVING COUNT(ma.address_id) > 1",
        ),
        Operation::read_pipeline(vec![doc! { "$match": {
            "deceased": false,
            "$expr": { "$gt": [ { "$size": "$addresses" }, 1 ] }
        }}]),
    )
}

/// Members who lived at more than two addresses for more than five years
/// total, counted per ethnicity and gender and ordered by total residency.
fn residency_by_demographics() -> Workload {
    Workload::new(
        "residency by demographics",
        Operation::read_sql(
            "SELECT gender, ethnicity, COUNT(*) AS members, SUM(total_days) AS total_days \
             FROM ( \
                 SELECT m.external_id, m.gender, m.ethnicity, \
                        COUNT(DISTINCT ma.address_id) AS address_count, \
                        SUM(DATEDIFF(IFNULL(ma.to_date, CURDATE()), ma.from_date)) AS total_days \
                 FROM household_member m \
                 JOIN member_address ma ON m.external_id = ma.member_external_id \
                 GROUP BY m.external_id, m.gender, m.ethnicity \
                 HAVING COUNT(DISTINCT ma.address_id) > 2 \
                    AND SUM(DATEDIFF(IFNULL(ma.to_date, CURDATE()), ma.from_date)) > 365 * 5 \
             ) per_member \
             GROUP BY gender, ethnicity \
             ORDER BY total_days DESC",
        ),
        Operation::read_pipeline(vec![
            doc! { "$unwind": "$addresses" },
            doc! { "$addFields": {
                "days_resident": { "$divide": [
                    { "$subtract": [
                        { "$ifNull": [ { "$toDate": "$addresses.to_date" }, "$$NOW" ] },
                        { "$toDate": "$addresses.from_date" }
                    ]},
                    // Milliseconds to days.
                    1000 * 60 * 60 * 24
                ]}
            }},
            doc! { "$group": {
                "_id": "$external_id",
                "gender": { "$first": "$gender" },
                "ethnicity": { "$first": "$ethnicity" },
                "total_days": { "$sum": "$days_resident" },
                "address_ids": { "$addToSet": "$addresses.id" }
            }},
            doc! { "$match": {
                "$expr": { "$gt": [ { "$size": "$address_ids" }, 2 ] },
                "total_days": { "$gt": 365 * 5 }
            }},
            doc! { "$group": {
                "_id": { "gender": "$gender", "ethnicity": "$ethnicity" },
                "members": { "$sum": 1 },
                "total_days": { "$sum": "$total_days" }
            }},
            doc! { "$sort": { "total_days": -1 } },
        ]),
    )
}

/// Household heads with more than three living members, where some member
/// moved through more than three addresses and stayed at one for more than
/// three years.
fn complex_household() -> Workload {
    Workload::new(
        "complex household",
        Operation::read_sql(
            "SELECT h.head_external_id, h.head_name, \
                    COUNT(DISTINCT m.external_id) AS member_count, \
                    MAX(addr_stats.address_count) AS max_addresses_per_member, \
                    MAX(addr_stats.max_days_resident) AS max_days_resident \
             FROM household h \
             JOIN household_member m ON m.household_id = h.id \
             JOIN ( \
                 SELECT ma.member_external_id, \
                        COUNT(*) AS address_count, \
                        MAX(DATEDIFF(COALESCE(ma.to_date, CURDATE()), ma.from_date)) AS max_days_resident \
                 FROM member_address ma \
                 GROUP BY ma.member_external_id \
             ) addr_stats ON addr_stats.member_external_id = m.external_id \
             WHERE m.deceased = FALSE \
             GROUP BY h.head_external_id, h.head_name \
             HAVING member_count > 3 \
                AND max_addresses_per_member > 3 \
                AND max_days_resident > 365 * 3 \
             ORDER BY member_count DESC",
        ),
        Operation::read_pipeline(vec![
            doc! { "$match": { "household.relationship": { "$ne": "head" } } },
            doc! { "$unwind": "$addresses" },
            doc! { "$addFields": {
                "days_resident": { "$divide": [
                    { "$subtract": [
                        { "$ifNull": [ { "$toDate": "$addresses.to_date" }, "$$NOW" ] },
                        { "$toDate": "$addresses.from_date" }
                    ]},
                    1000 * 60 * 60 * 24
                ]}
            }},
            doc! { "$group": {
                "_id": "$external_id",
                "head_external_id": { "$first": "$household.head_external_id" },
                "head_name": { "$first": "$household.head_name" },
                "address_ids": { "$addToSet": "$addresses.id" },
                "max_days_resident": { "$max": "$days_resident" }
            }},
            doc! { "$match": {
                "$expr": { "$gt": [ { "$size": "$address_ids" }, 3 ] },
                "max_days_resident": { "$gt": 365 * 3 }
            }},
            doc! { "$group": {
                "_id": "$head_external_id",
                "head_name": { "$first": "$head_name" },
                "member_count": { "$sum": 1 },
                "max_addresses_per_member": { "$max": { "$size": "$address_ids" } },
                "max_days_resident": { "$max": "$max_days_resident" }
            }},
            doc! { "$match": { "member_count": { "$gt": 3 } } },
            doc! { "$sort": { "member_count": -1 } },
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{OperationKind, QueryPayload};
    use std::collections::HashSet;

    #[test]
    fn catalog_pairs_sql_with_pipelines() {
        let workloads = registry_queries();
        assert_eq!(workloads.len(), 5);

        let labels: HashSet<&str> = workloads.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels.len(), workloads.len());
        assert!(labels.contains("complex household"));

        for workload in &workloads {
            assert_eq!(workload.relational.kind, OperationKind::Read);
            assert_eq!(workload.document.kind, OperationKind::Read);
            assert!(matches!(workload.relational.payload, QueryPayload::Sql(_)));
            assert!(matches!(
                workload.document.payload,
                QueryPayload::Pipeline(_)
            ));
        }
    }

    #[test]
    fn demographics_pair_groups_by_gender_and_ethnicity() {
        let workload = residency_by_demographics();

        let QueryPayload::Sql(sql) = &workload.relational.payload else {
            panic!("relational side must carry SQL");
        };
        assert!(sql.contains("GROUP BY gender, ethnicity"));

        let QueryPayload::Pipeline(stages) = &workload.document.payload else {
            panic!("document side must carry a pipeline");
        };
        let final_group = stages
            .iter()
            .rev()
            .find_map(|stage| stage.get_document("$group").ok())
            .unwrap();
        let id = final_group.get_document("_id").unwrap();
        assert!(id.contains_key("gender"));
        assert!(id.contains_key("ethnicity"));
    }
}
