//! Property-based tests for SELECT rendering and table naming
//!
//! These tests verify that:
//! - WHERE predicates render in call order with positionally named parameters
//! - Rendering is deterministic and `select()` discards earlier clauses
//! - LIMIT/OFFSET appear only for positive values
//! - Derived table names follow the snake_case + plural suffix rules

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use rowkeep::model::naming::{default_table_name, pluralize, snake_case};
    use rowkeep::{Connection, ConnectionConfig, Direction, Operator, Params, Value};

    // Test infrastructure

    fn arb_column_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}".prop_map(|s: String| s)
    }

    fn arb_operator() -> impl Strategy<Value = Operator> {
        prop_oneof![
            Just(Operator::Eq),
            Just(Operator::NotEq),
            Just(Operator::LtGt),
            Just(Operator::Lt),
            Just(Operator::Lte),
            Just(Operator::Gt),
            Just(Operator::Gte),
            Just(Operator::Like),
            Just(Operator::NotLike),
            Just(Operator::Is),
            Just(Operator::IsNot),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            "[ -~]{0,20}".prop_map(Value::Text),
        ]
    }

    fn arb_predicate() -> impl Strategy<Value = (String, Operator, Value, bool)> {
        (arb_column_name(), arb_operator(), arb_value(), any::<bool>())
    }

    /// Capitalized ASCII word such as `Post` or `Category`.
    fn arb_segment() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,8}".prop_map(|s: String| s)
    }

    fn connection() -> Connection {
        Connection::new(ConnectionConfig::in_memory())
    }

    proptest! {
        #[test]
        fn prop_predicates_render_in_call_order(
            predicates in prop::collection::vec(arb_predicate(), 1..8)
        ) {
            let db = connection();
            let mut builder = db.table("t");
            for (column, operator, value, use_or) in &predicates {
                builder = if *use_or {
                    builder.or_where(column.as_str(), *operator, value.clone())
                } else {
                    builder.and_where(column.as_str(), *operator, value.clone())
                };
            }
            let (sql, params) = builder.to_sql().unwrap();

            let mut cursor = 0;
            for (index, (column, operator, _, _)) in predicates.iter().enumerate() {
                let fragment = format!("{} {} :param_{}", column, operator, index);
                let found = sql[cursor..].find(&fragment);
                prop_assert!(found.is_some(), "missing `{}` in `{}`", fragment, sql);
                cursor += found.unwrap_or_default() + fragment.len();
            }

            match params {
                Params::Named(row) => {
                    prop_assert_eq!(row.len(), predicates.len());
                    for (index, ((key, value), (_, _, expected, _))) in
                        row.iter().zip(&predicates).enumerate()
                    {
                        prop_assert_eq!(key, &format!("param_{}", index));
                        prop_assert_eq!(value, expected);
                    }
                }
                other => prop_assert!(false, "expected named params, got {:?}", other),
            }
        }

        #[test]
        fn prop_first_connective_is_never_rendered(
            predicate in arb_predicate()
        ) {
            let (column, operator, value, _) = predicate;
            let db = connection();
            let (sql, _) = db
                .table("t")
                .or_where(column.as_str(), operator, value)
                .to_sql()
                .unwrap();

            prop_assert_eq!(sql, format!("SELECT * FROM t WHERE {} {} :param_0", column, operator));
        }

        #[test]
        fn prop_rendering_is_deterministic(
            predicates in prop::collection::vec(arb_predicate(), 0..6),
            limit in 0u64..100,
            offset in 0u64..100
        ) {
            let db = connection();
            let mut builder = db.table("t").order_by("id", Direction::Desc).limit(limit).offset(offset);
            for (column, operator, value, _) in predicates {
                builder = builder.and_where(column, operator, value);
            }

            prop_assert_eq!(builder.to_sql().unwrap(), builder.to_sql().unwrap());
        }

        #[test]
        fn prop_select_discards_previous_clauses(
            predicates in prop::collection::vec(arb_predicate(), 0..6),
            limit in 0u64..100
        ) {
            let db = connection();
            let mut builder = db.table("t");
            for (column, operator, value, _) in predicates {
                builder = builder.and_where(column, operator, value);
            }
            let (sql, params) = builder
                .order_by_asc("id")
                .limit(limit)
                .select(["id", "title"])
                .from("articles")
                .to_sql()
                .unwrap();

            prop_assert_eq!(sql, "SELECT id, title FROM articles");
            prop_assert!(params.is_empty());
        }

        #[test]
        fn prop_limit_and_offset_only_when_positive(
            limit in 0u64..1000,
            offset in 0u64..1000
        ) {
            let db = connection();
            let (sql, _) = db.table("t").limit(limit).offset(offset).to_sql().unwrap();

            prop_assert_eq!(sql.contains(" LIMIT "), limit > 0);
            prop_assert_eq!(sql.contains(" OFFSET "), offset > 0);
            if limit > 0 {
                let expected_limit = format!(" LIMIT {}", limit);
                prop_assert!(sql.contains(&expected_limit));
            }
        }

        #[test]
        fn prop_snake_case_joins_words(
            segments in prop::collection::vec(arb_segment(), 1..5)
        ) {
            let camel: String = segments.concat();
            let expected = segments
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join("_");

            prop_assert_eq!(snake_case(&camel), expected);
        }

        #[test]
        fn prop_plural_keeps_stem(word in "[a-z]{1,12}") {
            let plural = pluralize(&word);

            if let Some(stem) = word.strip_suffix('y') {
                prop_assert_eq!(plural, format!("{}ies", stem));
            } else {
                prop_assert!(plural.starts_with(&word));
                prop_assert!(plural.ends_with('s'));
                prop_assert!(plural.len() == word.len() + 1 || plural.len() == word.len() + 2);
            }
        }

        #[test]
        fn prop_table_name_ignores_module_path(
            modules in prop::collection::vec("[a-z_]{1,8}", 0..4),
            segment in arb_segment()
        ) {
            let mut path = modules.join("::");
            if !path.is_empty() {
                path.push_str("::");
            }
            path.push_str(&segment);

            prop_assert_eq!(default_table_name(&path), default_table_name(&segment));
        }
    }

    // Rendered statements for the documented builder scenarios

    #[test]
    fn snapshot_article_listing() {
        let db = connection();
        let (sql, _) = db
            .select(["id", "title"])
            .from("articles")
            .and_where("status", Operator::Eq, "published")
            .order_by("created_at", Direction::Desc)
            .limit(10)
            .to_sql()
            .unwrap();

        insta::assert_snapshot!(
            sql,
            @"SELECT id, title FROM articles WHERE status = :param_0 ORDER BY created_at DESC LIMIT 10"
        );
    }

    #[test]
    fn snapshot_mixed_connectives() {
        let db = connection();
        let (sql, _) = db
            .table("articles")
            .and_where("status", Operator::Eq, "draft")
            .or_where("author_id", Operator::Gte, 2)
            .and_where("title", Operator::NotLike, "%test%")
            .order_by_asc("id")
            .limit(5)
            .offset(15)
            .to_sql()
            .unwrap();

        insta::assert_snapshot!(
            sql,
            @"SELECT * FROM articles WHERE status = :param_0 OR author_id >= :param_1 AND title NOT LIKE :param_2 ORDER BY id ASC LIMIT 5 OFFSET 15"
        );
    }

    #[test]
    fn snapshot_hostile_value_stays_a_parameter() {
        let db = connection();
        let (sql, params) = db
            .table("users")
            .and_where("name", Operator::Eq, "x'; DROP TABLE users; --")
            .to_sql()
            .unwrap();

        insta::assert_snapshot!(sql, @"SELECT * FROM users WHERE name = :param_0");
        assert_eq!(
            params.get("param_0"),
            Some(&Value::from("x'; DROP TABLE users; --"))
        );
    }
}
