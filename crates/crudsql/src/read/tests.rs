use super::*;
use crate::config::CompilerConfig;
use crate::constraint::SubqueryDescriptor;
use crate::escape::MySqlEscaper;
use crate::SqlCompiler;
use serde_json::json;

fn compiler() -> SqlCompiler<MySqlEscaper> {
    SqlCompiler::new(MySqlEscaper)
}

#[test]
fn test_select_star() {
    let c = compiler();
    assert_eq!(c.read("users").find().unwrap(), "SELECT * FROM `users`");
}

#[test]
fn test_constraints_on_one_field_are_grouped() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("age", Constraint::Gt(json!(1)))
        .filter("age", Constraint::Lt(json!(5)))
        .eq("name", "bo")
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE (`users`.`age` > 1 AND `users`.`age` < 5) AND `users`.`name` = 'bo'"
    );
}

#[test]
fn test_comparison_operators() {
    let c = compiler();
    let cases = [
        (Constraint::Eq(json!(1)), "= 1"),
        (Constraint::Neq(json!(1)), "!= 1"),
        (Constraint::Gt(json!(1)), "> 1"),
        (Constraint::Gte(json!(1)), ">= 1"),
        (Constraint::Lt(json!(1)), "< 1"),
        (Constraint::Lte(json!(1)), "<= 1"),
    ];
    for (constraint, tail) in cases {
        let sql = c.read("t").filter("n", constraint).find().unwrap();
        assert_eq!(sql, format!("SELECT * FROM `t` WHERE `t`.`n` {tail}"));
    }
}

#[test]
fn test_pattern_operators() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("name", Constraint::StartsWith("al".into()))
        .filter("email", Constraint::EndsWith("@x.io".into()))
        .filter("bio", Constraint::Contains("rust".into()))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `users`.`name` LIKE 'al%' AND `users`.`email` LIKE '%@x.io' \
         AND `users`.`bio` LIKE '%rust%'"
    );
}

#[test]
fn test_has_across_columns() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("first|last", Constraint::Contains("bo".into()))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE CONCAT(`users`.`first`, `users`.`last`) LIKE '%bo%'"
    );
}

#[test]
fn test_has_with_configured_delimiter() {
    let config = CompilerConfig::new().with_has_delimiter(',');
    let c = SqlCompiler::with_config(MySqlEscaper, config);
    let sql = c
        .read("users")
        .filter("first,last", Constraint::Contains("bo".into()))
        .find()
        .unwrap();
    assert!(sql.ends_with("CONCAT(`users`.`first`, `users`.`last`) LIKE '%bo%'"));
}

#[test]
fn test_has_segments_are_validated() {
    let c = compiler();
    let err = c
        .read("users")
        .filter("first|la`st", Constraint::Contains("bo".into()))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidIdentifier { .. }));
}

#[test]
fn test_exists() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("email", Constraint::Exists(true))
        .filter("deleted_at", Constraint::Exists(false))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `users`.`email` IS NOT NULL AND `users`.`deleted_at` IS NULL"
    );
}

#[test]
fn test_in_lists() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("id", Constraint::In(vec![json!(1), json!(2)]))
        .filter("role", Constraint::NotIn(vec![json!("bot")]))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `users`.`id` IN (1, 2) AND `users`.`role` NOT IN ('bot')"
    );
}

#[test]
fn test_empty_in_lists_are_tautologies() {
    let c = compiler();
    let sql = c
        .read("users")
        .filter("id", Constraint::In(vec![]))
        .find()
        .unwrap();
    assert_eq!(sql, "SELECT * FROM `users` WHERE 1=1");

    let sql = c
        .read("users")
        .filter("id", Constraint::NotIn(vec![]))
        .find()
        .unwrap();
    assert_eq!(sql, "SELECT * FROM `users` WHERE 1=1");
}

#[test]
fn test_values_are_escaped() {
    let c = compiler();
    let sql = c.read("users").eq("name", "x' OR '1'='1").find().unwrap();
    assert_eq!(
        sql,
        r"SELECT * FROM `users` WHERE `users`.`name` = 'x\' OR \'1\'=\'1'"
    );
}

#[test]
fn test_field_order_does_not_change_predicates() {
    let c = compiler();
    let a = c.read("t").eq("a", 1).eq("b", 2).find().unwrap();
    let b = c.read("t").eq("b", 2).eq("a", 1).find().unwrap();

    let preds = |sql: &str| {
        let (_, where_clause) = sql.split_once(" WHERE ").unwrap();
        let mut parts: Vec<String> = where_clause.split(" AND ").map(String::from).collect();
        parts.sort();
        parts
    };
    assert_eq!(preds(&a), preds(&b));
}

#[test]
fn test_join_via() {
    let c = compiler();
    let sql = c
        .read("pets")
        .select("name")
        .select(FieldSelection::joined("owner", "name"))
        .join(JoinSpec::new("owners", "owner").via("owner_id").target_key("id"))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `pets`.`name` AS `name`, `owner`.`name` AS `owner_name` FROM `pets` \
         LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id`"
    );
}

#[test]
fn test_join_multi_hop() {
    let c = compiler();
    let sql = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").via("owner_id"))
        .join(JoinSpec::new("addresses", "addr").via("owner.address_id"))
        .select(FieldSelection::joined("addr", "city").output_as("city"))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `addr`.`city` AS `city` FROM `pets` \
         LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id` \
         LEFT OUTER JOIN `addresses` AS `addr` ON `owner`.`address_id` = `addr`.`id`"
    );
}

#[test]
fn test_join_via_must_cross_an_earlier_alias() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(JoinSpec::new("addresses", "addr").via("owner.address_id"))
        .join(JoinSpec::new("owners", "owner").via("owner_id"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::UnknownAlias(a) if a == "owner"));
}

#[test]
fn test_join_constraints_cannot_reach_a_later_alias() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(
            JoinSpec::new("owners", "owner")
                .join_constraints(ConstraintMap::new().with("city.id", Constraint::Eq(json!(1)))),
        )
        .join(JoinSpec::new("cities", "city").via("owner.city_id"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::UnknownAlias(a) if a == "city"));
}

#[test]
fn test_join_constraints_see_primary_and_earlier_aliases() {
    let c = compiler();
    let on = ConstraintMap::new()
        .with("city_id", Constraint::Exists(true))
        .with("owner.active", Constraint::Eq(json!(true)))
        .with("pets.kind", Constraint::Eq(json!("dog")));
    let sql = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").via("owner_id"))
        .join(JoinSpec::new("cities", "city").join_constraints(on))
        .find()
        .unwrap();
    assert!(sql.ends_with(
        "LEFT OUTER JOIN `cities` AS `city` ON (`city`.`city_id` IS NOT NULL \
         AND `owner`.`active` = true AND `pets`.`kind` = 'dog')"
    ));
}

#[test]
fn test_empty_join_constraints_count_as_absent() {
    let c = compiler();
    let sql = c
        .read("pets")
        .join(
            JoinSpec::new("owners", "owner")
                .via("owner_id")
                .join_constraints(ConstraintMap::new()),
        )
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `pets` LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id`"
    );

    let err = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").join_constraints(ConstraintMap::new()))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::MissingJoinKey(a) if a == "owner"));
}

#[test]
fn test_target_key_is_rejected_with_join_constraints() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(
            JoinSpec::new("owners", "owner")
                .join_constraints(ConstraintMap::new().with("active", Constraint::Exists(true)))
                .target_key("uid"),
        )
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::InvalidValue { ref field, .. } if field == "owner"));
}

#[test]
fn test_join_constraints_are_grouped() {
    let c = compiler();
    let on = ConstraintMap::new()
        .with("active", Constraint::Eq(json!(true)))
        .with("kind", Constraint::Eq(json!("person")));
    let sql = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").join_constraints(on))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `pets` LEFT OUTER JOIN `owners` AS `owner` \
         ON (`owner`.`active` = true AND `owner`.`kind` = 'person')"
    );
}

#[test]
fn test_join_needs_exactly_one_key() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::MissingJoinKey(a) if a == "owner"));

    let both = JoinSpec::new("owners", "owner")
        .via("owner_id")
        .join_constraints(ConstraintMap::new().with("active", Constraint::Exists(true)));
    let err = c.read("pets").join(both).find().unwrap_err();
    assert!(matches!(err, SqlError::MissingJoinKey(_)));
}

#[test]
fn test_duplicate_alias() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").via("owner_id"))
        .join(JoinSpec::new("people", "owner").via("vet_id"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::DuplicateAlias(a) if a == "owner"));

    let err = c
        .read("pets")
        .join(JoinSpec::new("owners", "pets").via("owner_id"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::DuplicateAlias(_)));
}

#[test]
fn test_ambiguous_selection() {
    let c = compiler();
    let err = c
        .read("pets")
        .join(JoinSpec::new("owners", "owner").via("owner_id"))
        .select("name")
        .select(FieldSelection::joined("owner", "name").output_as("name"))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::AmbiguousSelection(a) if a == "name"));
}

#[test]
fn test_unknown_alias_in_where() {
    let c = compiler();
    let err = c.read("pets").eq("ghost.name", "x").find().unwrap_err();
    assert!(matches!(err, SqlError::UnknownAlias(a) if a == "ghost"));
}

#[test]
fn test_invalid_table_name() {
    let c = compiler();
    let err = c.read("users; DROP TABLE users").find().unwrap_err();
    assert!(err.is_construction());
    assert!(matches!(err, SqlError::InvalidIdentifier { .. }));
}

#[test]
fn test_sort() {
    let c = compiler();
    let sql = c
        .read("users")
        .sort(SortSpec::desc("created_at"))
        .sort(SortSpec::asc("name"))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` ORDER BY `users`.`created_at` DESC, `users`.`name` ASC"
    );
}

#[test]
fn test_pagination() {
    let c = compiler();
    assert_eq!(
        c.read("t").skip(10).limit(5).find().unwrap(),
        "SELECT * FROM `t` LIMIT 10, 5"
    );
    assert_eq!(c.read("t").limit(5).find().unwrap(), "SELECT * FROM `t` LIMIT 5");
}

#[test]
fn test_skip_without_limit_keeps_zero_count() {
    let c = compiler();
    assert_eq!(
        c.read("t").skip(10).find().unwrap(),
        "SELECT * FROM `t` LIMIT 10, 0"
    );
}

#[test]
fn test_first_forces_single_row() {
    let c = compiler();
    let sql = c.read("users").eq("id", 3).skip(4).limit(50).first().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `users`.`id` = 3 LIMIT 4, 1"
    );
}

#[test]
fn test_count_drops_order_and_pagination() {
    let c = compiler();
    let sql = c
        .read("users")
        .eq("active", true)
        .sort(SortSpec::asc("name"))
        .limit(10)
        .count()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT COUNT(*) AS `count` FROM `users` WHERE `users`.`active` = true"
    );
}

#[test]
fn test_fi_subquery() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("y", "id").filter("flag", Constraint::Eq(json!(true)));
    let sql = c
        .read("x")
        .filter("x", Constraint::InQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `x` WHERE `x`.`x` IN \
         (SELECT `sq1_0`.`id` FROM `y` AS `sq1_0` WHERE `sq1_0`.`flag` = true)"
    );
}

#[test]
fn test_nfi_over_same_table_is_aliased() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("users", "id")
        .filter("role", Constraint::Eq(json!("admin")))
        .limit(5);
    let sql = c
        .read("users")
        .filter("id", Constraint::NotInQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `users`.`id` NOT IN \
         (SELECT `sq1_0`.`id` FROM `users` AS `sq1_0` WHERE `sq1_0`.`role` = 'admin' LIMIT 5)"
    );
}

#[test]
fn test_subquery_can_reference_outer_table() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("users", "id").filter("team", Constraint::Eq(json!(1)));
    let sub = sub.filter("users.org", Constraint::Exists(true));
    let sql = c
        .read("users")
        .filter("id", Constraint::InQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert!(sql.contains("`sq1_0`.`team` = 1 AND `users`.`org` IS NOT NULL"));
}

#[test]
fn test_fi_qualified_select_adds_implicit_join() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("pets", "owner.name");
    let sql = c
        .read("people")
        .filter("name", Constraint::NotInQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `people` WHERE `people`.`name` NOT IN \
         (SELECT `owner`.`name` FROM `pets` AS `sq1_0` \
         LEFT OUTER JOIN `owner` AS `owner` ON `sq1_0`.`owner` = `owner`.`id`)"
    );
}

#[test]
fn test_fi_qualified_select_uses_declared_join() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("pets", "o.name")
        .join(JoinSpec::new("owners", "o").via("owner_id"));
    let sql = c
        .read("people")
        .filter("name", Constraint::InQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert!(sql.contains(
        "(SELECT `o`.`name` FROM `pets` AS `sq1_0` \
         LEFT OUTER JOIN `owners` AS `o` ON `sq1_0`.`owner_id` = `o`.`id`)"
    ));
}

#[test]
fn test_sibling_and_nested_subqueries_get_distinct_aliases() {
    let c = compiler();
    let inner = SubqueryDescriptor::new("c", "id");
    let first = SubqueryDescriptor::new("b", "id")
        .filter("c_id", Constraint::InQuery(Box::new(inner)));
    let second = SubqueryDescriptor::new("b", "id");
    let sql = c
        .read("a")
        .filter("b1", Constraint::InQuery(Box::new(first)))
        .filter("b2", Constraint::InQuery(Box::new(second)))
        .find()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `a` WHERE `a`.`b1` IN (SELECT `sq1_0`.`id` FROM `b` AS `sq1_0` \
         WHERE `sq1_0`.`c_id` IN (SELECT `sq2_0`.`id` FROM `c` AS `sq2_0`)) \
         AND `a`.`b2` IN (SELECT `sq1_1`.`id` FROM `b` AS `sq1_1`)"
    );
}

#[test]
fn test_generated_alias_skips_reserved_names() {
    let c = compiler();
    let sub = SubqueryDescriptor::new("sq1_0", "id");
    let sql = c
        .read("x")
        .filter("id", Constraint::InQuery(Box::new(sub)))
        .find()
        .unwrap();
    assert!(sql.contains("FROM `sq1_0` AS `sq1_1`"));
}

#[test]
fn test_subquery_depth_is_bounded() {
    let config = CompilerConfig::new().with_max_subquery_depth(1);
    let c = SqlCompiler::with_config(MySqlEscaper, config);

    let one = SubqueryDescriptor::new("b", "id");
    assert!(c
        .read("a")
        .filter("id", Constraint::InQuery(Box::new(one.clone())))
        .find()
        .is_ok());

    let two = SubqueryDescriptor::new("b", "id").filter("id", Constraint::InQuery(Box::new(one)));
    let err = c
        .read("a")
        .filter("id", Constraint::InQuery(Box::new(two)))
        .find()
        .unwrap_err();
    assert!(matches!(err, SqlError::SubqueryTooDeep(1)));
}

#[test]
fn test_subquery_mode_on_top_level_builder() {
    let c = compiler();
    let sql = c.read("users").subquery(true).select("id").find().unwrap();
    assert_eq!(sql, "SELECT `sq0_0`.`id` FROM `users` AS `sq0_0`");
}

#[test]
fn test_statement_exposes_ast() {
    let c = compiler();
    let select = c.read("users").select("id").limit(2).statement().unwrap();
    assert_eq!(select.from, TableRef::new("users"));
    assert_eq!(select.limit.count, Some(2));
    assert!(matches!(select.projection, Projection::Columns(ref items) if items.len() == 1));
}
