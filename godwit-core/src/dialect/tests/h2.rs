use super::support::{compile_bare, compile_with, MockInspector};
use crate::command::{
    AlterTable, ColumnSpec, Command, ConstraintSpec, CreateIndex, CreateTable, InsertInto, Update,
    Value,
};
use crate::dialect::{H2Dialect, H2Version};
use crate::plan::Plan;

fn v1() -> H2Dialect {
    H2Dialect::new(H2Version::V1)
}

fn v2() -> H2Dialect {
    H2Dialect::new(H2Version::V2)
}

#[test]
fn test_version_parsing() {
    assert_eq!(H2Version::from_version_string("1.4.200"), H2Version::V1);
    assert_eq!(H2Version::from_version_string("2.2.224"), H2Version::V2);
    assert_eq!(H2Version::from_version_string("2.1.214"), H2Version::V2);
}

#[tokio::test]
async fn test_v1_default_null_token() {
    let cmd = Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns: vec![ColumnSpec::new("a", &["INT", "DEFAULT NULL"])],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE foo (a INT NULL)"]);
}

#[tokio::test]
async fn test_charset_tokens_stripped() {
    let cmd = Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns: vec![ColumnSpec::new(
            "name",
            &["VARCHAR(64)", "CHARACTER SET utf8", "COLLATE utf8_bin", "NOT NULL"],
        )],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE foo (name VARCHAR(64) NOT NULL)"]);
}

#[tokio::test]
async fn test_column_name_length_suffix_removed() {
    let cmd = Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns: vec![ColumnSpec::new("name(32)", &["VARCHAR(32)"])],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE foo (name VARCHAR(32))"]);
}

#[tokio::test]
async fn test_v2_uppercases_and_quotes_reserved() {
    let cmd = Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns: vec![
            ColumnSpec::new("value", &["INT"]),
            ColumnSpec::new("amount", &["INT"]),
        ],
        ..Default::default()
    });
    let sql = compile_bare(&v2(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE FOO (`VALUE` INT, AMOUNT INT)"]);
}

#[tokio::test]
async fn test_alter_groups_added_columns() {
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        add_columns: vec![ColumnSpec::new("a", &["INT"]), ColumnSpec::new("b", &["INT"])],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(sql, vec!["ALTER TABLE foo ADD COLUMN (a INT, b INT)"]);
}

#[tokio::test]
async fn test_alter_groups_dropped_columns() {
    let inspector = MockInspector::new().with_column("foo", "a").with_column("foo", "b");
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        drop_columns: vec!["a".into(), "b".into()],
        ..Default::default()
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["ALTER TABLE foo DROP COLUMN a, b"]);
}

#[tokio::test]
async fn test_drop_constraint_syntax_per_version() {
    let inspector = MockInspector::new().with_foreign_key("foo", "fk_a");
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        drop_constraints: vec!["fk_a".into()],
        ..Default::default()
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["ALTER TABLE foo DROP FOREIGN KEY fk_a"]);

    let sql = compile_with(&v2(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["ALTER TABLE FOO DROP CONSTRAINT IF EXISTS FK_A"]);
}

#[tokio::test]
async fn test_primary_key_add_skipped_when_present() {
    let inspector = MockInspector::new().with_primary_key("foo", "pk_foo");
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        primary_key: vec!["a".into()],
        ..Default::default()
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert!(sql.is_empty());
}

#[tokio::test]
async fn test_primary_key_add_kept_when_dropped_in_same_alter() {
    let inspector = MockInspector::new().with_primary_key("foo", "pk_foo");
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        drop_constraints: vec!["primary-key".into()],
        primary_key: vec!["a".into()],
        ..Default::default()
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(
        sql,
        vec!["ALTER TABLE foo DROP PRIMARY KEY", "ALTER TABLE foo ADD PRIMARY KEY (a)"]
    );
}

#[tokio::test]
async fn test_duplicate_foreign_key_auto_drop() {
    let inspector =
        MockInspector::new().with_matching_fk("foo", "bar_id", "bar", "id", &["FK_OLD"]);
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        add_constraints: vec![ConstraintSpec::new(
            "fk_foo_bar",
            &["(bar_id) REFERENCES bar(id)"],
        )],
        ..Default::default()
    });
    let sql = compile_with(&v2(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE FOO DROP CONSTRAINT IF EXISTS FK_OLD",
            "ALTER TABLE FOO ADD CONSTRAINT FK_FOO_BAR FOREIGN KEY (bar_id) REFERENCES bar(id)",
        ]
    );
}

#[tokio::test]
async fn test_duplicate_foreign_key_not_dropped_when_scheduled() {
    let inspector = MockInspector::new()
        .with_foreign_key("foo", "fk_old")
        .with_matching_fk("foo", "bar_id", "bar", "id", &["FK_OLD"]);
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        drop_constraints: vec!["fk_old".into()],
        add_constraints: vec![ConstraintSpec::new(
            "fk_foo_bar",
            &["(bar_id) REFERENCES bar(id)"],
        )],
        ..Default::default()
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE foo DROP FOREIGN KEY fk_old",
            "ALTER TABLE foo ADD CONSTRAINT fk_foo_bar FOREIGN KEY (bar_id) REFERENCES bar(id)",
        ]
    );
}

#[tokio::test]
async fn test_unparseable_ref_spec_still_adds() {
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        add_constraints: vec![ConstraintSpec::new("fk_odd", &["REFERENCES bar"])],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(
        sql,
        vec!["ALTER TABLE foo ADD CONSTRAINT fk_odd FOREIGN KEY REFERENCES bar"]
    );
}

#[tokio::test]
async fn test_index_filters_large_object_columns() {
    let inspector = MockInspector::new()
        .with_column_type("docs", "body", "CLOB")
        .with_column_type("docs", "title", "VARCHAR");
    let cmd = Command::CreateIndex(CreateIndex {
        index: "idx_docs".into(),
        on: "docs".into(),
        columns: vec!["body".into(), "title".into()],
        unique: false,
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["CREATE INDEX idx_docs ON docs (title)"]);
}

#[tokio::test]
async fn test_index_uses_plan_declared_types() {
    let mut plan = Plan::new();
    plan.record(Command::CreateTable(CreateTable {
        table: "docs".into(),
        columns: vec![
            ColumnSpec::new("body", &["TEXT"]),
            ColumnSpec::new("title", &["VARCHAR(64)"]),
        ],
        ..Default::default()
    }));
    let cmd = Command::CreateIndex(CreateIndex {
        index: "idx_docs".into(),
        on: "docs".into(),
        columns: vec!["body".into(), "title".into()],
        unique: false,
    });
    let ctx_plan = plan;
    let sql = {
        let ctx = crate::inspect::CompileContext::new(None, &ctx_plan);
        crate::dialect::Dialect::compile(&v1(), &cmd, &ctx).await.unwrap()
    };
    assert_eq!(sql, vec!["CREATE INDEX idx_docs ON docs (title)"]);
}

#[tokio::test]
async fn test_index_skipped_when_no_columns_remain() {
    let inspector = MockInspector::new().with_column_type("docs", "body", "BLOB");
    let cmd = Command::CreateIndex(CreateIndex {
        index: "idx_docs".into(),
        on: "docs".into(),
        columns: vec!["body".into()],
        unique: false,
    });
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert!(sql.is_empty());
}

#[tokio::test]
async fn test_v2_filters_character_large_object() {
    let inspector = MockInspector::new()
        .with_column_type("docs", "body", "CHARACTER LARGE OBJECT")
        .with_column_type("docs", "title", "CHARACTER VARYING");
    let cmd = Command::CreateIndex(CreateIndex {
        index: "idx_docs".into(),
        on: "docs".into(),
        columns: vec!["body".into(), "title".into()],
        unique: false,
    });
    let sql = compile_with(&v2(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["CREATE INDEX IDX_DOCS ON DOCS (TITLE)"]);

    // v1 indexes the same column happily
    let sql = compile_with(&v1(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["CREATE INDEX idx_docs ON docs (body, title)"]);
}

#[tokio::test]
async fn test_insert_single_quotes() {
    let cmd = Command::InsertInto(InsertInto {
        table: "foo".into(),
        values: vec![vec![Value::Int(1), Value::Str("x".into())]],
        ..Default::default()
    });
    let sql = compile_bare(&v1(), &cmd).await;
    assert_eq!(sql, vec!["INSERT INTO foo VALUES (1,'x')"]);
}

#[tokio::test]
async fn test_update_h2_override() {
    let cmd = Command::Update(Update {
        query: Some("UPDATE foo SET a = 1".into()),
        h2: Some("UPDATE FOO SET A = 1".into()),
        ..Default::default()
    });
    let sql = compile_bare(&v2(), &cmd).await;
    assert_eq!(sql, vec!["UPDATE FOO SET A = 1"]);
}
