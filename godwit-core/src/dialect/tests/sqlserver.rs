use super::support::{compile_bare, compile_with, MockInspector};
use crate::command::{
    AlterTable, ColumnSpec, Command, ConstraintSpec, CreateTable, DropIndex, InsertInto,
    TableOption, Value,
};
use crate::dialect::SqlServerDialect;
use crate::plan::Plan;

fn make_table(columns: Vec<ColumnSpec>) -> Command {
    Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_enum_becomes_varchar_check() {
    let cmd = make_table(vec![ColumnSpec::new("a", &["ENUM('Hello','Goodbye')"])]);
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec!["CREATE TABLE foo (a VARCHAR(7) CHECK (a IN('Hello','Goodbye')))"]
    );
}

#[tokio::test]
async fn test_create_table_with_primary_key_closes_parenthesis() {
    let cmd = Command::CreateTable(CreateTable {
        table: "foo".into(),
        columns: vec![ColumnSpec::new("a", &["INT"])],
        primary_key: vec!["a".into()],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE foo (a INT, PRIMARY KEY (a))"]);
}

#[tokio::test]
async fn test_token_remapping() {
    let cmd = make_table(vec![
        ColumnSpec::new("id", &["INT(11)", "AUTO_INCREMENT"]),
        ColumnSpec::new("flag", &["TINYINT(1)"]),
        ColumnSpec::new("small", &["TINYINT(4)"]),
        ColumnSpec::new("body", &["LONGTEXT"]),
        ColumnSpec::new("stamp", &["TIMESTAMP"]),
        ColumnSpec::new("ratio", &["DOUBLE"]),
        ColumnSpec::new("data", &["BLOB"]),
    ]);
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec![
            "CREATE TABLE foo (id int identity, flag bit, small tinyint, \
             body varchar(max), stamp datetime, ratio float, data varbinary(max))"
        ]
    );
}

#[tokio::test]
async fn test_varbinary_over_page_limit() {
    let cmd = make_table(vec![
        ColumnSpec::new("big", &["VARBINARY(9000)"]),
        ColumnSpec::new("small", &["VARBINARY(128)"]),
    ]);
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec!["CREATE TABLE foo (big varbinary(max), small VARBINARY(128))"]
    );
}

#[tokio::test]
async fn test_character_set_tokens_dropped() {
    let cmd = make_table(vec![ColumnSpec::new(
        "name",
        &["VARCHAR(64)", "CHARACTER SET utf8", "COLLATE utf8_bin", "NOT NULL"],
    )]);
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE foo (name VARCHAR(64) NOT NULL)"]);
}

#[tokio::test]
async fn test_reserved_table_name_bracketed() {
    let cmd = Command::CreateTable(CreateTable {
        table: "user".into(),
        columns: vec![ColumnSpec::new("id", &["INT"])],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(sql, vec!["CREATE TABLE [user] (id INT)"]);
}

#[tokio::test]
async fn test_row_format_option_is_filtered() {
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        table_options: vec![TableOption { name: "ROW_FORMAT".into(), value: "Compressed".into() }],
        add_constraints: vec![ConstraintSpec::new(
            "fk_foo_bar",
            &["(bar_id) REFERENCES bar(id)"],
        )],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec!["ALTER TABLE foo ADD CONSTRAINT fk_foo_bar FOREIGN KEY (bar_id) REFERENCES bar(id)"]
    );
}

#[tokio::test]
async fn test_unfiltered_option_emitted_after_adds() {
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        table_options: vec![TableOption { name: "DATA_COMPRESSION".into(), value: "PAGE".into() }],
        add_columns: vec![ColumnSpec::new("a", &["INT"])],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE foo ADD a INT",
            "ALTER TABLE foo DATA_COMPRESSION=PAGE",
        ]
    );
}

#[tokio::test]
async fn test_alter_groups_drops_and_adds() {
    let inspector = MockInspector::new()
        .with_column("foo", "old")
        .with_foreign_key("foo", "fk_stale")
        .with_primary_key("foo", "pk_foo");
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        drop_constraints: vec!["primary-key".into(), "fk_stale".into()],
        drop_columns: vec!["old".into()],
        add_columns: vec![ColumnSpec::new("fresh", &["INT"])],
        add_constraints: vec![ConstraintSpec::new("fk_new", &["(bar_id) REFERENCES bar(id)"])],
        ..Default::default()
    });
    let sql = compile_with(&SqlServerDialect::new(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE foo DROP CONSTRAINT pk_foo, CONSTRAINT fk_stale, COLUMN old",
            "ALTER TABLE foo ADD fresh INT, CONSTRAINT fk_new FOREIGN KEY (bar_id) REFERENCES bar(id)",
        ]
    );
}

#[tokio::test]
async fn test_alter_modify_column_dedicated_statement() {
    let cmd = Command::AlterTable(AlterTable {
        table: "foo".into(),
        modify_columns: vec![ColumnSpec::new("a", &["BIGINT", "NOT NULL"])],
        primary_key: vec!["a".into()],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE foo ALTER COLUMN a BIGINT NOT NULL",
            "ALTER TABLE foo ADD PRIMARY KEY (a)",
        ]
    );
}

#[tokio::test]
async fn test_insert_single_quotes_and_column_list() {
    let cmd = Command::InsertInto(InsertInto {
        table: "foo".into(),
        columns: vec!["a".into(), "b".into()],
        values: vec![vec![Value::Str("x".into()), Value::Int(2)]],
        ..Default::default()
    });
    let sql = compile_bare(&SqlServerDialect::new(), &cmd).await;
    assert_eq!(sql, vec!["INSERT INTO foo (a, b) VALUES ('x',2)"]);
}

#[tokio::test]
async fn test_drop_index_names_table() {
    let inspector = MockInspector::new().with_index("foo", "idx_a");
    let cmd = Command::DropIndex(DropIndex { index: "idx_a".into(), on: "foo".into() });
    let sql = compile_with(&SqlServerDialect::new(), &cmd, &inspector, &Plan::new()).await;
    assert_eq!(sql, vec!["DROP INDEX idx_a ON foo"]);
}
