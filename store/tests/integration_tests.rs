mod common;

use common::{FakeDatabase, FakeError, TRACKING};
use rowmap_core::{Fields, Object, Record, Value};
use rowmap_store::{
    InstallPlan, Installer, RecordQuery, SchemaConfig, Snapshot, StoreConfig, StoreError,
    TableState, transaction,
};
use serde::{Deserialize, Serialize};

mod v1 {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Fields, Record)]
    #[record(name = "r1")]
    pub struct R1 {
        #[field(flatten)]
        pub base: Object,
        #[field(length = 32)]
        pub name: String,
    }
}

mod v2 {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Fields, Record)]
    #[record(name = "r1")]
    pub struct R1 {
        #[field(flatten)]
        pub base: Object,
        #[field(length = 32)]
        pub name: String,
        pub age: i32,
    }
}

mod v3 {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Fields, Record)]
    #[record(name = "r1")]
    pub struct R1 {
        #[field(flatten)]
        pub base: Object,
        #[field(length = 64, index = "ASC")]
        pub name: String,
        #[field(default = 7)]
        pub age: i32,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Settings {
    theme: String,
    font_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Fields, Record)]
#[record(name = "account", title = "Accounts")]
struct Account {
    #[field(flatten)]
    base: Object,
    #[field(length = 32, index = "ASC")]
    login: String,
    active: bool,
    balance: f64,
    settings: Settings,
}

fn account(login: &str) -> Account {
    Account {
        login: login.to_string(),
        active: true,
        balance: 12.5,
        settings: Settings {
            theme: "dark".into(),
            font_size: 14,
        },
        ..Account::default()
    }
}

const ACCOUNT_COLUMNS: &[&str] = &["id", "login", "active", "balance", "settings"];

fn account_row(id: i64, login: &str, active: i64, settings: &str) -> Vec<Value> {
    vec![
        Value::Integer(id),
        Value::from(login),
        Value::Integer(active),
        Value::Real(12.5),
        Value::from(settings),
    ]
}

// ---------------------------------------------------------------------------
// Statement engine
// ---------------------------------------------------------------------------

#[test]
fn test_query_rejects_invalid_prefix() {
    let db = FakeDatabase::new();
    assert!(matches!(
        RecordQuery::new(&db, "bad prefix"),
        Err(StoreError::InvalidPrefix(_))
    ));
    assert!(RecordQuery::new(&db, "").is_ok());
}

#[test]
fn test_insert_assigns_generated_id() {
    let db = FakeDatabase::new();
    db.next_id.set(41);
    let query = RecordQuery::new(&db, "app_").unwrap();

    let mut record = account("ann");
    let outcome = query.insert(&mut record).unwrap();

    assert_eq!(outcome.assigned_id, Some(41));
    assert_eq!(record.id(), 41);

    let calls = db.calls.borrow();
    assert_eq!(
        calls[0].sql,
        "INSERT INTO `app_account`(`login`,`active`,`balance`,`settings`) VALUES (?,?,?,?)"
    );
    assert_eq!(
        calls[0].args,
        vec![
            Value::from("ann"),
            Value::Integer(1),
            Value::Real(12.5),
            Value::from(r#"{"theme":"dark","font_size":14}"#),
        ]
    );
}

#[test]
fn test_insert_with_explicit_id_keeps_it() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "").unwrap();

    let mut record = account("bob");
    record.set_id(500);
    let outcome = query.insert(&mut record).unwrap();

    assert_eq!(outcome.assigned_id, None);
    assert_eq!(record.id(), 500);
    let calls = db.calls.borrow();
    assert!(calls[0].sql.starts_with("INSERT INTO `account`(`id`,`login`"));
    assert_eq!(calls[0].args[0], Value::Integer(500));
}

#[test]
fn test_insert_without_reported_id_still_succeeds() {
    let db = FakeDatabase::new();
    db.report_insert_id.set(false);
    let query = RecordQuery::new(&db, "").unwrap();

    let mut record = account("cy");
    let outcome = query.insert(&mut record).unwrap();

    assert_eq!(outcome.assigned_id, None);
    assert_eq!(outcome.result.rows_affected, 1);
    assert_eq!(record.id(), 0);
}

#[test]
fn test_update_and_update_columns() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "").unwrap();
    let mut record = account("dee");
    record.set_id(3);

    query.update(&record).unwrap();
    query.update_columns(&record, &["active", "login"]).unwrap();

    let calls = db.calls.borrow();
    assert_eq!(
        calls[0].sql,
        "UPDATE `account` SET `login`=?,`active`=?,`balance`=?,`settings`=? WHERE id=?"
    );
    assert_eq!(calls[0].args.last(), Some(&Value::Integer(3)));
    assert_eq!(calls[1].sql, "UPDATE `account` SET `login`=?,`active`=? WHERE id=?");
    assert_eq!(
        calls[1].args,
        vec![Value::from("dee"), Value::Integer(1), Value::Integer(3)]
    );
}

#[test]
fn test_update_with_unknown_keys_is_skipped() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "").unwrap();
    let result = query.update_columns(&account("x"), &["missing"]).unwrap();
    assert_eq!(result.rows_affected, 0);
    assert!(db.calls.borrow().is_empty());
}

#[test]
fn test_delete_and_delete_where() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "t_").unwrap();
    let mut record = account("x");
    record.set_id(9);

    query.delete(&record).unwrap();
    query
        .delete_where(&record, "WHERE active = ?", &[Value::from(false)])
        .unwrap();

    let calls = db.calls.borrow();
    assert_eq!(calls[0].sql, "DELETE FROM `t_account` WHERE id=?");
    assert_eq!(calls[0].args, vec![Value::Integer(9)]);
    assert_eq!(calls[1].sql, "DELETE FROM `t_account` WHERE active = ?");
    assert_eq!(calls[1].args, vec![Value::Integer(0)]);
}

#[test]
fn test_count_reads_first_column() {
    let db = FakeDatabase::new();
    db.push_rows(&["c"], vec![vec![Value::Integer(17)]]);
    let query = RecordQuery::new(&db, "").unwrap();

    let n = query
        .count(&Account::default(), "WHERE active = ?", &[Value::from(true)])
        .unwrap();
    assert_eq!(n, 17);
    assert_eq!(
        db.sql_log(),
        vec!["SELECT COUNT(*) AS c FROM `account` WHERE active = ?"]
    );
}

#[test]
fn test_count_without_row_is_zero() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "").unwrap();
    assert_eq!(query.count(&Account::default(), "", &[]).unwrap(), 0);
}

#[test]
fn test_select_columns_in_declaration_order() {
    let db = FakeDatabase::new();
    let query = RecordQuery::new(&db, "").unwrap();

    query
        .select_columns(&Account::default(), Some(&["settings", "login"]), "", &[])
        .unwrap();
    query
        .select_columns(&Account::default(), None, "LIMIT 1", &[])
        .unwrap();

    assert_eq!(
        db.sql_log(),
        vec![
            "SELECT id,`login`,`settings` FROM `account`",
            "SELECT * FROM `account` LIMIT 1",
        ]
    );
}

#[test]
fn test_fetch_all_scans_every_row() {
    let db = FakeDatabase::new();
    db.push_rows(
        ACCOUNT_COLUMNS,
        vec![
            account_row(1, "ann", 1, r#"{"theme":"dark","font_size":14}"#),
            account_row(2, "bob", 0, "not json"),
        ],
    );
    let query = RecordQuery::new(&db, "").unwrap();

    let accounts: Vec<Account> = query.fetch_all("ORDER BY id", &[]).unwrap();
    assert_eq!(accounts.len(), 2);

    let mut expected = account("ann");
    expected.set_id(1);
    assert_eq!(accounts[0], expected);

    assert_eq!(accounts[1].id(), 2);
    assert!(!accounts[1].active);
    assert_eq!(accounts[1].settings, Settings::default());
}

#[test]
fn test_fetch_one() {
    let db = FakeDatabase::new();
    db.push_rows(ACCOUNT_COLUMNS, vec![account_row(5, "eve", 1, "{}")]);
    let query = RecordQuery::new(&db, "").unwrap();

    let found: Option<Account> = query.fetch_one("WHERE id = ?", &[Value::from(5)]).unwrap();
    assert_eq!(found.map(|a| a.login), Some("eve".to_string()));

    let missing: Option<Account> = query.fetch_one("WHERE id = ?", &[Value::from(6)]).unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_driver_error_propagates_unchanged() {
    let db = FakeDatabase::new();
    db.fail_on("DELETE");
    let query = RecordQuery::new(&db, "").unwrap();

    let err = query.delete(&account("x")).unwrap_err();
    let driver = err.driver_error::<FakeError>().unwrap();
    assert_eq!(driver.0, "rejected: DELETE FROM `account` WHERE id=?");
}

// ---------------------------------------------------------------------------
// Schema installer
// ---------------------------------------------------------------------------

fn installer(db: &FakeDatabase) -> Installer<'_, FakeDatabase> {
    let installer = Installer::new(db, "", SchemaConfig::default()).unwrap();
    installer.open().unwrap();
    installer
}

#[test]
fn test_open_creates_tracking_table() {
    let db = FakeDatabase::new();
    installer(&db);
    assert_eq!(
        db.sql_log(),
        vec![format!(
            "CREATE TABLE IF NOT EXISTS `{TRACKING}` (id BIGINT NOT NULL AUTO_INCREMENT, \
             name VARCHAR(64) NULL, scheme TEXT NULL, PRIMARY KEY (id), INDEX name (name ASC)) \
             AUTO_INCREMENT=1"
        )]
    );
}

#[test]
fn test_install_then_migrate() {
    let db = FakeDatabase::new();
    let installer = installer(&db);

    let report = installer.install(&v1::R1::default()).unwrap();
    assert!(report.created);
    assert_eq!(report.statements_applied, 1);
    assert_eq!(
        db.ddl()[0],
        "CREATE TABLE IF NOT EXISTS `r1` (id BIGINT NOT NULL AUTO_INCREMENT, \
         `name` VARCHAR(32) DEFAULT '', PRIMARY KEY (id))"
    );

    db.clear_log();
    let report = installer.install(&v2::R1::default()).unwrap();
    assert!(!report.created);
    assert_eq!(db.ddl(), vec!["ALTER TABLE `r1` ADD COLUMN `age` INT DEFAULT 0"]);
    assert_eq!(report.statements_applied, 1);

    // The snapshot row was updated in place, not duplicated.
    assert_eq!(db.snapshots.borrow().len(), 1);
    let stored = Snapshot::from_json(&db.stored_scheme("r1").unwrap()).unwrap();
    assert_eq!(stored.get("age").unwrap().db_type, "INT");
}

#[test]
fn test_install_is_idempotent() {
    let db = FakeDatabase::new();
    let installer = installer(&db);

    installer.install(&v2::R1::default()).unwrap();
    db.clear_log();

    let report = installer.install(&v2::R1::default()).unwrap();
    assert_eq!(report.statements_applied, 0);
    assert!(db.ddl().is_empty());
    // Only the snapshot lookup ran.
    assert_eq!(db.calls.borrow().len(), 1);
}

#[test]
fn test_change_and_index_migration() {
    let db = FakeDatabase::new();
    let installer = installer(&db);
    installer.install(&v2::R1::default()).unwrap();
    db.clear_log();

    installer.install(&v3::R1::default()).unwrap();
    assert_eq!(
        db.ddl(),
        vec![
            "ALTER TABLE `r1` CHANGE `name` `name` VARCHAR(64) DEFAULT ''",
            "CREATE INDEX `name` ON `r1` (`name` ASC)",
            "ALTER TABLE `r1` CHANGE `age` `age` INT DEFAULT 7",
        ]
    );
}

#[test]
fn test_removed_fields_are_not_dropped() {
    let db = FakeDatabase::new();
    let installer = installer(&db);
    installer.install(&v2::R1::default()).unwrap();
    db.clear_log();

    let report = installer.install(&v1::R1::default()).unwrap();
    assert_eq!(report.statements_applied, 0);
    assert!(db.sql_log().iter().all(|sql| !sql.contains("DROP")));
}

#[test]
fn test_plan_is_a_dry_run() {
    let db = FakeDatabase::new();
    let installer = installer(&db);
    db.clear_log();

    let plan: InstallPlan = installer.plan(&Account::default()).unwrap();
    assert_eq!(plan.table, "account");
    assert_eq!(plan.state, TableState::Unregistered);
    assert_eq!(plan.statements.len(), 1);
    assert!(plan.statements[0].ends_with("PRIMARY KEY (id), INDEX `login` (`login` ASC))"));
    assert!(plan.to_sql().ends_with(");\n"));
    assert_eq!(plan.snapshot.len(), 4);

    assert!(db.ddl().is_empty());
    assert!(db.snapshots.borrow().is_empty());
}

#[test]
fn test_registered_state_carries_snapshot_id() {
    let db = FakeDatabase::new();
    let installer = installer(&db);
    installer.install(&v1::R1::default()).unwrap();

    let plan = installer.plan(&v2::R1::default()).unwrap();
    assert_eq!(plan.state, TableState::Registered { snapshot_id: 1 });
    let stored = installer.snapshot("r1").unwrap().unwrap();
    assert_eq!(stored.id, 1);
    assert_eq!(stored.table, "r1");
    assert!(stored.snapshot.get("name").is_some());
    assert!(installer.snapshot("absent").unwrap().is_none());
}

#[test]
fn test_failed_migration_still_records_snapshot() {
    let db = FakeDatabase::new();
    let installer = installer(&db);
    installer.install(&v1::R1::default()).unwrap();

    db.fail_on("ADD COLUMN");
    let err = installer.install(&v2::R1::default()).unwrap_err();
    assert!(err.driver_error::<FakeError>().is_some());

    // The new snapshot was written, so a re-run sees nothing to do.
    db.clear_failure();
    db.clear_log();
    let report = installer.install(&v2::R1::default()).unwrap();
    assert_eq!(report.statements_applied, 0);
    assert_eq!(db.snapshots.borrow().len(), 1);
}

#[test]
fn test_failed_create_registers_table() {
    let db = FakeDatabase::new();
    let installer = installer(&db);

    db.fail_on("CREATE TABLE IF NOT EXISTS `r1`");
    assert!(installer.install(&v1::R1::default()).is_err());
    assert!(db.stored_scheme("r1").is_some());
}

#[test]
fn test_failed_migration_without_snapshot_policy() {
    let db = FakeDatabase::new();
    let config = SchemaConfig {
        snapshot_on_failure: false,
        ..SchemaConfig::default()
    };
    let installer = Installer::new(&db, "", config).unwrap();
    installer.install(&v1::R1::default()).unwrap();

    db.fail_on("ADD COLUMN");
    assert!(installer.install(&v2::R1::default()).is_err());

    db.clear_failure();
    db.clear_log();
    let report = installer.install(&v2::R1::default()).unwrap();
    assert_eq!(report.statements_applied, 1);
    assert_eq!(db.ddl(), vec!["ALTER TABLE `r1` ADD COLUMN `age` INT DEFAULT 0"]);
}

#[test]
fn test_malformed_snapshot_reinstalls_columns() {
    let db = FakeDatabase::new();
    db.snapshots
        .borrow_mut()
        .push((1, "r1".to_string(), "{oops".to_string()));
    let installer = installer(&db);
    db.clear_log();

    let plan = installer.plan(&v2::R1::default()).unwrap();
    assert_eq!(
        plan.statements,
        vec![
            "ALTER TABLE `r1` ADD COLUMN `name` VARCHAR(32) DEFAULT ''",
            "ALTER TABLE `r1` ADD COLUMN `age` INT DEFAULT 0",
        ]
    );
}

#[test]
fn test_existing_deployment_snapshot_is_recognised() {
    let db = FakeDatabase::new();
    db.snapshots.borrow_mut().push((
        4,
        "r1".to_string(),
        r#"{"name":{"dbindex":"","dbtype":"VARCHAR(32)","dbvalue":"DEFAULT ''","name":"name"}}"#
            .to_string(),
    ));
    let installer = Installer::from_config(&db, &StoreConfig::default()).unwrap();

    let plan = installer.plan(&v2::R1::default()).unwrap();
    assert_eq!(plan.state, TableState::Registered { snapshot_id: 4 });
    assert_eq!(plan.statements, vec!["ALTER TABLE `r1` ADD COLUMN `age` INT DEFAULT 0"]);
    assert!(db.sql_log()[0].contains("FROM `__kk_go_scheme`"));
}

#[test]
fn test_count_rejects_non_integer_cell() {
    let db = FakeDatabase::new();
    db.push_rows(&["c"], vec![vec![Value::from("many")]]);
    let query = RecordQuery::new(&db, "").unwrap();

    let err = query.count(&Account::default(), "", &[]).unwrap_err();
    assert!(matches!(err, StoreError::FieldError { ref column, .. } if column == "c"));
}

#[test]
fn test_installer_from_config() {
    let db = FakeDatabase::new();
    let config = StoreConfig {
        prefix: "app_".into(),
        schema: SchemaConfig {
            auto_increment: Some(100),
            ..SchemaConfig::default()
        },
    };
    let installer = Installer::from_config(&db, &config).unwrap();
    installer.open().unwrap();
    installer.install(&v1::R1::default()).unwrap();

    assert!(db.ddl()[0].ends_with("PRIMARY KEY (id)) AUTO_INCREMENT = 100"));
    assert!(db.ddl()[0].contains("`app_r1`"));
    assert!(db.stored_scheme("app_r1").is_some());
}

#[test]
fn test_installer_rejects_bad_tracking_table() {
    let db = FakeDatabase::new();
    let config = SchemaConfig {
        tracking_table: String::new(),
        ..SchemaConfig::default()
    };
    assert!(matches!(
        Installer::new(&db, "", config),
        Err(StoreError::InvalidTableName(_))
    ));
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[test]
fn test_transaction_commits_on_success() {
    let mut db = FakeDatabase::new();
    let ids = transaction(&mut db, |tx| {
        let query = RecordQuery::new(tx, "")?;
        let mut first = account("a");
        first.set_id(1);
        let mut second = account("b");
        second.set_id(2);
        query.insert(&mut first)?;
        query.insert(&mut second)?;
        Ok(vec![first.id(), second.id()])
    })
    .unwrap();

    assert_eq!(ids, vec![1, 2]);
    assert_eq!(db.committed.get(), 1);
    assert_eq!(db.rolled_back.get(), 0);
    assert_eq!(db.calls.borrow().len(), 2);
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let mut db = FakeDatabase::new();
    db.fail_on("`login`=?");

    let result = transaction(&mut db, |tx| {
        let query = RecordQuery::new(tx, "")?;
        let mut record = account("a");
        record.set_id(1);
        query.insert(&mut record)?;
        query.update(&record)?;
        Ok(())
    });

    assert!(result.unwrap_err().driver_error::<FakeError>().is_some());
    assert_eq!(db.committed.get(), 0);
    assert_eq!(db.rolled_back.get(), 1);
    assert!(db.calls.borrow().is_empty());
}
