mod libsql {
    use libsql_migrate::{
        error::Kind, libsql::Builder, Direction, Driver, DriverConfig, LibsqlDriver, Migrations,
        Migrator, SchemaState,
    };
    use std::path::Path;

    const DEFAULT_TABLE_NAME: &str = "schema_migrations";
    const LAST_VERSION: u64 = 1285849751;

    mod embedded {
        use libsql_migrate::embed_migrations;
        embed_migrations!("./tests/migrations");
    }

    mod broken {
        use libsql_migrate::embed_migrations;
        embed_migrations!("./tests/migrations_broken");
    }

    mod explicit_tx {
        use libsql_migrate::embed_migrations;
        embed_migrations!("./tests/migrations_explicit_tx");
    }

    fn address(path: &Path) -> String {
        format!("libsql://file:{}", path.display())
    }

    async fn table_exists(driver: &LibsqlDriver, table: &str) -> bool {
        let mut rows = driver
            .connection()
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    // exercises every driver operation in the order a migration cycle uses them,
    // dropping last as it clears the database
    async fn exercise_driver(driver: &mut LibsqlDriver, migration: &str) {
        assert_eq!(SchemaState::default(), driver.version().await.unwrap());

        driver.lock().await.unwrap();
        assert!(matches!(driver.lock().await.unwrap_err().kind(), Kind::Locked));
        driver.unlock().await.unwrap();
        assert!(matches!(
            driver.unlock().await.unwrap_err().kind(),
            Kind::NotLocked
        ));
        driver.lock().await.unwrap();
        driver.unlock().await.unwrap();

        driver.run(migration).await.unwrap();

        for (version, dirty) in [
            (Some(1), true),
            (Some(1), false),
            (None, true),
            (Some(2), false),
            (Some(u64::from(u32::MAX) + 1), true),
            (None, false),
        ] {
            driver.set_version(version, dirty).await.unwrap();
            assert_eq!(
                SchemaState { version, dirty },
                driver.version().await.unwrap()
            );
        }

        driver.drop_all().await.unwrap();
        assert!(!table_exists(driver, "t").await);
    }

    #[tokio::test]
    async fn opens_file_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");

        let mut driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        assert!(!driver.config().no_tx_wrap);
        assert_eq!(DEFAULT_TABLE_NAME, driver.config().migrations_table);
        exercise_driver(&mut driver, "CREATE TABLE t (Qty int, Name string);").await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn opens_memory_address() {
        let mut driver = LibsqlDriver::open("libsql://:memory:").await.unwrap();
        exercise_driver(&mut driver, "CREATE TABLE t (Qty int, Name string);").await;
    }

    #[tokio::test]
    async fn migrates_with_instance() {
        let dir = tempfile::tempdir().unwrap();
        let db = Builder::new_local(dir.path().join("libsql.db"))
            .build()
            .await
            .unwrap();
        let conn = db.connect().unwrap();

        let driver = LibsqlDriver::with_instance(conn, DriverConfig::default())
            .await
            .unwrap();
        let migrations = Migrations::from_dir("./tests/migrations").unwrap();
        let mut migrator = Migrator::new(migrations, driver);

        let report = migrator.up().await.unwrap();
        assert_eq!(3, report.steps().len());
        assert_eq!(
            SchemaState {
                version: Some(LAST_VERSION),
                dirty: false
            },
            migrator.version().await.unwrap()
        );
        assert!(table_exists(migrator.driver(), "posts").await);

        let report = migrator.down().await.unwrap();
        assert_eq!(3, report.steps().len());
        assert!(report
            .steps()
            .iter()
            .all(|step| step.direction() == Direction::Down));
        assert_eq!(SchemaState::default(), migrator.version().await.unwrap());
        assert!(!table_exists(migrator.driver(), "users").await);
    }

    #[tokio::test]
    async fn tracks_migrations_in_custom_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = Builder::new_local(dir.path().join("libsql.db"))
            .build()
            .await
            .unwrap();
        let conn = db.connect().unwrap();

        let config = DriverConfig::new().set_migrations_table("my_migration_table");
        let driver = LibsqlDriver::with_instance(conn, config).await.unwrap();
        let mut migrator = Migrator::new(embedded::migrations::source(), driver);
        migrator.up().await.unwrap();

        let mut rows = migrator
            .driver()
            .connection()
            .query("SELECT * FROM my_migration_table", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let version: i64 = row.get(0).unwrap();
        assert_eq!(LAST_VERSION as i64, version);
        assert!(!table_exists(migrator.driver(), DEFAULT_TABLE_NAME).await);
    }

    #[tokio::test]
    async fn reads_migrations_table_from_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");
        let driver = LibsqlDriver::open(&format!(
            "{}?x-migrations-table=my_migration_table",
            address(&path)
        ))
        .await
        .unwrap();

        assert_eq!("my_migration_table", driver.config().migrations_table);
        assert!(table_exists(&driver, "my_migration_table").await);
    }

    #[tokio::test]
    async fn runs_explicit_transactions_without_tx_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");
        let mut driver = LibsqlDriver::open(&format!("{}?x-no-tx-wrap=true", address(&path)))
            .await
            .unwrap();
        assert!(driver.config().no_tx_wrap);

        exercise_driver(
            &mut driver,
            "BEGIN; CREATE TABLE t (Qty int, Name string); COMMIT;",
        )
        .await;
    }

    #[tokio::test]
    async fn explicit_transaction_fails_when_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");
        let mut driver = LibsqlDriver::open(&address(&path)).await.unwrap();

        let err = driver
            .run("BEGIN; CREATE TABLE t (Qty int, Name string); COMMIT;")
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), Kind::Execution { .. }));
        assert!(!table_exists(&driver, "t").await);
    }

    #[tokio::test]
    async fn migrates_explicit_transactions_without_tx_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");

        let driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        let mut migrator = Migrator::new(explicit_tx::migrations::source(), driver);
        assert!(migrator.up().await.is_err());
        assert_eq!(
            SchemaState {
                version: Some(1),
                dirty: true
            },
            migrator.version().await.unwrap()
        );
        migrator.force(None).await.unwrap();
        drop(migrator);

        let driver = LibsqlDriver::open(&format!("{}?x-no-tx-wrap=1", address(&path)))
            .await
            .unwrap();
        let mut migrator = Migrator::new(explicit_tx::migrations::source(), driver);
        migrator.up().await.unwrap();
        assert!(table_exists(migrator.driver(), "orders").await);
    }

    #[tokio::test]
    async fn rejects_invalid_no_tx_wrap_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");

        let result = LibsqlDriver::open(&format!("{}?x-no-tx-wrap=yeppers", address(&path))).await;
        let err = match result {
            Ok(_) => panic!("x-no-tx-wrap=yeppers must be rejected"),
            Err(err) => err,
        };
        let msg = err.to_string();
        assert!(msg.contains("x-no-tx-wrap"));
        assert!(msg.contains("invalid syntax"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn migrates_with_whitespace_in_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let spaced = dir.path().join("dir with spaces");
        std::fs::create_dir(&spaced).unwrap();
        let path = spaced.join("libsql.db");

        let mut driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        exercise_driver(&mut driver, "CREATE TABLE t (Qty int, Name string);").await;
        assert!(path.exists());

        let driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        let mut migrator = Migrator::new(embedded::migrations::source(), driver);
        migrator.up().await.unwrap();
        assert!(table_exists(migrator.driver(), "users").await);
    }

    #[tokio::test]
    async fn keeps_version_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libsql.db");

        let driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        let mut migrator = Migrator::new(embedded::migrations::source(), driver);
        migrator.steps(2).await.unwrap();
        drop(migrator);

        let driver = LibsqlDriver::open(&address(&path)).await.unwrap();
        let mut migrator = Migrator::new(embedded::migrations::source(), driver);
        let report = migrator.up().await.unwrap();
        assert_eq!(1, report.steps().len());
        assert_eq!(LAST_VERSION, report.steps()[0].version());
        assert_eq!("create_posts_table", report.steps()[0].identifier());
    }

    #[tokio::test]
    async fn updates_to_last_working_version() {
        let driver = LibsqlDriver::open("libsql://:memory:").await.unwrap();
        let mut migrator = Migrator::new(broken::migrations::source(), driver);

        let err = migrator.up().await.unwrap_err();
        let applied = err.report().unwrap().steps();
        assert_eq!(1, applied.len());
        assert_eq!(1, applied[0].version());
        assert_eq!("create_users", applied[0].identifier());
        assert_eq!(
            SchemaState {
                version: Some(2),
                dirty: true
            },
            migrator.version().await.unwrap()
        );

        let err = migrator.up().await.unwrap_err();
        assert!(matches!(err.kind(), Kind::Dirty(Some(2))));
        assert!(!table_exists(migrator.driver(), "posts").await);
    }
}
