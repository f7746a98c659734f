use tablewright::{Backend, Entity, Error, FieldMeta, SchemaBuilder, SchemaCompiler, TableModel, TypeTag};

// Declared through tuple selectors only, so it carries no field metadata.
struct Wide;

impl Entity for Wide {
    fn type_name() -> &'static str {
        "Wide"
    }

    fn fields() -> Vec<FieldMeta> {
        Vec::new()
    }
}

#[derive(Entity)]
#[schema(table = "Accounts")]
struct Account {
    #[schema(key)]
    id: i32,
    #[schema(unique, max_length = 128)]
    email: String,
}

#[derive(Entity)]
struct Contact {
    #[schema(unique)]
    phone: String,
    #[schema(unique)]
    email: String,
    #[schema(unique)]
    handle: String,
    notes: Option<String>,
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn quote(backend: Backend, name: &str) -> String {
    match backend {
        Backend::MySql => format!("`{}`", name),
        Backend::SqlServer | Backend::Sqlite => format!("[{}]", name),
    }
}

fn compile(backend: Backend, tables: &[TableModel]) -> Result<Vec<String>, Error> {
    SchemaCompiler::new(backend.generator()).compile(tables)
}

fn column_name(tag: TypeTag) -> String {
    format!("C_{}", tag)
}

fn wide_table(skip: &[TypeTag]) -> Vec<TableModel> {
    let mut schema = SchemaBuilder::new();
    let wide = schema.define_table::<Wide>();
    for tag in TypeTag::ALL.into_iter().filter(|tag| !skip.contains(tag)) {
        let member = column_name(tag);
        schema.with_column(wide, (member.as_str(), tag), |_| {}).unwrap();
    }
    schema.build()
}

fn is_balanced(sql: &str) -> bool {
    let mut depth = 0i32;
    for c in sql.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

#[test]
fn test_every_universal_type_appears_exactly_once() {
    init_logger();

    for backend in Backend::ALL {
        let skip = match backend {
            Backend::MySql => vec![TypeTag::VarNumeric],
            _ => vec![],
        };
        let statements = compile(backend, &wide_table(&skip)).unwrap();
        assert_eq!(statements.len(), 1, "{}", backend);

        let sql = &statements[0];
        for tag in TypeTag::ALL.into_iter().filter(|tag| !skip.contains(tag)) {
            let quoted = quote(backend, &column_name(tag));
            assert_eq!(sql.matches(&quoted).count(), 1, "{} in {}: {}", quoted, backend, sql);
        }
        assert!(is_balanced(sql), "{}", sql);
    }
}

#[test]
fn test_variable_numeric_is_rejected_only_by_mysql() {
    init_logger();
    let tables = wide_table(&[]);

    let err = compile(Backend::MySql, &tables).unwrap_err();
    match err {
        Error::UnsupportedType { dialect, table, column, type_name } => {
            assert_eq!(dialect, "MySql");
            assert_eq!(table, "Wide");
            assert_eq!(column, "C_VarNumeric");
            assert_eq!(type_name, "VarNumeric");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(compile(Backend::SqlServer, &tables).is_ok());
    assert!(compile(Backend::Sqlite, &tables).is_ok());
}

#[test]
fn test_identity_key_with_unique_email() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let accounts = schema.define_table::<Account>();
    schema
        .with_column(accounts, account_fields::ID, |c| {
            c.auto_increment(1, 1);
        })
        .unwrap();
    schema
        .with_column(accounts, account_fields::EMAIL, |c| {
            c.allow_null(false);
        })
        .unwrap();
    let tables = schema.build();

    for backend in Backend::ALL {
        let statements = compile(backend, &tables).unwrap();
        assert_eq!(statements.len(), 1);

        let sql = &statements[0];
        assert!(is_balanced(sql), "{}", sql);
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1, "{}", sql);
        assert_eq!(sql.matches("UNIQUE(").count(), 1, "{}", sql);
        assert!(sql.contains(&format!("UNIQUE({})", quote(backend, "email"))), "{}", sql);
    }

    let sql = &compile(Backend::SqlServer, &tables).unwrap()[0];
    assert_eq!(
        sql,
        "IF OBJECT_ID(N'[Accounts]', N'U') IS NULL CREATE TABLE [Accounts] \
         ([id] INT PRIMARY KEY NOT NULL IDENTITY(1,1), [email] NVARCHAR(128) NOT NULL, UNIQUE([email]))"
    );
}

#[test]
fn test_primary_key_is_never_bare_not_null() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let accounts = schema.define_table::<Account>();
    schema.with_entity_columns(accounts).unwrap();
    let tables = schema.build();

    for backend in Backend::ALL {
        let sql = &compile(backend, &tables).unwrap()[0];
        let id = quote(backend, "id");
        let definition = sql
            .split(", ")
            .find(|part| part.contains(&id))
            .unwrap_or_else(|| panic!("no id column in {}", sql));
        assert!(definition.contains("PRIMARY KEY"), "{}", definition);
    }
}

#[test]
fn test_unique_columns_share_one_constraint() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let contacts = schema.define_table::<Contact>();
    schema.with_entity_columns(contacts).unwrap();
    let tables = schema.build();

    for backend in Backend::ALL {
        let sql = &compile(backend, &tables).unwrap()[0];
        let expected = format!(
            "UNIQUE({}, {}, {})",
            quote(backend, "phone"),
            quote(backend, "email"),
            quote(backend, "handle")
        );
        assert_eq!(sql.matches("UNIQUE").count(), 1, "{}", sql);
        assert!(sql.contains(&expected), "{}", sql);
    }
}

#[test]
fn test_generation_is_repeatable_and_guarded() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let accounts = schema.define_table::<Account>();
    schema.with_entity_columns(accounts).unwrap();
    let tables = schema.build();

    for backend in Backend::ALL {
        let first = compile(backend, &tables).unwrap();
        let second = compile(backend, &tables).unwrap();
        assert_eq!(first, second);

        let sql = &first[0];
        match backend {
            Backend::SqlServer => assert!(sql.starts_with("IF OBJECT_ID(N'[Accounts]', N'U') IS NULL"), "{}", sql),
            _ => assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"), "{}", sql),
        }
    }
}

#[test]
fn test_oversized_string_falls_back_to_unbounded() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let wide = schema.define_table::<Wide>();
    schema
        .with_column(wide, ("Body", TypeTag::String), |c| {
            c.max_length(10_000);
        })
        .unwrap();
    schema
        .with_column(wide, ("Blob", TypeTag::Binary), |c| {
            c.max_length(100_000);
        })
        .unwrap();
    let tables = schema.build();

    let sqlserver = &compile(Backend::SqlServer, &tables).unwrap()[0];
    assert!(sqlserver.contains("[Body] NVARCHAR(MAX)"), "{}", sqlserver);
    assert!(sqlserver.contains("[Blob] VARBINARY(MAX)"), "{}", sqlserver);

    let mysql = &compile(Backend::MySql, &tables).unwrap()[0];
    assert!(mysql.contains("`Body` VARCHAR(10000)"), "{}", mysql);
    assert!(mysql.contains("`Blob` LONGBLOB"), "{}", mysql);

    let sqlite = &compile(Backend::Sqlite, &tables).unwrap()[0];
    assert!(sqlite.contains("[Body] NVARCHAR(10000)"), "{}", sqlite);
}

#[test]
fn test_compile_preserves_table_order() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let contacts = schema.define_table::<Contact>();
    schema.with_entity_columns(contacts).unwrap();
    let accounts = schema.define_table::<Account>();
    schema.with_entity_columns(accounts).unwrap();

    let statements = compile(Backend::Sqlite, schema.tables()).unwrap();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("[Contact]"));
    assert!(statements[1].contains("[Accounts]"));
}

#[test]
fn test_unsized_key_columns_get_indexable_types() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let wide = schema.define_table::<Wide>();
    schema
        .with_column(wide, ("Code", TypeTag::String), |c| {
            c.primary_key();
        })
        .unwrap();
    schema
        .with_column(wide, ("Email", TypeTag::String), |c| {
            c.unique();
        })
        .unwrap();
    schema
        .with_column(wide, ("Digest", TypeTag::Binary), |c| {
            c.unique();
        })
        .unwrap();
    let tables = schema.build();

    let sqlserver = &compile(Backend::SqlServer, &tables).unwrap()[0];
    assert!(sqlserver.contains("[Code] NVARCHAR(450) PRIMARY KEY NOT NULL"), "{}", sqlserver);
    assert!(sqlserver.contains("[Email] NVARCHAR(450)"), "{}", sqlserver);
    assert!(sqlserver.contains("[Digest] VARBINARY(900)"), "{}", sqlserver);
    assert!(!sqlserver.contains("MAX"), "{}", sqlserver);

    let mysql = &compile(Backend::MySql, &tables).unwrap()[0];
    assert!(mysql.contains("`Code` VARCHAR(255) PRIMARY KEY NOT NULL"), "{}", mysql);
    assert!(mysql.contains("`Email` VARCHAR(255)"), "{}", mysql);
    assert!(mysql.contains("`Digest` VARBINARY(255)"), "{}", mysql);
    assert!(!mysql.contains("LONG"), "{}", mysql);

    let sqlite = &compile(Backend::Sqlite, &tables).unwrap()[0];
    assert!(sqlite.contains("[Code] TEXT PRIMARY KEY NOT NULL"), "{}", sqlite);
}

#[test]
fn test_key_longer_than_index_limit_is_rejected() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let wide = schema.define_table::<Wide>();
    schema
        .with_column(wide, ("Email", TypeTag::String), |c| {
            c.unique().max_length(1000);
        })
        .unwrap();
    let tables = schema.build();

    match compile(Backend::MySql, &tables).unwrap_err() {
        Error::UnsupportedType { dialect, column, type_name, .. } => {
            assert_eq!(dialect, "MySql");
            assert_eq!(column, "Email");
            assert_eq!(type_name, "String(1000) as key");
        }
        other => panic!("unexpected error: {other}"),
    }

    let sqlserver = &compile(Backend::SqlServer, &tables).unwrap()[0];
    assert!(sqlserver.contains("[Email] NVARCHAR(1000)"), "{}", sqlserver);

    // Above the inline threshold a key never falls back to NVARCHAR(MAX).
    let mut tables = tables;
    tables[0].columns[0].max_length = Some(5000);
    assert!(matches!(compile(Backend::SqlServer, &tables), Err(Error::UnsupportedType { .. })));
}

#[test]
fn test_nullable_default_emits_type_only() {
    init_logger();

    let mut schema = SchemaBuilder::new();
    let wide = schema.define_table::<Wide>();
    schema
        .with_column(wide, ("Age", TypeTag::Int32), |c| {
            c.default_value("18");
        })
        .unwrap();
    schema
        .with_column(wide, ("Score", TypeTag::Int32), |c| {
            c.allow_null(false).default_value("0");
        })
        .unwrap();
    let tables = schema.build();

    for backend in Backend::ALL {
        let sql = &compile(backend, &tables).unwrap()[0];
        let definition = |name: &str| {
            let quoted = quote(backend, name);
            sql.split(", ")
                .find(|part| part.contains(&quoted))
                .unwrap_or_else(|| panic!("no {} column in {}", name, sql))
                .to_string()
        };

        let age = definition("Age");
        assert!(!age.contains("DEFAULT"), "{}", age);
        assert!(!age.contains("NOT NULL"), "{}", age);

        let score = definition("Score");
        assert!(score.contains("DEFAULT 0"), "{}", score);
        assert!(!score.contains("NOT NULL"), "{}", score);
    }
}
