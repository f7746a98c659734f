use chrono::{DateTime, Utc};
use tablewright::{Backend, Database, Entity, ProviderBinder, SchemaBuilder, SchemaCompiler, SqlxProvider};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Entity, Debug, Clone)]
#[schema(table = "Users")]
struct User {
    #[schema(key)]
    id: i32,
    #[schema(unique, max_length = 50)]
    username: String,
    age: Option<i32>,
    created_at: DateTime<Utc>,
    #[schema(row_version)]
    version: Vec<u8>,
}

#[derive(Entity, Debug, Clone)]
struct Post {
    #[schema(key)]
    id: Uuid,
    #[schema(column = "AuthorId")]
    user_id: i32,
    #[schema(max_length = 200)]
    title: String,
    content: String,
    price: f64,
}

fn declare_schema() -> Result<SchemaBuilder, Box<dyn std::error::Error>> {
    let mut schema = SchemaBuilder::new();

    let users = schema.define_table::<User>();
    schema.with_column(users, user_fields::ID, |c| {
        c.auto_increment(1000, 1);
    })?;
    schema.with_column(users, user_fields::USERNAME, |c| {
        c.allow_null(false);
    })?;
    schema.with_column(users, user_fields::AGE, |c| {
        c.default_value("18");
    })?;
    schema.with_column(users, user_fields::CREATED_AT, |_| {})?;
    schema.with_column(users, user_fields::VERSION, |_| {})?;

    let posts = schema.define_table::<Post>();
    for member in ["id", "user_id", "title", "content"] {
        schema.with_column(posts, member, |_| {})?;
    }
    // Cast member access: store the price as an exact decimal.
    schema.with_column(posts, "price as Decimal", |c| {
        c.allow_null(false).default_value("0");
    })?;

    Ok(schema)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let schema = declare_schema()?;

    for backend in Backend::ALL {
        println!("-- {}", backend);
        match SchemaCompiler::new(backend.generator()).compile(schema.tables()) {
            Ok(statements) => {
                for statement in statements {
                    println!("{};", statement);
                }
            }
            Err(e) => println!("-- skipped: {}", e),
        }
        println!();
    }

    println!("{}", serde_json::to_string_pretty(schema.tables())?);

    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        log::info!("DATABASE_URL not set, skipping migration");
        return Ok(());
    };

    let binder = ProviderBinder::bind(SqlxProvider::new(&database_url));
    let db = Database::bind(&binder).await?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let report = db.migrator().register(schema.build()).run_until_cancelled(&cancel).await?;
    println!("Migration executed {} statements, {} pending", report.executed, report.pending);

    for table in ["Users", "Post"] {
        if db.table_exists(table).await? {
            println!("{}: {:?}", table, db.table_columns(table).await?);
        }
    }

    Ok(())
}
