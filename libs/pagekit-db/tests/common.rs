#![allow(dead_code)]

use anyhow::Result;
use pagekit_db::{connect, DbConnConfig};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Schema, Set};

pub mod author {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod post {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "blog_posts")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        pub author_id: i64,
        pub title: String,
        pub category: String,
        pub published: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::author::Entity",
            from = "Column::AuthorId",
            to = "super::author::Column::Id"
        )]
        Author,
    }

    impl Related<super::author::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Author.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub const AUTHORS: [(i64, &str); 3] = [(1, "alice"), (2, "bob"), (3, "carol")];

/// Posts 1..=12: alice wrote 1-5, bob 6-9, carol 10-12. Odd ids are "rust",
/// even ids "sql". Posts 11 and 12 are drafts.
pub const POST_COUNT: i64 = 12;

fn author_of(post_id: i64) -> i64 {
    match post_id {
        1..=5 => 1,
        6..=9 => 2,
        _ => 3,
    }
}

pub async fn bring_up_sqlite() -> Result<DatabaseConnection> {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".into()),
        pool: None,
    };
    Ok(connect(&cfg).await?)
}

/// In-memory database with both tables created and seeded.
pub async fn setup() -> Result<DatabaseConnection> {
    let db = bring_up_sqlite().await?;
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(author::Entity)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(post::Entity)))
        .await?;

    for (id, name) in AUTHORS {
        author::ActiveModel {
            id: Set(id),
            name: Set(name.to_owned()),
        }
        .insert(&db)
        .await?;
    }
    for id in 1..=POST_COUNT {
        insert_post(&db, id).await?;
    }
    Ok(db)
}

pub async fn insert_post(db: &DatabaseConnection, id: i64) -> Result<()> {
    post::ActiveModel {
        id: Set(id),
        author_id: Set(author_of(id)),
        title: Set(format!("post {id:02}")),
        category: Set(if id % 2 == 1 { "rust" } else { "sql" }.to_owned()),
        published: Set(id <= 10),
    }
    .insert(db)
    .await?;
    Ok(())
}
