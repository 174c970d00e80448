use chrono::{DateTime, Utc};
use grade_processor::{database::db::DbClient, model::structures::event_kind::EventRef};
use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let db = TestDatabase {
            connection_string,
            _container: container
        };
        db.connect().await?.ensure_schema().await?;

        Ok(db)
    }

    pub async fn connect(&self) -> Result<DbClient, Box<dyn std::error::Error>> {
        Ok(DbClient::connect(&self.connection_string).await?)
    }

    pub async fn connect_pool(&self, size: usize) -> Result<DbClient, Box<dyn std::error::Error>> {
        Ok(DbClient::connect_pool(&self.connection_string, size).await?)
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("Database connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Inserts players with ids `1..=count`.
    pub async fn seed_players(&self, count: i32) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        for id in 1..=count {
            let username = format!("TestPlayer{}", id);
            client
                .execute("INSERT INTO players (id, username) VALUES ($1, $2)", &[&id, &username])
                .await?;
        }

        Ok(())
    }

    pub async fn add_participation(
        &self,
        player_id: i32,
        event: EventRef,
        started_at: DateTime<Utc>
    ) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;
        let kind = event.kind.to_string();

        client
            .execute(
                "INSERT INTO event_participants (player_id, event_kind, event_id, started_at) VALUES ($1, $2, $3, $4)",
                &[&player_id, &kind, &event.id, &started_at]
            )
            .await?;

        Ok(())
    }
}
