use std::{thread::sleep, time::Duration};

use clap::Parser;
use diesel::result::Error as DieselError;
use diesel::{Connection, ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl, SelectableHelper};
use dotenvy::dotenv;
use foodtruck_order_service::models::Outbox;
use foodtruck_order_service::{schema, Database};
use kafka::client::RequiredAcks;
use kafka::producer::{Producer, Record};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Relays outbox rows to Kafka, one row per transaction.
#[derive(Parser, Debug)]
#[command(name = "producer")]
struct Config {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    #[arg(long, env = "KAFKA_URL")]
    kafka_url: String,
    /// Seconds to wait when the outbox is empty or a send failed.
    #[arg(long, env = "OUTBOX_POLL_INTERVAL", default_value_t = 1)]
    poll_interval: u64,
}

struct OutboxProcessor {
    kafka: Producer,
}

impl OutboxProcessor {
    fn process_next_outbox_row(
        &mut self,
        conn: &mut PgConnection,
    ) -> Result<bool, OutboxProcessingError> {
        use schema::outbox::dsl::*;

        conn.transaction::<_, OutboxProcessingError, _>(|conn| {
            let row = match outbox
                .select(Outbox::as_select())
                .order(id.asc())
                .for_update()
                .skip_locked()
                .first::<Outbox>(conn)
            {
                Ok(row) => row,
                Err(DieselError::NotFound) => return Ok(false),
                Err(err) => return Err(err.into()),
            };

            self.send_message(&row)?;
            diesel::delete(outbox.filter(id.eq(row.id))).execute(conn)?;
            debug!(outbox_id = row.id, topic = %row.topic, key = %row.key, "outbox row relayed");

            Ok(true)
        })
    }

    fn send_message(&mut self, row: &Outbox) -> Result<(), kafka::Error> {
        self.kafka.send(&Record::from_key_value(
            &row.topic,
            row.key.clone(),
            row.value.clone(),
        ))
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = Config::parse();

    let conn = &mut Database::new(config.database_url).connect()?;
    let producer = Producer::from_hosts(vec![config.kafka_url])
        .with_ack_timeout(Duration::from_secs(1))
        .with_required_acks(RequiredAcks::One)
        .create()?;
    info!("outbox relay started");

    let mut outbox_processor = OutboxProcessor { kafka: producer };
    let idle = Duration::from_secs(config.poll_interval);

    loop {
        match outbox_processor.process_next_outbox_row(conn) {
            Ok(true) => {}
            Ok(false) => sleep(idle),
            Err(err) => {
                error!(%err, "cannot relay outbox row");
                sleep(idle);
            }
        }
    }
}

#[derive(Error, Debug)]
enum OutboxProcessingError {
    #[error("database: {0}")]
    Database(#[from] DieselError),
    #[error("kafka: {0}")]
    Kafka(#[from] kafka::Error),
}
