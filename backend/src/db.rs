use crate::errors::ApiError;
use chrono::{DateTime, Utc};
use fhe_kyc::address::checksum;
use fhe_kyc::controller::SubmissionOutcome;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;

pub type Db = Pool<Sqlite>;

/// One confirmed `submitKYC` call. Only ciphertext handles and the proof are kept.
#[derive(Debug)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub contract_address: String,
    pub chain_id: u64,
    pub tx_hash: String,
    pub block_number: u64,
    pub age_handle: String,
    pub nationality_handle: String,
    pub doc_type_handle: String,
    pub input_proof: String,
}

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|_| ApiError::Internal)
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS submissions (
  id TEXT PRIMARY KEY,
  created_at TEXT NOT NULL,
  user_address TEXT NOT NULL,
  contract_address TEXT NOT NULL,
  chain_id INTEGER NOT NULL,
  tx_hash TEXT NOT NULL UNIQUE,
  block_number INTEGER NOT NULL,
  age_handle TEXT NOT NULL,
  nationality_handle TEXT NOT NULL,
  doc_type_handle TEXT NOT NULL,
  input_proof TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_by_user ON submissions (user_address, block_number);
"#,
    )
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn insert_submission(db: &Db, outcome: &SubmissionOutcome) -> Result<Uuid, ApiError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO submissions
           (id, created_at, user_address, contract_address, chain_id, tx_hash, block_number,
            age_handle, nationality_handle, doc_type_handle, input_proof)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id.to_string())
    .bind(created_at)
    .bind(checksum(&outcome.user))
    .bind(checksum(&outcome.contract))
    .bind(outcome.chain_id as i64)
    .bind(outcome.receipt.tx_hash.to_string())
    .bind(outcome.receipt.block_number as i64)
    .bind(&outcome.encrypted.age_handle)
    .bind(&outcome.encrypted.nationality_handle)
    .bind(&outcome.encrypted.doc_type_handle)
    .bind(&outcome.encrypted.proof)
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(id)
}

/// Submissions from `user_address` (checksummed), oldest first.
pub async fn list_submissions(db: &Db, user_address: &str) -> Result<Vec<SubmissionRow>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT id, created_at, contract_address, chain_id, tx_hash, block_number,
                  age_handle, nationality_handle, doc_type_handle, input_proof
           FROM submissions
           WHERE user_address = ?
           ORDER BY block_number"#,
    )
    .bind(user_address)
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get(0);
        let created_at: String = row.get(1);
        let chain_id: i64 = row.get(3);
        let block_number: i64 = row.get(5);

        out.push(SubmissionRow {
            id: Uuid::parse_str(&id).map_err(|_| ApiError::Internal)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|_| ApiError::Internal)?
                .with_timezone(&Utc),
            contract_address: row.get(2),
            chain_id: chain_id as u64,
            tx_hash: row.get(4),
            block_number: block_number as u64,
            age_handle: row.get(6),
            nationality_handle: row.get(7),
            doc_type_handle: row.get(8),
            input_proof: row.get(9),
        });
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) async fn memory() -> Db {
    // One connection: every `:memory:` connection is its own database.
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&db).await.unwrap();
    db
}
