// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{GameDislikes, GameTally};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn add_dislikes(&self, game_id: &str, increment: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::add_dislikes(&conn, game_id, increment)
    }

    async fn add_reaction(&self, game_id: &str, emoji: &str, increment: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::add_reaction(&conn, game_id, emoji, increment)
    }

    async fn get_tally(&self, game_id: &str) -> Result<GameTally> {
        let conn = self.conn.lock().await;
        super::queries::get_tally(&conn, game_id)
    }

    async fn top_disliked(&self, limit: u32) -> Result<Vec<GameDislikes>> {
        let conn = self.conn.lock().await;
        super::queries::top_disliked(&conn, limit)
    }
}
