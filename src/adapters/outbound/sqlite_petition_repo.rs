//! SQLite Petition Repository

use crate::adapters::outbound::sqlite_store::SqliteStore;
use crate::domain::entities::{Petition, PetitionId, Stance, UserId};
use crate::domain::error::StoreResult;
use crate::domain::ports::PetitionRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

const PETITION_SELECT: &str = "SELECT p.id, p.movie_name, p.created_by, u.username, p.created_at,
        (SELECT COUNT(*) FROM petition_stances s WHERE s.petition_id = p.id AND s.stance = 'vote'),
        (SELECT COUNT(*) FROM petition_stances s WHERE s.petition_id = p.id AND s.stance = 'dislike')
     FROM petitions p JOIN users u ON u.id = p.created_by";

fn petition_from_row(row: &Row<'_>) -> rusqlite::Result<Petition> {
    let votes: i64 = row.get(5)?;
    let dislikes: i64 = row.get(6)?;
    Ok(Petition {
        id: row.get(0)?,
        movie_name: row.get(1)?,
        created_by: row.get(2)?,
        created_by_name: row.get(3)?,
        created_at: row.get(4)?,
        vote_count: votes.max(0) as usize,
        dislike_count: dislikes.max(0) as usize,
    })
}

fn stance_to_sql(stance: Stance) -> &'static str {
    match stance {
        Stance::Vote => "vote",
        Stance::Dislike => "dislike",
    }
}

fn stance_from_sql(value: &str) -> Option<Stance> {
    match value {
        "vote" => Some(Stance::Vote),
        "dislike" => Some(Stance::Dislike),
        _ => None,
    }
}

#[async_trait]
impl PetitionRepository for SqliteStore {
    async fn list_petitions(&self) -> StoreResult<Vec<Petition>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY p.created_at DESC, p.id DESC",
                PETITION_SELECT
            ))?;
            let rows = stmt.query_map([], petition_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn get_petition(&self, id: PetitionId) -> StoreResult<Option<Petition>> {
        self.call(move |conn| {
            conn.query_row(
                &format!("{} WHERE p.id = ?1", PETITION_SELECT),
                params![id],
                petition_from_row,
            )
            .optional()
        })
        .await
    }

    async fn insert_petition(&self, movie_name: &str, created_by: UserId) -> StoreResult<Petition> {
        let movie_name = movie_name.to_string();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO petitions (movie_name, created_by, created_at) VALUES (?1, ?2, ?3)",
                params![movie_name, created_by, Utc::now()],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("{} WHERE p.id = ?1", PETITION_SELECT),
                params![id],
                petition_from_row,
            )
        })
        .await
    }

    async fn stance(&self, id: PetitionId, user_id: UserId) -> StoreResult<Option<Stance>> {
        self.call(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT stance FROM petition_stances WHERE petition_id = ?1 AND user_id = ?2",
                    params![id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw.as_deref().and_then(stance_from_sql))
        })
        .await
    }

    async fn set_stance(
        &self,
        id: PetitionId,
        user_id: UserId,
        stance: Option<Stance>,
    ) -> StoreResult<()> {
        self.call(move |conn| {
            match stance {
                Some(stance) => conn.execute(
                    "INSERT INTO petition_stances (petition_id, user_id, stance) VALUES (?1, ?2, ?3)
                     ON CONFLICT (petition_id, user_id) DO UPDATE SET stance = excluded.stance",
                    params![id, user_id, stance_to_sql(stance)],
                )?,
                None => conn.execute(
                    "DELETE FROM petition_stances WHERE petition_id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?,
            };
            Ok(())
        })
        .await
    }
}
