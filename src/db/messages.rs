use rusqlite::{params, Row};

use crate::error::Result;
use crate::models::{Message, Role};

use super::repository::{new_id, timestamp, Repository};

impl Repository {
    /// The most recent `limit` messages, oldest first.
    pub async fn recent_messages(&self, limit: u32) -> Result<Vec<Message>> {
        let messages = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, role, content, created_at FROM messages ORDER BY rowid DESC LIMIT ?1",
                )?;
                let mut messages = stmt
                    .query_map(params![limit], message_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                messages.reverse();
                Ok(messages)
            })
            .await?;
        Ok(messages)
    }

    pub async fn create_message(&self, role: Role, content: String) -> Result<Message> {
        let message = self
            .conn
            .call(move |conn| {
                let id = new_id();
                conn.execute(
                    "INSERT INTO messages (id, role, content) VALUES (?1, ?2, ?3)",
                    params![id, role.as_str(), content],
                )?;
                Ok(conn.query_row(
                    "SELECT id, role, content, created_at FROM messages WHERE id = ?1",
                    params![id],
                    message_from_row,
                )?)
            })
            .await?;
        Ok(message)
    }

    pub async fn delete_all_messages(&self) -> Result<usize> {
        let deleted = self
            .conn
            .call(|conn| Ok(conn.execute("DELETE FROM messages", [])?))
            .await?;
        Ok(deleted)
    }
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    let role: String = row.get(1)?;
    Ok(Message {
        id: row.get(0)?,
        role: role.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?,
        content: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recent_messages_are_chronological_tail() {
        let repo = Repository::open_in_memory().await.unwrap();
        for i in 0..5 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            repo.create_message(role, format!("m{i}")).await.unwrap();
        }

        let recent = repo.recent_messages(3).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert_eq!(recent[1].role, Role::Assistant);

        assert_eq!(repo.delete_all_messages().await.unwrap(), 5);
        assert!(repo.recent_messages(10).await.unwrap().is_empty());
    }
}
