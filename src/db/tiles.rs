use rusqlite::{params, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{FilterMode, NewTile, Tile, TileUpdate};

use super::repository::{
    flag, json_list, json_text, new_id, timestamp, update_fields, Repository,
};

const TILE_COLUMNS: &str = "id, type, content, source, tags, read, starred, archived, pinned, saved_for_later, reactions, created_at, updated_at";

const SEARCH_LIMIT: i64 = 50;

impl Repository {
    /// Tiles selected by `mode`, optionally restricted to one type. Pinned
    /// tiles sort first, then newest.
    pub async fn list_tiles(&self, tile_type: Option<String>, mode: FilterMode) -> Result<Vec<Tile>> {
        let tiles = self
            .conn
            .call(move |conn| {
                let type_clause = if tile_type.is_some() { " AND type = ?1" } else { "" };
                let sql = format!(
                    "SELECT {} FROM tiles WHERE {}{} ORDER BY pinned DESC, created_at DESC, rowid DESC",
                    TILE_COLUMNS,
                    mode.where_clause(),
                    type_clause
                );
                let mut stmt = conn.prepare(&sql)?;
                let tiles = stmt
                    .query_map(rusqlite::params_from_iter(tile_type), tile_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(tiles)
            })
            .await?;
        Ok(tiles)
    }

    /// Free-text search over content, tags and type of non-archived tiles.
    pub async fn search_tiles(&self, query: &str) -> Result<Vec<Tile>> {
        let pattern = format!("%{}%", query);
        let tiles = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {} FROM tiles
                       WHERE archived = 0
                       AND (content LIKE ?1 OR tags LIKE ?1 OR type LIKE ?1)
                       ORDER BY created_at DESC, rowid DESC
                       LIMIT ?2"#,
                    TILE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let tiles = stmt
                    .query_map(params![pattern, SEARCH_LIMIT], tile_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(tiles)
            })
            .await?;
        Ok(tiles)
    }

    pub async fn get_tile(&self, id: &str) -> Result<Option<Tile>> {
        let id = id.to_string();
        let tile = self
            .conn
            .call(move |conn| Ok(select_tile(conn, &id)?))
            .await?;
        Ok(tile)
    }

    pub async fn create_tile(&self, tile: NewTile) -> Result<Tile> {
        let content = serde_json::to_string(&tile.content)?;
        let tags = serde_json::to_string(&tile.tags)?;
        let created = self
            .conn
            .call(move |conn| {
                let id = tile.id.unwrap_or_else(new_id);
                conn.execute(
                    "INSERT INTO tiles (id, type, content, source, tags) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, tile.tile_type, content, tile.source, tags],
                )?;
                Ok(select_tile(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
            })
            .await?;
        Ok(created)
    }

    pub async fn update_tile(&self, id: &str, update: TileUpdate) -> Result<Option<Tile>> {
        let id = id.to_string();
        let tile = self
            .conn
            .call(move |conn| {
                let mut fields = Vec::new();
                if let Some(content) = &update.content {
                    fields.push(("content", json_text(content)));
                }
                if let Some(tags) = &update.tags {
                    fields.push(("tags", json_text(tags)));
                }
                let flags = [
                    ("read", update.read),
                    ("starred", update.starred),
                    ("archived", update.archived),
                    ("pinned", update.pinned),
                    ("saved_for_later", update.saved_for_later),
                ];
                for (column, value) in flags {
                    if let Some(value) = value {
                        fields.push((column, flag(value)));
                    }
                }
                if let Some(reactions) = &update.reactions {
                    fields.push(("reactions", json_text(reactions)));
                }
                update_fields(conn, "tiles", &id, fields, true)?;
                Ok(select_tile(conn, &id)?)
            })
            .await?;
        Ok(tile)
    }

    pub async fn delete_tile(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM tiles WHERE id = ?1", params![id])?))
            .await?;
        Ok(deleted > 0)
    }
}

fn select_tile(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Tile>> {
    let sql = format!("SELECT {} FROM tiles WHERE id = ?1", TILE_COLUMNS);
    conn.query_row(&sql, params![id], tile_from_row).optional()
}

fn tile_from_row(row: &Row) -> rusqlite::Result<Tile> {
    let flag_at = |idx: usize| -> rusqlite::Result<bool> {
        Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0) != 0)
    };

    Ok(Tile {
        id: row.get(0)?,
        tile_type: row.get(1)?,
        content: serde_json::from_str(&row.get::<_, String>(2)?).unwrap_or(serde_json::Value::Null),
        source: row.get(3)?,
        tags: json_list(row, 4)?,
        read: flag_at(5)?,
        starred: flag_at(6)?,
        archived: flag_at(7)?,
        pinned: flag_at(8)?,
        saved_for_later: flag_at(9)?,
        reactions: json_list(row, 10)?,
        created_at: timestamp(row, 11)?,
        updated_at: timestamp(row, 12)?,
    })
}
