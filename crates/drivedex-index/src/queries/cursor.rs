use rusqlite::{Connection, OptionalExtension, params};
use std::str::FromStr;

use drivedex_types::{CursorScope, PageToken, now_rfc3339};

use crate::Result;
use crate::records::CursorRecord;

/// Store the resume cursor for a feed, one row per scope
pub fn set(conn: &Connection, scope: CursorScope, token: &PageToken) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO page_cursors (scope, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(scope) DO UPDATE SET
            value = ?2,
            updated_at = ?3
        "#,
        params![scope.as_str(), token.as_str(), now_rfc3339()],
    )?;

    Ok(())
}

pub fn current(conn: &Connection, scope: CursorScope) -> Result<Option<CursorRecord>> {
    let result = conn
        .query_row(
            r#"
            SELECT scope, value, updated_at
            FROM page_cursors
            WHERE scope = ?1
            "#,
            [scope.as_str()],
            |row| {
                let scope_raw: String = row.get(0)?;
                Ok((scope_raw, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            },
        )
        .optional()?;

    Ok(result.and_then(|(scope_raw, value, updated_at)| {
        CursorScope::from_str(&scope_raw).ok().map(|scope| CursorRecord {
            scope,
            value: PageToken::from(value),
            updated_at,
        })
    }))
}

/// Forget the stored cursor; the next run must pick a start token itself
pub fn clear(conn: &Connection, scope: CursorScope) -> Result<()> {
    conn.execute(
        "DELETE FROM page_cursors WHERE scope = ?1",
        [scope.as_str()],
    )?;
    Ok(())
}
