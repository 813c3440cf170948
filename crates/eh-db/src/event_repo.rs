use eh_core::error::EventError;
use eh_core::events::EventRepository;
use eh_core::types::list;
use eh_core::types::{Event, EventId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::util::{
    DbError, decode_enum, encode_enum, event_storage, from_date, from_rfc3339, to_date,
    to_rfc3339,
};

const COLUMNS: &str = "id, title, slug, description, overview, image, venue, location, date, time, mode, audience, agenda, organizer, tags, created_at, updated_at";

// Tags written by other tools may be a JSON scalar or bare text; both count as one tag.
const TAG_OVERLAP: &str = "EXISTS (
    SELECT 1 FROM json_each(CASE WHEN json_valid(events.tags) THEN events.tags ELSE json_array(events.tags) END) AS t
    WHERE t.value IN (SELECT value FROM json_each(?2))
)";

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_events(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Event>, EventError> {
        let mut stmt = self.conn.prepare(sql).map_err(event_storage)?;
        let mut rows = stmt.query(params).map_err(event_storage)?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().map_err(event_storage)? {
            events.push(map_event_row(row)?);
        }
        Ok(events)
    }

    fn query_one(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Event>, EventError> {
        let mut stmt = self.conn.prepare(sql).map_err(event_storage)?;
        let mut rows = stmt.query(params).map_err(event_storage)?;
        let Some(row) = rows.next().map_err(event_storage)? else {
            return Ok(None);
        };
        map_event_row(row).map(Some)
    }
}

impl EventRepository for EventRepo<'_> {
    fn insert(&self, event: &Event) -> Result<(), EventError> {
        let sql = format!(
            "INSERT INTO events ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        );
        let mode = encode_enum(&event.mode)?;
        self.conn
            .execute(
                &sql,
                params![
                    event.id.as_str(),
                    event.title,
                    event.slug,
                    event.description,
                    event.overview,
                    event.image,
                    event.venue,
                    event.location,
                    to_date(&event.date),
                    event.time,
                    mode,
                    event.audience,
                    list::encode(&event.agenda),
                    event.organizer,
                    list::encode(&event.tags),
                    to_rfc3339(&event.created_at),
                    to_rfc3339(&event.updated_at),
                ],
            )
            .map_err(|err| map_write_error(err, &event.slug))?;
        Ok(())
    }

    fn update(&self, event: &Event) -> Result<(), EventError> {
        let mode = encode_enum(&event.mode)?;
        let affected = self
            .conn
            .execute(
                "UPDATE events SET title = ?2, slug = ?3, description = ?4, overview = ?5, image = ?6, venue = ?7, location = ?8, date = ?9, time = ?10, mode = ?11, audience = ?12, agenda = ?13, organizer = ?14, tags = ?15, updated_at = ?16 WHERE id = ?1",
                params![
                    event.id.as_str(),
                    event.title,
                    event.slug,
                    event.description,
                    event.overview,
                    event.image,
                    event.venue,
                    event.location,
                    to_date(&event.date),
                    event.time,
                    mode,
                    event.audience,
                    list::encode(&event.agenda),
                    event.organizer,
                    list::encode(&event.tags),
                    to_rfc3339(&event.updated_at),
                ],
            )
            .map_err(|err| map_write_error(err, &event.slug))?;
        if affected == 0 {
            return Err(EventError::NotFound);
        }
        Ok(())
    }

    fn get(&self, id: &EventId) -> Result<Option<Event>, EventError> {
        let sql = format!("SELECT {COLUMNS} FROM events WHERE id = ?1");
        self.query_one(&sql, [id.as_str()])
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<Event>, EventError> {
        let sql = format!("SELECT {COLUMNS} FROM events WHERE slug = ?1");
        self.query_one(&sql, [slug])
    }

    fn slug_taken(&self, slug: &str, exclude: &EventId) -> Result<bool, EventError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM events WHERE slug = ?1 AND id != ?2 LIMIT 1",
                params![slug, exclude.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(event_storage)?;
        Ok(found.is_some())
    }

    fn list(&self) -> Result<Vec<Event>, EventError> {
        let sql = format!("SELECT {COLUMNS} FROM events ORDER BY created_at DESC, id DESC");
        self.query_events(&sql, [])
    }

    fn list_sharing_tags(
        &self,
        tags: &[String],
        exclude: &EventId,
    ) -> Result<Vec<Event>, EventError> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {COLUMNS} FROM events WHERE id != ?1 AND {TAG_OVERLAP} ORDER BY created_at DESC, id DESC"
        );
        self.query_events(&sql, params![exclude.as_str(), list::encode(tags)])
    }
}

fn map_write_error(err: rusqlite::Error, slug: &str) -> EventError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &err {
        if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return EventError::SlugConflict {
                slug: slug.to_string(),
            };
        }
    }
    event_storage(err)
}

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<Event, EventError> {
    let get = |idx: usize| -> Result<String, EventError> { row.get(idx).map_err(event_storage) };

    let id = EventId::new(get(0)?).map_err(|err| DbError::InvalidId {
        message: err.to_string(),
    })?;
    Ok(Event {
        id,
        title: get(1)?,
        slug: get(2)?,
        description: get(3)?,
        overview: get(4)?,
        image: get(5)?,
        venue: get(6)?,
        location: get(7)?,
        date: from_date(&get(8)?)?,
        time: get(9)?,
        mode: decode_enum(&get(10)?)?,
        audience: get(11)?,
        agenda: list::decode_lenient(&get(12)?),
        organizer: get(13)?,
        tags: list::decode_lenient(&get(14)?),
        created_at: from_rfc3339(&get(15)?)?,
        updated_at: from_rfc3339(&get(16)?)?,
    })
}
