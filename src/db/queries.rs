use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    AdminUser, BlockedDate, BookingRequest, BookingStatus, Service, ServiceFields, SiteSettings,
};
use crate::models::service::DEFAULT_BOX_COLOR;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, full_name, email, phone, services, event_date, guest_count, message, status, created_at";

pub fn insert_booking(conn: &Connection, booking: &BookingRequest) -> anyhow::Result<()> {
    let services = serde_json::to_string(&booking.services)?;
    let event_date = booking
        .event_date
        .map(|d| d.format(DATE_FORMAT).to_string());

    conn.execute(
        "INSERT INTO bookings (id, full_name, email, phone, services, event_date, guest_count, message, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.full_name,
            booking.email,
            booking.phone,
            services,
            event_date,
            booking.guest_count,
            booking.message,
            booking.status.as_str(),
            format_ts(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingRequest>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Newest first.
pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<BookingRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, rowid DESC LIMIT ?2"
    ))?;
    let status = status_filter.map(|s| s.as_str());
    let rows = stmt.query_map(params![status, limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn count_bookings(conn: &Connection, status_filter: Option<BookingStatus>) -> anyhow::Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE (?1 IS NULL OR status = ?1)",
        params![status_filter.map(|s| s.as_str())],
        |row| row.get(0),
    )?)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<BookingRequest> {
    let services_json: String = row.get(4)?;
    let event_date: Option<String> = row.get(5)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    let event_date = match event_date {
        Some(s) => Some(NaiveDate::parse_from_str(&s, DATE_FORMAT)?),
        None => None,
    };

    Ok(BookingRequest {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        services: serde_json::from_str(&services_json).unwrap_or_default(),
        event_date,
        guest_count: row.get(6)?,
        message: row.get(7)?,
        status: status_str.parse().unwrap_or(BookingStatus::Pending),
        created_at: parse_ts(&created_at_str),
    })
}

// ── Blocked Dates ──

/// Current denylist, read fresh on every call.
pub fn blocked_date_set(conn: &Connection) -> anyhow::Result<BTreeSet<NaiveDate>> {
    Ok(list_blocked_dates(conn)?.into_iter().map(|b| b.date).collect())
}

pub fn list_blocked_dates(conn: &Connection) -> anyhow::Result<Vec<BlockedDate>> {
    let mut stmt =
        conn.prepare("SELECT id, date, reason, created_at FROM blocked_dates ORDER BY date")?;
    let rows = stmt.query_map([], |row| Ok(parse_blocked_row(row)))?;

    let mut blocked = vec![];
    for row in rows {
        blocked.push(row??);
    }
    Ok(blocked)
}

/// Returns `None` when the date is already blocked.
pub fn add_blocked_date(
    conn: &Connection,
    date: NaiveDate,
    reason: Option<&str>,
) -> anyhow::Result<Option<BlockedDate>> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO blocked_dates (date, reason) VALUES (?1, ?2)",
        params![date.format(DATE_FORMAT).to_string(), reason],
    )?;
    if inserted == 0 {
        return Ok(None);
    }

    let id = conn.last_insert_rowid();
    let blocked = conn.query_row(
        "SELECT id, date, reason, created_at FROM blocked_dates WHERE id = ?1",
        params![id],
        |row| Ok(parse_blocked_row(row)),
    )??;
    Ok(Some(blocked))
}

pub fn remove_blocked_date(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blocked_dates WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_blocked_dates(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM blocked_dates", [], |row| row.get(0))?)
}

fn parse_blocked_row(row: &rusqlite::Row) -> anyhow::Result<BlockedDate> {
    let date_str: String = row.get(1)?;
    let created_at_str: String = row.get(3)?;
    Ok(BlockedDate {
        id: row.get(0)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)?,
        reason: row.get(2)?,
        created_at: parse_ts(&created_at_str),
    })
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, title, subtitle, description, image_url, features, box_color, created_at, updated_at";

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY id"))?;
    let rows = stmt.query_map([], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: i64) -> anyhow::Result<Option<Service>> {
    let result = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            params![id],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn create_service(conn: &Connection, fields: &ServiceFields) -> anyhow::Result<Service> {
    let features = serde_json::to_string(&fields.features)?;
    conn.execute(
        "INSERT INTO services (title, subtitle, description, image_url, features, box_color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            fields.title,
            fields.subtitle,
            fields.description,
            fields.image_url,
            features,
            fields.box_color.as_deref().unwrap_or(DEFAULT_BOX_COLOR),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_service(conn, id)?.ok_or_else(|| anyhow::anyhow!("service {id} vanished after insert"))
}

pub fn update_service(
    conn: &Connection,
    id: i64,
    fields: &ServiceFields,
) -> anyhow::Result<Option<Service>> {
    let features = serde_json::to_string(&fields.features)?;
    let count = conn.execute(
        "UPDATE services SET title = ?1, subtitle = ?2, description = ?3, image_url = ?4,
                features = ?5, box_color = ?6, updated_at = datetime('now')
         WHERE id = ?7",
        params![
            fields.title,
            fields.subtitle,
            fields.description,
            fields.image_url,
            features,
            fields.box_color.as_deref().unwrap_or(DEFAULT_BOX_COLOR),
            id,
        ],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_service(conn, id)
}

pub fn delete_service(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_services(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))?)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let features_json: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;
    Ok(Service {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        features: serde_json::from_str(&features_json).unwrap_or_default(),
        box_color: row.get(6)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Settings ──

pub fn load_settings(conn: &Connection) -> anyhow::Result<SiteSettings> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut values = BTreeMap::new();
    for row in rows {
        let (key, value) = row?;
        values.insert(key, value);
    }
    Ok(SiteSettings::new(values))
}

pub fn save_settings(conn: &Connection, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in values {
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// ── Admins ──

pub fn count_admins(conn: &Connection) -> anyhow::Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |row| row.get(0))?)
}

pub fn create_admin(conn: &Connection, username: &str, password_hash: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO admins (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_admin_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<AdminUser>> {
    let admin = conn
        .query_row(
            "SELECT id, username, password_hash, created_at FROM admins WHERE username = ?1",
            params![username],
            |row| {
                let created_at_str: String = row.get(3)?;
                Ok(AdminUser {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: parse_ts(&created_at_str),
                })
            },
        )
        .optional()?;
    Ok(admin)
}

// ── Admin Sessions ──

pub fn create_session(
    conn: &Connection,
    token: &str,
    admin_id: i64,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO admin_sessions (token, admin_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, admin_id, format_ts(expires_at)],
    )?;
    Ok(())
}

/// Resolves a live session token to `(admin_id, username)`.
pub fn find_session(conn: &Connection, token: &str) -> anyhow::Result<Option<(i64, String)>> {
    let now = format_ts(&Utc::now().naive_utc());
    let session = conn
        .query_row(
            "SELECT a.id, a.username FROM admin_sessions s
             JOIN admins a ON a.id = s.admin_id
             WHERE s.token = ?1 AND s.expires_at > ?2",
            params![token, now],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(session)
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM admin_sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn purge_expired_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = format_ts(&Utc::now().naive_utc());
    Ok(conn.execute("DELETE FROM admin_sessions WHERE expires_at <= ?1", params![now])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn booking(id: &str, event_date: Option<&str>) -> BookingRequest {
        BookingRequest {
            id: id.to_string(),
            full_name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: "555-1234".to_string(),
            services: vec!["Event Planning".to_string(), "Language Services".to_string()],
            event_date: event_date.map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).unwrap()),
            guest_count: Some(50),
            message: Some("Outdoor venue".to_string()),
            status: BookingStatus::Pending,
            created_at: parse_ts("2025-06-01 12:00:00"),
        }
    }

    #[test]
    fn test_booking_persists_all_fields() {
        let conn = db::init_db(":memory:").unwrap();
        let original = booking("bk-1", Some("2025-12-25"));
        insert_booking(&conn, &original).unwrap();

        let loaded = get_booking_by_id(&conn, "bk-1").unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_bookings_filters_by_status() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, &booking("a", None)).unwrap();
        insert_booking(&conn, &booking("b", None)).unwrap();
        assert!(update_booking_status(&conn, "b", BookingStatus::Confirmed).unwrap());
        assert!(!update_booking_status(&conn, "zzz", BookingStatus::Confirmed).unwrap());

        assert_eq!(list_bookings(&conn, None, 50).unwrap().len(), 2);
        let confirmed = list_bookings(&conn, Some(BookingStatus::Confirmed), 50).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, "b");
    }

    #[test]
    fn test_blocked_dates_are_unique() {
        let conn = db::init_db(":memory:").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();

        let first = add_blocked_date(&conn, date, Some("Holiday")).unwrap();
        assert!(first.is_some());
        assert!(add_blocked_date(&conn, date, None).unwrap().is_none());

        let set = blocked_date_set(&conn).unwrap();
        assert!(set.contains(&date));
        assert_eq!(set.len(), 1);

        assert!(remove_blocked_date(&conn, first.unwrap().id).unwrap());
        assert!(blocked_date_set(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_settings_upsert() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(load_settings(&conn).unwrap().company_name(), "Ezana Services");

        let mut values = BTreeMap::new();
        values.insert("company_name".to_string(), "Acme Events".to_string());
        values.insert("tagline".to_string(), "We plan parties".to_string());
        save_settings(&conn, &values).unwrap();

        let settings = load_settings(&conn).unwrap();
        assert_eq!(settings.company_name(), "Acme Events");
        assert_eq!(settings.get("tagline"), Some("We plan parties"));
    }

    #[test]
    fn test_service_crud() {
        let conn = db::init_db(":memory:").unwrap();
        let fields = ServiceFields {
            title: "Catering".to_string(),
            subtitle: None,
            description: Some("Food for every occasion".to_string()),
            image_url: None,
            features: vec!["Buffet".to_string()],
            box_color: None,
        };
        let created = create_service(&conn, &fields).unwrap();
        assert_eq!(created.box_color, DEFAULT_BOX_COLOR);
        assert_eq!(created.features, vec!["Buffet".to_string()]);

        let renamed = ServiceFields {
            title: "Premium Catering".to_string(),
            ..fields
        };
        let updated = update_service(&conn, created.id, &renamed).unwrap().unwrap();
        assert_eq!(updated.title, "Premium Catering");

        assert!(delete_service(&conn, created.id).unwrap());
        assert!(get_service(&conn, created.id).unwrap().is_none());
        assert!(update_service(&conn, created.id, &renamed).unwrap().is_none());
    }

    #[test]
    fn test_admin_lookup_by_username() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(count_admins(&conn).unwrap(), 0);

        let id = create_admin(&conn, "owner", "$argon2id$stub").unwrap();
        let admin = get_admin_by_username(&conn, "owner").unwrap().unwrap();
        assert_eq!(admin.id, id);
        assert_eq!(admin.password_hash, "$argon2id$stub");
        assert_eq!(count_admins(&conn).unwrap(), 1);
        assert!(get_admin_by_username(&conn, "nobody").unwrap().is_none());
    }
}
