use crate::models::{ListingRow, MessageRow, ReportRow, UserRow};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, Row};
use rusqlite::types::ToSql;

/// Optional, conjunctive filters for the public listing feed.
#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    pub id: Option<String>,
    pub status: Option<String>,
    pub seller_email: Option<String>,
}

/// Extra filters applied on top of the participant restriction.
#[derive(Debug, Default, Clone)]
pub struct MessageFilter {
    pub sender_email: Option<String>,
    pub receiver_email: Option<String>,
    pub listing_id: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, email_verified, verification_token, created_at, verified_at";

const LISTING_COLUMNS: &str = "id, title, description, price, category, condition, campus, images, \
     seller_name, seller_email, status, location, created_date";

const MESSAGE_COLUMNS: &str =
    "id, listing_id, sender_email, sender_name, receiver_email, content, read, created_date";

impl Database {
    // -- Users --

    /// Insert a new unverified account. Returns `false` when the email is already taken.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        password_hash: &str,
        verification_token: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, name, password_hash, email_verified, verification_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
                rusqlite::params![id, email, name, password_hash, verification_token, now_timestamp()],
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    /// Replace the pending verification token of an account.
    pub fn rotate_verification_token(&self, email: &str, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET verification_token = ?1 WHERE email = ?2",
                (token, email),
            )?;
            Ok(())
        })
    }

    /// Set the verified flag and consume the token. Returns false if no such user.
    pub fn mark_email_verified(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET email_verified = 1, verification_token = NULL, verified_at = ?1
                 WHERE email = ?2",
                (now_timestamp(), email),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Listings --

    pub fn insert_listing(&self, listing: &ListingRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO listings ({LISTING_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                rusqlite::params![
                    listing.id,
                    listing.title,
                    listing.description,
                    listing.price,
                    listing.category,
                    listing.condition,
                    listing.campus,
                    listing.images,
                    listing.seller_name,
                    listing.seller_email,
                    listing.status,
                    listing.location,
                    listing.created_date,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"))?;
            let row = stmt.query_row([id], listing_from_row).optional()?;
            Ok(row)
        })
    }

    /// Newest first. Ties on the timestamp fall back to insertion order.
    pub fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE 1=1");
            let mut params: Vec<&dyn ToSql> = Vec::new();

            for (column, value) in [
                ("id", &filter.id),
                ("status", &filter.status),
                ("seller_email", &filter.seller_email),
            ] {
                if let Some(value) = value {
                    params.push(value);
                    sql.push_str(&format!(" AND {} = ?{}", column, params.len()));
                }
            }
            sql.push_str(" ORDER BY created_date DESC, rowid DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), listing_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_listing_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE listings SET status = ?1 WHERE id = ?2", (status, id))?;
            Ok(())
        })
    }

    pub fn delete_listing(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM listings WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                rusqlite::params![
                    message.id,
                    message.listing_id,
                    message.sender_email,
                    message.sender_name,
                    message.receiver_email,
                    message.content,
                    message.read,
                    message.created_date,
                ],
            )?;
            Ok(())
        })
    }

    /// Messages `participant` sent or received, newest first.
    pub fn list_messages_for(&self, participant: &str, filter: &MessageFilter) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE (sender_email = ?1 OR receiver_email = ?1)"
            );
            let mut params: Vec<&dyn ToSql> = Vec::new();
            params.push(&participant);

            for (column, value) in [
                ("sender_email", &filter.sender_email),
                ("receiver_email", &filter.receiver_email),
                ("listing_id", &filter.listing_id),
            ] {
                if let Some(value) = value {
                    params.push(value);
                    sql.push_str(&format!(" AND {} = ?{}", column, params.len()));
                }
            }
            sql.push_str(" ORDER BY created_date DESC, rowid DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        listing_id: row.get(1)?,
                        sender_email: row.get(2)?,
                        sender_name: row.get(3)?,
                        receiver_email: row.get(4)?,
                        content: row.get(5)?,
                        read: row.get(6)?,
                        created_date: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reports --

    pub fn insert_report(&self, report: &ReportRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (id, listing_id, reporter_email, reason, created_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    report.id,
                    report.listing_id,
                    report.reporter_email,
                    report.reason,
                    report.created_date,
                ],
            )?;
            Ok(())
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                password_hash: row.get(3)?,
                email_verified: row.get(4)?,
                verification_token: row.get(5)?,
                created_at: row.get(6)?,
                verified_at: row.get(7)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        condition: row.get(5)?,
        campus: row.get(6)?,
        images: row.get(7)?,
        seller_name: row.get(8)?,
        seller_email: row.get(9)?,
        status: row.get(10)?,
        location: row.get(11)?,
        created_date: row.get(12)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn listing(seller: &str, status: &str, created_date: &str) -> ListingRow {
        ListingRow {
            id: Uuid::new_v4().to_string(),
            title: "Desk".into(),
            description: String::new(),
            price: 20.0,
            category: "furniture".into(),
            condition: "good".into(),
            campus: "abbotsford".into(),
            images: r#"["http://localhost/uploads/a.png"]"#.into(),
            seller_name: "Ann".into(),
            seller_email: seller.into(),
            status: status.into(),
            location: String::new(),
            created_date: created_date.into(),
        }
    }

    fn message(listing_id: &str, from: &str, to: &str, created_date: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4().to_string(),
            listing_id: listing_id.into(),
            sender_email: from.into(),
            sender_name: String::new(),
            receiver_email: to.into(),
            content: "still available?".into(),
            read: false,
            created_date: created_date.into(),
        }
    }

    #[test]
    fn user_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let email = "a@student.ufv.ca";
        assert!(db.get_user_by_email(email).unwrap().is_none());

        db.create_user("u1", email, "Ann", "hash", "tok-1").unwrap();
        let user = db.get_user_by_email(email).unwrap().unwrap();
        assert!(!user.email_verified);
        assert_eq!(user.verification_token.as_deref(), Some("tok-1"));

        db.rotate_verification_token(email, "tok-2").unwrap();
        let user = db.get_user_by_email(email).unwrap().unwrap();
        assert_eq!(user.verification_token.as_deref(), Some("tok-2"));
        assert_eq!(user.password_hash, "hash");

        assert!(db.mark_email_verified(email).unwrap());
        let user = db.get_user_by_email(email).unwrap().unwrap();
        assert!(user.email_verified);
        assert!(user.verification_token.is_none());
        assert!(user.verified_at.is_some());

        assert!(!db.mark_email_verified("nobody@student.ufv.ca").unwrap());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_user("u1", "a@student.ufv.ca", "Ann", "hash", "t").unwrap());
        assert!(!db.create_user("u2", "a@student.ufv.ca", "Bob", "hash2", "t2").unwrap());

        let kept = db.get_user_by_email("a@student.ufv.ca").unwrap().unwrap();
        assert_eq!(kept.id, "u1");
        assert_eq!(kept.name, "Ann");
    }

    #[test]
    fn listings_filter_and_sort_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let old = listing("a@student.ufv.ca", "active", "2026-01-01T00:00:00.000Z");
        let new = listing("a@student.ufv.ca", "sold", "2026-02-01T00:00:00.000Z");
        let other = listing("b@student.ufv.ca", "active", "2026-03-01T00:00:00.000Z");
        for l in [&old, &new, &other] {
            db.insert_listing(l).unwrap();
        }

        let all = db.list_listings(&ListingFilter::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![other.id.as_str(), new.id.as_str(), old.id.as_str()]);

        let mine_active = db
            .list_listings(&ListingFilter {
                status: Some("active".into()),
                seller_email: Some("a@student.ufv.ca".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mine_active.len(), 1);
        assert_eq!(mine_active[0].id, old.id);

        let by_id = db
            .list_listings(&ListingFilter { id: Some(new.id.clone()), ..Default::default() })
            .unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].images, r#"["http://localhost/uploads/a.png"]"#);
    }

    #[test]
    fn listing_status_update_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let l = listing("a@student.ufv.ca", "active", "2026-01-01T00:00:00.000Z");
        db.insert_listing(&l).unwrap();

        db.update_listing_status(&l.id, "sold").unwrap();
        assert_eq!(db.get_listing(&l.id).unwrap().unwrap().status, "sold");

        db.delete_listing(&l.id).unwrap();
        assert!(db.get_listing(&l.id).unwrap().is_none());
    }

    #[test]
    fn messages_are_scoped_to_participants() {
        let db = Database::open_in_memory().unwrap();
        let (ann, bob, cat) = ("ann@student.ufv.ca", "bob@student.ufv.ca", "cat@student.ufv.ca");
        db.insert_message(&message("l1", ann, bob, "2026-01-01T00:00:00.000Z")).unwrap();
        db.insert_message(&message("l1", bob, ann, "2026-01-02T00:00:00.000Z")).unwrap();
        db.insert_message(&message("l2", cat, bob, "2026-01-03T00:00:00.000Z")).unwrap();

        let for_ann = db.list_messages_for(ann, &MessageFilter::default()).unwrap();
        assert_eq!(for_ann.len(), 2);
        assert_eq!(for_ann[0].sender_email, bob);

        let for_cat_on_l1 = db
            .list_messages_for(cat, &MessageFilter { listing_id: Some("l1".into()), ..Default::default() })
            .unwrap();
        assert!(for_cat_on_l1.is_empty());

        let bob_sent = db
            .list_messages_for(bob, &MessageFilter { sender_email: Some(bob.into()), ..Default::default() })
            .unwrap();
        assert_eq!(bob_sent.len(), 1);
        assert_eq!(bob_sent[0].receiver_email, ann);
    }

    #[test]
    fn reports_are_stored() {
        let db = Database::open_in_memory().unwrap();
        db.insert_report(&ReportRow {
            id: Uuid::new_v4().to_string(),
            listing_id: "l1".into(),
            reporter_email: "a@student.ufv.ca".into(),
            reason: "scam".into(),
            created_date: now_timestamp(),
        })
        .unwrap();

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM reports", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }
}
