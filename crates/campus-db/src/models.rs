/// Database row types. Each maps directly to a SQLite row.
/// Distinct from campus-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub created_at: String,
    pub verified_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub campus: String,
    /// JSON array of image URLs.
    pub images: String,
    pub seller_name: String,
    pub seller_email: String,
    pub status: String,
    pub location: String,
    pub created_date: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub listing_id: String,
    pub sender_email: String,
    pub sender_name: String,
    pub receiver_email: String,
    pub content: String,
    pub read: bool,
    pub created_date: String,
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: String,
    pub listing_id: String,
    pub reporter_email: String,
    pub reason: String,
    pub created_date: String,
}
