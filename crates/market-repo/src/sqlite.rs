use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use market_types::domain::livestock::{
    Category, Gender, Image, Livestock, LivestockFilter, LivestockStatus,
};
use market_types::domain::notification::AdminNotification;
use market_types::domain::order::{Order, OrderStatus, PaymentProof};
use market_types::domain::user::{Role, User};
use market_types::ports::{
    LivestockRepository, NotificationRepository, OrderRepository, RepoError, UserRepository,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl ToString) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn write_err(e: sqlx::Error, what: &str) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(what.to_string())
        }
        _ => db_err(e),
    }
}

// Fixed-width timestamps so text ordering matches time ordering.
fn ts(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

fn to_json<T: Serialize>(v: &T) -> Result<String, RepoError> {
    serde_json::to_string(v).map_err(db_err)
}

fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, RepoError> {
    serde_json::from_str(s).map_err(db_err)
}

fn role_str(r: Role) -> &'static str {
    match r {
        Role::Customer => "Customer",
        Role::Admin => "Admin",
    }
}

fn category_str(c: Category) -> &'static str {
    match c {
        Category::Goat => "Goat",
        Category::Sheep => "Sheep",
    }
}

fn livestock_status_str(s: LivestockStatus) -> &'static str {
    match s {
        LivestockStatus::Available => "Available",
        LivestockStatus::Sold => "Sold",
    }
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    cart_json: String,
    wishlist_json: String,
    addresses_json: String,
    notifications_json: String,
    created_at: String,
    updated_at: String,
}

impl DbUser {
    fn into_user(self) -> Result<User, RepoError> {
        let role = match self.role.as_str() {
            "Admin" => Role::Admin,
            _ => Role::Customer,
        };
        Ok(User {
            id: parse_id(&self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            cart: from_json(&self.cart_json)?,
            wishlist: from_json(&self.wishlist_json)?,
            addresses: from_json(&self.addresses_json)?,
            notifications: from_json(&self.notifications_json)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbLivestock {
    id: String,
    name: String,
    category: String,
    breed: String,
    age_months: i64,
    weight_kg: f64,
    gender: String,
    description: String,
    price_cents: i64,
    status: String,
    image_ids_json: String,
    created_at: String,
    updated_at: String,
}

impl DbLivestock {
    fn into_livestock(self) -> Result<Livestock, RepoError> {
        let category = match self.category.as_str() {
            "Sheep" => Category::Sheep,
            _ => Category::Goat,
        };
        let gender = match self.gender.as_str() {
            "Female" => Gender::Female,
            _ => Gender::Male,
        };
        let status = match self.status.as_str() {
            "Sold" => LivestockStatus::Sold,
            _ => LivestockStatus::Available,
        };
        Ok(Livestock {
            id: parse_id(&self.id)?,
            name: self.name,
            category,
            breed: self.breed,
            age_months: u32::try_from(self.age_months).map_err(db_err)?,
            weight_kg: self.weight_kg,
            gender,
            description: self.description,
            price_cents: self.price_cents,
            status,
            image_ids: from_json(&self.image_ids_json)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    items_json: String,
    shipping_json: String,
    total_cents: i64,
    status: String,
    proof_json: Option<String>,
    status_note: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let payment_proof = self
            .proof_json
            .as_deref()
            .map(from_json::<PaymentProof>)
            .transpose()?;
        Ok(Order {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            items: from_json(&self.items_json)?,
            shipping: from_json(&self.shipping_json)?,
            total_cents: self.total_cents,
            status,
            payment_proof,
            status_note: self.status_note,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbNotification {
    id: String,
    message: String,
    order_id: Option<String>,
    read: bool,
    created_at: String,
}

impl DbNotification {
    fn into_notification(self) -> Result<AdminNotification, RepoError> {
        Ok(AdminNotification {
            id: parse_id(&self.id)?,
            message: self.message,
            order_id: self.order_id.as_deref().map(parse_id).transpose()?,
            read: self.read,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

const USER_COLS: &str = "id, name, email, password_hash, role, cart_json, wishlist_json, addresses_json, notifications_json, created_at, updated_at";
const LIVESTOCK_COLS: &str = "id, name, category, breed, age_months, weight_kg, gender, description, price_cents, status, image_ids_json, created_at, updated_at";
const ORDER_COLS: &str = "id, user_id, items_json, shipping_json, total_cents, status, proof_json, status_note, created_at, updated_at";

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_init.sql");
        for stmt in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await?;
        }
        tracing::debug!(%database_url, "sqlite schema ready");

        Ok(Self { pool })
    }

    async fn fetch_orders(
        &self,
        sql: &str,
        bind: Option<String>,
    ) -> Result<Vec<Order>, RepoError> {
        let mut q = sqlx::query_as::<_, DbOrder>(sql);
        if let Some(b) = bind {
            q = q.bind(b);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role_str(user.role))
        .bind(to_json(&user.cart)?)
        .bind(to_json(&user.wishlist)?)
        .bind(to_json(&user.addresses)?)
        .bind(to_json(&user.notifications)?)
        .bind(ts(&user.created_at))
        .bind(ts(&user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(e, &format!("email {}", user.email)))?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbUser::into_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLS} FROM users WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbUser::into_user).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let rows: Vec<DbUser> = sqlx::query_as(&format!(
            "SELECT {USER_COLS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbUser::into_user).collect()
    }

    async fn save_user(&self, user: User) -> Result<Option<User>, RepoError> {
        let updated = sqlx::query(
            "UPDATE users SET name = ?, role = ?, cart_json = ?, wishlist_json = ?, addresses_json = ?,
             notifications_json = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(role_str(user.role))
        .bind(to_json(&user.cart)?)
        .bind(to_json(&user.wishlist)?)
        .bind(to_json(&user.addresses)?)
        .bind(to_json(&user.notifications)?)
        .bind(ts(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(user))
    }
}

#[async_trait]
impl LivestockRepository for SqliteRepo {
    async fn create_livestock(&self, item: Livestock) -> Result<Livestock, RepoError> {
        sqlx::query(&format!(
            "INSERT INTO livestock ({LIVESTOCK_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(category_str(item.category))
        .bind(&item.breed)
        .bind(i64::from(item.age_months))
        .bind(item.weight_kg)
        .bind(format!("{:?}", item.gender))
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(livestock_status_str(item.status))
        .bind(to_json(&item.image_ids)?)
        .bind(ts(&item.created_at))
        .bind(ts(&item.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(item)
    }

    async fn get_livestock(&self, id: Uuid) -> Result<Option<Livestock>, RepoError> {
        let row: Option<DbLivestock> =
            sqlx::query_as(&format!("SELECT {LIVESTOCK_COLS} FROM livestock WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbLivestock::into_livestock).transpose()
    }

    async fn list_livestock(&self, filter: &LivestockFilter) -> Result<Vec<Livestock>, RepoError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {LIVESTOCK_COLS} FROM livestock WHERE 1 = 1"));
        if let Some(c) = filter.category {
            qb.push(" AND category = ").push_bind(category_str(c));
        }
        if let Some(s) = filter.status {
            qb.push(" AND status = ").push_bind(livestock_status_str(s));
        }
        if let Some(min) = filter.min_price {
            qb.push(" AND price_cents >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            qb.push(" AND price_cents <= ").push_bind(max);
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            qb.push(" AND (lower(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(breed) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(description) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC");

        let rows: Vec<DbLivestock> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(DbLivestock::into_livestock).collect()
    }

    async fn save_livestock(&self, item: Livestock) -> Result<Option<Livestock>, RepoError> {
        let updated = sqlx::query(
            "UPDATE livestock SET name = ?, category = ?, breed = ?, age_months = ?, weight_kg = ?,
             gender = ?, description = ?, price_cents = ?, status = ?, image_ids_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&item.name)
        .bind(category_str(item.category))
        .bind(&item.breed)
        .bind(i64::from(item.age_months))
        .bind(item.weight_kg)
        .bind(format!("{:?}", item.gender))
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(livestock_status_str(item.status))
        .bind(to_json(&item.image_ids)?)
        .bind(ts(&item.updated_at))
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn delete_livestock(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM livestock WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_livestock_status(
        &self,
        ids: &[Uuid],
        status: LivestockStatus,
    ) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE livestock SET status = ");
        qb.push_bind(livestock_status_str(status))
            .push(", updated_at = ")
            .push_bind(ts(&Utc::now()))
            .push(" WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.to_string());
        }
        sep.push_unseparated(")");
        let res = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(res.rows_affected())
    }

    async fn put_image(&self, image: Image) -> Result<Uuid, RepoError> {
        sqlx::query("INSERT INTO images (id, content_type, data) VALUES (?, ?, ?)")
            .bind(image.id.to_string())
            .bind(&image.content_type)
            .bind(&image.data)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(image.id)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<Image>, RepoError> {
        let row: Option<(String, Vec<u8>)> =
            sqlx::query_as("SELECT content_type, data FROM images WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(row.map(|(content_type, data)| Image {
            id,
            content_type,
            data,
        }))
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        let proof_json = order.payment_proof.as_ref().map(to_json).transpose()?;
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(to_json(&order.items)?)
        .bind(to_json(&order.shipping)?)
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(proof_json)
        .bind(&order.status_note)
        .bind(ts(&order.created_at))
        .bind(ts(&order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepoError> {
        match status {
            Some(s) => {
                self.fetch_orders(
                    &format!(
                        "SELECT {ORDER_COLS} FROM orders WHERE status = ? ORDER BY created_at DESC"
                    ),
                    Some(s.as_str().to_string()),
                )
                .await
            }
            None => {
                self.fetch_orders(
                    &format!("SELECT {ORDER_COLS} FROM orders ORDER BY created_at DESC"),
                    None,
                )
                .await
            }
        }
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        self.fetch_orders(
            &format!("SELECT {ORDER_COLS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"),
            Some(user_id.to_string()),
        )
        .await
    }

    async fn save_order(&self, order: Order) -> Result<Option<Order>, RepoError> {
        let proof_json = order.payment_proof.as_ref().map(to_json).transpose()?;
        let updated = sqlx::query(
            "UPDATE orders SET items_json = ?, shipping_json = ?, total_cents = ?, status = ?,
             proof_json = ?, status_note = ?, updated_at = ? WHERE id = ?",
        )
        .bind(to_json(&order.items)?)
        .bind(to_json(&order.shipping)?)
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(proof_json)
        .bind(&order.status_note)
        .bind(ts(&order.updated_at))
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(order))
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE status = ? AND created_at <= ?"
        ))
        .bind(OrderStatus::Pending.as_str())
        .bind(ts(&cutoff))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn find_proof_hash(&self, sha256: &str) -> Result<Option<Uuid>, RepoError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT order_id FROM proof_hashes WHERE sha256 = ?")
                .bind(sha256)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(|(id,)| parse_id(&id)).transpose()
    }

    async fn record_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO proof_hashes (sha256, order_id) VALUES (?, ?)")
            .bind(sha256)
            .bind(order_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| write_err(e, &format!("proof hash {sha256}")))?;
        Ok(())
    }

    async fn release_proof_hash(&self, sha256: &str, order_id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM proof_hashes WHERE sha256 = ? AND order_id = ?")
            .bind(sha256)
            .bind(order_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for SqliteRepo {
    async fn push_admin_notification(&self, n: AdminNotification) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO admin_notifications (id, message, order_id, read, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(n.id.to_string())
        .bind(&n.message)
        .bind(n.order_id.map(|id| id.to_string()))
        .bind(n.read)
        .bind(ts(&n.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_admin_notifications(&self) -> Result<Vec<AdminNotification>, RepoError> {
        let rows: Vec<DbNotification> = sqlx::query_as(
            "SELECT id, message, order_id, read, created_at FROM admin_notifications ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(DbNotification::into_notification)
            .collect()
    }

    async fn mark_admin_notifications_read(&self) -> Result<u64, RepoError> {
        let res = sqlx::query("UPDATE admin_notifications SET read = 1 WHERE read = 0")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected())
    }
}
