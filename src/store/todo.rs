use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    model::Todo,
    schema::{NewTodo, TodoChanges},
};

// Every query below is filtered by owner; there is no unscoped access path.

/// Numbers the todo from the owner's `todo_seq` counter, so display ids are
/// never handed out twice, even after the newest todo is deleted.
pub async fn insert(db: &Pool<Sqlite>, owner: i64, todo: &NewTodo) -> Result<Todo, sqlx::Error> {
    let mut tx = db.begin().await?;

    // Writing first takes the database write lock before anything is read
    let (display_id,): (i64,) = sqlx::query_as(
        "UPDATE users SET todo_seq = todo_seq + 1 WHERE id = ? RETURNING todo_seq",
    )
    .bind(owner)
    .fetch_one(&mut *tx)
    .await?;

    let now = Utc::now();
    let created = sqlx::query_as::<_, Todo>(
        "INSERT INTO todos (display_id, title, description, owner, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING id, display_id, title, description, owner, created_at, updated_at",
    )
    .bind(display_id)
    .bind(todo.title.as_str())
    .bind(todo.description.as_str())
    .bind(owner)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(created)
}

pub async fn list(db: &Pool<Sqlite>, owner: i64) -> Result<Vec<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(
        "SELECT id, display_id, title, description, owner, created_at, updated_at \
         FROM todos WHERE owner = ? ORDER BY display_id",
    )
    .bind(owner)
    .fetch_all(db)
    .await
}

pub async fn find(db: &Pool<Sqlite>, owner: i64, id: i64) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(
        "SELECT id, display_id, title, description, owner, created_at, updated_at \
         FROM todos WHERE id = ? AND owner = ?",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &Pool<Sqlite>,
    owner: i64,
    id: i64,
    changes: &TodoChanges,
) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(
        "UPDATE todos SET \
            title = COALESCE(?, title), \
            description = COALESCE(?, description), \
            updated_at = ? \
         WHERE id = ? AND owner = ? \
         RETURNING id, display_id, title, description, owner, created_at, updated_at",
    )
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(Utc::now())
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &Pool<Sqlite>, owner: i64, id: i64) -> Result<Option<Todo>, sqlx::Error> {
    sqlx::query_as::<_, Todo>(
        "DELETE FROM todos WHERE id = ? AND owner = ? \
         RETURNING id, display_id, title, description, owner, created_at, updated_at",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_pool,
        store::user::{self, NewUserRecord},
    };

    async fn owner(db: &Pool<Sqlite>, name: &str) -> i64 {
        let email = format!("{name}@example.com");
        user::insert(
            db,
            NewUserRecord {
                full_name: name,
                username: name,
                email: &email,
                password_hash: "hash",
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            description: "description".to_string(),
        }
    }

    #[tokio::test]
    async fn display_ids_are_sequential_per_owner() {
        let db = memory_pool().await;
        let ada = owner(&db, "ada").await;
        let bob = owner(&db, "bob").await;

        let first = insert(&db, ada, &new_todo("first")).await.unwrap();
        let second = insert(&db, ada, &new_todo("second")).await.unwrap();
        let bobs = insert(&db, bob, &new_todo("bobs first")).await.unwrap();

        assert_eq!(first.display_id, 1);
        assert_eq!(second.display_id, 2);
        assert_eq!(bobs.display_id, 1);
        assert_eq!(first.owner, ada);
    }

    #[tokio::test]
    async fn display_ids_are_not_reused_after_delete() {
        let db = memory_pool().await;
        let ada = owner(&db, "ada").await;

        insert(&db, ada, &new_todo("first")).await.unwrap();
        let second = insert(&db, ada, &new_todo("second")).await.unwrap();
        delete(&db, ada, second.id).await.unwrap().unwrap();

        let third = insert(&db, ada, &new_todo("third")).await.unwrap();
        assert_eq!(third.display_id, 3);
    }

    #[tokio::test]
    async fn other_owners_cannot_reach_a_todo() {
        let db = memory_pool().await;
        let ada = owner(&db, "ada").await;
        let bob = owner(&db, "bob").await;
        let todo = insert(&db, ada, &new_todo("private")).await.unwrap();
        let changes = TodoChanges {
            title: Some("hijacked".into()),
            description: None,
        };

        assert!(list(&db, bob).await.unwrap().is_empty());
        assert!(find(&db, bob, todo.id).await.unwrap().is_none());
        assert!(update(&db, bob, todo.id, &changes).await.unwrap().is_none());
        assert!(delete(&db, bob, todo.id).await.unwrap().is_none());

        let untouched = find(&db, ada, todo.id).await.unwrap().unwrap();
        assert_eq!(untouched.title, "private");
    }

    #[tokio::test]
    async fn update_and_delete_own_todo() {
        let db = memory_pool().await;
        let ada = owner(&db, "ada").await;
        let todo = insert(&db, ada, &new_todo("laundry")).await.unwrap();

        let updated = update(
            &db,
            ada,
            todo.id,
            &TodoChanges {
                title: None,
                description: Some("whites only".into()),
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.title, "laundry");
        assert_eq!(updated.description, "whites only");

        let deleted = delete(&db, ada, todo.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, todo.id);
        assert!(list(&db, ada).await.unwrap().is_empty());
    }
}
